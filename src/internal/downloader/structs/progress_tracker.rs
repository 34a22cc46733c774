//! 进度聚合：各分片任务并发累加字节数，同步到响应式进度并通知上报器。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::internal::states::unlock_reactive::UnlockReactiveProperty;

use super::download_progress::DownloadProgress;
use super::progress_reporters_container::ProgressReportersContainer;

#[derive(Debug, Clone)]
pub struct ProgressTracker {
    bytes_done: Arc<AtomicU64>,
    progress: UnlockReactiveProperty<DownloadProgress>,
    reporters: ProgressReportersContainer,
}

impl ProgressTracker {
    pub fn new(reporters: ProgressReportersContainer) -> Self {
        Self {
            bytes_done: Arc::new(AtomicU64::new(0)),
            progress: UnlockReactiveProperty::new(DownloadProgress::default()),
            reporters,
        }
    }

    /// 重置起点：续传时 `bytes_done` 为已完成的字节数。
    pub fn reset(&self, bytes_done: u64, total: Option<u64>) {
        self.bytes_done.store(bytes_done, Ordering::Relaxed);
        self.progress.update(DownloadProgress { bytes_done, total });
    }

    /// 记录新写入的 `n` 个字节。
    ///
    /// 响应式进度只前进不后退：并发任务的更新顺序可能与累加顺序不同。
    pub fn advance(&self, n: u64) {
        if n == 0 {
            return;
        }
        let current = self.bytes_done.fetch_add(n, Ordering::Relaxed) + n;
        self.progress.update_if(|p| {
            if current > p.bytes_done {
                p.bytes_done = current;
                true
            } else {
                false
            }
        });
        self.reporters.run_on_bytes(n);
        if !self.reporters.is_empty() {
            let total = self.progress.map(|p| p.total);
            self.reporters.run_on_progress(current, total);
        }
    }

    /// 下载完成：进度补齐到总大小（总大小未知时以实际写入量为准）。
    pub fn complete(&self) {
        let done = self.bytes_done.load(Ordering::Relaxed);
        self.progress.update_field(|p| {
            let total = *p.total.get_or_insert(done);
            p.bytes_done = total;
        });
    }

    /// 对外暴露的响应式进度句柄。
    pub fn property(&self) -> UnlockReactiveProperty<DownloadProgress> {
        self.progress.clone()
    }
}
