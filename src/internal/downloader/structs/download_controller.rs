//! 下载控制器：持有状态机，协调探测、分片规划、并发下载与完成落地。
//!
//! 控制器可 Clone，所有副本共享同一个任务：一个副本 `start().await` 的同时，
//! 其他副本可以随时 `pause()` / `cancel()` 或读取状态与进度。

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};

use crate::internal::states::unlock_reactive::{PropertyWatcher, UnlockReactiveProperty};
use crate::internal::transport::traits::http_transport::HttpTransport;
use crate::internal::utils::size_format::human_readable_size;

use super::capability_probe::probe_resource;
use super::download_error::DownloadError;
use super::download_progress::DownloadProgress;
use super::download_result::DownloadResult;
use super::download_status::DownloadStatus;
use super::downloader_config::DownloaderConfig;
use super::job_paths::JobPaths;
use super::probe_result::ProbeResult;
use super::progress_reporters_container::ProgressReportersContainer;
use super::progress_tracker::ProgressTracker;
use super::range_ledger::RangeLedger;
use super::remaining_ranges::RemainingRanges;
use super::status_machine::StatusMachine;

mod chunked_download;
mod single_download;

use chunked_download::{
    PrepareLedgerParams, RunChunkedDownloadParams, prepare_ledger, run_chunked_download,
};
use single_download::{RunSingleStreamParams, run_single_stream_download};

#[derive(Clone)]
pub struct DownloadController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    /// 用户给出的原始 URL，也是续传状态的任务标识
    url: String,
    paths: JobPaths,
    config: DownloaderConfig,
    transport: Arc<dyn HttpTransport>,
    status: StatusMachine,
    progress: ProgressTracker,
    /// 每个控制器最多探测一次
    probe: OnceCell<ProbeResult>,
    /// 分片下载进行中或暂停时的区间账本
    ledger: Mutex<Option<Arc<RangeLedger>>>,
    last_error: UnlockReactiveProperty<Option<String>>,
    /// 串行化并发的 `start` 调用
    run_lock: Mutex<()>,
}

/// 内部实现
impl DownloadController {
    pub(crate) fn new(
        url: String,
        paths: JobPaths,
        config: DownloaderConfig,
        transport: Arc<dyn HttpTransport>,
        reporters: ProgressReportersContainer,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                url,
                paths,
                config,
                transport,
                status: StatusMachine::new(),
                progress: ProgressTracker::new(reporters),
                probe: OnceCell::new(),
                ledger: Mutex::new(None),
                last_error: UnlockReactiveProperty::new(None),
                run_lock: Mutex::new(()),
            }),
        }
    }
}

/// 外部接口：查询
impl DownloadController {
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn paths(&self) -> &JobPaths {
        &self.inner.paths
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.inner.config
    }

    /// 获取当前下载状态
    pub fn status(&self) -> DownloadStatus {
        self.inner.status.current()
    }

    /// 监听下载状态变化
    pub fn watch_status(&self) -> PropertyWatcher<DownloadStatus> {
        self.inner.status.watch()
    }

    /// 下载进度的响应式句柄，可 `get_current()` 读取或 `watch()` 监听
    pub fn progress(&self) -> UnlockReactiveProperty<DownloadProgress> {
        self.inner.progress.property()
    }

    /// 探测结果，尚未探测时为 `None`
    pub fn probe_result(&self) -> Option<ProbeResult> {
        self.inner.probe.get().cloned()
    }

    /// 最近一次导致下载失败的错误信息
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error.get_current()
    }

    /// 尚未完成的区间；单连接下载或尚未开始分片下载时为 `None`
    pub async fn remaining_ranges(&self) -> Option<RemainingRanges> {
        let ledger = self.inner.ledger.lock().await.clone()?;
        Some(ledger.snapshot().await)
    }
}

/// 外部接口：控制
impl DownloadController {
    /// 探测远程资源（HEAD），结果缓存，重复调用不会再次请求。
    ///
    /// 成功时 `Init → Ready`，失败时 `Init → Error`。
    pub async fn probe(&self) -> Result<ProbeResult, DownloadError> {
        let inner = &self.inner;
        let result = inner
            .probe
            .get_or_try_init(|| probe_resource(inner.transport.as_ref(), &inner.url))
            .await;
        match result {
            Ok(probe) => {
                if inner.status.transition(DownloadStatus::Ready).is_ok() {
                    inner.progress.reset(0, probe.size);
                    info!(
                        url = %inner.url,
                        size = %probe.size.map(human_readable_size).unwrap_or_else(|| "未知".into()),
                        resumable = probe.is_resumable(),
                        "资源探测成功"
                    );
                }
                Ok(probe.clone())
            }
            Err(e) => {
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    /// 开始或继续下载，直到完成、暂停、取消或出错后返回。
    ///
    /// 已完成时直接返回 `Finished`；已取消或出错的任务不能再次开始。
    pub async fn start(&self) -> Result<DownloadResult, DownloadError> {
        let _run = self.inner.run_lock.lock().await;
        match self.status() {
            DownloadStatus::Finished => return Ok(DownloadResult::Finished),
            from @ (DownloadStatus::Canceled | DownloadStatus::Error) => {
                return Err(DownloadError::InvalidTransition {
                    from,
                    to: DownloadStatus::Running,
                });
            }
            _ => {}
        }

        if self.is_already_complete().await {
            return self.finish_already_complete().await;
        }

        let probe = self.probe().await?;
        let result = match (probe.size, probe.range_supported) {
            (Some(total), true) => self.run_chunked(&probe, total).await,
            _ => self.run_single_stream(&probe).await,
        };
        if let Err(e) = &result {
            self.record_failure(e);
        }
        result
    }

    /// 暂停：`Running → Paused`。正在进行的分片把已写入的部分记入续传状态后退出。
    ///
    /// 只有可续传（大小已知且支持 Range）的任务才能暂停。
    pub fn pause(&self) -> Result<(), DownloadError> {
        let resumable = self
            .inner
            .probe
            .get()
            .is_some_and(ProbeResult::is_resumable);
        if !resumable {
            return Err(DownloadError::NotPausable);
        }
        self.inner.status.request_pause()?;
        info!(url = %self.inner.url, "已请求暂停");
        Ok(())
    }

    /// 取消：进入终态 `Canceled`，分片文件与续传状态保留在磁盘上。
    pub fn cancel(&self) -> Result<(), DownloadError> {
        self.inner.status.transition(DownloadStatus::Canceled)?;
        info!(url = %self.inner.url, "已请求取消");
        Ok(())
    }
}

/// 下载逻辑
impl DownloadController {
    async fn run_chunked(
        &self,
        probe: &ProbeResult,
        total: u64,
    ) -> Result<DownloadResult, DownloadError> {
        let inner = &self.inner;
        if !self.enter_running()? {
            return Ok(DownloadResult::Canceled);
        }

        let ledger = prepare_ledger(PrepareLedgerParams {
            paths: &inner.paths,
            url: &inner.url,
            total,
            chunk_size: inner.config.chunk_size,
        })
        .await?;
        *inner.ledger.lock().await = Some(Arc::clone(&ledger));

        run_chunked_download(RunChunkedDownloadParams {
            transport: Arc::clone(&inner.transport),
            url: &probe.resolved_url,
            paths: &inner.paths,
            total,
            config: &inner.config,
            ledger,
            status: inner.status.clone(),
            progress: inner.progress.clone(),
        })
        .await
    }

    async fn run_single_stream(&self, probe: &ProbeResult) -> Result<DownloadResult, DownloadError> {
        let inner = &self.inner;
        if !self.enter_running()? {
            return Ok(DownloadResult::Canceled);
        }

        run_single_stream_download(RunSingleStreamParams {
            transport: inner.transport.as_ref(),
            url: &probe.resolved_url,
            paths: &inner.paths,
            expected_size: probe.size,
            request_timeout: inner.config.request_timeout,
            status: &inner.status,
            progress: &inner.progress,
        })
        .await
    }

    /// 进入 `Running`；在此之前已被取消时返回 `Ok(false)`。
    fn enter_running(&self) -> Result<bool, DownloadError> {
        match self.inner.status.transition(DownloadStatus::Running) {
            Ok(_) => Ok(true),
            Err(DownloadError::InvalidTransition {
                from: DownloadStatus::Canceled,
                ..
            }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// 目标文件存在且没有分片文件与续传状态，说明之前已经下载完成。
    async fn is_already_complete(&self) -> bool {
        let paths = &self.inner.paths;
        path_exists(&paths.destination).await
            && !path_exists(&paths.partial).await
            && !path_exists(&paths.resume).await
    }

    /// 不发起任何请求，直接走完 `Ready → Running → Finished`。
    async fn finish_already_complete(&self) -> Result<DownloadResult, DownloadError> {
        let status = &self.inner.status;
        if status.current() == DownloadStatus::Init {
            status.transition(DownloadStatus::Ready)?;
        }
        if !self.enter_running()? {
            return Ok(DownloadResult::Canceled);
        }
        status.transition(DownloadStatus::Finished)?;

        let size = fs::metadata(&self.inner.paths.destination)
            .await
            .map(|m| m.len())
            .ok();
        if let Some(size) = size {
            self.inner.progress.reset(size, Some(size));
        }
        info!(path = %self.inner.paths.destination.display(), "目标文件已存在，跳过下载");
        Ok(DownloadResult::Finished)
    }

    /// 记录失败：进入 `Error`（已是终态时保持不变）并保存错误信息。
    fn record_failure(&self, err: &DownloadError) {
        let _ = self.inner.status.transition(DownloadStatus::Error);
        self.inner.last_error.update(Some(err.to_string()));
        warn!(url = %self.inner.url, error = %err, "下载失败");
    }
}

impl fmt::Debug for DownloadController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadController")
            .field("url", &self.inner.url)
            .field("paths", &self.inner.paths)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

async fn path_exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}
