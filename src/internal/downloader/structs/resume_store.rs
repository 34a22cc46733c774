//! 续传状态文件：记录尚未落盘的字节区间，进程重启后据此继续下载。
//!
//! 文件内容为 JSON：`{ version, url, total_size, ranges: [{start, end}], updated_at }`。
//! 写入先落到 `P.resume.tmp`，fsync 后再 rename 覆盖 `P.resume`，读取方只会看到完整的文档。
//! 写入在阻塞线程池中执行，等待它的 future 被丢弃时写入也会完成；
//! 每次写入带递增序号，晚到的旧写入会被跳过，不会覆盖更新的状态。

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use super::download_error::DownloadError;
use super::job_paths::JobPaths;
use super::remaining_ranges::RemainingRanges;

/// 续传状态文件格式版本，格式不兼容时递增。
pub const RESUME_STATE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ResumeState {
    version: u32,
    url: String,
    total_size: u64,
    ranges: RemainingRanges,
    updated_at: DateTime<Utc>,
}

/// 读取续传状态的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeLoad {
    /// 状态文件有效，里面是剩余区间
    Found(RemainingRanges),
    NotFound,
    /// 状态文件存在但无法使用（无法解析、与当前任务不匹配或区间非法），附带原因
    Corrupt(String),
}

/// 单个下载任务的续传状态读写。
#[derive(Debug)]
pub struct ResumeStore {
    path: PathBuf,
    tmp_path: PathBuf,
    url: String,
    total_size: u64,
    next_seq: AtomicU64,
    /// 已落盘的最新序号；`u64::MAX` 表示状态已删除，之后的写入全部跳过。
    written_seq: Arc<Mutex<u64>>,
}

impl ResumeStore {
    /// `url` 为用户给出的原始 URL，与 `total_size` 一起标识同一个下载任务。
    pub fn new(paths: &JobPaths, url: impl Into<String>, total_size: u64) -> Self {
        Self {
            path: paths.resume.clone(),
            tmp_path: paths.resume_tmp(),
            url: url.into(),
            total_size,
            next_seq: AtomicU64::new(0),
            written_seq: Arc::new(Mutex::new(0)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取并校验续传状态。
    pub async fn load(&self) -> ResumeLoad {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return ResumeLoad::NotFound,
            Err(e) => return ResumeLoad::Corrupt(format!("读取失败: {e}")),
        };
        let state: ResumeState = match serde_json::from_slice(&raw) {
            Ok(state) => state,
            Err(e) => return ResumeLoad::Corrupt(format!("解析失败: {e}")),
        };
        if state.version != RESUME_STATE_VERSION {
            return ResumeLoad::Corrupt(format!("不支持的版本 {}", state.version));
        }
        if state.url != self.url {
            return ResumeLoad::Corrupt(format!("URL 不一致: {}", state.url));
        }
        if state.total_size != self.total_size {
            return ResumeLoad::Corrupt(format!(
                "文件大小不一致: 记录 {}，当前 {}",
                state.total_size, self.total_size
            ));
        }
        if !state.ranges.is_valid_for(self.total_size) {
            return ResumeLoad::Corrupt("区间列表非法".into());
        }
        ResumeLoad::Found(state.ranges)
    }

    /// 用 `ranges` 整体覆盖续传状态。
    pub async fn save(&self, ranges: &RemainingRanges) -> Result<(), DownloadError> {
        let state = ResumeState {
            version: RESUME_STATE_VERSION,
            url: self.url.clone(),
            total_size: self.total_size,
            ranges: ranges.clone(),
            updated_at: Utc::now(),
        };
        let payload = serde_json::to_vec_pretty(&state)
            .map_err(|e| DownloadError::ResumeStateWrite(io::Error::other(e)))?;

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let written_seq = Arc::clone(&self.written_seq);
        let tmp_path = self.tmp_path.clone();
        let path = self.path.clone();
        let result = tokio::task::spawn_blocking(move || {
            write_if_newer(&written_seq, seq, &tmp_path, &path, &payload)
        })
        .await?;
        result.map_err(DownloadError::ResumeStateWrite)
    }

    /// 删除续传状态文件与残留的临时文件，之后的 `save` 不再落盘。
    pub async fn delete(&self) -> io::Result<()> {
        let written_seq = Arc::clone(&self.written_seq);
        let tmp_path = self.tmp_path.clone();
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut last = lock_seq(&written_seq)?;
            *last = u64::MAX;
            remove_if_exists(&tmp_path)?;
            remove_if_exists(&path)
        })
        .await
        .map_err(io::Error::other)?
    }
}

fn lock_seq(seq: &Mutex<u64>) -> io::Result<std::sync::MutexGuard<'_, u64>> {
    seq.lock()
        .map_err(|_| io::Error::other("续传状态序号锁已损坏"))
}

fn write_if_newer(
    written_seq: &Mutex<u64>,
    seq: u64,
    tmp_path: &Path,
    path: &Path,
    payload: &[u8],
) -> io::Result<()> {
    let mut last = lock_seq(written_seq)?;
    if *last >= seq {
        return Ok(());
    }
    let mut file = std::fs::File::create(tmp_path)?;
    file.write_all(payload)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(tmp_path, path)?;
    *last = seq;
    Ok(())
}

pub(crate) fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
