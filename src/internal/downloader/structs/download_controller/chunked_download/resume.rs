//! 分片下载：断点续传——读取续传状态决定剩余区间，无效时重新规划，并准备分片文件。

use std::path::Path;
use std::sync::Arc;

use tokio::fs::{self, OpenOptions};
use tracing::{info, warn};

use crate::internal::downloader::structs::chunk_planner::plan;
use crate::internal::downloader::structs::download_error::DownloadError;
use crate::internal::downloader::structs::job_paths::JobPaths;
use crate::internal::downloader::structs::range_ledger::RangeLedger;
use crate::internal::downloader::structs::remaining_ranges::RemainingRanges;
use crate::internal::downloader::structs::resume_store::{ResumeLoad, ResumeStore};

/// 准备区间账本时的参数（形参超过 3 个，用 struct 承载）。
pub struct PrepareLedgerParams<'a> {
    pub paths: &'a JobPaths,
    /// 原始 URL，用于校验续传状态是否属于当前任务
    pub url: &'a str,
    pub total: u64,
    pub chunk_size: u64,
}

/// 有效的续传状态优先于新规划；新规划会立即写入续传状态。
pub async fn prepare_ledger(
    params: PrepareLedgerParams<'_>,
) -> Result<Arc<RangeLedger>, DownloadError> {
    let store = ResumeStore::new(params.paths, params.url, params.total);
    let resumed = load_remaining(&store, &params.paths.partial).await;
    let fresh = resumed.is_none();
    let ranges = resumed.unwrap_or_else(|| plan(params.total, params.chunk_size));

    prepare_partial_file(&params.paths.partial, params.total).await?;

    let ledger = Arc::new(RangeLedger::new(ranges, store));
    if fresh {
        ledger.persist().await?;
    }
    Ok(ledger)
}

/// 读取续传状态；状态无效或分片文件缺失时记录警告并返回 `None`。
async fn load_remaining(store: &ResumeStore, partial: &Path) -> Option<RemainingRanges> {
    let reason = match store.load().await {
        ResumeLoad::NotFound => return None,
        ResumeLoad::Found(ranges) => {
            if fs::try_exists(partial).await.unwrap_or(false) {
                info!(
                    path = %store.path().display(),
                    ranges = ranges.len(),
                    remaining = ranges.total_remaining(),
                    "从续传状态恢复"
                );
                return Some(ranges);
            }
            "分片文件缺失".to_string()
        }
        ResumeLoad::Corrupt(reason) => reason,
    };
    let error = DownloadError::ResumeStateCorrupt(reason);
    warn!(path = %store.path().display(), error = %error, "续传状态不可用，重新规划");
    None
}

/// 分片文件不存在时创建，已存在时保留内容；长度调整为文件总大小。
async fn prepare_partial_file(path: &Path, total: u64) -> Result<(), DownloadError> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .await
        .map_err(DownloadError::CreateFile)?;
    file.set_len(total)
        .await
        .map_err(DownloadError::CreateFile)?;
    Ok(())
}
