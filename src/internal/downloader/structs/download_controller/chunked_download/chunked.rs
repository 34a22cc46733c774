//! 分片下载：多段 Range 请求 + 并发写文件 + 区间记账 + 完成落地。

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::internal::downloader::structs::download_error::DownloadError;
use crate::internal::downloader::structs::download_result::DownloadResult;
use crate::internal::downloader::structs::download_status::DownloadStatus;
use crate::internal::downloader::structs::downloader_config::DownloaderConfig;
use crate::internal::downloader::structs::finalizer::finalize;
use crate::internal::downloader::structs::job_paths::JobPaths;
use crate::internal::downloader::structs::progress_tracker::ProgressTracker;
use crate::internal::downloader::structs::range_ledger::RangeLedger;
use crate::internal::downloader::structs::status_machine::StatusMachine;
use crate::internal::transport::traits::http_transport::HttpTransport;
use crate::internal::utils::size_format::human_readable_size;

use super::spawn_tasks::{SpawnRangeTasksParams, join_range_handles, spawn_range_tasks};

/// 执行分片下载时的参数（形参超过 3 个，用 struct 承载）。
pub struct RunChunkedDownloadParams<'a> {
    pub transport: Arc<dyn HttpTransport>,
    /// 探测得到的最终 URL
    pub url: &'a str,
    pub paths: &'a JobPaths,
    pub total: u64,
    pub config: &'a DownloaderConfig,
    pub ledger: Arc<RangeLedger>,
    pub status: StatusMachine,
    pub progress: ProgressTracker,
}

/// 分片下载入口：调用前状态已是 `Running`，账本已就绪。
///
/// 等所有分片任务结束后，根据状态与剩余区间决定完成落地、暂停还是取消。
pub async fn run_chunked_download(
    params: RunChunkedDownloadParams<'_>,
) -> Result<DownloadResult, DownloadError> {
    let pending = params.ledger.snapshot().await;
    let remaining = pending.total_remaining();
    params
        .progress
        .reset(params.total.saturating_sub(remaining), Some(params.total));
    info!(
        url = params.url,
        ranges = pending.len(),
        remaining = %human_readable_size(remaining),
        connections = params.config.connections,
        "开始分片下载"
    );

    let semaphore = Arc::new(Semaphore::new(params.config.connections));
    let handles = spawn_range_tasks(SpawnRangeTasksParams {
        transport: &params.transport,
        url: params.url,
        total: params.total,
        ranges: &pending,
        partial_path: &params.paths.partial,
        semaphore,
        ledger: &params.ledger,
        status: &params.status,
        progress: &params.progress,
        config: params.config,
    });
    let joined = join_range_handles(handles).await;
    let left = params.ledger.snapshot().await;

    match (params.status.current(), joined) {
        (DownloadStatus::Canceled, joined) => {
            if let Err(e) = joined {
                debug!(error = %e, "取消期间的分片错误");
            }
            info!(remaining = %human_readable_size(left.total_remaining()), "下载已取消");
            Ok(DownloadResult::Canceled)
        }
        (_, Err(e)) => Err(e),
        (DownloadStatus::Running | DownloadStatus::Paused, Ok(())) if left.is_empty() => {
            finalize(params.paths, Some(params.ledger.store())).await?;
            params.status.transition(DownloadStatus::Finished)?;
            params.progress.complete();
            Ok(DownloadResult::Finished)
        }
        (DownloadStatus::Paused, Ok(())) => {
            info!(
                ranges = left.len(),
                remaining = %human_readable_size(left.total_remaining()),
                "下载已暂停"
            );
            Ok(DownloadResult::Paused)
        }
        (status, Ok(())) => Err(DownloadError::Internal(format!(
            "分片任务全部结束但仍有 {} 个区间未完成，当前状态 {status}",
            left.len()
        ))),
    }
}
