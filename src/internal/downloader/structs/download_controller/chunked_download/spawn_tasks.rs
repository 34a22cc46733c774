//! 分片下载：为每个剩余区间 spawn 一个任务，以及等待所有任务结束。

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::internal::downloader::structs::byte_range::ByteRange;
use crate::internal::downloader::structs::download_error::DownloadError;
use crate::internal::downloader::structs::downloader_config::DownloaderConfig;
use crate::internal::downloader::structs::progress_tracker::ProgressTracker;
use crate::internal::downloader::structs::range_ledger::RangeLedger;
use crate::internal::downloader::structs::remaining_ranges::RemainingRanges;
use crate::internal::downloader::structs::status_machine::StatusMachine;
use crate::internal::transport::traits::http_transport::HttpTransport;

use super::download_one_range::{DownloadOneRangeParams, RangeOutcome, download_one_range};

/// 单个分片任务句柄：(区间, JoinHandle)。
pub type RangeTaskHandle = (ByteRange, JoinHandle<Result<RangeOutcome, DownloadError>>);

/// 生成并 spawn 分片任务时的参数（形参超过 3 个，用 struct 承载）。
pub struct SpawnRangeTasksParams<'a> {
    pub transport: &'a Arc<dyn HttpTransport>,
    pub url: &'a str,
    pub total: u64,
    pub ranges: &'a RemainingRanges,
    pub partial_path: &'a Path,
    /// 准入闸门：许可数即最大并发连接数
    pub semaphore: Arc<Semaphore>,
    pub ledger: &'a Arc<RangeLedger>,
    pub status: &'a StatusMachine,
    pub progress: &'a ProgressTracker,
    pub config: &'a DownloaderConfig,
}

/// 每个区间一个任务；任务先取得许可再发起请求，许可随任务结束释放。
pub fn spawn_range_tasks(params: SpawnRangeTasksParams<'_>) -> Vec<RangeTaskHandle> {
    let url: Arc<str> = Arc::from(params.url);
    let partial_path = Arc::new(params.partial_path.to_path_buf());
    params
        .ranges
        .iter()
        .map(|&range| {
            let download_params = DownloadOneRangeParams {
                transport: Arc::clone(params.transport),
                url: Arc::clone(&url),
                range,
                total: params.total,
                partial_path: Arc::clone(&partial_path),
                ledger: Arc::clone(params.ledger),
                status: params.status.clone(),
                progress: params.progress.clone(),
                max_retries: params.config.max_retries,
                retry_delay: params.config.retry_delay(),
                request_timeout: params.config.request_timeout,
            };
            let sem = Arc::clone(&params.semaphore);
            let handle = tokio::spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|_| DownloadError::Internal("semaphore closed".into()))?;
                download_one_range(download_params).await
            });
            (range, handle)
        })
        .collect()
}

/// 等待全部分片任务结束（不提前返回），返回遇到的第一个错误。
pub async fn join_range_handles(handles: Vec<RangeTaskHandle>) -> Result<(), DownloadError> {
    let mut first_error = None;
    let (mut completed, mut interrupted, mut skipped) = (0usize, 0usize, 0usize);
    for (range, h) in handles {
        match h.await {
            Ok(Ok(RangeOutcome::Completed)) => completed += 1,
            Ok(Ok(RangeOutcome::Interrupted)) => interrupted += 1,
            Ok(Ok(RangeOutcome::Skipped)) => skipped += 1,
            Ok(Err(e)) => {
                debug!(range = %range, error = %e, "分片任务失败");
                first_error.get_or_insert(e);
            }
            Err(join_err) => {
                first_error.get_or_insert(DownloadError::TaskJoin(join_err));
            }
        }
    }
    debug!(completed, interrupted, skipped, "分片任务全部结束");
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
