//! 分片下载：执行单段 Range 下载的编排——请求、流式读块、写文件与进度、记账。
//!
//! 每读到一块数据都会同时等待状态变化，暂停或取消后立即停止读取；
//! 已写入的前缀在退出前 fsync 并记入区间账本，不会丢失也不会重复下载。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::internal::downloader::structs::byte_range::ByteRange;
use crate::internal::downloader::structs::download_error::DownloadError;
use crate::internal::downloader::structs::download_status::DownloadStatus;
use crate::internal::downloader::structs::progress_tracker::ProgressTracker;
use crate::internal::downloader::structs::range_ledger::RangeLedger;
use crate::internal::downloader::structs::status_machine::StatusMachine;
use crate::internal::transport::structs::timeouts::next_buffer;
use crate::internal::transport::traits::http_transport::HttpTransport;

use super::chunk_handler::{HandleOneChunkParams, handle_one_chunk, open_at};
use super::range_request::{FetchRangeParams, chunk_failed, fetch_range_response};

/// 单个分片任务的结束方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// 区间已全部写入并移出账本
    Completed,
    /// 因暂停、取消或其他分片失败而中途停止，已写入部分已记账
    Interrupted,
    /// 获得许可时下载已不在进行中，没有发起请求
    Skipped,
}

/// 执行单段 Range 下载时的参数（形参超过 3 个，用 struct 承载）。
pub struct DownloadOneRangeParams {
    pub transport: Arc<dyn HttpTransport>,
    pub url: Arc<str>,
    pub range: ByteRange,
    pub total: u64,
    pub partial_path: Arc<PathBuf>,
    pub ledger: Arc<RangeLedger>,
    pub status: StatusMachine,
    pub progress: ProgressTracker,
    pub max_retries: usize,
    pub retry_delay: Duration,
    pub request_timeout: Option<Duration>,
}

enum AttemptEnd {
    Completed,
    Interrupted,
}

/// 下载一个区间；失败且重试用尽时把任务切到 `Error`，让其他分片尽快停下。
pub async fn download_one_range(
    params: DownloadOneRangeParams,
) -> Result<RangeOutcome, DownloadError> {
    if !params.status.is_running() {
        return Ok(RangeOutcome::Skipped);
    }

    let mut pending = params.range;
    let mut attempt = 0;
    loop {
        let (written_until, result) = fetch_into_file(&params, pending).await;
        if written_until > pending.start
            && let Err(e) = params.ledger.mark_done(pending.start, written_until).await
        {
            // 续传状态写不进去时同样失败即停，其他分片不再继续下载
            return Err(fail_job(&params, e));
        }

        let error = match result {
            Ok(AttemptEnd::Completed) => return Ok(RangeOutcome::Completed),
            Ok(AttemptEnd::Interrupted) => {
                debug!(range = %params.range, written_until, "分片中断，已记录进度");
                return Ok(RangeOutcome::Interrupted);
            }
            Err(e) => e,
        };

        if !params.status.is_running() {
            debug!(range = %params.range, error = %error, "下载已停止，忽略分片错误");
            return Ok(RangeOutcome::Interrupted);
        }
        let Some(rest) = pending.starting_at(written_until) else {
            return Ok(RangeOutcome::Completed);
        };
        if attempt < params.max_retries {
            attempt += 1;
            warn!(range = %params.range, attempt, error = %error, "分片下载失败，稍后重试");
            tokio::time::sleep(params.retry_delay).await;
            pending = rest;
            continue;
        }

        return Err(fail_job(&params, error));
    }
}

/// 把任务切到 `Error`（已是终态时保持不变），返回原错误。
fn fail_job(params: &DownloadOneRangeParams, error: DownloadError) -> DownloadError {
    if params.status.transition(DownloadStatus::Error).is_ok() {
        warn!(range = %params.range, error = %error, "分片失败，停止下载");
    }
    error
}

/// 请求并写入 `pending`，返回已持久写入的上界与本次结果。
///
/// 退出前一定 fsync；fsync 失败时不认可任何进度。
async fn fetch_into_file(
    params: &DownloadOneRangeParams,
    pending: ByteRange,
) -> (u64, Result<AttemptEnd, DownloadError>) {
    let mut cursor = pending.start;
    let mut file = None;
    let result = stream_range(params, pending, &mut cursor, &mut file).await;

    let Some(mut file) = file else {
        return (pending.start, result);
    };
    let synced = async {
        file.flush().await?;
        file.sync_data().await
    }
    .await;
    match synced {
        Ok(()) => (cursor, result),
        Err(e) => (pending.start, result.and(Err(DownloadError::WriteFile(e)))),
    }
}

async fn stream_range(
    params: &DownloadOneRangeParams,
    pending: ByteRange,
    cursor: &mut u64,
    file_slot: &mut Option<File>,
) -> Result<AttemptEnd, DownloadError> {
    let resp = fetch_range_response(FetchRangeParams {
        transport: params.transport.as_ref(),
        url: &params.url,
        pending,
        range: params.range,
        total: params.total,
        timeout: params.request_timeout,
    })
    .await?;
    let file = file_slot.insert(open_at(&params.partial_path, pending.start).await?);
    let mut body = resp.body;

    while *cursor < pending.end {
        let next = tokio::select! {
            biased;
            _ = params.status.stopped() => return Ok(AttemptEnd::Interrupted),
            next = next_buffer(&mut body, params.request_timeout) => next,
        };
        let Some(chunk) = next.map_err(|e| chunk_failed(params.range, e))? else {
            return Err(chunk_failed(
                params.range,
                format!("响应体提前结束，缺少 {} 字节", pending.end - *cursor),
            ));
        };
        handle_one_chunk(HandleOneChunkParams {
            chunk,
            cursor: &mut *cursor,
            end: pending.end,
            file: &mut *file,
            progress: &params.progress,
        })
        .await?;
    }
    Ok(AttemptEnd::Completed)
}
