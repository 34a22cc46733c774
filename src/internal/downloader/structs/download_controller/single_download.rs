//! 单连接整文件下载：大小未知或服务器不支持 Range 时使用，不写续传状态，不支持暂停。

use std::time::Duration;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::internal::downloader::structs::download_error::DownloadError;
use crate::internal::downloader::structs::download_result::DownloadResult;
use crate::internal::downloader::structs::download_status::DownloadStatus;
use crate::internal::downloader::structs::finalizer::finalize;
use crate::internal::downloader::structs::job_paths::JobPaths;
use crate::internal::downloader::structs::progress_tracker::ProgressTracker;
use crate::internal::downloader::structs::status_machine::StatusMachine;
use crate::internal::transport::structs::timeouts::{next_buffer, with_timeout};
use crate::internal::transport::structs::transport_error::TransportError;
use crate::internal::transport::traits::http_transport::HttpTransport;

/// 单连接下载时的参数（形参超过 3 个，用 struct 承载）。
pub(super) struct RunSingleStreamParams<'a> {
    pub transport: &'a dyn HttpTransport,
    pub url: &'a str,
    pub paths: &'a JobPaths,
    /// 探测得到的大小，已知时下载结束后校验
    pub expected_size: Option<u64>,
    pub request_timeout: Option<Duration>,
    pub status: &'a StatusMachine,
    pub progress: &'a ProgressTracker,
}

/// 整文件 GET，流式写入截断后的分片文件，结束后完成落地。
pub(super) async fn run_single_stream_download(
    params: RunSingleStreamParams<'_>,
) -> Result<DownloadResult, DownloadError> {
    params.progress.reset(0, params.expected_size);
    info!(url = params.url, "不支持分片续传，使用单连接下载");

    let resp = with_timeout(params.request_timeout, params.transport.get(params.url, None)).await?;
    if !resp.status.is_success() {
        return Err(TransportError::Status(resp.status).into());
    }

    let mut file = File::create(&params.paths.partial)
        .await
        .map_err(DownloadError::CreateFile)?;
    let mut body = resp.body;
    let mut written: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = params.status.stopped() => return stopped_result(params.status.current()),
            next = next_buffer(&mut body, params.request_timeout) => next?,
        };
        let Some(chunk) = next else { break };
        file.write_all(&chunk)
            .await
            .map_err(DownloadError::WriteFile)?;
        let len = chunk.len() as u64;
        written += len;
        params.progress.advance(len);
    }

    file.flush().await.map_err(DownloadError::WriteFile)?;
    file.sync_data().await.map_err(DownloadError::WriteFile)?;
    drop(file);

    if let Some(expected) = params.expected_size
        && expected != written
    {
        return Err(DownloadError::SizeMismatch {
            expected,
            actual: written,
        });
    }

    finalize(params.paths, None).await?;
    params.status.transition(DownloadStatus::Finished)?;
    params.progress.complete();
    Ok(DownloadResult::Finished)
}

/// 单连接下载只会被取消打断。
fn stopped_result(status: DownloadStatus) -> Result<DownloadResult, DownloadError> {
    match status {
        DownloadStatus::Canceled => {
            info!("下载已取消");
            Ok(DownloadResult::Canceled)
        }
        other => Err(DownloadError::Internal(format!(
            "单连接下载被意外中断，当前状态 {other}"
        ))),
    }
}
