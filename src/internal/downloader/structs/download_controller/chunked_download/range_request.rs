//! 分片下载：发起单段 Range 请求并校验响应，返回响应体供流式读取。

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_RANGE, HeaderMap};

use crate::internal::downloader::structs::byte_range::ByteRange;
use crate::internal::downloader::structs::download_error::DownloadError;
use crate::internal::transport::structs::timeouts::with_timeout;
use crate::internal::transport::traits::http_transport::{GetResponse, HttpTransport};

/// 发起 Range 请求时的参数（形参超过 3 个时用 struct 承载）。
pub struct FetchRangeParams<'a> {
    pub transport: &'a dyn HttpTransport,
    pub url: &'a str,
    /// 本次实际请求的区间（重试时只请求未写入的部分）
    pub pending: ByteRange,
    /// 分片的原始区间，用于错误信息
    pub range: ByteRange,
    pub total: u64,
    pub timeout: Option<Duration>,
}

/// 发起单段 Range GET 请求。
///
/// 只接受 206；区间恰好是整个文件时也接受 200。其余状态码都算分片失败。
pub async fn fetch_range_response(
    params: FetchRangeParams<'_>,
) -> Result<GetResponse, DownloadError> {
    let resp = with_timeout(
        params.timeout,
        params.transport.get(params.url, Some(params.pending)),
    )
    .await
    .map_err(|e| chunk_failed(params.range, e))?;

    let whole_file = params.pending.start == 0 && params.pending.end == params.total;
    match resp.status {
        StatusCode::PARTIAL_CONTENT => {
            check_content_range(&resp.headers, params.pending, params.range)?;
            Ok(resp)
        }
        StatusCode::OK if whole_file => Ok(resp),
        status => Err(chunk_failed(
            params.range,
            format!("服务器返回状态码 {status}，预期 206"),
        )),
    }
}

/// 服务器给出 `Content-Range` 时，起点必须与请求一致。
fn check_content_range(
    headers: &HeaderMap,
    pending: ByteRange,
    range: ByteRange,
) -> Result<(), DownloadError> {
    let Some(value) = headers.get(CONTENT_RANGE).and_then(|v| v.to_str().ok()) else {
        return Ok(());
    };
    let start = value
        .trim()
        .strip_prefix("bytes")
        .and_then(|rest| rest.trim_start().split('-').next())
        .and_then(|s| s.trim().parse::<u64>().ok());
    match start {
        Some(start) if start == pending.start => Ok(()),
        _ => Err(chunk_failed(
            range,
            format!("Content-Range 与请求不符: {value}"),
        )),
    }
}

pub fn chunk_failed(range: ByteRange, message: impl ToString) -> DownloadError {
    DownloadError::ChunkFailed {
        range,
        message: message.to_string(),
    }
}
