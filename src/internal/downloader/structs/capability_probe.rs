//! 资源探测：HEAD 请求得到资源大小、是否支持 Range 以及重定向后的最终 URL。

use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, HeaderMap};
use tracing::debug;

use crate::internal::transport::traits::http_transport::HttpTransport;

use super::download_error::DownloadError;
use super::probe_result::ProbeResult;

/// 发起 HEAD 请求并解析探测结果。传输失败或非成功状态码返回 [`DownloadError::ProbeFailed`]。
pub async fn probe_resource(
    transport: &dyn HttpTransport,
    url: &str,
) -> Result<ProbeResult, DownloadError> {
    let resp = transport
        .head(url)
        .await
        .map_err(|e| DownloadError::ProbeFailed(e.to_string()))?;
    if !resp.status.is_success() {
        return Err(DownloadError::ProbeFailed(format!(
            "服务器返回状态码 {}",
            resp.status
        )));
    }

    let result = ProbeResult {
        size: content_length(&resp.headers),
        range_supported: accepts_byte_ranges(&resp.headers),
        resolved_url: resp.resolved_url,
    };
    debug!(
        url,
        resolved_url = %result.resolved_url,
        size = ?result.size,
        range_supported = result.range_supported,
        "探测完成"
    );
    Ok(result)
}

/// 直接解析 `Content-Length` 头；缺失或不是十进制整数时返回 `None`。
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// `Accept-Ranges` 中列出了 `bytes` 单位时才认为支持 Range；缺失或为 `none` 都视为不支持。
pub fn accepts_byte_ranges(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT_RANGES)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|unit| unit.trim().eq_ignore_ascii_case("bytes"))
}
