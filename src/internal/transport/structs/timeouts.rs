//! 请求超时：限制等待响应头和每次读取响应体的时间。

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;

use crate::internal::transport::traits::http_transport::BodyStream;

use super::transport_error::TransportError;

/// 为传输层 future 套上可选超时；`None` 表示不限时。
pub async fn with_timeout<F, T>(timeout: Option<Duration>, fut: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| TransportError::Timeout(limit))?,
        None => fut.await,
    }
}

/// 读取响应体的下一块数据；流结束时返回 `Ok(None)`。
pub async fn next_buffer(
    body: &mut BodyStream,
    timeout: Option<Duration>,
) -> Result<Option<Bytes>, TransportError> {
    with_timeout(timeout, async { body.next().await.transpose() }).await
}
