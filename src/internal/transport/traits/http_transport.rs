//! HTTP 传输接口：探测用的 HEAD 请求与可选 Range 的 GET 请求。
//!
//! 响应体以惰性、有限、不可重放的字节流交给调用方。

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

use crate::internal::downloader::structs::byte_range::ByteRange;
use crate::internal::transport::structs::transport_error::TransportError;

/// 响应体字节流。
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// HEAD 响应：跟随重定向之后的最终 URL、状态码与响应头。
#[derive(Debug, Clone)]
pub struct HeadResponse {
    pub resolved_url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// GET 响应：状态码、响应头与尚未读取的响应体。
pub struct GetResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BodyStream,
}

impl std::fmt::Debug for GetResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// HTTP 传输实现。
///
/// 实现方需要自行跟随重定向；`get` 传入 `Some(range)` 时必须发送
/// `Range: bytes=start-(end-1)` 请求头（见 [`ByteRange::header_value`]）。
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// 发起 HEAD 请求。
    async fn head(&self, url: &str) -> Result<HeadResponse, TransportError>;

    /// 发起 GET 请求，`range` 为 `None` 时请求整个资源。
    async fn get(
        &self,
        url: &str,
        range: Option<ByteRange>,
    ) -> Result<GetResponse, TransportError>;
}
