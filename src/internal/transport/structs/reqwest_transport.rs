//! 基于 reqwest 的 [`HttpTransport`] 实现。

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::RANGE;

use crate::internal::downloader::structs::byte_range::ByteRange;
use crate::internal::transport::traits::http_transport::{
    GetResponse, HeadResponse, HttpTransport,
};

use super::transport_error::TransportError;

/// reqwest 客户端的薄封装，客户端内部自带连接池，Clone 开销很小。
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// 创建传输实现：所有请求携带 `user_agent`，建立连接受 `connect_timeout` 限制。
    ///
    /// 不开启响应压缩，Range 响应体必须是原始字节。
    pub fn new(user_agent: &str, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// 复用调用方已有的客户端。
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn head(&self, url: &str) -> Result<HeadResponse, TransportError> {
        let resp = self.client.head(url).send().await?;
        Ok(HeadResponse {
            resolved_url: resp.url().to_string(),
            status: resp.status(),
            headers: resp.headers().clone(),
        })
    }

    async fn get(
        &self,
        url: &str,
        range: Option<ByteRange>,
    ) -> Result<GetResponse, TransportError> {
        let mut request = self.client.get(url);
        if let Some(range) = range {
            request = request.header(RANGE, range.header_value());
        }
        let resp = request.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from));
        Ok(GetResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}
