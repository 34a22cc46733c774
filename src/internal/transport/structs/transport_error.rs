//! 传输层错误类型。

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP 请求失败: {0}")]
    Request(#[from] reqwest::Error),

    /// 等待响应头或读取响应体超时。
    #[error("请求超时（{0:?}）")]
    Timeout(Duration),

    #[error("服务器返回异常状态码: {0}")]
    Status(StatusCode),

    /// 非 reqwest 实现（如测试替身）使用的通用错误。
    #[error("{0}")]
    Other(String),
}
