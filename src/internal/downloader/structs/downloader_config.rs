use std::time::Duration;

use tokio::sync::Semaphore;

use super::download_error::DownloadError;

/// 默认分片大小：1MB
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// 默认最大并发连接数
pub const DEFAULT_CONNECTIONS: usize = 8;

/// 默认重试次数：0 表示任一分片失败立即结束整个下载
pub const DEFAULT_MAX_RETRIES: usize = 0;

/// 默认重试延迟（毫秒）
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// 默认请求超时：等待响应头以及每次读取响应体
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 默认建立连接超时
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// 默认 User-Agent，部分服务器会拒绝没有浏览器标识的请求
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// 每个分片的大小（字节）
    pub chunk_size: u64,
    /// 最大并发连接数（同时进行中的分片数）
    pub connections: usize,
    /// 分片失败最大重试次数，只重新请求尚未写入的部分
    pub max_retries: usize,
    /// 重试延迟（毫秒）
    pub retry_delay_ms: u64,
    /// 等待响应头与每次读取响应体的超时，`None` 表示不限时
    pub request_timeout: Option<Duration>,
    /// 建立连接超时，仅对默认的 reqwest 传输生效
    pub connect_timeout: Duration,
    /// 默认 reqwest 传输使用的 User-Agent
    pub user_agent: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            connections: DEFAULT_CONNECTIONS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl DownloaderConfig {
    /// 校验配置，构建控制器前调用。
    pub fn validate(&self) -> Result<(), DownloadError> {
        if self.chunk_size == 0 {
            return Err(DownloadError::InvalidConfig("chunk_size 必须大于 0".into()));
        }
        if self.connections == 0 {
            return Err(DownloadError::InvalidConfig("connections 必须大于 0".into()));
        }
        if self.connections > Semaphore::MAX_PERMITS {
            return Err(DownloadError::InvalidConfig(format!(
                "connections 不能超过 {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(DownloadError::InvalidConfig("request_timeout 不能为 0".into()));
        }
        Ok(())
    }

    pub(crate) fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
