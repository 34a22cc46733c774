use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::internal::downloader::traits::progress::ProgressReporter;
use crate::internal::transport::structs::reqwest_transport::ReqwestTransport;
use crate::internal::transport::traits::http_transport::HttpTransport;
use crate::internal::utils::file_name::infer_file_name;

use super::download_controller::DownloadController;
use super::download_error::DownloadError;
use super::download_result::DownloadResult;
use super::downloader_config::DownloaderConfig;
use super::job_paths::JobPaths;
use super::progress_reporters_container::ProgressReportersContainer;
use super::reporter_adapters::{OnBytesReporterAdapter, OnProgressReporterAdapter};

/// 下载器构建器：设置目标、参数、传输实现与进度上报，`build()` 得到控制器。
///
/// 所有设置都在 `build()` 之前完成，控制器创建后配置不可变。
pub struct Downloader {
    url: String,
    destination: PathBuf,
    config: DownloaderConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    reporters: ProgressReportersContainer,
}

impl Downloader {
    /// 下载 `url` 到 `destination`。
    pub fn new(url: impl Into<String>, destination: impl AsRef<Path>) -> Self {
        Self {
            url: url.into(),
            destination: destination.as_ref().to_path_buf(),
            config: DownloaderConfig::default(),
            transport: None,
            reporters: ProgressReportersContainer::default(),
        }
    }

    /// 下载到目录 `dir` 下，文件名取 URL 路径的最后一段。
    pub fn from_url(url: impl Into<String>, dir: impl AsRef<Path>) -> Result<Self, DownloadError> {
        let url = url.into();
        let file_name = infer_file_name(&url)?;
        let destination = dir.as_ref().join(file_name);
        Ok(Self::new(url, destination))
    }

    /// 整体替换配置
    pub fn config(mut self, config: DownloaderConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置分片大小（字节）
    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// 设置最大并发连接数
    pub fn connections(mut self, connections: usize) -> Self {
        self.config.connections = connections;
        self
    }

    /// 设置分片失败最大重试次数
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// 设置重试延迟（毫秒）
    pub fn retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.config.retry_delay_ms = retry_delay_ms;
        self
    }

    /// 设置请求超时，`None` 表示不限时
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// 替换 HTTP 传输实现（默认使用 reqwest）
    pub fn with_transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// 与其他下载器共享同一个传输实现
    pub fn with_shared_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// 注册进度上报器；可多次调用，按注册顺序通知。
    pub fn with_progress_reporter(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.reporters.add(reporter);
        self
    }

    /// 每写入一块数据调用一次，参数为本次写入的字节数
    pub fn with_on_bytes<F>(mut self, f: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.reporters.add(OnBytesReporterAdapter(f));
        self
    }

    /// 每写入一块数据调用一次，参数为累计字节数与总大小
    pub fn with_on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(u64, Option<u64>) + Send + Sync + 'static,
    {
        self.reporters.add(OnProgressReporterAdapter(f));
        self
    }

    /// 校验配置并创建控制器。
    pub fn build(self) -> Result<DownloadController, DownloadError> {
        self.config.validate()?;
        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(
                &self.config.user_agent,
                self.config.connect_timeout,
            )?),
        };
        Ok(DownloadController::new(
            self.url,
            JobPaths::for_destination(self.destination),
            self.config,
            transport,
            self.reporters,
        ))
    }

    /// 创建控制器并立即开始下载；需要暂停或取消时先 `build()` 再保留控制器。
    pub async fn send(self) -> Result<DownloadResult, DownloadError> {
        self.build()?.start().await
    }
}
