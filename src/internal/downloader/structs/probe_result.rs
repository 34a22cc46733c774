/// HEAD 探测结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// 跟随重定向后的最终 URL，后续所有请求都发往这里
    pub resolved_url: String,
    /// 资源大小，来自 `Content-Length`；缺失或无法解析时为 `None`
    pub size: Option<u64>,
    /// 服务器是否在 `Accept-Ranges` 中声明了 `bytes`
    pub range_supported: bool,
}

impl ProbeResult {
    /// 大小已知且支持 Range 时才能分片下载、暂停和续传。
    pub fn is_resumable(&self) -> bool {
        self.size.is_some() && self.range_supported
    }
}
