//! 进度上报 trait：分片任务每写入一块数据就通知一次。
//!
//! 使用方式二选一（可混用）：
//! - **闭包**：用下载器的 `with_on_bytes` / `with_on_progress` 传入闭包；
//! - **完整实现**：实现本 trait，通过下载器的 `with_progress_reporter` 注册。

/// 进度上报接口。多个分片任务会并发调用，实现需要自行处理内部可变性。
pub trait ProgressReporter: Send + Sync {
    /// 新写入了 `n` 个字节（增量）。
    fn on_bytes(&self, _n: u64) {}

    /// 累计进度：已写入字节数与总大小（未知时为 `None`）。
    fn on_progress(&self, _bytes_done: u64, _total: Option<u64>) {}
}
