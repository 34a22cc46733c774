/// 单次 `start` 调用的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadResult {
    /// 文件已完整落地到目标路径
    Finished,
    /// 已暂停，剩余区间已写入续传状态，可再次 `start`
    Paused,
    /// 已取消，分片文件与续传状态保留在磁盘上
    Canceled,
}
