//! 下载相关错误类型。

use thiserror::Error;

use crate::internal::transport::structs::transport_error::TransportError;

use super::byte_range::ByteRange;
use super::download_status::DownloadStatus;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// HEAD 探测失败（传输错误或非成功状态码）。
    #[error("探测远程资源失败: {0}")]
    ProbeFailed(String),

    #[error("分片 {range} 下载失败: {message}")]
    ChunkFailed { range: ByteRange, message: String },

    /// 续传状态文件无法使用；下载器记录警告后重新规划，不会向调用方返回。
    #[error("续传状态文件无效: {0}")]
    ResumeStateCorrupt(String),

    #[error("写入续传状态失败: {0}")]
    ResumeStateWrite(std::io::Error),

    #[error("完成文件落地失败: {0}")]
    FinalizationFailed(String),

    #[error("当前下载不支持暂停")]
    NotPausable,

    #[error("非法状态迁移: {from} -> {to}")]
    InvalidTransition {
        from: DownloadStatus,
        to: DownloadStatus,
    },

    #[error("下载配置无效: {0}")]
    InvalidConfig(String),

    #[error("创建文件失败: {0}")]
    CreateFile(std::io::Error),

    #[error("写入文件失败: {0}")]
    WriteFile(std::io::Error),

    #[error("下载大小不符: 预期 {expected} 字节，实际 {actual} 字节")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("无法从 URL 推断文件名: {0}")]
    NoFileName(String),

    /// 分片任务 join 失败。
    #[error("分片任务失败: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("下载内部错误: {0}")]
    Internal(String),

    #[error("{0}")]
    Transport(#[from] TransportError),
}
