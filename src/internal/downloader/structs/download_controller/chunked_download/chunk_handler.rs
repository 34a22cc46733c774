//! 分片下载：处理单块数据——截断到区间内、写文件、推进游标、更新进度。

use std::io::SeekFrom;
use std::path::Path;

use bytes::Bytes;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use crate::internal::downloader::structs::download_error::DownloadError;
use crate::internal::downloader::structs::progress_tracker::ProgressTracker;

/// 处理单块数据时的参数（形参超过 3 个，用 struct 承载）。
pub struct HandleOneChunkParams<'a> {
    pub chunk: Bytes,
    /// 下一个要写入的文件偏移
    pub cursor: &'a mut u64,
    /// 区间上界（不含）
    pub end: u64,
    /// 已定位到 `cursor` 的写句柄
    pub file: &'a mut File,
    pub progress: &'a ProgressTracker,
}

/// 将一块数据写入文件并更新整体进度；超出区间的部分丢弃。
pub async fn handle_one_chunk(params: HandleOneChunkParams<'_>) -> Result<(), DownloadError> {
    let remaining = params.end.saturating_sub(*params.cursor);
    let take = (params.chunk.len() as u64).min(remaining);
    if take == 0 {
        return Ok(());
    }

    // take <= chunk.len()，转换不会截断
    params
        .file
        .write_all(&params.chunk[..take as usize])
        .await
        .map_err(DownloadError::WriteFile)?;
    *params.cursor += take;
    params.progress.advance(take);
    Ok(())
}

/// 为分片任务打开独立的写句柄并定位到 `offset`，各任务互不共享文件游标。
pub async fn open_at(path: &Path, offset: u64) -> Result<File, DownloadError> {
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .await
        .map_err(DownloadError::CreateFile)?;
    file.seek(SeekFrom::Start(offset))
        .await
        .map_err(DownloadError::WriteFile)?;
    Ok(file)
}
