//! 下载器领域模块：探测、分片规划、续传状态、并发分片下载与状态机。
//!
//! 使用方式：`Downloader::new(url, path).connections(4).build()?.start().await`
//! 对外导出以 [`crate::downloader`] 为准，此处仅做模块划分，不重复 pub use。

pub mod structs;
pub mod traits;
