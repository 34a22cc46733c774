pub mod byte_range;
pub mod capability_probe;
pub mod chunk_planner;
pub mod download_controller;
pub mod download_error;
pub mod download_progress;
pub mod download_result;
pub mod download_status;
pub mod downloader;
pub mod downloader_config;
pub mod finalizer;
pub mod job_paths;
pub mod probe_result;
pub mod progress_reporters_container;
pub mod progress_tracker;
pub mod range_ledger;
pub mod remaining_ranges;
pub mod reporter_adapters;
pub mod resume_store;
pub mod status_machine;

// 重导出公共类型
pub use byte_range::ByteRange;
pub use chunk_planner::plan;
pub use download_controller::DownloadController;
pub use download_error::DownloadError;
pub use download_progress::DownloadProgress;
pub use download_result::DownloadResult;
pub use download_status::DownloadStatus;
pub use downloader::Downloader;
pub use downloader_config::DownloaderConfig;
pub use job_paths::JobPaths;
pub use probe_result::ProbeResult;
pub use remaining_ranges::RemainingRanges;
pub use resume_store::{ResumeLoad, ResumeStore};
