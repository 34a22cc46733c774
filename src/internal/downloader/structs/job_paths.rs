use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// 一次下载涉及的本地文件路径。
///
/// 目标路径为 `P` 时，下载中的数据写入 `P.partial`，续传状态写入 `P.resume`，
/// 续传状态的临时文件为 `P.resume.tmp`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    pub destination: PathBuf,
    pub partial: PathBuf,
    pub resume: PathBuf,
}

impl JobPaths {
    pub fn for_destination(destination: impl Into<PathBuf>) -> Self {
        let destination = destination.into();
        Self {
            partial: with_suffix(&destination, ".partial"),
            resume: with_suffix(&destination, ".resume"),
            destination,
        }
    }

    /// 续传状态原子写入时使用的临时文件。
    pub fn resume_tmp(&self) -> PathBuf {
        with_suffix(&self.resume, ".tmp")
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
