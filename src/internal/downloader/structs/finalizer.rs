//! 完成落地：分片文件改名为目标文件，再清理续传状态。

use tokio::fs;
use tracing::info;

use super::download_error::DownloadError;
use super::job_paths::JobPaths;
use super::resume_store::{ResumeStore, remove_if_exists};

/// 把 `P.partial` 改名为 `P`，然后删除 `P.resume` 与残留的 `P.resume.tmp`。
///
/// 目标文件已存在时拒绝覆盖；失败时数据仍完整保留在分片文件中。
/// 单连接下载没有 [`ResumeStore`]，`store` 传 `None`，按路径清理。
pub async fn finalize(paths: &JobPaths, store: Option<&ResumeStore>) -> Result<(), DownloadError> {
    let exists = fs::try_exists(&paths.destination)
        .await
        .map_err(|e| DownloadError::FinalizationFailed(e.to_string()))?;
    if exists {
        return Err(DownloadError::FinalizationFailed(format!(
            "目标文件已存在: {}",
            paths.destination.display()
        )));
    }

    fs::rename(&paths.partial, &paths.destination)
        .await
        .map_err(|e| DownloadError::FinalizationFailed(format!("重命名分片文件失败: {e}")))?;

    let cleanup = match store {
        Some(store) => store.delete().await,
        None => {
            let resume = paths.resume.clone();
            let tmp = paths.resume_tmp();
            tokio::task::spawn_blocking(move || {
                remove_if_exists(&tmp)?;
                remove_if_exists(&resume)
            })
            .await
            .map_err(std::io::Error::other)
            .and_then(|r| r)
        }
    };
    cleanup.map_err(|e| DownloadError::FinalizationFailed(format!("清理续传状态失败: {e}")))?;

    info!(path = %paths.destination.display(), "下载完成");
    Ok(())
}
