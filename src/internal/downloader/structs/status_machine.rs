//! 下载状态机：状态保存在响应式属性中，所有修改都经过迁移表校验。
//!
//! 校验与修改在同一次 `update_if` 中完成，并发的 pause / cancel / 分片失败
//! 不会同时通过校验。

use crate::internal::states::unlock_reactive::{PropertyWatcher, UnlockReactiveProperty};

use super::download_error::DownloadError;
use super::download_status::DownloadStatus;

/// Clone 得到的是同一个状态机的共享句柄，分片任务各持一份用于检查是否继续。
#[derive(Debug, Clone)]
pub struct StatusMachine {
    state: UnlockReactiveProperty<DownloadStatus>,
}

impl Default for StatusMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusMachine {
    pub fn new() -> Self {
        Self {
            state: UnlockReactiveProperty::new(DownloadStatus::Init),
        }
    }

    pub fn current(&self) -> DownloadStatus {
        self.state.get_current()
    }

    pub fn is_running(&self) -> bool {
        self.state.map(|s| *s == DownloadStatus::Running)
    }

    /// 迁移到 `to`，成功时返回迁移前的状态。
    pub fn transition(&self, to: DownloadStatus) -> Result<DownloadStatus, DownloadError> {
        let mut from = to;
        let changed = self.state.update_if(|current| {
            from = *current;
            if current.can_transition_to(to) {
                *current = to;
                true
            } else {
                false
            }
        });
        if changed {
            Ok(from)
        } else {
            Err(DownloadError::InvalidTransition { from, to })
        }
    }

    /// 暂停请求：`Running → Paused`；已处于 `Paused` 或 `Ready` 时视为成功且不改变状态，
    /// 其余状态返回 [`DownloadError::NotPausable`]。
    ///
    /// 调用方负责先确认任务可续传。
    pub fn request_pause(&self) -> Result<(), DownloadError> {
        let mut outcome = Err(DownloadError::NotPausable);
        self.state.update_if(|current| match current {
            DownloadStatus::Running => {
                *current = DownloadStatus::Paused;
                outcome = Ok(());
                true
            }
            DownloadStatus::Paused | DownloadStatus::Ready => {
                outcome = Ok(());
                false
            }
            _ => false,
        });
        outcome
    }

    /// 监听状态变化。
    pub fn watch(&self) -> PropertyWatcher<DownloadStatus> {
        self.state.watch()
    }

    /// 等到状态离开 `Running` 时返回；分片任务与读取响应体并行等待它。
    pub async fn stopped(&self) {
        let mut watcher = self.state.watch();
        while self.is_running() {
            if watcher.changed().await.is_err() {
                return;
            }
        }
    }
}
