use std::fmt;

/// 下载状态（由下载器内部维护，外部只读监听）
///
/// 合法迁移见 [`DownloadStatus::can_transition_to`]，其余迁移一律拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadStatus {
    /// 已创建，尚未探测
    Init,
    /// 探测完成，等待开始
    Ready,
    Running,
    Paused,
    Canceled,
    Finished,
    Error,
}

impl DownloadStatus {
    /// 是否为终态（不会再离开的状态）。
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Canceled | Self::Finished | Self::Error)
    }

    /// 状态迁移表。
    ///
    /// `Paused → Finished` 对应暂停恰好与最后一个分片完成同时发生的情况。
    pub fn can_transition_to(self, next: Self) -> bool {
        use DownloadStatus::*;
        matches!(
            (self, next),
            (Init, Ready)
                | (Init, Error)
                | (Ready, Running)
                | (Paused, Running)
                | (Running, Paused)
                | (Init, Canceled)
                | (Ready, Canceled)
                | (Running, Canceled)
                | (Paused, Canceled)
                | (Running, Finished)
                | (Paused, Finished)
                | (Running, Error)
                | (Paused, Error)
        )
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "Init",
            Self::Ready => "Ready",
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::Canceled => "Canceled",
            Self::Finished => "Finished",
            Self::Error => "Error",
        };
        f.write_str(name)
    }
}
