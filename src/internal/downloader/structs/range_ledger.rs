//! 区间账本：剩余区间的唯一修改入口。
//!
//! 每次修改在互斥锁内完成并写入续传状态，一次只处理一个更新，
//! 磁盘上的状态与内存中的列表顺序一致。

use tokio::sync::Mutex;

use super::download_error::DownloadError;
use super::remaining_ranges::RemainingRanges;
use super::resume_store::ResumeStore;

#[derive(Debug)]
pub struct RangeLedger {
    ranges: Mutex<RemainingRanges>,
    store: ResumeStore,
}

impl RangeLedger {
    pub fn new(ranges: RemainingRanges, store: ResumeStore) -> Self {
        Self {
            ranges: Mutex::new(ranges),
            store,
        }
    }

    /// 起点为 `start` 的区间已写入到 `done_until`（不含），更新列表并持久化。
    ///
    /// 没有新进度时不写盘。
    pub async fn mark_done(&self, start: u64, done_until: u64) -> Result<(), DownloadError> {
        let mut ranges = self.ranges.lock().await;
        if !ranges.mark_done(start, done_until) {
            return Ok(());
        }
        self.store.save(&ranges).await
    }

    /// 把当前列表整体写入续传状态（新规划时调用）。
    pub async fn persist(&self) -> Result<(), DownloadError> {
        let ranges = self.ranges.lock().await;
        self.store.save(&ranges).await
    }

    pub async fn snapshot(&self) -> RemainingRanges {
        self.ranges.lock().await.clone()
    }

    pub fn store(&self) -> &ResumeStore {
        &self.store
    }
}
