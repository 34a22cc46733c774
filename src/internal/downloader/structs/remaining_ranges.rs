//! 尚未落盘的字节区间列表。

use serde::{Deserialize, Serialize};

use super::byte_range::ByteRange;

/// 尚未持久写入的字节区间，按起点升序排列。
///
/// 初始为完整规划；分片完成时移除对应区间，分片中途中断时把区间起点推进到已写入的位置。
/// 下载过程中只通过 [`super::range_ledger::RangeLedger::mark_done`] 修改。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemainingRanges {
    ranges: Vec<ByteRange>,
}

impl RemainingRanges {
    pub fn new(ranges: Vec<ByteRange>) -> Self {
        Self { ranges }
    }

    pub fn as_slice(&self) -> &[ByteRange] {
        &self.ranges
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ByteRange> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// 剩余字节总数。
    pub fn total_remaining(&self) -> u64 {
        self.ranges.iter().map(ByteRange::len).sum()
    }

    /// 记录起点为 `start` 的区间已写入到 `done_until`（不含）。
    ///
    /// 按起点线性查找：`done_until >= end` 时移除该区间，否则把起点推进到 `done_until`。
    /// 找不到区间或没有新进度时返回 `false`，列表保持不变。
    pub fn mark_done(&mut self, start: u64, done_until: u64) -> bool {
        let Some(idx) = self.ranges.iter().position(|r| r.start == start) else {
            return false;
        };
        let range = self.ranges[idx];
        if done_until <= range.start {
            return false;
        }
        if done_until >= range.end {
            self.ranges.remove(idx);
        } else {
            self.ranges[idx].start = done_until;
        }
        true
    }

    /// 校验区间列表对大小为 `total` 的文件是否合法：每段非空、升序、互不重叠、不越界。
    pub fn is_valid_for(&self, total: u64) -> bool {
        let mut prev_end = 0;
        for range in &self.ranges {
            if range.start >= range.end || range.start < prev_end || range.end > total {
                return false;
            }
            prev_end = range.end;
        }
        true
    }
}

impl From<Vec<ByteRange>> for RemainingRanges {
    fn from(ranges: Vec<ByteRange>) -> Self {
        Self::new(ranges)
    }
}

impl<'a> IntoIterator for &'a RemainingRanges {
    type Item = &'a ByteRange;
    type IntoIter = std::slice::Iter<'a, ByteRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}
