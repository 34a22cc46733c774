use std::fmt;

use serde::{Deserialize, Serialize};

/// 目标文件中的一段字节区间，半开区间 `[start, end)`。
///
/// 分片规划、续传状态、进度统计都使用这一约定；只有发往服务器的
/// `Range` 请求头是闭区间，由 [`ByteRange::header_value`] 负责换算。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// 创建区间，`start >= end`（空区间或反向区间）时返回 `None`。
    pub fn new(start: u64, end: u64) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// 区间内的字节数。
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// 生成 Range 请求头：`bytes=start-(end-1)`，end 为不含上界。
    pub fn header_value(&self) -> String {
        let end_inclusive = self.end.saturating_sub(1);
        format!("bytes={}-{}", self.start, end_inclusive)
    }

    /// 把起点推进到 `start` 后剩余的部分；推进到末尾时返回 `None`。
    pub fn starting_at(&self, start: u64) -> Option<Self> {
        Self::new(start.max(self.start), self.end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
