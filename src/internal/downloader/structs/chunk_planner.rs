use super::byte_range::ByteRange;
use super::remaining_ranges::RemainingRanges;

/// 把 `[0, size)` 切成若干 `chunk_size` 大小的区间，最后一段可能更短。
///
/// 结果升序、互不重叠、并集恰好覆盖整个文件；相同输入总得到相同结果。
/// `size == 0` 时返回空列表，`chunk_size == 0` 按 1 处理。
pub fn plan(size: u64, chunk_size: u64) -> RemainingRanges {
    let chunk_size = chunk_size.max(1);
    let count = usize::try_from(size.div_ceil(chunk_size)).unwrap_or(0);
    let mut ranges = Vec::with_capacity(count);
    let mut start = 0;
    while start < size {
        let end = start.saturating_add(chunk_size).min(size);
        ranges.push(ByteRange { start, end });
        start = end;
    }
    RemainingRanges::new(ranges)
}
