//! 字节区间与剩余区间列表测试
//!
//! 测试项：
//! - 半开区间构造与 Range 请求头换算
//! - mark_done 的移除 / 推进 / 忽略
//! - 续传状态校验规则

use crate::downloader::{ByteRange, RemainingRanges};

fn r(start: u64, end: u64) -> ByteRange {
    ByteRange { start, end }
}

// ═══════════════════════════ ByteRange ═══════════════════════════

#[test]
fn new_rejects_empty_and_reversed() {
    assert_eq!(ByteRange::new(0, 10), Some(r(0, 10)));
    assert_eq!(ByteRange::new(5, 5), None);
    assert_eq!(ByteRange::new(6, 5), None);
}

#[test]
fn header_value_is_inclusive() {
    // 半开 [0, 1024) 对应请求头 0-1023
    assert_eq!(r(0, 1024).header_value(), "bytes=0-1023");
    assert_eq!(r(1024, 1025).header_value(), "bytes=1024-1024");
    assert_eq!(r(0, 1024).len(), 1024);
}

#[test]
fn starting_at_trims_prefix() {
    let range = r(100, 200);
    assert_eq!(range.starting_at(150), Some(r(150, 200)));
    assert_eq!(range.starting_at(50), Some(r(100, 200)));
    assert_eq!(range.starting_at(200), None);
}

// ═══════════════════════════ mark_done ═══════════════════════════

#[test]
fn mark_done_removes_completed_range() {
    let mut ranges = RemainingRanges::new(vec![r(0, 10), r(10, 20), r(20, 25)]);
    assert!(ranges.mark_done(10, 20));
    assert_eq!(ranges.as_slice(), &[r(0, 10), r(20, 25)]);
    assert_eq!(ranges.total_remaining(), 15);
}

#[test]
fn mark_done_shrinks_partially_written_range() {
    let mut ranges = RemainingRanges::new(vec![r(0, 10), r(10, 20)]);
    assert!(ranges.mark_done(10, 14));
    assert_eq!(ranges.as_slice(), &[r(0, 10), r(14, 20)]);

    // 后续记账使用推进后的起点
    assert!(ranges.mark_done(14, 20));
    assert_eq!(ranges.as_slice(), &[r(0, 10)]);
}

#[test]
fn mark_done_ignores_unknown_start_and_no_progress() {
    let mut ranges = RemainingRanges::new(vec![r(0, 10)]);
    assert!(!ranges.mark_done(5, 8));
    assert!(!ranges.mark_done(0, 0));
    assert_eq!(ranges.as_slice(), &[r(0, 10)]);
}

// ═══════════════════════════ 校验 ═══════════════════════════

#[test]
fn validity_rules() {
    assert!(RemainingRanges::default().is_valid_for(0));
    assert!(RemainingRanges::new(vec![r(0, 10), r(15, 20)]).is_valid_for(20));

    // 越界
    assert!(!RemainingRanges::new(vec![r(0, 21)]).is_valid_for(20));
    // 重叠
    assert!(!RemainingRanges::new(vec![r(0, 10), r(9, 20)]).is_valid_for(20));
    // 乱序
    assert!(!RemainingRanges::new(vec![r(10, 20), r(0, 10)]).is_valid_for(20));
    // 空区间
    assert!(!RemainingRanges::new(vec![r(5, 5)]).is_valid_for(20));
}
