//! `representation_contract` 集成测试：三态表示与模式迁移。
//!
//! # 测试总览（Why）
//! - 校验空值、内联、堆独占、堆共享四种状态之间的迁移是否符合约定；
//! - 覆盖越界、下溢、长度溢出等错误路径，确认失败时目标值保持不变。

use core::fmt::Write as _;

use spark_tendril::{ByteTendril, MAX_INLINE_LEN, StorageMode, StrTendril, TendrilError};

/// 新建值即规范空值，不持有后备块。
#[test]
fn new_value_is_canonical_empty() {
    let empty = ByteTendril::new();
    assert_eq!(empty.mode(), StorageMode::Empty);
    assert_eq!(empty.len32(), 0);
    assert!(empty.is_empty());
    assert_eq!(empty.block_ref_count(), None);
    assert_eq!(empty, ByteTendril::default());
}

/// 不超过 15 字节的内容直接内联，`as_ptr` 指向值内部。
#[test]
fn short_content_stays_inline() {
    let payload = b"fifteen bytes!!";
    assert_eq!(payload.len(), MAX_INLINE_LEN);
    let tendril = ByteTendril::from_slice(payload).expect("构造内联值");
    assert_eq!(tendril.mode(), StorageMode::Inline);
    assert_eq!(&*tendril, payload);
    assert_eq!(tendril.block_ref_count(), None);

    let start = &tendril as *const ByteTendril as usize;
    let end = start + core::mem::size_of::<ByteTendril>();
    let data = tendril.as_ptr() as usize;
    assert!((start..end).contains(&data), "内联数据必须位于值内部");
}

/// 超过 15 字节的内容进入独占堆块。
#[test]
fn long_content_moves_to_exclusive_heap_block() {
    let payload = b"sixteen bytes!!!";
    let tendril = ByteTendril::from_slice(payload).expect("构造堆值");
    assert_eq!(tendril.mode(), StorageMode::Owned);
    assert_eq!(tendril.block_ref_count(), Some(1));
    assert_eq!(&*tendril, payload);
    assert!(tendril.capacity() >= 16);
}

/// 内联值追加到超过阈值时迁移到堆模式，内容保持连续。
#[test]
fn inline_overflow_promotes_to_heap() {
    let mut tendril = ByteTendril::from_slice(b"0123456789").expect("构造内联值");
    tendril.push_slice(b"abcde").expect("仍在内联上限内");
    assert_eq!(tendril.mode(), StorageMode::Inline);
    tendril.push_slice(b"f").expect("越过内联上限");
    assert_eq!(tendril.mode(), StorageMode::Owned);
    assert_eq!(&*tendril, b"0123456789abcdef");
}

/// 独占堆块的连续追加摊还为就地写入：容量足够时数据地址不变。
#[test]
fn exclusive_appends_reuse_the_block() {
    let mut tendril = ByteTendril::with_capacity(64).expect("预分配");
    assert_eq!(tendril.mode(), StorageMode::Owned);
    tendril.push_slice(&[7; 20]).expect("首次追加");
    let data = tendril.as_ptr();
    for _ in 0..4 {
        tendril.push_slice(&[7; 10]).expect("就地追加");
    }
    assert_eq!(tendril.len32(), 60);
    assert_eq!(tendril.as_ptr(), data, "容量充足时不应重新分配");
}

/// “Hello, 2015!” 场景：内联切片与弹出互不影响。
#[test]
fn hello_2015_scenario() {
    let mut t = StrTendril::new();
    writeln!(t, "Hello, {}!", 2015).expect("格式化写入");
    assert_eq!(t.mode(), StorageMode::Inline);
    assert_eq!(t.len32(), 13);

    let mut s = t.subtendril(0, 9).expect("切片");
    assert_eq!(s.mode(), StorageMode::Inline);
    assert_eq!(&*s, "Hello, 20");

    s.pop_back(4).expect("弹出尾部");
    assert_eq!(s.len32(), 5);
    assert_eq!(&*s, "Hello");
    assert_eq!(t.len32(), 13);
    assert_eq!(&*t, "Hello, 2015!\n");
}

/// 内联模式的 `pop_front` 需要前移剩余字节。
#[test]
fn inline_pop_front_shifts_bytes() {
    let mut tendril = ByteTendril::from_slice(b"abcdef").expect("构造内联值");
    tendril.pop_front(2).expect("弹出头部");
    assert_eq!(&*tendril, b"cdef");
    tendril.pop_front(4).expect("弹空");
    assert_eq!(tendril.mode(), StorageMode::Empty);
}

/// 堆模式的弹出只调整视图，不复制也不释放后备块。
#[test]
fn heap_pops_only_adjust_the_view() {
    let mut tendril = ByteTendril::from_slice(b"0123456789abcdefghijklmnop").expect("构造堆值");
    let base = tendril.as_ptr();
    tendril.pop_front(4).expect("弹出头部");
    tendril.pop_back(2).expect("弹出尾部");
    assert_eq!(&*tendril, b"456789abcdefghijklmn");
    assert_eq!(tendril.as_ptr(), base.wrapping_add(4));
    assert_eq!(tendril.mode(), StorageMode::Owned);

    tendril.pop_back(20).expect("弹空");
    assert_eq!(tendril.len32(), 0);
    assert_eq!(tendril.mode(), StorageMode::Owned, "弹空后仍保留后备块");
}

/// 弹出超过长度返回 `Underflow`，值保持不变。
#[test]
fn pop_underflow_leaves_value_unchanged() {
    let mut tendril = ByteTendril::from_slice(b"abc").expect("构造内联值");
    let err = tendril.pop_front(4).expect_err("应下溢");
    assert_eq!(err, TendrilError::Underflow { requested: 4, len: 3 });
    assert_eq!(err.code(), "tendril.underflow");
    assert!(tendril.pop_back(5).is_err());
    assert_eq!(&*tendril, b"abc");
}

/// 越界切片返回 `OutOfRange`，源值不变。
#[test]
fn out_of_range_sub_leaves_source_unchanged() {
    let source = ByteTendril::from_slice(b"0123456789abcdefghij").expect("构造堆值");
    let err = source.subtendril(15, 6).expect_err("应越界");
    assert_eq!(
        err,
        TendrilError::OutOfRange {
            offset: 15,
            length: 6,
            len: 20
        }
    );
    assert!(source.subtendril(u32::MAX, 2).is_err(), "偏移加长度溢出也必须报告越界");
    assert_eq!(source.block_ref_count(), Some(1));
    assert_eq!(&*source, b"0123456789abcdefghij");
    assert_eq!(source.subtendril(20, 0).expect("末尾空切片").mode(), StorageMode::Empty);
}

/// 小切片总是复制为内联值，不拖住后备块。
#[test]
fn small_sub_never_retains_the_block() {
    let source = ByteTendril::from_slice(b"0123456789abcdefghij").expect("构造堆值");
    let small = source.subtendril(5, 15).expect("切片");
    assert_eq!(small.mode(), StorageMode::Inline);
    assert_eq!(source.block_ref_count(), Some(1));
    assert_eq!(&*small, b"56789abcdefghij");
}

/// `clear` 保留独占后备块；`destroy` 释放并可重复调用。
#[test]
fn clear_keeps_block_and_destroy_is_idempotent() {
    let mut tendril = ByteTendril::from_slice(b"0123456789abcdefghij").expect("构造堆值");
    let capacity = tendril.capacity();
    tendril.clear();
    assert_eq!(tendril.len32(), 0);
    assert_eq!(tendril.mode(), StorageMode::Owned);
    assert_eq!(tendril.capacity(), capacity);

    tendril.destroy();
    assert_eq!(tendril.mode(), StorageMode::Empty);
    tendril.destroy();
    assert_eq!(tendril.mode(), StorageMode::Empty);
    assert_eq!(tendril.len32(), 0);

    let mut inline = ByteTendril::from_slice(b"abc").expect("构造内联值");
    inline.clear();
    assert_eq!(inline.mode(), StorageMode::Empty);
}

/// 追加零字节不改变模式。
#[test]
fn empty_push_is_not_a_transition() {
    let mut tendril = ByteTendril::new();
    tendril.push_slice(b"").expect("追加空切片");
    assert_eq!(tendril.mode(), StorageMode::Empty);
    assert!(tendril.push_uninit(0).expect("零长度预留").is_empty());
    assert_eq!(tendril.mode(), StorageMode::Empty);
}

/// `push_uninit` 返回零填充的新区域，`pop_back` 回退多占的部分。
#[test]
fn push_uninit_then_commit_shrink() {
    let mut tendril = ByteTendril::from_slice(b"head:").expect("构造内联值");
    let before = tendril.len32();
    let region = tendril.push_uninit(32).expect("预留尾部");
    assert_eq!(region.len(), 32);
    assert!(region.iter().all(|&byte| byte == 0));
    region[..4].copy_from_slice(b"body");
    tendril.pop_back(28).expect("回退未写入部分");
    assert_eq!(before, 5);
    assert_eq!(&*tendril, b"head:body");
}

/// 长度溢出在触碰任何状态前报告。
#[test]
fn capacity_overflow_is_reported_without_mutation() {
    let mut tendril = ByteTendril::from_slice(b"abc").expect("构造内联值");
    let err = tendril
        .push_uninit(u32::MAX as usize)
        .expect_err("超过 32 位长度上限");
    assert_eq!(err.code(), "tendril.capacity_overflow");
    assert_eq!(&*tendril, b"abc");
}

/// `describe` 渲染模式、长度与内容，且不修改源值。
#[test]
fn describe_renders_mode_length_and_sharing() {
    let source = ByteTendril::from_slice(b"0123456789abcdefghij").expect("构造堆值");
    let owned = source.describe().expect("生成描述");
    assert!(owned.starts_with("Tendril<Binary>(owned, 20 bytes: "));

    let alias = source.clone();
    let shared = alias.describe().expect("生成描述");
    assert!(shared.starts_with("Tendril<Binary>(shared, 20 bytes: "));

    let text = StrTendril::from_slice("hi").expect("构造文本");
    assert_eq!(&*text.describe().expect("生成描述"), r#"Tendril<Utf8>(inline, 2 bytes: "hi")"#);
    assert_eq!(source.block_ref_count(), Some(2));
}
