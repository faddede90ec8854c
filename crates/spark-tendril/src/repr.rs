//! `Tendril` 的三态表示：空、内联、堆视图。
//!
//! # 模块定位（Why）
//! - 所有公开操作都先查看当前存储模式，再分派到对应算法；把模式显式建模为枚举，
//!   由编译器保证“任意时刻恰好处于一种模式”。
//!
//! # 设计概要（How）
//! - `Empty`：规范空值，不持有任何分配；
//! - `Inline`：最多 [`MAX_INLINE_LEN`] 字节直接存放在值内部，长度恒大于 0；
//! - `Heap`：`Rc<BackingBlock>` + `offset` + `len`，引用计数即共享计数。
//!
//! # 风险提示（Trade-offs）
//! - 枚举判别值无法塞进 16 字节的负载中，64 位平台上值大小为 24 字节，
//!   内联阈值仍维持 15 字节。

use alloc::rc::Rc;
use core::fmt;

use crate::{MAX_INLINE_LEN, block::BackingBlock};

/// 存储模式，供诊断与测试观察表示状态。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageMode {
    /// 规范空值，无分配。
    Empty,
    /// 字节直接存放在值内部。
    Inline,
    /// 独占一个堆后备块，可就地修改。
    Owned,
    /// 与其它 `Tendril` 共享后备块，修改前必须先复制。
    Shared,
}

impl StorageMode {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageMode::Empty => "empty",
            StorageMode::Inline => "inline",
            StorageMode::Owned => "owned",
            StorageMode::Shared => "shared",
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 内联存储区。`len` 在 `Repr::Inline` 中恒为 `1..=MAX_INLINE_LEN`。
#[derive(Clone, Copy)]
pub(crate) struct InlineBuf {
    len: u8,
    bytes: [u8; MAX_INLINE_LEN],
}

impl InlineBuf {
    pub(crate) fn from_slice(src: &[u8]) -> Self {
        debug_assert!(src.len() <= MAX_INLINE_LEN);
        let mut bytes = [0; MAX_INLINE_LEN];
        bytes[..src.len()].copy_from_slice(src);
        Self {
            len: src.len() as u8,
            bytes,
        }
    }

    pub(crate) fn len(&self) -> u32 {
        u32::from(self.len)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes[..usize::from(self.len)]
    }

    /// 追加 `additional` 个零字节并返回新增区域；调用方保证不超过内联上限。
    pub(crate) fn extend_zeroed(&mut self, additional: usize) -> &mut [u8] {
        let start = usize::from(self.len);
        let end = start + additional;
        debug_assert!(end <= MAX_INLINE_LEN);
        self.bytes[start..end].fill(0);
        self.len = end as u8;
        &mut self.bytes[start..end]
    }

    /// 丢弃前 `n` 字节；内联区没有偏移字段，只能把剩余字节整体前移。
    pub(crate) fn drop_front(&mut self, n: usize) {
        let len = usize::from(self.len);
        debug_assert!(n <= len);
        self.bytes.copy_within(n..len, 0);
        self.len = (len - n) as u8;
    }

    pub(crate) fn drop_back(&mut self, n: usize) {
        debug_assert!(n <= usize::from(self.len));
        self.len -= n as u8;
    }
}

/// 指向后备块 `[offset, offset + len)` 的视图。
#[derive(Clone)]
pub(crate) struct HeapView {
    pub(crate) block: Rc<BackingBlock>,
    pub(crate) offset: u32,
    pub(crate) len: u32,
}

impl HeapView {
    pub(crate) fn new(block: BackingBlock, len: u32) -> Self {
        Self {
            block: Rc::new(block),
            offset: 0,
            len,
        }
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        self.block.slice(self.offset, self.len)
    }

    pub(crate) fn end(&self) -> u32 {
        self.offset + self.len
    }

    pub(crate) fn ref_count(&self) -> usize {
        Rc::strong_count(&self.block)
    }

    pub(crate) fn is_shared(&self) -> bool {
        self.ref_count() > 1
    }

    /// 后备块在当前偏移之后还能容纳多少字节。
    pub(crate) fn capacity(&self) -> u32 {
        self.block.capacity() - self.offset
    }

    /// 视图能否在不复制的前提下就地增长到 `new_len`：必须独占且容量足够。
    pub(crate) fn can_grow_in_place(&self, new_len: u32) -> bool {
        !self.is_shared() && new_len <= self.capacity()
    }

    /// 就地追加 `additional` 个零字节，返回新增区域；块被共享时返回 `None`。
    pub(crate) fn grow_in_place(&mut self, additional: u32) -> Option<&mut [u8]> {
        let end = self.end();
        let block = Rc::get_mut(&mut self.block)?;
        self.len += additional;
        Some(block.extend_zeroed_at(end, additional))
    }

    /// 独占时返回视图的可变切片。
    pub(crate) fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        let (offset, len) = (self.offset, self.len);
        Rc::get_mut(&mut self.block).map(|block| block.slice_mut(offset, len))
    }
}

/// `Tendril` 的底层表示。
#[derive(Clone)]
pub(crate) enum Repr {
    Empty,
    Inline(InlineBuf),
    Heap(HeapView),
}

impl Repr {
    /// 以内联方式复制 `src`；空切片得到规范空值。
    pub(crate) fn inline(src: &[u8]) -> Self {
        if src.is_empty() {
            Repr::Empty
        } else {
            Repr::Inline(InlineBuf::from_slice(src))
        }
    }

    pub(crate) fn len(&self) -> u32 {
        match self {
            Repr::Empty => 0,
            Repr::Inline(buf) => buf.len(),
            Repr::Heap(view) => view.len,
        }
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Repr::Empty => &[],
            Repr::Inline(buf) => buf.as_slice(),
            Repr::Heap(view) => view.as_slice(),
        }
    }

    pub(crate) fn mode(&self) -> StorageMode {
        match self {
            Repr::Empty => StorageMode::Empty,
            Repr::Inline(_) => StorageMode::Inline,
            Repr::Heap(view) if view.is_shared() => StorageMode::Shared,
            Repr::Heap(_) => StorageMode::Owned,
        }
    }
}
