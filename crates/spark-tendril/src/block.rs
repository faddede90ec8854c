//! 堆后备块（Backing Block）与扩容策略。
//!
//! # 模块定位（Why）
//! - 堆模式下的 `Tendril` 只是指向后备块某段区间的视图，多个视图可以共享同一块；
//! - 后备块本身只负责“持有字节 + 报告容量”，引用计数交给外层 `Rc` 管理。
//!
//! # 设计概要（How）
//! - 以 `Vec<u8>` 承载字节：`len()` 为已初始化的高水位，`capacity()` 即块容量；
//! - 所有分配都经由 `Vec::try_reserve_exact`，分配失败以 [`TendrilError::AllocationFailure`]
//!   报告给调用方，而不是直接终止进程；
//! - 扩容遵循倍增策略：新容量 `>= max(needed, 2 * old_capacity, MIN_CAPACITY)`。

use alloc::vec::Vec;

use crate::error::TendrilError;

/// 新建后备块的最小容量，超过内联上限即可，避免为 16 字节左右的数据反复扩容。
pub(crate) const MIN_CAPACITY: u32 = 16;

/// 堆模式下被一个或多个 `Tendril` 共享的字节块。
///
/// # 契约说明（What）
/// - 已初始化区域 `[0, bytes.len())` 内的字节在块被共享期间只读；
/// - 只有独占持有者（`Rc::get_mut` 成功）才能截断或追加。
#[derive(Debug)]
pub(crate) struct BackingBlock {
    bytes: Vec<u8>,
}

impl BackingBlock {
    /// 分配容量不少于 `capacity` 的空块。
    pub(crate) fn with_capacity(capacity: u32) -> Result<Self, TendrilError> {
        let mut bytes = Vec::new();
        if let Err(source) = bytes.try_reserve_exact(capacity as usize) {
            tracing::debug!(capacity, "backing block allocation failed");
            return Err(TendrilError::AllocationFailure { capacity, source });
        }
        Ok(Self { bytes })
    }

    /// 分配新块并把 `prefix` 复制到块首。
    pub(crate) fn copy_of(prefix: &[u8], capacity: u32) -> Result<Self, TendrilError> {
        debug_assert!(prefix.len() <= capacity as usize);
        let mut block = Self::with_capacity(capacity)?;
        block.bytes.extend_from_slice(prefix);
        Ok(block)
    }

    /// 直接接管已有的 `Vec<u8>`，不复制。
    pub(crate) fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// 块容量，超过 `u32` 的部分不可寻址，因此截断到 `u32::MAX`。
    pub(crate) fn capacity(&self) -> u32 {
        u32::try_from(self.bytes.capacity()).unwrap_or(u32::MAX)
    }

    pub(crate) fn slice(&self, offset: u32, len: u32) -> &[u8] {
        let start = offset as usize;
        &self.bytes[start..start + len as usize]
    }

    pub(crate) fn slice_mut(&mut self, offset: u32, len: u32) -> &mut [u8] {
        let start = offset as usize;
        &mut self.bytes[start..start + len as usize]
    }

    /// 把已初始化区域截到 `end`，再追加 `additional` 个零字节，返回新增区域。
    ///
    /// 调用方必须独占该块并保证 `end + additional <= capacity()`，此时不会发生重新分配。
    pub(crate) fn extend_zeroed_at(&mut self, end: u32, additional: u32) -> &mut [u8] {
        let start = end as usize;
        let new_end = start + additional as usize;
        debug_assert!(start <= self.bytes.len());
        debug_assert!(new_end <= self.bytes.capacity());
        self.bytes.truncate(start);
        self.bytes.resize(new_end, 0);
        &mut self.bytes[start..]
    }
}

/// 按倍增策略计算新块容量。
pub(crate) fn grown_capacity(needed: u32, old_capacity: u32) -> u32 {
    needed
        .max(old_capacity.saturating_mul(2))
        .max(MIN_CAPACITY)
}
