//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为 `Tendril` 的全部可失败操作提供统一错误域，调用方只需处理一个枚举；
//! - 每个变体都带有稳定错误码（`tendril.*`），便于上层日志与告警聚合。
//!
//! ## 设计要求（What）
//! - 所有错误均为同步、可恢复错误：库内部从不 panic、不截断、不重试；
//! - 返回错误时目标缓冲保持调用前的状态，绝不会留下非法表示。

use alloc::collections::TryReserveError;

use thiserror::Error;

use crate::MAX_LEN;

/// `Tendril` 操作的错误类型。
///
/// # 教案式说明
/// - **意图 (Why)**：把越界、下溢、长度溢出、分配失败、格式校验与格式化失败集中表达，
///   避免在调用端散落 `Option`/`bool` 形式的失败信号。
/// - **契约 (What)**：
///   - 返回任一变体时，被操作的 `Tendril` 保持原值（强异常安全）；
///   - `code()` 返回的字符串在版本间保持稳定，可直接作为指标维度。
/// - **设计权衡 (Trade-offs)**：长度字段统一使用 `u32`，与缓冲自身的 32 位长度上限一致；
///   `CapacityOverflow::additional` 使用 `usize`，因为输入切片可能本身就超过 4 GiB。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TendrilError {
    /// 子切片请求越过了源缓冲的当前长度。
    #[error("sub-slice [{offset}, {offset}+{length}) is out of range for length {len}")]
    OutOfRange { offset: u32, length: u32, len: u32 },

    /// 弹出字节数超过了当前长度。
    #[error("cannot pop {requested} bytes from a tendril of length {len}")]
    Underflow { requested: u32, len: u32 },

    /// 结果长度超出 32 位长度字段的表示范围。
    #[error("length {len} + {additional} exceeds the 32-bit length limit")]
    CapacityOverflow { len: u32, additional: usize },

    /// 底层分配器无法满足扩容请求。
    #[error("failed to allocate a backing block of {capacity} bytes: {source}")]
    AllocationFailure {
        capacity: u32,
        #[source]
        source: TryReserveError,
    },

    /// 结果字节不符合 `Tendril` 的格式约束（例如切在 UTF-8 字符中间）。
    #[error("resulting bytes are not valid for the {format} format")]
    ValidationFailed { format: &'static str },

    /// 格式化过程中某个 `Display` 实现自身报告了错误。
    #[error("a formatting trait implementation returned an error")]
    FormatFailed,
}

impl TendrilError {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            TendrilError::OutOfRange { .. } => "tendril.out_of_range",
            TendrilError::Underflow { .. } => "tendril.underflow",
            TendrilError::CapacityOverflow { .. } => "tendril.capacity_overflow",
            TendrilError::AllocationFailure { .. } => "tendril.allocation_failure",
            TendrilError::ValidationFailed { .. } => "tendril.validation_failed",
            TendrilError::FormatFailed => "tendril.format_failed",
        }
    }
}

/// 计算 `len + additional`，超过 [`MAX_LEN`] 时返回 [`TendrilError::CapacityOverflow`]。
///
/// 在 `u64` 中求和，`usize` 输入无论多大都不会在比较之前回绕。
pub(crate) fn checked_len(len: u32, additional: usize) -> Result<u32, TendrilError> {
    u64::try_from(additional)
        .ok()
        .and_then(|extra| u64::from(len).checked_add(extra))
        .filter(|&total| total <= u64::from(MAX_LEN))
        .map(|total| total as u32)
        .ok_or(TendrilError::CapacityOverflow { len, additional })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_len_rejects_overflow() {
        assert_eq!(checked_len(10, 5), Ok(15));
        assert_eq!(
            checked_len(u32::MAX, 1),
            Err(TendrilError::CapacityOverflow {
                len: u32::MAX,
                additional: 1
            })
        );
        let err = checked_len(0, usize::MAX).expect_err("超过 u32 的输入必须报错");
        assert_eq!(err.code(), "tendril.capacity_overflow");
    }

    #[test]
    fn checked_len_accepts_exactly_max_len() {
        assert_eq!(checked_len(MAX_LEN - 1, 1), Ok(MAX_LEN));
        assert_eq!(checked_len(0, MAX_LEN as usize), Ok(MAX_LEN));
        assert!(checked_len(1, MAX_LEN as usize).is_err());
    }
}
