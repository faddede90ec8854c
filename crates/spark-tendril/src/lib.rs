#![cfg_attr(not(feature = "std"), no_std)]

//! `spark-tendril` 提供面向零拷贝解析的紧凑缓冲 `Tendril`。
//!
//! # 模块定位（Why）
//! - 解析器与协议栈需要大量“从输入中截取一段再传给下游”的操作；
//!   如果每段都复制成独立的 `Vec<u8>`/`String`，内存带宽会被复制本身吃掉；
//! - `Tendril` 以一个值同时覆盖三种场景：短小数据内联存放不分配、
//!   大块数据以引用计数共享后备块、需要修改时才写时复制。
//!
//! # 设计概要（How）
//! - `repr` 模块以枚举显式建模 `Empty`/`Inline`/`Heap` 三态，所有操作按模式分派；
//! - `block` 模块负责后备块的分配与倍增扩容，分配失败以错误返回；
//! - `format` 模块以类型参数区分二进制、ASCII、UTF-8 与 WTF-8 内容，
//!   `binary`/`ascii`/`utf8`/`wtf8` 模块提供各自的专有 API；
//! - `stream` 模块提供逐块推送的 [`TendrilSink`] 与跨块补齐字符的 [`Utf8Validator`]；
//! - `io`（`std` 特性）与 `serde_impl`（`serde` 特性）提供外部生产者/消费者接口。
//!
//! # 契约说明（What）
//! - 长度以 `u32` 表示，上限 [`MAX_LEN`]；内联上限 [`MAX_INLINE_LEN`] 字节；
//! - 引用计数为非原子计数，`Tendril` 不可跨线程传递；
//! - 可失败操作统一返回 [`TendrilError`]，失败时目标值保持不变。
//!
//! ```
//! use spark_tendril::{ByteTendril, StorageMode};
//!
//! let mut greeting = ByteTendril::from_slice(b"Hello, ")?;
//! greeting.push_slice(b"2015!\n")?;
//! assert_eq!(greeting.mode(), StorageMode::Inline);
//!
//! let shared = ByteTendril::from_slice(b"0123456789abcdefghij")?;
//! let alias = shared.clone();
//! assert!(alias.is_shared_with(&shared));
//! # Ok::<(), spark_tendril::TendrilError>(())
//! ```

extern crate alloc;

mod ascii;
mod binary;
mod block;
mod error;
pub mod format;
#[cfg(feature = "std")]
mod io;
mod repr;
#[cfg(feature = "serde")]
mod serde_impl;
mod stream;
mod tendril;
mod utf8;
mod wtf8;

pub use error::TendrilError;
pub use format::{Ascii, Binary, Format, SubsetOf, Utf8, Wtf8};
#[cfg(feature = "std")]
pub use io::ReadExt;
pub use repr::StorageMode;
pub use stream::{TendrilSink, Utf8DecodeError, Utf8Validator};
pub use tendril::{ByteTendril, SliceExt, StrTendril, Tendril};

/// 内联存储的最大字节数，超过即迁移到堆后备块。
pub const MAX_INLINE_LEN: usize = 15;

/// 单个 `Tendril` 的最大长度。
pub const MAX_LEN: u32 = u32::MAX;

/// 以 `format!` 语法构造 [`StrTendril`]，返回 `Result<StrTendril, TendrilError>`。
///
/// ```
/// let line = spark_tendril::format_tendril!("{}-{}", "spark", 2026)?;
/// assert_eq!(&*line, "spark-2026");
/// # Ok::<(), spark_tendril::TendrilError>(())
/// ```
#[macro_export]
macro_rules! format_tendril {
    ($($arg:tt)*) => {
        $crate::StrTendril::format(::core::format_args!($($arg)*))
    };
}
