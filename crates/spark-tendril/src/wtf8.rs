//! WTF-8 扫描与 `Tendril<Wtf8>` 专有 API。
//!
//! # 模块定位（Why）
//! - 来自 UTF-16 的文本可能含有孤立代理，UTF-8 无法表达；WTF-8 以三字节序列
//!   `ED A0..BF 80..BF` 保留这些码元，同时与 UTF-8 完全兼容。
//!
//! # 设计概要（How）
//! - 校验复用 `core::str::from_utf8` 扫描合法段，只在它停下的位置判断是否为代理序列；
//! - 唯一额外约束：前导代理后面不能紧跟尾随代理，这样的组合必须写成四字节字符。

use core::ops::Deref;

use crate::{
    error::TendrilError,
    format::{Format, Wtf8},
    tendril::{Tendril, validation_failed},
};

const LEAD_SURROGATES: core::ops::RangeInclusive<u32> = 0xD800..=0xDBFF;
const TRAIL_SURROGATES: core::ops::RangeInclusive<u32> = 0xDC00..=0xDFFF;

/// 整段字节是否为合法 WTF-8。
pub(crate) fn validate(mut bytes: &[u8]) -> bool {
    let mut after_lead = false;
    loop {
        let error = match core::str::from_utf8(bytes) {
            Ok(_) => return true,
            Err(error) => error,
        };
        let at = error.valid_up_to();
        if at > 0 {
            after_lead = false;
        }
        let Some(unit) = surrogate_at(&bytes[at..]) else {
            return false;
        };
        if after_lead && TRAIL_SURROGATES.contains(&unit) {
            return false;
        }
        after_lead = LEAD_SURROGATES.contains(&unit);
        bytes = &bytes[at + 3..];
    }
}

/// `bytes` 是否以一个代理码元的三字节编码开头；是则返回码元值。
fn surrogate_at(bytes: &[u8]) -> Option<u32> {
    match *bytes {
        [0xED, second @ 0xA0..=0xBF, third @ 0x80..=0xBF, ..] => {
            Some(0xD000 | (u32::from(second & 0x3F) << 6) | u32::from(third & 0x3F))
        }
        _ => None,
    }
}

/// `lhs` 以前导代理结尾且 `rhs` 以尾随代理开头时，返回两者合并后的四字节编码。
pub(crate) fn join_surrogates(lhs: &[u8], rhs: &[u8]) -> Option<[u8; 4]> {
    let lead = surrogate_at(lhs.get(lhs.len().checked_sub(3)?..)?)?;
    let trail = surrogate_at(rhs)?;
    if !LEAD_SURROGATES.contains(&lead) || !TRAIL_SURROGATES.contains(&trail) {
        return None;
    }
    let ch = char::from_u32(0x10000 + ((lead - 0xD800) << 10) + (trail - 0xDC00))?;
    let mut joined = [0; 4];
    ch.encode_utf8(&mut joined);
    Some(joined)
}

/// 逐个解码合法 WTF-8 中的码点（代理码元按其数值返回）。
pub(crate) fn code_points(bytes: &[u8]) -> impl Iterator<Item = u32> + '_ {
    let mut rest = bytes;
    core::iter::from_fn(move || {
        let (&first, tail) = rest.split_first()?;
        let (width, initial) = match first {
            0x00..=0x7F => (1, u32::from(first)),
            0x80..=0xDF => (2, u32::from(first & 0x1F)),
            0xE0..=0xEF => (3, u32::from(first & 0x0F)),
            _ => (4, u32::from(first & 0x07)),
        };
        let continuation = tail.get(..width - 1).unwrap_or(tail);
        let code_point = continuation
            .iter()
            .fold(initial, |acc, &byte| (acc << 6) | u32::from(byte & 0x3F));
        rest = &tail[continuation.len()..];
        Some(code_point)
    })
}

impl Tendril<Wtf8> {
    /// 追加一个码点；代理码点以三字节形式写入，若与末尾前导代理成对则合并为四字节字符。
    ///
    /// 超过 `U+10FFFF` 的值返回 [`TendrilError::ValidationFailed`]。
    pub fn push_code_point(&mut self, code_point: u32) -> Result<(), TendrilError> {
        if let Some(ch) = char::from_u32(code_point) {
            let mut buf = [0; 4];
            return self.try_push_bytes(ch.encode_utf8(&mut buf).as_bytes());
        }
        if !(LEAD_SURROGATES.contains(&code_point) || TRAIL_SURROGATES.contains(&code_point)) {
            return Err(validation_failed::<Wtf8>());
        }
        let encoded = [
            0xED,
            0x80 | ((code_point >> 6) & 0x3F) as u8,
            0x80 | (code_point & 0x3F) as u8,
        ];
        self.try_push_bytes(&encoded)
    }

    /// 由 UTF-16 码元序列无损构造；孤立代理被保留，成对代理合并为字符。
    pub fn from_utf16(units: &[u16]) -> Result<Self, TendrilError> {
        let mut tendril = Self::new();
        for unit in units {
            tendril.push_code_point(u32::from(*unit))?;
        }
        Ok(tendril)
    }

    /// 逐个返回码点；孤立代理以其码元值出现，因此元素类型是 `u32` 而非 `char`。
    pub fn code_points(&self) -> impl Iterator<Item = u32> + '_ {
        code_points(self.as_byte_slice())
    }

    /// 是否不含任何孤立代理（即同时是合法 UTF-8）。
    pub fn is_well_formed(&self) -> bool {
        crate::format::Utf8::validate(self.as_byte_slice())
    }
}

impl Deref for Tendril<Wtf8> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_byte_slice()
    }
}
