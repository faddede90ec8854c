//! `Tendril<Ascii>` 专有 API：ASCII 同时是合法 UTF-8，因此可以直接当作 `str` 使用。

use core::{fmt, ops::Deref};

use crate::{
    error::TendrilError,
    format::Ascii,
    tendril::{Tendril, validation_failed},
};

impl Tendril<Ascii> {
    /// 复制 `text` 构造新值；含非 ASCII 字符时返回 [`TendrilError::ValidationFailed`]。
    pub fn from_slice(text: &str) -> Result<Self, TendrilError> {
        Self::try_from_byte_slice(text.as_bytes())
    }

    /// 追加 ASCII 文本。
    pub fn push_slice(&mut self, text: &str) -> Result<(), TendrilError> {
        self.try_push_bytes(text.as_bytes())
    }

    /// 追加单个字符；非 ASCII 字符返回 [`TendrilError::ValidationFailed`]。
    pub fn push_char(&mut self, ch: char) -> Result<(), TendrilError> {
        if !ch.is_ascii() {
            return Err(validation_failed::<Ascii>());
        }
        self.push_bytes_unchecked(&[ch as u8])
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: `Tendril<Ascii>` 的内容恒为 ASCII，而 ASCII 字节序列必然是合法 UTF-8。
        unsafe { core::str::from_utf8_unchecked(self.as_byte_slice()) }
    }
}

impl Deref for Tendril<Ascii> {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for Tendril<Ascii> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Tendril<Ascii> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}
