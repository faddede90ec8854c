//! `ByteTendril` 专有 API：未初始化追加、可变访问与 `bytes` 生态互通。

use alloc::vec::Vec;
use core::ops::Deref;

use bytes::{Buf, Bytes};

use crate::{
    error::TendrilError,
    format::{Binary, Utf8},
    tendril::{ByteTendril, StrTendril, Tendril, expect_grown},
};

impl Tendril<Binary> {
    /// 复制 `bytes` 构造新值；不超过内联上限时不分配。
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TendrilError> {
        let mut tendril = Self::new();
        tendril.push_slice(bytes)?;
        Ok(tendril)
    }

    /// 追加字节。共享的后备块会先被复制（写时复制）。
    pub fn push_slice(&mut self, bytes: &[u8]) -> Result<(), TendrilError> {
        self.push_bytes_unchecked(bytes)
    }

    /// 预留并占用 `n` 字节尾部区域，返回该区域供调用方直接写入。
    ///
    /// # 契约说明（What）
    /// - 返回后长度已经增加 `n`；区域以零填充，调用方覆盖即可；
    /// - 实际写入少于 `n` 时，调用方以 [`Tendril::pop_back`] 回退多占的部分；
    /// - 失败时（长度溢出或分配失败）值保持不变。
    pub fn push_uninit(&mut self, n: usize) -> Result<&mut [u8], TendrilError> {
        self.grow_tail(n)
    }

    /// 返回内容的可变切片；后备块被共享时先复制一份独占的。
    pub fn make_mut(&mut self) -> Result<&mut [u8], TendrilError> {
        self.make_exclusive()
    }

    /// 内容为合法 UTF-8 时零拷贝地转换为 [`StrTendril`]，否则原样交还。
    pub fn try_into_utf8(self) -> Result<StrTendril, Self> {
        self.try_into_subset::<Utf8>()
    }
}

impl Deref for Tendril<Binary> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_byte_slice()
    }
}

impl TryFrom<&[u8]> for ByteTendril {
    type Error = TendrilError;

    fn try_from(bytes: &[u8]) -> Result<Self, TendrilError> {
        Self::from_slice(bytes)
    }
}

impl TryFrom<Vec<u8>> for ByteTendril {
    type Error = TendrilError;

    /// 超过内联上限时直接接管 `Vec` 的分配作为后备块。
    fn try_from(bytes: Vec<u8>) -> Result<Self, TendrilError> {
        Self::from_vec_unchecked(bytes)
    }
}

impl Extend<u8> for ByteTendril {
    fn extend<I: IntoIterator<Item = u8>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        if let Ok(hint) = u32::try_from(iter.size_hint().0) {
            expect_grown(self.reserve(hint));
        }
        for byte in iter {
            expect_grown(self.push_slice(&[byte]));
        }
    }
}

impl<'a> Extend<&'a u8> for ByteTendril {
    fn extend<I: IntoIterator<Item = &'a u8>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<'a> Extend<&'a [u8]> for ByteTendril {
    fn extend<I: IntoIterator<Item = &'a [u8]>>(&mut self, iter: I) {
        for chunk in iter {
            expect_grown(self.push_slice(chunk));
        }
    }
}

impl FromIterator<u8> for ByteTendril {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut output = Self::new();
        output.extend(iter);
        output
    }
}

impl<'a> FromIterator<&'a [u8]> for ByteTendril {
    fn from_iter<I: IntoIterator<Item = &'a [u8]>>(iter: I) -> Self {
        let mut output = Self::new();
        output.extend(iter);
        output
    }
}

/// 以 `bytes::Buf` 的游标语义消费内容：`advance` 即 `pop_front`，堆模式下不搬移字节。
impl Buf for ByteTendril {
    fn remaining(&self) -> usize {
        self.len32() as usize
    }

    fn chunk(&self) -> &[u8] {
        self.as_byte_slice()
    }

    fn advance(&mut self, cnt: usize) {
        let remaining = self.len32();
        match u32::try_from(cnt) {
            Ok(n) if n <= remaining => self.drop_front(n),
            _ => panic!("cannot advance past the end of a tendril: {cnt} > {remaining}"),
        }
    }
}

impl From<ByteTendril> for Bytes {
    /// 后备块以 `Rc` 计数，无法交给线程安全的 `Bytes`，因此复制一次。
    fn from(tendril: ByteTendril) -> Bytes {
        Bytes::copy_from_slice(tendril.as_byte_slice())
    }
}
