//! `StrTendril` 专有 API：字符级追加/弹出与格式化写入。
//!
//! # 契约说明（What）
//! - `Tendril<Utf8>` 的内容恒为合法 UTF-8：所有入口要么追加 `&str`/`char`，
//!   要么经过 [`Format::validate`](crate::Format::validate) 与字符边界检查，因此解引用为 `str` 不再重复校验；
//! - 格式化失败时已写入的部分会被回退，值的内容保持调用前的样子。

use alloc::string::String;
use core::{fmt, mem, ops::Deref, str::FromStr};

use crate::{
    error::TendrilError,
    format::Utf8,
    repr::Repr,
    tendril::{StrTendril, Tendril, expect_grown},
};

impl Tendril<Utf8> {
    /// 复制 `text` 构造新值；不超过内联上限时不分配。
    pub fn from_slice(text: &str) -> Result<Self, TendrilError> {
        let mut tendril = Self::new();
        tendril.push_slice(text)?;
        Ok(tendril)
    }

    /// 单个字符总能内联存放，因此不会失败。
    pub fn from_char(ch: char) -> Self {
        let mut buf = [0; 4];
        Self::from_repr(Repr::inline(ch.encode_utf8(&mut buf).as_bytes()))
    }

    pub fn push_slice(&mut self, text: &str) -> Result<(), TendrilError> {
        self.push_bytes_unchecked(text.as_bytes())
    }

    pub fn push_char(&mut self, ch: char) -> Result<(), TendrilError> {
        let mut buf = [0; 4];
        self.push_bytes_unchecked(ch.encode_utf8(&mut buf).as_bytes())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        // SAFETY: 所有写入路径只接受 `&str`/`char` 或经 `Utf8::validate` 校验的字节，
        // 所有截断路径都先通过 `Utf8::is_boundary`，内容因此始终是合法 UTF-8。
        unsafe { core::str::from_utf8_unchecked(self.as_byte_slice()) }
    }

    /// 弹出首字符；空值返回 `None`。
    pub fn pop_front_char(&mut self) -> Option<char> {
        let ch = self.as_str().chars().next()?;
        self.drop_front(ch.len_utf8() as u32);
        Some(ch)
    }

    /// 弹出分类结果与首字符相同的最长前缀，返回该前缀与其分类。
    ///
    /// 词法分析器常用它一次性取出“连续空白”或“连续非空白”；
    /// 前缀超过内联上限时与源共享后备块，不复制。
    pub fn pop_front_char_run<P>(&mut self, mut classify: P) -> Option<(StrTendril, bool)>
    where
        P: FnMut(char) -> bool,
    {
        let (class, run_end) = {
            let mut chars = self.as_str().char_indices();
            let (_, first) = chars.next()?;
            let class = classify(first);
            let run_end = chars
                .find(|&(_, ch)| classify(ch) != class)
                .map(|(index, _)| index as u32);
            (class, run_end)
        };
        let run = match run_end {
            Some(end) => {
                let run = self.slice_unchecked(0, end);
                self.drop_front(end);
                run
            }
            None => mem::take(self),
        };
        Some((run, class))
    }

    /// 把格式化结果写入新值，[`format_tendril!`](crate::format_tendril) 的实现基础。
    pub fn format(args: fmt::Arguments<'_>) -> Result<Self, TendrilError> {
        let mut output = Self::new();
        output.push_fmt(args)?;
        Ok(output)
    }

    /// 追加格式化结果。
    ///
    /// # 执行逻辑（How）
    /// - `fmt::Write` 只能返回不带信息的 `fmt::Error`，因此由适配器暂存真正的 [`TendrilError`]；
    /// - 失败时把长度回退到写入前，再把暂存的错误交给调用方；
    ///   若是某个 `Display` 实现自行失败，则报告 [`TendrilError::FormatFailed`]。
    pub fn push_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<(), TendrilError> {
        struct Sink<'a> {
            target: &'a mut StrTendril,
            error: Option<TendrilError>,
        }

        impl fmt::Write for Sink<'_> {
            fn write_str(&mut self, text: &str) -> fmt::Result {
                self.target.push_slice(text).map_err(|err| {
                    self.error = Some(err);
                    fmt::Error
                })
            }
        }

        let old_len = self.len32();
        let mut sink = Sink {
            target: self,
            error: None,
        };
        let outcome = fmt::write(&mut sink, args);
        let error = sink.error.take();
        if outcome.is_ok() {
            return Ok(());
        }
        let written = self.len32() - old_len;
        self.drop_back(written);
        Err(error.unwrap_or(TendrilError::FormatFailed))
    }
}

impl Deref for Tendril<Utf8> {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for StrTendril {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for StrTendril {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

impl fmt::Write for StrTendril {
    fn write_str(&mut self, text: &str) -> fmt::Result {
        self.push_slice(text).map_err(|_| fmt::Error)
    }
}

impl FromStr for StrTendril {
    type Err = TendrilError;

    fn from_str(text: &str) -> Result<Self, TendrilError> {
        Self::from_slice(text)
    }
}

impl TryFrom<&str> for StrTendril {
    type Error = TendrilError;

    fn try_from(text: &str) -> Result<Self, TendrilError> {
        Self::from_slice(text)
    }
}

impl TryFrom<String> for StrTendril {
    type Error = TendrilError;

    /// 超过内联上限时直接接管 `String` 的分配作为后备块。
    fn try_from(text: String) -> Result<Self, TendrilError> {
        Self::from_vec_unchecked(text.into_bytes())
    }
}

impl From<StrTendril> for String {
    fn from(tendril: StrTendril) -> String {
        String::from(tendril.as_str())
    }
}

impl Extend<char> for StrTendril {
    fn extend<I: IntoIterator<Item = char>>(&mut self, iter: I) {
        for ch in iter {
            expect_grown(self.push_char(ch));
        }
    }
}

impl<'a> Extend<&'a str> for StrTendril {
    fn extend<I: IntoIterator<Item = &'a str>>(&mut self, iter: I) {
        for text in iter {
            expect_grown(self.push_slice(text));
        }
    }
}

impl FromIterator<char> for StrTendril {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        let mut output = Self::new();
        output.extend(iter);
        output
    }
}

impl<'a> FromIterator<&'a str> for StrTendril {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut output = Self::new();
        output.extend(iter);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageMode;

    #[test]
    fn char_run_splits_on_class_change() {
        let mut text = StrTendril::from_slice("   \tfoo bar").expect("构造文本");
        let (run, is_space) = text.pop_front_char_run(char::is_whitespace).expect("首段");
        assert!(is_space);
        assert_eq!(&*run, "   \t");
        assert_eq!(&*text, "foo bar");

        let (word, is_space) = text.pop_front_char_run(char::is_whitespace).expect("次段");
        assert!(!is_space);
        assert_eq!(&*word, "foo");
    }

    #[test]
    fn char_run_takes_everything_when_class_never_changes() {
        let mut text = StrTendril::from_slice("abcdefghijklmnopqrstuvwxyz").expect("构造文本");
        let (run, _) = text.pop_front_char_run(char::is_alphabetic).expect("整段");
        assert_eq!(run.len32(), 26);
        assert_eq!(text.mode(), StorageMode::Empty);
        assert!(text.pop_front_char_run(char::is_alphabetic).is_none());
    }

    #[test]
    fn failing_display_rolls_back_partial_output() {
        struct Broken;

        impl fmt::Display for Broken {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("partial")?;
                Err(fmt::Error)
            }
        }

        let mut text = StrTendril::from_slice("keep").expect("构造文本");
        let err = text
            .push_fmt(format_args!("{}", Broken))
            .expect_err("Display 失败必须透传");
        assert_eq!(err, TendrilError::FormatFailed);
        assert_eq!(&*text, "keep");
    }
}
