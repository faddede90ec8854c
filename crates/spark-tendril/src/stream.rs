//! 流式处理：`TendrilSink` 接收端与增量 UTF-8 校验器。
//!
//! # 模块定位（Why）
//! - 网络与文件输入按块到达，多字节字符可能恰好被块边界切开；
//!   逐块调用 `try_into_utf8` 会把这种合法输入误判为错误。
//!
//! # 设计概要（How）
//! - [`TendrilSink`] 是逐块推送的接收端，错误以描述文本旁路上报，数据流本身不中断；
//! - [`Utf8Validator`] 把跨块的不完整字符暂存在最多 4 字节的前缀缓冲里，
//!   其余内容以零拷贝子视图转发；非法序列上报错误并替换为 `U+FFFD`。
//!
//! # 契约说明（What）
//! - 转发给下游的每个块都是合法 UTF-8，且按输入顺序到达；
//! - 只有跨块的字符会被复制，其余字节与输入共享后备块。

use alloc::borrow::Cow;

use thiserror::Error;

use crate::{
    format::{Binary, Format, Utf8},
    repr::Repr,
    tendril::{ByteTendril, StrTendril, Tendril},
};

/// 逐块接收 `Tendril` 的下游。
pub trait TendrilSink<F: Format> {
    /// 处理一个块。
    fn process(&mut self, tendril: Tendril<F>);

    /// 输入结束。默认什么也不做。
    fn finish(&mut self) {}

    /// 上游发现了错误；数据流随后继续。
    fn error(&mut self, desc: Cow<'static, str>);
}

/// [`ByteTendril::decode_utf8`] 失败时的结果，两种情况都交还已解码的前缀与剩余输入。
#[derive(Debug, Error)]
pub enum Utf8DecodeError {
    /// `valid_prefix` 之后有 `invalid_len` 字节构成非法序列，`remaining` 为其后的全部输入。
    #[error("invalid UTF-8 sequence of {invalid_len} byte(s) after {} valid bytes", .valid_prefix.len32())]
    Invalid {
        valid_prefix: StrTendril,
        invalid_len: usize,
        remaining: ByteTendril,
    },

    /// 输入以一个尚未结束的多字节字符收尾，`incomplete_suffix` 为该字符已到达的部分。
    #[error("incomplete UTF-8 sequence of {} byte(s) at end of input", .incomplete_suffix.len32())]
    Incomplete {
        valid_prefix: StrTendril,
        incomplete_suffix: ByteTendril,
    },
}

impl Tendril<Binary> {
    /// 把字节解码为 UTF-8；失败时按出错位置拆分为零拷贝视图交还，便于调用方恢复。
    pub fn decode_utf8(self) -> Result<StrTendril, Utf8DecodeError> {
        let Some(error) = core::str::from_utf8(self.as_byte_slice()).err() else {
            return Ok(Tendril::from_repr(self.repr));
        };
        let len = self.len32();
        let valid = error.valid_up_to() as u32;
        let valid_prefix = Tendril::from_repr(self.slice_unchecked(0, valid).repr);
        match error.error_len() {
            Some(invalid_len) => {
                let resume = valid + invalid_len as u32;
                Err(Utf8DecodeError::Invalid {
                    valid_prefix,
                    invalid_len,
                    remaining: self.slice_unchecked(resume, len - resume),
                })
            }
            None => Err(Utf8DecodeError::Incomplete {
                valid_prefix,
                incomplete_suffix: self.slice_unchecked(valid, len - valid),
            }),
        }
    }
}

/// 增量 UTF-8 校验器：接收任意切分的字节块，向下游转发合法文本。
///
/// # 契约说明（What）
/// - 被块边界切开的字符在后续块补齐后作为一个独立的小块转发；
/// - 非法序列先调用下游的 `error`，再转发一个 `U+FFFD`；
///   暂存前缀与后续续字节拼成的序列若仍非法，整体只替换为一个 `U+FFFD`；
/// - `finish` 时仍有未补齐的字符，同样上报错误并转发 `U+FFFD`。
pub struct Utf8Validator<S> {
    partial: [u8; 4],
    partial_len: usize,
    need: usize,
    sink: S,
}

impl<S: TendrilSink<Utf8>> Utf8Validator<S> {
    pub fn new(sink: S) -> Self {
        Self {
            partial: [0; 4],
            partial_len: 0,
            need: 0,
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// 取回下游；尚未补齐的字符被丢弃，需要时先调用 `finish`。
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn replace(&mut self, desc: &'static str) {
        tracing::debug!(desc, "utf-8 validator substituted U+FFFD");
        self.sink.error(Cow::Borrowed(desc));
        self.sink.process(StrTendril::from_char(char::REPLACEMENT_CHARACTER));
    }

    fn forward(&mut self, text: StrTendril) {
        if !text.is_empty() {
            self.sink.process(text);
        }
    }

    /// 用 `chunk` 开头的续字节补齐暂存的字符；返回 `false` 表示 `chunk` 已耗尽且仍未补齐。
    fn complete_partial(&mut self, chunk: &mut ByteTendril) -> bool {
        let bytes = chunk.as_byte_slice();
        let take = bytes
            .iter()
            .take(self.need)
            .take_while(|&&byte| is_continuation(byte))
            .count();
        self.partial[self.partial_len..self.partial_len + take].copy_from_slice(&bytes[..take]);
        self.partial_len += take;
        self.need -= take;
        chunk.drop_front(take as u32);

        if self.need > 0 {
            if chunk.is_empty() {
                return false;
            }
            self.reset_partial();
            self.replace("truncated UTF-8 sequence");
            return true;
        }
        let sequence = &self.partial[..self.partial_len];
        match core::str::from_utf8(sequence) {
            Ok(text) => {
                let text = Tendril::from_repr(Repr::inline(text.as_bytes()));
                self.reset_partial();
                self.forward(text);
            }
            Err(_) => {
                self.reset_partial();
                self.replace("invalid UTF-8 sequence");
            }
        }
        true
    }

    fn reset_partial(&mut self) {
        self.partial_len = 0;
        self.need = 0;
    }
}

impl<S: TendrilSink<Utf8>> TendrilSink<Binary> for Utf8Validator<S> {
    fn process(&mut self, mut chunk: ByteTendril) {
        if self.need > 0 && !self.complete_partial(&mut chunk) {
            return;
        }
        loop {
            match chunk.decode_utf8() {
                Ok(text) => {
                    self.forward(text);
                    return;
                }
                Err(Utf8DecodeError::Invalid {
                    valid_prefix,
                    remaining,
                    ..
                }) => {
                    self.forward(valid_prefix);
                    self.replace("invalid UTF-8 sequence");
                    chunk = remaining;
                }
                Err(Utf8DecodeError::Incomplete {
                    valid_prefix,
                    incomplete_suffix,
                }) => {
                    self.forward(valid_prefix);
                    let suffix = incomplete_suffix.as_byte_slice();
                    self.partial[..suffix.len()].copy_from_slice(suffix);
                    self.partial_len = suffix.len();
                    self.need = sequence_width(suffix[0]).saturating_sub(suffix.len());
                    return;
                }
            }
        }
    }

    fn finish(&mut self) {
        if self.partial_len > 0 {
            self.reset_partial();
            self.replace("incomplete UTF-8 sequence at end of stream");
        }
        self.sink.finish();
    }

    fn error(&mut self, desc: Cow<'static, str>) {
        self.sink.error(desc);
    }
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// 由首字节推出字符的总字节数。
fn sequence_width(first: u8) -> usize {
    match first {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}
