//! 格式标记（Format Marker）。
//!
//! # 模块定位（Why）
//! - 同一套表示既承载任意字节，也承载 ASCII、UTF-8 与 WTF-8 文本；格式标记作为类型参数，
//!   在编译期区分它们并决定切片、弹出、追加时需要的校验。
//!
//! # 设计概要（How）
//! - 格式之间存在包含关系（ASCII ⊂ UTF-8 ⊂ WTF-8 ⊂ 任意字节），由 [`SubsetOf`] 表达；
//!   向超集转换只改类型参数，向子集转换需要重新校验；
//! - WTF-8 在拼接处可能需要把相邻的前导/尾随代理合并为一个四字节字符，
//!   由 `Format::join_fixup` 告知通用追加路径。
//!
//! # 契约说明（What）
//! - `Format` 为封闭 trait，只有本模块的四个标记实现它；
//!   `Tendril<Utf8>` 依赖“内容恒为合法 UTF-8”这一不变式提供 `Deref<Target = str>`，
//!   因此不允许外部格式绕过校验。

use core::fmt::{self, Write as _};

use crate::wtf8;

mod sealed {
    pub trait Sealed {}
}

/// `Tendril` 内容格式。
pub trait Format: sealed::Sealed + 'static {
    /// 诊断输出中使用的格式名。
    const NAME: &'static str;

    /// 整段字节是否符合格式。
    fn validate(bytes: &[u8]) -> bool;

    /// 在合法内容 `bytes` 的 `index` 处切开是否仍得到两段合法内容。
    fn is_boundary(bytes: &[u8], index: usize) -> bool;

    /// 以格式对应的方式渲染内容。
    fn fmt_contents(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result;

    /// 把合法内容 `rhs` 接在合法内容 `lhs` 之后时，拼接点是否需要改写。
    ///
    /// 返回 `Some(joined)` 表示 `lhs` 末尾 3 字节与 `rhs` 开头 3 字节应替换为 `joined`。
    #[doc(hidden)]
    fn join_fixup(_lhs: &[u8], _rhs: &[u8]) -> Option<[u8; 4]> {
        None
    }
}

/// `Self` 的任何合法内容都是 `Super` 的合法内容。
///
/// 只有本模块的格式标记能实现 [`Format`]，因此这里列出的包含关系就是全部关系。
pub trait SubsetOf<Super: Format>: Format {}

/// 未解释的二进制字节。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Binary;

/// 7 位 ASCII 文本，任意字节位置都是边界。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Ascii;

/// UTF-8 文本。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Utf8;

/// WTF-8：允许孤立代理码点的广义 UTF-8，用于无损承载不合法的 UTF-16。
///
/// 相邻的前导代理与尾随代理必须编码为对应的四字节字符，不能以两个代理出现。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Wtf8;

impl sealed::Sealed for Binary {}
impl sealed::Sealed for Ascii {}
impl sealed::Sealed for Utf8 {}
impl sealed::Sealed for Wtf8 {}

impl<F: Format> SubsetOf<F> for F {}
impl SubsetOf<Binary> for Ascii {}
impl SubsetOf<Binary> for Utf8 {}
impl SubsetOf<Binary> for Wtf8 {}
impl SubsetOf<Utf8> for Ascii {}
impl SubsetOf<Wtf8> for Ascii {}
impl SubsetOf<Wtf8> for Utf8 {}

impl Format for Binary {
    const NAME: &'static str = "Binary";

    fn validate(_bytes: &[u8]) -> bool {
        true
    }

    fn is_boundary(_bytes: &[u8], _index: usize) -> bool {
        true
    }

    fn fmt_contents(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(bytes, f)
    }
}

impl Format for Ascii {
    const NAME: &'static str = "Ascii";

    fn validate(bytes: &[u8]) -> bool {
        bytes.is_ascii()
    }

    fn is_boundary(bytes: &[u8], index: usize) -> bool {
        index <= bytes.len()
    }

    fn fmt_contents(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Utf8::fmt_contents(bytes, f)
    }
}

impl Format for Utf8 {
    const NAME: &'static str = "Utf8";

    fn validate(bytes: &[u8]) -> bool {
        core::str::from_utf8(bytes).is_ok()
    }

    fn is_boundary(bytes: &[u8], index: usize) -> bool {
        is_char_start(bytes, index)
    }

    fn fmt_contents(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match core::str::from_utf8(bytes) {
            Ok(text) => fmt::Debug::fmt(text, f),
            Err(_) => fmt::Debug::fmt(bytes, f),
        }
    }
}

impl Format for Wtf8 {
    const NAME: &'static str = "Wtf8";

    fn validate(bytes: &[u8]) -> bool {
        wtf8::validate(bytes)
    }

    fn is_boundary(bytes: &[u8], index: usize) -> bool {
        is_char_start(bytes, index)
    }

    fn fmt_contents(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        for code_point in wtf8::code_points(bytes) {
            match char::from_u32(code_point) {
                Some(ch) => {
                    for escaped in ch.escape_debug() {
                        f.write_char(escaped)?;
                    }
                }
                None => write!(f, "\\u{{{code_point:x}}}")?,
            }
        }
        f.write_char('"')
    }

    fn join_fixup(lhs: &[u8], rhs: &[u8]) -> Option<[u8; 4]> {
        wtf8::join_surrogates(lhs, rhs)
    }
}

/// `index` 处是否为（广义）UTF-8 字符起点；越界时只有 `bytes.len()` 算作边界。
fn is_char_start(bytes: &[u8], index: usize) -> bool {
    // 非续字节（0b10xx_xxxx 以外）即字符起点。
    match bytes.get(index) {
        None => index == bytes.len(),
        Some(&byte) => (byte as i8) >= -0x40,
    }
}
