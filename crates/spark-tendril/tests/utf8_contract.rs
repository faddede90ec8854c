//! `utf8_contract` 集成测试：`StrTendril` 的格式不变式与文本 API。
//!
//! # 测试总览（Why）
//! - 切片、弹出、追加在字符中间切开或写入非法字节时必须失败，且值保持不变；
//! - 字符级 API、格式化写入与标准库转换的行为需与 `String` 一致。

use core::fmt::Write as _;

use spark_tendril::{
    ByteTendril, SliceExt, StorageMode, StrTendril, TendrilError, format_tendril,
};

/// 在多字节字符中间切片返回 `ValidationFailed`。
#[test]
fn sub_inside_a_char_is_rejected() {
    let text = StrTendril::from_slice("a\u{a66e}b").expect("构造文本");
    let err = text.subtendril(0, 2).expect_err("切在字符中间");
    assert_eq!(err, TendrilError::ValidationFailed { format: "Utf8" });
    assert_eq!(err.code(), "tendril.validation_failed");
    assert_eq!(&*text.subtendril(1, 3).expect("完整字符"), "\u{a66e}");
}

/// 弹出切在字符中间时失败且不修改值。
#[test]
fn pops_inside_a_char_leave_value_unchanged() {
    let mut text = StrTendril::from_slice("\u{a66e}xyz").expect("构造文本");
    assert!(text.pop_front(1).is_err());
    assert!(text.pop_back(4).is_err());
    assert_eq!(&*text, "\u{a66e}xyz");
    text.pop_front(3).expect("整字符弹出");
    assert_eq!(&*text, "xyz");
}

/// 追加非法 UTF-8 字节被拒绝。
#[test]
fn invalid_bytes_cannot_be_pushed() {
    let mut text = StrTendril::from_slice("ok").expect("构造文本");
    let err = text.try_push_bytes(b"\xC3").expect_err("截断的多字节序列");
    assert_eq!(err.code(), "tendril.validation_failed");
    text.try_push_bytes("é".as_bytes()).expect("合法序列");
    assert_eq!(&*text, "oké");
    assert!(StrTendril::try_from_byte_slice(b"\xFF").is_err());
}

#[test]
fn char_api_round_trips() {
    let mut text = StrTendril::from_char('å');
    assert_eq!(text.mode(), StorageMode::Inline);
    text.push_char('ß').expect("追加字符");
    text.push_slice("c").expect("追加文本");
    assert_eq!(text.pop_front_char(), Some('å'));
    assert_eq!(text.pop_front_char(), Some('ß'));
    assert_eq!(text.pop_front_char(), Some('c'));
    assert_eq!(text.pop_front_char(), None);
    assert_eq!(text.mode(), StorageMode::Empty);
}

/// 长前缀通过共享后备块弹出，不复制。
#[test]
fn long_char_run_shares_backing_block() {
    let mut text = StrTendril::from_slice("                    word").expect("构造文本");
    let (spaces, is_space) = text
        .pop_front_char_run(char::is_whitespace)
        .expect("空白前缀");
    assert!(is_space);
    assert_eq!(spaces.len32(), 20);
    assert!(spaces.is_shared_with(&text));
    assert_eq!(&*text, "word");
}

#[test]
fn formatting_macros_and_write() {
    let formatted = format_tendril!("{:>6}|{:<4}|", "right", 42).expect("格式化");
    assert_eq!(&*formatted, " right|42  |");

    let mut long = StrTendril::new();
    for index in 0..10 {
        write!(long, "{index},").expect("写入");
    }
    assert_eq!(&*long, "0,1,2,3,4,5,6,7,8,9,");
    assert_eq!(long.mode(), StorageMode::Owned);
    assert_eq!(format!("[{long:>22}]"), "[  0,1,2,3,4,5,6,7,8,9,]");
}

#[test]
fn conversions_match_std_strings() {
    let from_str: StrTendril = "parse".parse().expect("FromStr");
    let from_string = StrTendril::try_from(String::from("an owned string, longer than 15")).expect("接管 String");
    assert_eq!(from_string.mode(), StorageMode::Owned);
    let from_ext = "slice".to_tendril().expect("SliceExt");
    assert_eq!(from_str, StrTendril::try_from("parse").expect("TryFrom"));
    assert_eq!(String::from(from_ext), "slice");
    assert_eq!(from_string.to_string(), "an owned string, longer than 15");

    let collected: StrTendril = ["ab", "cd", "ef"].into_iter().collect();
    assert_eq!(&*collected, "abcdef");
    let chars: StrTendril = "xyz".chars().rev().collect();
    assert_eq!(&*chars, "zyx");

    let bytes: ByteTendril = collected.into_bytes();
    assert_eq!(&*bytes, b"abcdef");
}

/// 排序与哈希按字节序，与 `str` 一致。
#[test]
fn ordering_matches_str() {
    let mut values: Vec<StrTendril> = ["pear", "apple", "fig", "applesauce and more"]
        .into_iter()
        .map(|text| text.to_tendril().expect("构造文本"))
        .collect();
    values.sort();
    let sorted: Vec<&str> = values.iter().map(|value| value.as_str()).collect();
    assert_eq!(sorted, ["apple", "applesauce and more", "fig", "pear"]);

    let set: std::collections::HashSet<StrTendril> = values.iter().cloned().collect();
    assert!(set.contains(&StrTendril::from_slice("fig").expect("构造文本")));
}
