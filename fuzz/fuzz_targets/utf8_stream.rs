#![no_main]

use std::borrow::Cow;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spark_tendril::{ByteTendril, StrTendril, TendrilSink, Utf8, Utf8Validator};

/// 任意字节按任意方式切块后送入校验器。
///
/// - **Why**：跨块补齐是校验器里唯一有状态的部分，切点组合由 Fuzzer 穷举；
/// - **What**：合法输入的输出必须与输入逐字节相同且不报错；
///   非法输入的输出必须是合法 UTF-8，且至少报告一次错误。
#[derive(Debug, Arbitrary)]
struct StreamCase {
    bytes: Vec<u8>,
    cuts: Vec<u8>,
}

#[derive(Default)]
struct Collect {
    text: String,
    errors: usize,
}

impl TendrilSink<Utf8> for Collect {
    fn process(&mut self, tendril: StrTendril) {
        self.text.push_str(&tendril);
    }

    fn error(&mut self, _desc: Cow<'static, str>) {
        self.errors += 1;
    }
}

fuzz_target!(|case: StreamCase| {
    let mut validator = Utf8Validator::new(Collect::default());
    let mut rest = &case.bytes[..];
    for cut in case.cuts {
        let at = usize::from(cut).min(rest.len());
        let (chunk, tail) = rest.split_at(at);
        validator.process(ByteTendril::from_slice(chunk).expect("构造输入块"));
        rest = tail;
    }
    validator.process(ByteTendril::from_slice(rest).expect("构造输入块"));
    validator.finish();

    let sink = validator.into_sink();
    match core::str::from_utf8(&case.bytes) {
        Ok(text) => {
            assert_eq!(sink.text, text);
            assert_eq!(sink.errors, 0);
        }
        Err(_) => assert!(sink.errors > 0),
    }
});
