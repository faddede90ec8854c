#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spark_tendril::StrTendril;

/// UTF-8 文本操作：任意切点都必须要么成功且仍是合法 UTF-8，要么失败且值不变。
#[derive(Debug, Arbitrary)]
enum TextOp {
    Push(String),
    PushBytes(Vec<u8>),
    PushChar(char),
    PopFront(u8),
    PopBack(u8),
    PopChar,
    Run,
    Sub { offset: u8, length: u8 },
}

fuzz_target!(|ops: Vec<TextOp>| {
    let mut text = StrTendril::new();
    let mut model = String::new();

    for op in ops {
        match op {
            TextOp::Push(slice) => {
                text.push_slice(&slice).expect("追加不应失败");
                model.push_str(&slice);
            }
            TextOp::PushBytes(bytes) => match core::str::from_utf8(&bytes) {
                Ok(valid) => {
                    text.try_push_bytes(&bytes).expect("合法 UTF-8 应被接受");
                    model.push_str(valid);
                }
                Err(_) => assert!(text.try_push_bytes(&bytes).is_err()),
            },
            TextOp::PushChar(ch) => {
                text.push_char(ch).expect("追加字符不应失败");
                model.push(ch);
            }
            TextOp::PopFront(n) => {
                let n = usize::from(n);
                let expected = n <= model.len() && model.is_char_boundary(n);
                assert_eq!(text.pop_front(n as u32).is_ok(), expected);
                if expected {
                    model.drain(..n);
                }
            }
            TextOp::PopBack(n) => {
                let n = usize::from(n);
                let expected = n <= model.len() && model.is_char_boundary(model.len() - n);
                assert_eq!(text.pop_back(n as u32).is_ok(), expected);
                if expected {
                    model.truncate(model.len() - n);
                }
            }
            TextOp::PopChar => {
                let expected = model.chars().next();
                assert_eq!(text.pop_front_char(), expected);
                if let Some(ch) = expected {
                    model.drain(..ch.len_utf8());
                }
            }
            TextOp::Run => {
                if let Some((run, _)) = text.pop_front_char_run(char::is_alphanumeric) {
                    assert!(model.starts_with(&*run));
                    model.drain(..run.len());
                }
            }
            TextOp::Sub { offset, length } => {
                let (offset, length) = (usize::from(offset), usize::from(length));
                let end = offset + length;
                let valid = end <= model.len()
                    && model.is_char_boundary(offset)
                    && model.is_char_boundary(end);
                match text.subtendril(offset as u32, length as u32) {
                    Ok(sub) => {
                        assert!(valid);
                        assert_eq!(&*sub, &model[offset..end]);
                    }
                    Err(_) => assert!(!valid),
                }
            }
        }
        assert_eq!(&*text, model.as_str());
    }
});
