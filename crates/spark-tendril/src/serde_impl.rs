//! `serde` 支持：`StrTendril` 编码为字符串，`ByteTendril` 编码为字节串。
//!
//! 反序列化同样经由可失败的构造函数，分配失败或长度溢出会以 `D::Error::custom` 报告。

use core::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{Error, SeqAccess, Visitor},
};

use crate::tendril::{ByteTendril, StrTendril};

impl Serialize for StrTendril {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Serialize for ByteTendril {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.as_byte_slice())
    }
}

struct StrTendrilVisitor;

impl<'de> Visitor<'de> for StrTendrilVisitor {
    type Value = StrTendril;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a UTF-8 string")
    }

    fn visit_str<E: Error>(self, text: &str) -> Result<StrTendril, E> {
        StrTendril::from_slice(text).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for StrTendril {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(StrTendrilVisitor)
    }
}

struct ByteTendrilVisitor;

impl<'de> Visitor<'de> for ByteTendrilVisitor {
    type Value = ByteTendril;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a byte string or a sequence of bytes")
    }

    fn visit_bytes<E: Error>(self, bytes: &[u8]) -> Result<ByteTendril, E> {
        ByteTendril::from_slice(bytes).map_err(E::custom)
    }

    fn visit_str<E: Error>(self, text: &str) -> Result<ByteTendril, E> {
        self.visit_bytes(text.as_bytes())
    }

    // 自描述格式（例如 JSON）把字节串编码为整数数组。
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ByteTendril, A::Error> {
        let mut output = ByteTendril::new();
        while let Some(byte) = seq.next_element::<u8>()? {
            output.push_slice(&[byte]).map_err(A::Error::custom)?;
        }
        Ok(output)
    }
}

impl<'de> Deserialize<'de> for ByteTendril {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_bytes(ByteTendrilVisitor)
    }
}
