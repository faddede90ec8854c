//! 与 `std::io` 的对接：外部生产者/消费者接口。
//!
//! # 模块定位（Why）
//! - 读取方（套接字、文件）需要“先要一段可写区域、读完再提交实际长度”的接口，
//!   `push_uninit` + `pop_back` 正好组成这一对操作，本模块把它们包装成 `io` 生态的常用形状；
//! - 写出方只需要原始字节或诊断文本，分别对应 [`Tendril::write_to`] 与 [`Tendril::dump`]。
//!
//! # 契约说明（What）
//! - [`TendrilError`] 转换为 `io::Error` 时，分配失败映射为 `OutOfMemory`，其余映射为 `InvalidInput`；
//! - 读取失败时，本次预留但未填充的尾部会被回退，之前已读入的数据保留。

use std::io::{self, Read, Write};

use crate::{
    error::TendrilError,
    format::Format,
    tendril::{ByteTendril, Tendril},
};

/// 单次读取的起始块大小，此后逐次倍增。小于内联上限，探测空数据源时不分配。
const MIN_READ_CHUNK: usize = 8;
/// 单次读取的块大小上限。
const MAX_READ_CHUNK: usize = 64 * 1024;

impl From<TendrilError> for io::Error {
    fn from(err: TendrilError) -> io::Error {
        let kind = match err {
            TendrilError::AllocationFailure { .. } => io::ErrorKind::OutOfMemory,
            _ => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, err)
    }
}

impl Write for ByteTendril {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push_slice(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<F: Format> Tendril<F> {
    /// 把原始字节完整写入 `sink`。
    pub fn write_to<W: Write + ?Sized>(&self, sink: &mut W) -> io::Result<()> {
        sink.write_all(self.as_byte_slice())
    }

    /// 把 [`Tendril::describe`] 的诊断文本写入 `sink`，以换行结尾。
    pub fn dump<W: Write + ?Sized>(&self, sink: &mut W) -> io::Result<()> {
        let description = self.describe()?;
        sink.write_all(description.as_bytes())?;
        sink.write_all(b"\n")
    }
}

/// 为任意 `io::Read` 提供读入 [`ByteTendril`] 的能力。
pub trait ReadExt: Read {
    /// 读到 EOF，把数据追加到 `buf` 末尾，返回读入的字节数。
    ///
    /// # 执行逻辑（How）
    /// 1. `push_uninit` 预留一块尾部区域（从 8 字节起倍增，上限 64 KiB）；
    /// 2. 直接读入该区域，`Interrupted` 自动重试；
    /// 3. `pop_back` 回退未填满的部分，读到 0 字节即视为 EOF。
    fn read_to_tendril(&mut self, buf: &mut ByteTendril) -> io::Result<usize>;
}

impl<R: Read + ?Sized> ReadExt for R {
    fn read_to_tendril(&mut self, buf: &mut ByteTendril) -> io::Result<usize> {
        let start = buf.len32();
        let mut chunk = MIN_READ_CHUNK;
        loop {
            let tail = buf.push_uninit(chunk)?;
            let filled = match read_retrying(self, tail) {
                Ok(filled) => filled.min(chunk),
                Err(err) => {
                    buf.pop_back(chunk as u32)?;
                    return Err(err);
                }
            };
            buf.pop_back((chunk - filled) as u32)?;
            if filled == 0 {
                return Ok((buf.len32() - start) as usize);
            }
            chunk = (chunk * 2).min(MAX_READ_CHUNK);
        }
    }
}

fn read_retrying<R: Read + ?Sized>(reader: &mut R, dst: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(dst) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}
