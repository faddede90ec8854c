#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spark_tendril::{ByteTendril, StorageMode};

/// Fuzz 指令：描述一段作用在多个槽位上的缓冲操作序列。
///
/// - **Why**：共享、切片与写时复制交错时最容易出现“一个值的修改被另一个值看到”的缺陷，
///   本结构枚举所有可变路径，交给 Fuzzer 穷举组合。
/// - **How**：每个槽位同时维护 `ByteTendril` 与 `Vec<u8>` 影子模型，每步之后逐一比对。
/// - **What**：任何内容不一致、模式与长度矛盾或 panic 都视为缺陷。
#[derive(Debug, Arbitrary)]
struct TendrilCase {
    ops: Vec<TendrilOp>,
}

#[derive(Debug, Arbitrary)]
enum TendrilOp {
    Push { slot: u8, bytes: Vec<u8> },
    PushUninit { slot: u8, len: u8, fill: u8 },
    PopFront { slot: u8, n: u8 },
    PopBack { slot: u8, n: u8 },
    Sub { slot: u8, from: u8, offset: u8, length: u8 },
    Clone { slot: u8, from: u8 },
    PushTendril { slot: u8, from: u8 },
    Poke { slot: u8, index: u8, byte: u8 },
    Clear { slot: u8 },
    Destroy { slot: u8 },
}

const SLOTS: usize = 4;

fuzz_target!(|case: TendrilCase| {
    let mut values: Vec<ByteTendril> = (0..SLOTS).map(|_| ByteTendril::new()).collect();
    let mut models: Vec<Vec<u8>> = vec![Vec::new(); SLOTS];

    for op in case.ops {
        match op {
            TendrilOp::Push { slot, bytes } => {
                let slot = map_slot(slot);
                values[slot].push_slice(&bytes).expect("追加不应失败");
                models[slot].extend_from_slice(&bytes);
            }
            TendrilOp::PushUninit { slot, len, fill } => {
                let slot = map_slot(slot);
                let len = usize::from(len);
                values[slot].push_uninit(len).expect("预留不应失败").fill(fill);
                models[slot].extend(core::iter::repeat_n(fill, len));
            }
            TendrilOp::PopFront { slot, n } => {
                let slot = map_slot(slot);
                let n = usize::from(n);
                let result = values[slot].pop_front(n as u32);
                assert_eq!(result.is_ok(), n <= models[slot].len());
                if result.is_ok() {
                    models[slot].drain(..n);
                }
            }
            TendrilOp::PopBack { slot, n } => {
                let slot = map_slot(slot);
                let n = usize::from(n);
                let result = values[slot].pop_back(n as u32);
                assert_eq!(result.is_ok(), n <= models[slot].len());
                if result.is_ok() {
                    let keep = models[slot].len() - n;
                    models[slot].truncate(keep);
                }
            }
            TendrilOp::Sub {
                slot,
                from,
                offset,
                length,
            } => {
                let (slot, from) = (map_slot(slot), map_slot(from));
                let (offset, length) = (usize::from(offset), usize::from(length));
                match values[from].subtendril(offset as u32, length as u32) {
                    Ok(sub) => {
                        models[slot] = models[from][offset..offset + length].to_vec();
                        values[slot] = sub;
                    }
                    Err(_) => assert!(offset + length > models[from].len()),
                }
            }
            TendrilOp::Clone { slot, from } => {
                let (slot, from) = (map_slot(slot), map_slot(from));
                values[slot] = values[from].clone();
                models[slot] = models[from].clone();
            }
            TendrilOp::PushTendril { slot, from } => {
                let (slot, from) = (map_slot(slot), map_slot(from));
                let other = values[from].clone();
                let tail = models[from].clone();
                values[slot].push_tendril(&other).expect("拼接不应失败");
                models[slot].extend_from_slice(&tail);
            }
            TendrilOp::Poke { slot, index, byte } => {
                let slot = map_slot(slot);
                if !models[slot].is_empty() {
                    let index = usize::from(index) % models[slot].len();
                    values[slot].make_mut().expect("写时复制不应失败")[index] = byte;
                    models[slot][index] = byte;
                }
            }
            TendrilOp::Clear { slot } => {
                let slot = map_slot(slot);
                values[slot].clear();
                models[slot].clear();
            }
            TendrilOp::Destroy { slot } => {
                let slot = map_slot(slot);
                values[slot].destroy();
                models[slot].clear();
            }
        }

        for (value, model) in values.iter().zip(&models) {
            assert_eq!(&value[..], &model[..]);
            match value.mode() {
                StorageMode::Empty => assert!(model.is_empty()),
                StorageMode::Inline => assert!(!model.is_empty() && model.len() <= 15),
                StorageMode::Owned => assert_eq!(value.block_ref_count(), Some(1)),
                StorageMode::Shared => assert!(value.block_ref_count() >= Some(2)),
            }
        }
    }
});

fn map_slot(raw: u8) -> usize {
    usize::from(raw) % SLOTS
}
