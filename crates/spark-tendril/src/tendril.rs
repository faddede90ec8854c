//! `Tendril<F>` 本体：与格式无关的访问、切片、弹出、追加与写时复制。
//!
//! # 模块定位（Why）
//! - 各格式专有 API（`binary`、`utf8`）只做校验与类型转换，真正改变表示的算法都集中在这里，
//!   保证每条路径只实现一次。
//!
//! # 设计概要（How）
//! - 读操作直接分派到 [`Repr`]；写操作统一经过 `grow_tail` 与 `make_exclusive`；
//! - `make_owned_with_capacity` 是唯一的分配入口：共享视图按自身长度倍增，
//!   独占块按剩余容量倍增，内联值按内联上限倍增。
//!
//! # 契约说明（What）
//! - 任何返回错误的方法都不修改 `self`；
//! - 格式校验只发生在切点与外部输入上，已有内容的不变式由类型参数保证。

use alloc::{rc::Rc, vec::Vec};
use core::{
    borrow::Borrow,
    cmp::Ordering,
    fmt::{self, Write as _},
    hash,
    marker::PhantomData,
};

use crate::{
    MAX_INLINE_LEN,
    block::{self, BackingBlock},
    error::{TendrilError, checked_len},
    format::{Binary, Format, SubsetOf, Utf8},
    repr::{HeapView, InlineBuf, Repr, StorageMode},
};

/// 面向零拷贝解析的紧凑缓冲。
///
/// # 设计动机（Why）
/// - 语义上等同于拥有所有权的字节串/字符串，但小数据不分配、大数据可以零拷贝切片与共享；
/// - 调用方无需关心当前处于哪种存储模式，所有操作都会自行分派并在必要时迁移模式。
///
/// # 架构关系（How）
/// - 最多 [`MAX_INLINE_LEN`] 字节内联存放；超出后迁移到堆后备块；
/// - `clone` 与 `subtendril` 只增加后备块的引用计数，不复制字节；
/// - 任何会被其它共享者观察到的修改都先检查独占性，不独占则先复制（写时复制）。
///
/// # 契约说明（What）
/// - 长度上限为 `u32::MAX`，超限返回 [`TendrilError::CapacityOverflow`]；
/// - 所有失败路径都保持调用前的值不变；
/// - 引用计数为非原子计数，类型因此既不是 `Send` 也不是 `Sync`：
///
/// ```compile_fail
/// fn assert_send<T: Send>() {}
/// assert_send::<spark_tendril::ByteTendril>();
/// ```
// `transparent` 让不同格式参数的 `Tendril` 布局一致，`as_superset` 依赖这一点。
#[repr(transparent)]
pub struct Tendril<F: Format> {
    pub(crate) repr: Repr,
    marker: PhantomData<F>,
}

/// 存放任意字节的 `Tendril`。
pub type ByteTendril = Tendril<Binary>;

/// 存放 UTF-8 文本的 `Tendril`。
pub type StrTendril = Tendril<Utf8>;

impl<F: Format> Tendril<F> {
    /// 创建规范空值，不分配。
    #[inline]
    pub const fn new() -> Self {
        Self::from_repr(Repr::Empty)
    }

    pub(crate) const fn from_repr(repr: Repr) -> Self {
        Self {
            repr,
            marker: PhantomData,
        }
    }

    /// 创建可容纳 `capacity` 字节而无需再次分配的空值。
    pub fn with_capacity(capacity: u32) -> Result<Self, TendrilError> {
        if capacity as usize <= MAX_INLINE_LEN {
            return Ok(Self::new());
        }
        let block = BackingBlock::with_capacity(capacity)?;
        Ok(Self::from_repr(Repr::Heap(HeapView::new(block, 0))))
    }

    /// 接管已知符合格式的 `Vec<u8>`：不超过内联上限时复制进内联区，否则直接作为后备块，不复制。
    pub(crate) fn from_vec_unchecked(bytes: Vec<u8>) -> Result<Self, TendrilError> {
        let len = checked_len(0, bytes.len())?;
        if len as usize <= MAX_INLINE_LEN {
            return Ok(Self::from_repr(Repr::inline(&bytes)));
        }
        let block = BackingBlock::from_vec(bytes);
        Ok(Self::from_repr(Repr::Heap(HeapView::new(block, len))))
    }

    /// 校验格式后复制 `bytes`。
    pub fn try_from_byte_slice(bytes: &[u8]) -> Result<Self, TendrilError> {
        let mut tendril = Self::new();
        tendril.try_push_bytes(bytes)?;
        Ok(tendril)
    }

    /// 当前长度。命名避免与解引用后切片的 `len()` 冲突。
    #[inline]
    pub fn len32(&self) -> u32 {
        self.repr.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len32() == 0
    }

    /// 以未解释字节的形式查看内容。
    #[inline]
    pub fn as_byte_slice(&self) -> &[u8] {
        self.repr.as_slice()
    }

    /// 内容首字节地址：内联时指向值内部，堆模式时为 `块起点 + offset`。
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.as_byte_slice().as_ptr()
    }

    /// 当前存储模式。
    pub fn mode(&self) -> StorageMode {
        self.repr.mode()
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.repr, Repr::Inline(_))
    }

    /// 后备块是否被多个 `Tendril` 共享。
    pub fn is_shared(&self) -> bool {
        matches!(&self.repr, Repr::Heap(view) if view.is_shared())
    }

    /// 是否与 `other` 共享同一后备块（偏移可以不同）。
    pub fn is_shared_with(&self, other: &Self) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Heap(mine), Repr::Heap(theirs)) => Rc::ptr_eq(&mine.block, &theirs.block),
            _ => false,
        }
    }

    /// 后备块的引用计数；空值与内联值没有后备块，返回 `None`。
    pub fn block_ref_count(&self) -> Option<usize> {
        match &self.repr {
            Repr::Heap(view) => Some(view.ref_count()),
            _ => None,
        }
    }

    /// 不再分配即可达到的最大长度。
    pub fn capacity(&self) -> u32 {
        match &self.repr {
            Repr::Heap(view) => view.capacity(),
            _ => MAX_INLINE_LEN as u32,
        }
    }

    /// 为后续追加预留空间。
    ///
    /// 共享的后备块不会被预留：那样会立即触发一次复制，而追加发生时本来就要复制。
    pub fn reserve(&mut self, additional: u32) -> Result<(), TendrilError> {
        if self.is_shared() {
            return Ok(());
        }
        let new_len = checked_len(self.len32(), additional as usize)?;
        let fits = match &self.repr {
            Repr::Heap(view) => view.can_grow_in_place(new_len),
            _ => new_len as usize <= MAX_INLINE_LEN,
        };
        if fits {
            return Ok(());
        }
        self.make_owned_with_capacity(new_len)
    }

    /// 取 `[offset, offset + length)` 作为新的 `Tendril`。
    ///
    /// # 契约说明（What）
    /// - 越界返回 [`TendrilError::OutOfRange`]，切点不满足格式返回
    ///   [`TendrilError::ValidationFailed`]，源值始终不变；
    /// - 结果不超过 [`MAX_INLINE_LEN`] 时总是复制为内联值，小视图不会拖住大块；
    /// - 否则与源共享后备块（引用计数加一），不复制字节。
    pub fn subtendril(&self, offset: u32, length: u32) -> Result<Self, TendrilError> {
        let len = self.len32();
        if offset > len || length > len - offset {
            return Err(TendrilError::OutOfRange {
                offset,
                length,
                len,
            });
        }
        let bytes = self.as_byte_slice();
        if !F::is_boundary(bytes, offset as usize) || !F::is_boundary(bytes, (offset + length) as usize)
        {
            return Err(validation_failed::<F>());
        }
        Ok(self.slice_unchecked(offset, length))
    }

    /// 已完成边界与格式检查的切片。
    pub(crate) fn slice_unchecked(&self, offset: u32, length: u32) -> Self {
        if length as usize <= MAX_INLINE_LEN {
            let start = offset as usize;
            let bytes = &self.as_byte_slice()[start..start + length as usize];
            return Self::from_repr(Repr::inline(bytes));
        }
        match &self.repr {
            Repr::Heap(view) => Self::from_repr(Repr::Heap(HeapView {
                block: Rc::clone(&view.block),
                offset: view.offset + offset,
                len: length,
            })),
            _ => unreachable!("超过内联上限的内容必然位于堆块"),
        }
    }

    /// 丢弃前 `n` 字节。
    ///
    /// 堆模式只调整偏移与长度，不复制也不提前释放；内联模式需要把剩余字节前移。
    pub fn pop_front(&mut self, n: u32) -> Result<(), TendrilError> {
        self.check_pop(n, n)?;
        self.drop_front(n);
        Ok(())
    }

    /// 丢弃末尾 `n` 字节。
    pub fn pop_back(&mut self, n: u32) -> Result<(), TendrilError> {
        let len = self.len32();
        self.check_pop(n, len.saturating_sub(n))?;
        self.drop_back(n);
        Ok(())
    }

    fn check_pop(&self, n: u32, cut: u32) -> Result<(), TendrilError> {
        let len = self.len32();
        if n > len {
            return Err(TendrilError::Underflow { requested: n, len });
        }
        if !F::is_boundary(self.as_byte_slice(), cut as usize) {
            return Err(validation_failed::<F>());
        }
        Ok(())
    }

    pub(crate) fn drop_front(&mut self, n: u32) {
        let emptied = match &mut self.repr {
            Repr::Empty => false,
            Repr::Inline(buf) => {
                buf.drop_front(n as usize);
                buf.is_empty()
            }
            Repr::Heap(view) => {
                view.offset += n;
                view.len -= n;
                false
            }
        };
        if emptied {
            self.repr = Repr::Empty;
        }
    }

    pub(crate) fn drop_back(&mut self, n: u32) {
        let emptied = match &mut self.repr {
            Repr::Empty => false,
            Repr::Inline(buf) => {
                buf.drop_back(n as usize);
                buf.is_empty()
            }
            Repr::Heap(view) => {
                view.len -= n;
                false
            }
        };
        if emptied {
            self.repr = Repr::Empty;
        }
    }

    /// 长度归零。
    ///
    /// 独占的后备块被保留以便复用；共享块只是放弃引用，零长度视图没必要拖住它。
    pub fn clear(&mut self) {
        if let Repr::Heap(view) = &mut self.repr {
            if !view.is_shared() {
                view.offset = 0;
                view.len = 0;
                return;
            }
        }
        self.repr = Repr::Empty;
    }

    /// 释放持有的后备块（引用计数归零时回收）并重置为规范空值；重复调用无副作用。
    pub fn destroy(&mut self) {
        self.repr = Repr::Empty;
    }

    /// 校验格式后追加 `bytes`。
    pub fn try_push_bytes(&mut self, bytes: &[u8]) -> Result<(), TendrilError> {
        if !F::validate(bytes) {
            return Err(validation_failed::<F>());
        }
        self.push_joined(bytes)
    }

    /// 追加另一个同格式的 `Tendril`。
    ///
    /// 若 `other` 在同一后备块中紧接着 `self`，只需延长视图，不搬移任何字节。
    pub fn push_tendril(&mut self, other: &Self) -> Result<(), TendrilError> {
        let new_len = checked_len(self.len32(), other.len32() as usize)?;
        let rewrites_seam = F::join_fixup(self.as_byte_slice(), other.as_byte_slice()).is_some();
        if !rewrites_seam
            && let (Repr::Heap(mine), Repr::Heap(theirs)) = (&mut self.repr, &other.repr)
            && Rc::ptr_eq(&mine.block, &theirs.block)
            && theirs.offset == mine.end()
        {
            mine.len = new_len;
            return Ok(());
        }
        self.push_joined(other.as_byte_slice())
    }

    /// 追加已校验的 `bytes`；拼接点需要改写时（WTF-8 的代理对）把两侧的三字节合并为一个字符。
    ///
    /// 先完成可能失败的增长再改写内容，失败时值保持不变。
    fn push_joined(&mut self, bytes: &[u8]) -> Result<(), TendrilError> {
        let Some(joined) = F::join_fixup(self.as_byte_slice(), bytes) else {
            return self.push_bytes_unchecked(bytes);
        };
        let seam = self.len32() as usize - 3;
        let rest = &bytes[3..];
        self.grow_tail(1 + rest.len())?;
        let contents = self.make_exclusive()?;
        contents[seam..seam + 4].copy_from_slice(&joined);
        contents[seam + 4..].copy_from_slice(rest);
        Ok(())
    }

    /// 追加已知符合格式的字节。
    pub(crate) fn push_bytes_unchecked(&mut self, bytes: &[u8]) -> Result<(), TendrilError> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.grow_tail(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// 把长度增加 `additional`，返回新增的（零填充）尾部区域。
    ///
    /// # 执行逻辑（How）
    /// 1. 先做长度溢出检查，失败时不触碰任何状态；
    /// 2. 独占且容量充足的堆块直接就地增长；
    /// 3. 结果仍能内联时（包括小于阈值的共享视图）复制进内联区，不分配；
    /// 4. 其余情况分配新块：容量按倍增策略计算，复制现有内容后替换，
    ///    旧块的引用随之释放。
    pub(crate) fn grow_tail(&mut self, additional: usize) -> Result<&mut [u8], TendrilError> {
        let old_len = self.len32();
        let new_len = checked_len(old_len, additional)?;
        if additional == 0 {
            return Ok(&mut []);
        }
        let in_place = matches!(&self.repr, Repr::Heap(view) if view.can_grow_in_place(new_len));
        if !in_place && new_len as usize <= MAX_INLINE_LEN {
            let mut buf = InlineBuf::from_slice(self.as_byte_slice());
            buf.extend_zeroed(additional);
            self.repr = Repr::Inline(buf);
            return match &mut self.repr {
                Repr::Inline(buf) => Ok(&mut buf.as_mut_slice()[old_len as usize..]),
                _ => unreachable!("刚写入内联表示"),
            };
        }
        if !in_place {
            self.make_owned_with_capacity(new_len)?;
        }
        match &mut self.repr {
            Repr::Heap(view) => match view.grow_in_place(new_len - old_len) {
                Some(tail) => Ok(tail),
                None => unreachable!("make_owned_with_capacity 已保证独占"),
            },
            _ => unreachable!("make_owned_with_capacity 已迁移到堆模式"),
        }
    }

    /// 确保当前值独占一个至少能容纳 `new_len` 字节的后备块。
    ///
    /// 分配失败时返回错误且值保持不变。
    pub(crate) fn make_owned_with_capacity(&mut self, new_len: u32) -> Result<(), TendrilError> {
        let old_capacity = match &self.repr {
            Repr::Heap(view) if view.can_grow_in_place(new_len) => return Ok(()),
            // 共享视图只复制自己的那一段，倍增基数不能取整个后备块的容量。
            Repr::Heap(view) if view.is_shared() => view.len,
            Repr::Heap(view) => view.capacity(),
            _ => MAX_INLINE_LEN as u32,
        };
        let capacity = block::grown_capacity(new_len, old_capacity);
        let current = self.as_byte_slice();
        let len = current.len() as u32;
        let block = BackingBlock::copy_of(current, capacity)?;
        match &self.repr {
            Repr::Heap(view) if view.is_shared() => tracing::trace!(
                len,
                capacity,
                refcount = view.ref_count(),
                "copy-on-write: detaching from shared backing block"
            ),
            Repr::Heap(_) => tracing::trace!(len, capacity, "reallocating exclusive backing block"),
            _ => tracing::trace!(len, capacity, "promoting tendril to a heap backing block"),
        }
        self.repr = Repr::Heap(HeapView::new(block, len));
        Ok(())
    }

    /// 独占内容后返回可变切片；共享时先复制（写时复制）。
    pub(crate) fn make_exclusive(&mut self) -> Result<&mut [u8], TendrilError> {
        if self.is_shared() {
            let len = self.len32();
            if len as usize <= MAX_INLINE_LEN {
                self.repr = Repr::inline(self.as_byte_slice());
            } else {
                self.make_owned_with_capacity(len)?;
            }
        }
        match &mut self.repr {
            Repr::Empty => Ok(&mut []),
            Repr::Inline(buf) => Ok(buf.as_mut_slice()),
            Repr::Heap(view) => match view.as_mut_slice() {
                Some(bytes) => Ok(bytes),
                None => unreachable!("共享块已在上方复制"),
            },
        }
    }

    /// 把内容重新解释为未解释字节，不复制。
    pub fn into_bytes(self) -> ByteTendril {
        Tendril::from_repr(self.repr)
    }

    /// 零拷贝地转换为超集格式，例如 `Ascii` 到 `Utf8`；无需校验。
    pub fn into_superset<Super>(self) -> Tendril<Super>
    where
        F: SubsetOf<Super>,
        Super: Format,
    {
        Tendril::from_repr(self.repr)
    }

    /// 以超集格式借用当前值，不复制也不增加引用计数。
    ///
    /// 只提供共享借用：以超集身份修改内容可能破坏子集格式的不变式。
    pub fn as_superset<Super>(&self) -> &Tendril<Super>
    where
        F: SubsetOf<Super>,
        Super: Format,
    {
        // SAFETY: `Tendril` 是 `repr(transparent)`，不同格式参数的布局完全相同；
        // `F: SubsetOf<Super>` 保证当前内容同样满足 `Super` 的不变式。
        unsafe { &*(self as *const Self).cast::<Tendril<Super>>() }
    }

    /// 内容满足子集格式时零拷贝地转换，否则原样交还。
    pub fn try_into_subset<Sub>(self) -> Result<Tendril<Sub>, Self>
    where
        Sub: SubsetOf<F>,
    {
        if Sub::validate(self.as_byte_slice()) {
            Ok(Tendril::from_repr(self.repr))
        } else {
            Err(self)
        }
    }

    /// 内容满足子集格式时以该格式借用当前值。
    pub fn try_as_subset<Sub>(&self) -> Option<&Tendril<Sub>>
    where
        Sub: SubsetOf<F>,
    {
        if !Sub::validate(self.as_byte_slice()) {
            return None;
        }
        // SAFETY: 布局同 `as_superset`；内容刚通过 `Sub` 的校验，
        // 且共享借用期间内容不会被修改。
        Some(unsafe { &*(self as *const Self).cast::<Tendril<Sub>>() })
    }

    /// 在任意两种格式之间转换：内容满足目标格式时零拷贝，否则原样交还。
    pub fn try_reinterpret<G: Format>(self) -> Result<Tendril<G>, Self> {
        if G::validate(self.as_byte_slice()) {
            Ok(Tendril::from_repr(self.repr))
        } else {
            Err(self)
        }
    }

    /// 生成描述存储模式、长度与共享状态的诊断文本，例如
    /// `Tendril<Binary>(shared, 20 bytes: [...])`。不修改 `self`。
    pub fn describe(&self) -> Result<StrTendril, TendrilError> {
        StrTendril::format(format_args!("{self:?}"))
    }
}

pub(crate) fn validation_failed<F: Format>() -> TendrilError {
    TendrilError::ValidationFailed { format: F::NAME }
}

impl<F: Format> Clone for Tendril<F> {
    /// 堆模式只增加后备块引用计数，内联与空值按位复制。
    #[inline]
    fn clone(&self) -> Self {
        Self::from_repr(self.repr.clone())
    }
}

impl<F: Format> Default for Tendril<F> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Format> fmt::Debug for Tendril<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tendril<{}>({}, {} bytes: ",
            F::NAME,
            self.mode(),
            self.len32()
        )?;
        F::fmt_contents(self.as_byte_slice(), f)?;
        f.write_char(')')
    }
}

impl<F: Format> PartialEq for Tendril<F> {
    fn eq(&self, other: &Self) -> bool {
        self.as_byte_slice() == other.as_byte_slice()
    }
}

impl<F: Format> Eq for Tendril<F> {}

impl<F: Format> PartialOrd for Tendril<F> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<F: Format> Ord for Tendril<F> {
    /// 字节序比较；对 UTF-8 而言与按码点比较一致。
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_byte_slice().cmp(other.as_byte_slice())
    }
}

impl<F: Format> hash::Hash for Tendril<F> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.as_byte_slice().hash(state);
    }
}

// 不实现 `Borrow<str>`：`str` 与 `[u8]` 的哈希不同，会让以 `StrTendril` 为键的映射静默失效。
impl<F: Format> Borrow<[u8]> for Tendril<F> {
    fn borrow(&self) -> &[u8] {
        self.as_byte_slice()
    }
}

impl<F: Format> AsRef<[u8]> for Tendril<F> {
    fn as_ref(&self) -> &[u8] {
        self.as_byte_slice()
    }
}

impl<'a, F: Format> Extend<&'a Tendril<F>> for Tendril<F> {
    /// # Panics
    /// 超过长度上限或分配失败时 panic，与 `Vec::extend` 一致。
    fn extend<I: IntoIterator<Item = &'a Tendril<F>>>(&mut self, iter: I) {
        for tendril in iter {
            expect_grown(self.push_tendril(tendril));
        }
    }
}

impl<'a, F: Format> FromIterator<&'a Tendril<F>> for Tendril<F> {
    fn from_iter<I: IntoIterator<Item = &'a Tendril<F>>>(iter: I) -> Self {
        let mut output = Self::new();
        output.extend(iter);
        output
    }
}

/// 供无法返回错误的标准 trait 使用。
#[track_caller]
pub(crate) fn expect_grown(result: Result<(), TendrilError>) {
    if let Err(err) = result {
        panic!("tendril growth failed: {err}");
    }
}

/// 为切片提供 `to_tendril` 便捷方法。
pub trait SliceExt {
    type Output;

    fn to_tendril(&self) -> Result<Self::Output, TendrilError>;
}

impl SliceExt for str {
    type Output = StrTendril;

    fn to_tendril(&self) -> Result<StrTendril, TendrilError> {
        StrTendril::from_slice(self)
    }
}

impl SliceExt for [u8] {
    type Output = ByteTendril;

    fn to_tendril(&self) -> Result<ByteTendril, TendrilError> {
        ByteTendril::from_slice(self)
    }
}

#[cfg(test)]
mod tests {
    use core::mem;

    use super::*;

    #[test]
    fn value_stays_within_three_words() {
        assert!(mem::size_of::<ByteTendril>() <= 3 * mem::size_of::<usize>());
        assert_eq!(
            mem::size_of::<Option<ByteTendril>>(),
            mem::size_of::<ByteTendril>()
        );
    }

    #[test]
    fn shared_small_view_grows_back_into_inline_storage() {
        let source = ByteTendril::from_slice(b"0123456789abcdefghij").expect("构造堆值");
        let mut view = source.clone();
        view.pop_back(12).expect("弹出尾部");
        assert_eq!(view.mode(), StorageMode::Shared);
        view.push_slice(b"!").expect("追加单字节");
        assert_eq!(view.mode(), StorageMode::Inline);
        assert_eq!(&*view, b"01234567!");
        assert_eq!(source.mode(), StorageMode::Owned);
    }

    #[test]
    fn adjacent_views_concatenate_without_copy() {
        let source = ByteTendril::from_slice(b"abcdefghijklmnopqrstuvwxyz0123456789").expect("构造堆值");
        let mut head = source.subtendril(0, 16).expect("前半段");
        let tail = source.subtendril(16, 20).expect("后半段");
        head.push_tendril(&tail).expect("拼接相邻视图");
        assert!(head.is_shared_with(&source));
        assert_eq!(head, source);
    }
}
