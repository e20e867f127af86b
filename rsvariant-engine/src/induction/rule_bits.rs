use rustc_hash::FxHasher;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::antichain::Antichain;
use crate::core::{ExampleRow, RoleColumns};
use crate::error::{CoreError, CoreResult};

const WORD_BITS: usize = u64::BITS as usize;

/// 子集关系比较结果（兼容 -1 / 1 / 0 编码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsumption {
    /// 左侧的置位全部出现在右侧（左侧更一般，或两者相等）
    Subsumes,
    /// 右侧的置位全部出现在左侧
    SubsumedBy,
    /// 互不包含，或上下文不同
    Incomparable,
}

impl Subsumption {
    pub fn as_i8(self) -> i8 {
        match self {
            Subsumption::Subsumes => -1,
            Subsumption::SubsumedBy => 1,
            Subsumption::Incomparable => 0,
        }
    }
}

/// 角色列位图
/// 宽度 = 子系统角色列数；置位数与快速哈希在构造时缓存，构造后不可变
#[derive(Debug, Clone)]
pub struct RuleBits {
    context: Arc<RoleColumns>,
    words: Vec<u64>,
    count: usize,
    hash: u64,
}

impl RuleBits {
    /// 全零位图
    pub fn empty(context: &Arc<RoleColumns>) -> Self {
        let words = vec![0; context.len().div_ceil(WORD_BITS)];
        Self::from_words(context.clone(), words)
    }

    /// 按列下标构造（越界下标忽略）
    pub fn from_indices<I>(context: &Arc<RoleColumns>, indices: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let width = context.len();
        let mut words = vec![0u64; width.div_ceil(WORD_BITS)];
        for idx in indices.into_iter().filter(|idx| *idx < width) {
            words[idx / WORD_BITS] |= 1u64 << (idx % WORD_BITS);
        }
        Self::from_words(context.clone(), words)
    }

    /// 由样本行构造：特征集合非空且不是辅助角色的列置位
    pub fn from_row(context: &Arc<RoleColumns>, row: &ExampleRow) -> CoreResult<Self> {
        if row.cells.len() != context.len() {
            return Err(CoreError::InvalidInput(format!(
                "row for genome `{}` has {} cells, subsystem `{}` has {} roles",
                row.genome,
                row.cells.len(),
                context.name,
                context.len()
            )));
        }
        Ok(Self::from_indices(
            context,
            (0..context.len()).filter(|idx| row.has_column(*idx) && !context.is_auxiliary(*idx)),
        ))
    }

    /// 全部非辅助角色
    pub fn all_primary(context: &Arc<RoleColumns>) -> Self {
        Self::from_indices(context, context.primary_indices())
    }

    fn from_words(context: Arc<RoleColumns>, words: Vec<u64>) -> Self {
        let count = words.iter().map(|w| w.count_ones() as usize).sum();
        let mut hasher = FxHasher::default();
        words.hash(&mut hasher);
        Self {
            context,
            words,
            count,
            hash: hasher.finish(),
        }
    }

    pub fn context(&self) -> &Arc<RoleColumns> {
        &self.context
    }

    /// 置位数量
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// 缓存的快速哈希
    pub fn fast_hash(&self) -> u64 {
        self.hash
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.words
            .get(idx / WORD_BITS)
            .is_some_and(|w| w & (1u64 << (idx % WORD_BITS)) != 0)
    }

    /// 置位的列下标（升序）
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w_idx, word)| {
            (0..WORD_BITS)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| w_idx * WORD_BITS + bit)
        })
    }

    pub fn same_context(&self, other: &RuleBits) -> bool {
        Arc::ptr_eq(&self.context, &other.context) || self.context.same_context(&other.context)
    }

    fn is_subset_of(&self, other: &RuleBits) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .all(|(a, b)| a & !b == 0)
    }

    /// 子集关系比较；置位较多的一方与较少的一方交换后判断
    pub fn subsume_compare(&self, other: &RuleBits) -> Subsumption {
        if !self.same_context(other) {
            return Subsumption::Incomparable;
        }
        if self.count <= other.count {
            if self.is_subset_of(other) {
                Subsumption::Subsumes
            } else {
                Subsumption::Incomparable
            }
        } else if other.is_subset_of(self) {
            Subsumption::SubsumedBy
        } else {
            Subsumption::Incomparable
        }
    }

    /// self 的每个置位都在 other 中（相等也算）
    pub fn subsumes(&self, other: &RuleBits) -> bool {
        self.subsume_compare(other) == Subsumption::Subsumes
    }

    /// 按位与
    pub fn intersect(&self, other: &RuleBits) -> RuleBits {
        debug_assert!(self.same_context(other));
        let words = self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| a & b)
            .collect();
        Self::from_words(self.context.clone(), words)
    }

    /// 差集：self 中有而 other 中没有的位
    pub fn minus(&self, other: &RuleBits) -> RuleBits {
        debug_assert!(self.same_context(other));
        let words = self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| a & !b)
            .collect();
        Self::from_words(self.context.clone(), words)
    }

    /// 合并进反链（见 Antichain::merge）
    pub fn merge_into(self, collection: &mut Antichain) -> CoreResult<bool> {
        collection.merge(self)
    }

    /// 反链中存在某个成员包含于 self
    pub fn matches(&self, collection: &Antichain) -> bool {
        collection.covers(self)
    }

    /// 角色缩写合取文本，例如 `a and b and c`
    pub fn to_conjunction(&self) -> String {
        self.indices()
            .map(|idx| self.context.abbr(idx))
            .collect::<Vec<_>>()
            .join(" and ")
    }

    /// 作为复合表达式操作数的文本（多于一个角色时加括号）
    pub fn to_operand(&self) -> String {
        if self.count > 1 {
            format!("({})", self.to_conjunction())
        } else {
            self.to_conjunction()
        }
    }
}

impl PartialEq for RuleBits {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count
            && self.hash == other.hash
            && self.same_context(other)
            && self.words == other.words
    }
}

impl Eq for RuleBits {}

impl Hash for RuleBits {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.context.name.hash(state);
        self.hash.hash(state);
    }
}

/// 全序：置位数降序 → 上下文 → 快速哈希 → 逐位比较（先置位者在前）
impl Ord for RuleBits {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .count
            .cmp(&self.count)
            .then_with(|| self.context.name.cmp(&other.context.name))
            .then_with(|| self.context.len().cmp(&other.context.len()))
            .then_with(|| self.hash.cmp(&other.hash))
            .then_with(|| {
                for (a, b) in self.words.iter().zip(&other.words) {
                    let diff = a ^ b;
                    if diff != 0 {
                        let bit = 1u64 << diff.trailing_zeros();
                        return if a & bit != 0 {
                            Ordering::Less
                        } else {
                            Ordering::Greater
                        };
                    }
                }
                Ordering::Equal
            })
    }
}

impl PartialOrd for RuleBits {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
