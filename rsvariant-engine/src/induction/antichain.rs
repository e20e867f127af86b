use std::sync::Arc;

use super::rule_bits::RuleBits;
use crate::core::RoleColumns;
use crate::error::{CoreError, CoreResult};

/// RuleBits 反链：任意两个成员互不包含
/// 保存某个变体观察到的最一般（所需角色最少）的不同角色组合
#[derive(Debug, Clone)]
pub struct Antichain {
    context: Arc<RoleColumns>,
    members: Vec<RuleBits>,
}

impl Antichain {
    pub fn new(context: Arc<RoleColumns>) -> Self {
        Self {
            context,
            members: Vec::new(),
        }
    }

    pub fn context(&self) -> &Arc<RoleColumns> {
        &self.context
    }

    /// 合并新位图
    /// - 已有成员包含于新位图（或相等）：丢弃新位图
    /// - 否则移除所有被新位图包含的成员，再插入新位图
    ///
    /// 返回是否插入
    pub fn merge(&mut self, new: RuleBits) -> CoreResult<bool> {
        if !(Arc::ptr_eq(&self.context, new.context())
            || self.context.same_context(new.context()))
        {
            return Err(CoreError::ContextMismatch {
                expected: self.context.name.clone(),
                found: new.context().name.clone(),
            });
        }
        if self.members.iter().any(|m| m.subsumes(&new)) {
            return Ok(false);
        }
        self.members.retain(|m| !new.subsumes(m));
        self.members.push(new);
        Ok(true)
    }

    /// 所有成员的按位与；空反链返回全零位图
    pub fn intersection(&self) -> RuleBits {
        let mut iter = self.members.iter();
        match iter.next() {
            Some(first) => iter.fold(first.clone(), |acc, m| acc.intersect(m)),
            None => RuleBits::empty(&self.context),
        }
    }

    /// 是否存在成员包含于 bits
    pub fn covers(&self, bits: &RuleBits) -> bool {
        self.members.iter().any(|m| m.subsumes(bits))
    }

    pub fn members(&self) -> &[RuleBits] {
        &self.members
    }

    /// 输出顺序：置位数降序，同数量时按列位置
    pub fn sorted(&self) -> Vec<&RuleBits> {
        let mut list: Vec<&RuleBits> = self.members.iter().collect();
        list.sort_by(|a, b| {
            b.count()
                .cmp(&a.count())
                .then_with(|| a.indices().cmp(b.indices()))
        });
        list
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RoleColumn;
    use proptest::prelude::*;

    fn context() -> Arc<RoleColumns> {
        Arc::new(RoleColumns::new(
            "chain",
            (0..8)
                .map(|i| RoleColumn::new(format!("Role{}", i), format!("r{}", i)))
                .collect(),
        ))
    }

    #[test]
    fn test_merge_keeps_most_general_members() {
        let ctx = context();
        let mut chain = Antichain::new(ctx.clone());

        assert!(chain.merge(RuleBits::from_indices(&ctx, [0, 1, 2])).unwrap());
        assert!(chain.merge(RuleBits::from_indices(&ctx, [3, 4])).unwrap());
        // 被更一般的新成员替换
        assert!(chain.merge(RuleBits::from_indices(&ctx, [0, 1])).unwrap());
        // 已有成员包含于新位图，丢弃
        assert!(!chain.merge(RuleBits::from_indices(&ctx, [0, 1, 5])).unwrap());
        // 相等，丢弃
        assert!(!chain.merge(RuleBits::from_indices(&ctx, [3, 4])).unwrap());

        assert_eq!(chain.len(), 2);
        assert!(chain.covers(&RuleBits::from_indices(&ctx, [0, 1, 7])));
        assert!(!chain.covers(&RuleBits::from_indices(&ctx, [0, 3])));
        assert!(RuleBits::from_indices(&ctx, [3, 4, 6]).matches(&chain));

        let order: Vec<String> = chain.sorted().iter().map(|b| b.to_conjunction()).collect();
        assert_eq!(order, vec!["r0 and r1", "r3 and r4"]);
    }

    #[test]
    fn test_intersection_identity_and_empty() {
        let ctx = context();
        let mut chain = Antichain::new(ctx.clone());
        assert!(chain.intersection().is_empty());

        let a = RuleBits::from_indices(&ctx, [1, 2, 3]);
        a.clone().merge_into(&mut chain).unwrap();
        assert_eq!(chain.intersection(), a);

        RuleBits::from_indices(&ctx, [2, 3, 4]).merge_into(&mut chain).unwrap();
        assert_eq!(chain.intersection(), RuleBits::from_indices(&ctx, [2, 3]));
    }

    #[test]
    fn test_merge_rejects_foreign_context() {
        let ctx = context();
        let foreign = Arc::new(RoleColumns::new("elsewhere", ctx.columns.clone()));
        let mut chain = Antichain::new(ctx);
        let err = chain.merge(RuleBits::from_indices(&foreign, [0])).unwrap_err();
        assert!(matches!(err, CoreError::ContextMismatch { .. }));
    }

    proptest! {
        #[test]
        fn merge_never_leaves_comparable_members(
            rows in prop::collection::vec(prop::collection::vec(0usize..8, 1..5), 1..20)
        ) {
            let ctx = context();
            let mut chain = Antichain::new(ctx.clone());
            for row in &rows {
                chain.merge(RuleBits::from_indices(&ctx, row.iter().copied())).unwrap();
            }
            let members = chain.members();
            for (i, a) in members.iter().enumerate() {
                for b in members.iter().skip(i + 1) {
                    prop_assert!(!a.subsumes(b) && !b.subsumes(a));
                }
            }
            // 每一行都被反链覆盖
            for row in &rows {
                prop_assert!(chain.covers(&RuleBits::from_indices(&ctx, row.iter().copied())));
            }
        }
    }
}
