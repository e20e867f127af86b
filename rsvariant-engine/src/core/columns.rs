use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// 子系统中的单个角色列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleColumn {
    /// 稳定的角色ID
    pub id: String,
    /// 角色缩写（规则文本中使用）
    #[serde(alias = "abbreviation")]
    pub abbr: String,
    /// 辅助角色：归纳时忽略
    #[serde(default)]
    pub auxiliary: bool,
}

impl RoleColumn {
    pub fn new(id: impl Into<String>, abbr: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            abbr: abbr.into(),
            auxiliary: false,
        }
    }

    pub fn auxiliary(mut self, auxiliary: bool) -> Self {
        self.auxiliary = auxiliary;
        self
    }
}

/// 规则族上下文：一个子系统的有序角色列
/// RuleBits 只有在同一上下文下才可比较
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleColumns {
    pub name: String,
    pub columns: Vec<RoleColumn>,
}

impl RoleColumns {
    pub fn new(name: impl Into<String>, columns: Vec<RoleColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&RoleColumn> {
        self.columns.get(idx)
    }

    /// 列缩写（越界时回退为列号，保证输出可读）
    pub fn abbr(&self, idx: usize) -> &str {
        self.columns.get(idx).map_or("?", |c| c.abbr.as_str())
    }

    pub fn is_auxiliary(&self, idx: usize) -> bool {
        self.columns.get(idx).is_some_and(|c| c.auxiliary)
    }

    /// 非辅助列下标
    pub fn primary_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.auxiliary)
            .map(|(idx, _)| idx)
    }

    /// 同一上下文判定：名字与列数一致
    pub fn same_context(&self, other: &RoleColumns) -> bool {
        self.name == other.name && self.columns.len() == other.columns.len()
    }

    /// 校验缩写不含空白、分隔符，且互不重复（否则生成的规则无法回读）
    pub fn validate(&self) -> CoreResult<()> {
        let mut seen = FxHashSet::default();
        for column in &self.columns {
            let abbr = column.abbr.as_str();
            if abbr.is_empty()
                || abbr.starts_with('(')
                || abbr.chars().any(|c| c.is_whitespace() || matches!(c, '{' | '}' | ','))
                || !balanced_parens(abbr)
                || crate::compiler::is_keyword(abbr)
            {
                return Err(CoreError::InvalidInput(format!(
                    "role abbreviation `{}` cannot be used as a rule identifier",
                    abbr
                )));
            }
            if !seen.insert(abbr) {
                return Err(CoreError::InvalidInput(format!(
                    "duplicate role abbreviation `{}` in subsystem `{}`",
                    abbr, self.name
                )));
            }
        }
        Ok(())
    }
}

/// 标识符内部的括号必须成对（令牌化时才会留在同一个标识符里）
fn balanced_parens(word: &str) -> bool {
    let mut depth = 0usize;
    for c in word.chars() {
        match c {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

/// 归纳用的历史样本行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleRow {
    pub genome: String,
    pub variant: String,
    /// 非活跃行不参与归纳
    #[serde(default = "default_active")]
    pub active: bool,
    /// 每个角色列对应的特征ID集合（空集合表示角色缺失）
    pub cells: Vec<Vec<String>>,
}

fn default_active() -> bool {
    true
}

impl ExampleRow {
    pub fn new(
        genome: impl Into<String>,
        variant: impl Into<String>,
        cells: Vec<Vec<String>>,
    ) -> Self {
        Self {
            genome: genome.into(),
            variant: variant.into(),
            active: true,
            cells,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// 第 idx 列是否有特征
    pub fn has_column(&self, idx: usize) -> bool {
        self.cells.get(idx).is_some_and(|c| !c.is_empty())
    }

    /// 该行对应的角色存在集合（包含辅助角色）
    pub fn role_set(&self, columns: &RoleColumns) -> FxHashSet<String> {
        columns
            .columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.has_column(*idx))
            .map(|(_, c)| c.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> RoleColumns {
        RoleColumns::new(
            "Methylmalonyl-CoA pathway",
            vec![
                RoleColumn::new("MethCoaMuta", "1.3"),
                RoleColumn::new("MalyCoaLyas", "mcl1"),
                RoleColumn::new("TranRegu", "reg").auxiliary(true),
            ],
        )
    }

    #[test]
    fn test_primary_indices_skip_auxiliary() {
        let cols = columns();
        assert_eq!(cols.primary_indices().collect::<Vec<_>>(), vec![0, 1]);
        assert!(cols.is_auxiliary(2));
        assert_eq!(cols.abbr(1), "mcl1");
    }

    #[test]
    fn test_role_set_includes_auxiliary_roles() {
        let row = ExampleRow::new(
            "83333.1",
            "1",
            vec![vec!["fig|83333.1.peg.1".into()], vec![], vec!["fig|83333.1.peg.9".into()]],
        );
        let set = row.role_set(&columns());
        assert!(set.contains("MethCoaMuta"));
        assert!(set.contains("TranRegu"));
        assert!(!set.contains("MalyCoaLyas"));
    }

    #[test]
    fn test_validate_rejects_unusable_abbreviations() {
        assert!(columns().validate().is_ok());
        let bad = RoleColumns::new("s", vec![RoleColumn::new("R", "two words")]);
        assert!(matches!(bad.validate(), Err(CoreError::InvalidInput(_))));
        let dup = RoleColumns::new("s", vec![RoleColumn::new("R1", "a"), RoleColumn::new("R2", "a")]);
        assert!(dup.validate().is_err());
    }

    #[test]
    fn test_validate_requires_balanced_parens() {
        for abbr in ["pcc)", "x(a", "a)(b", "x(a))"] {
            let cols = RoleColumns::new("s", vec![RoleColumn::new("R", abbr)]);
            assert!(
                matches!(cols.validate(), Err(CoreError::InvalidInput(_))),
                "`{}` should be rejected",
                abbr
            );
        }
        let nested = RoleColumns::new("s", vec![RoleColumn::new("R", "1.3s1(a(b))")]);
        assert!(nested.validate().is_ok());
    }
}
