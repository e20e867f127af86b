use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

use crate::core::{RoleColumns, Rule};

/// 名字空间：标识符 → 规则 的绑定，以及编译期间累计的未解析标识符
///
/// 一个名字空间只服务于一条编译序列（编译时需要 `&mut`），
/// 独立的规则集合应各自使用独立的名字空间。
#[derive(Debug, Clone, Default)]
pub struct NameSpace {
    bindings: FxHashMap<String, Rule>,
    unresolved: BTreeSet<String>,
}

impl NameSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用子系统角色列初始化：缩写与角色ID都绑定到对应的角色原子规则
    pub fn with_columns(columns: &RoleColumns) -> Self {
        let mut ns = Self::new();
        for column in &columns.columns {
            ns.define_role(&column.abbr, &column.id);
        }
        ns
    }

    /// 绑定一个角色缩写（角色ID自身也可直接引用）
    pub fn define_role(&mut self, abbr: &str, role_id: &str) {
        let rule = Rule::labeled(role_id, abbr);
        self.bindings
            .entry(role_id.to_string())
            .or_insert_with(|| Rule::primitive(role_id));
        self.bindings.insert(abbr.to_string(), rule);
    }

    /// 定义（或覆盖）一个具名规则，返回被覆盖的旧规则
    pub fn define(&mut self, name: impl Into<String>, rule: Rule) -> Option<Rule> {
        self.bindings.insert(name.into(), rule)
    }

    pub fn resolve(&self, name: &str) -> Option<&Rule> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// 记录一个无法解析的标识符
    pub(crate) fn mark_unresolved(&mut self, name: &str) {
        if self.unresolved.insert(name.to_string()) {
            log::debug!("Unresolved rule identifier: {}", name);
        }
    }

    /// 累计的未解析标识符（有序）
    pub fn unresolved(&self) -> &BTreeSet<String> {
        &self.unresolved
    }

    pub fn has_unresolved(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// 取出并清空未解析标识符
    pub fn take_unresolved(&mut self) -> BTreeSet<String> {
        std::mem::take(&mut self.unresolved)
    }
}
