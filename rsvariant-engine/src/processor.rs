use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::compiler::{NameSpace, RuleCompiler};
use crate::core::{EvalTrace, RoleColumns, RolePresence, Rule, TraceMode};
use crate::error::ParseResult;

/// 一条已编译的变体规则（规则文件中的一行）
#[derive(Debug, Clone, Serialize)]
pub struct VariantRule {
    pub code: String,
    pub rule: Arc<Rule>,
}

/// 一个子系统编译完成的规则集
/// 变体规则按文件顺序排列，首次匹配生效
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubsystemRules {
    pub name: String,
    pub variants: Vec<VariantRule>,
    /// 整个规则集中累计的未解析标识符
    pub unresolved: BTreeSet<String>,
    /// 成功绑定的定义数
    pub definitions: usize,
}

impl SubsystemRules {
    /// 第一条满足的变体规则
    pub fn classify<R: RolePresence + ?Sized>(&self, roles: &R) -> Option<&VariantRule> {
        self.variants.iter().find(|v| v.rule.check(roles))
    }

    /// 重放一条变体规则并返回求值轨迹
    pub fn trace<R: RolePresence + ?Sized>(
        &self,
        code: &str,
        roles: &R,
        mode: TraceMode,
    ) -> Option<(bool, EvalTrace)> {
        let variant = self.variants.iter().find(|v| v.code == code)?;
        let mut trace = EvalTrace::new(mode);
        let found = variant.rule.evaluate(roles, &mut trace);
        Some((found, trace))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.code.as_str())
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// 规则处理器：在一个名字空间上依次编译定义行与变体规则行
#[derive(Debug, Clone)]
pub struct RuleProcessor {
    name: String,
    names: NameSpace,
    compiler: RuleCompiler,
    variants: Vec<VariantRule>,
    definitions: usize,
}

impl RuleProcessor {
    /// 空名字空间（只能引用之后定义的名字）
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_namespace(name, NameSpace::new())
    }

    /// 以子系统角色列初始化名字空间
    pub fn with_columns(columns: &RoleColumns) -> Self {
        Self::with_namespace(columns.name.clone(), NameSpace::with_columns(columns))
    }

    pub fn with_namespace(name: impl Into<String>, names: NameSpace) -> Self {
        Self {
            name: name.into(),
            names,
            compiler: RuleCompiler::new(),
            variants: Vec::new(),
            definitions: 0,
        }
    }

    /// 编译定义行并绑定名字，后续行可引用
    pub fn define(&mut self, name: &str, expression: &str) -> ParseResult<()> {
        self.compiler
            .compile_definition(name, expression, &mut self.names)?;
        self.definitions += 1;
        Ok(())
    }

    /// 编译一条变体规则，追加到首次匹配序列末尾
    pub fn add_variant(&mut self, code: &str, expression: &str) -> ParseResult<()> {
        let rule = self.compiler.compile(expression, &mut self.names)?;
        self.variants.push(VariantRule {
            code: code.to_string(),
            rule: Arc::new(rule),
        });
        Ok(())
    }

    pub fn namespace(&self) -> &NameSpace {
        &self.names
    }

    pub fn failed_count(&self) -> usize {
        self.compiler.failed_count()
    }

    pub fn finish(mut self) -> SubsystemRules {
        let unresolved = self.names.take_unresolved();
        log::debug!(
            "子系统规则编译完成：{} | definitions={}, variants={}, failed={}, unresolved={}",
            self.name,
            self.definitions,
            self.variants.len(),
            self.compiler.failed_count(),
            unresolved.len()
        );
        SubsystemRules {
            name: self.name,
            variants: self.variants,
            unresolved,
            definitions: self.definitions,
        }
    }
}
