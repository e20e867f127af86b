use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use super::trace::{NoTrace, RolePresence, Tracer};

/// 列表规则模式
/// - And：阈值 = 当前子规则数量（随子规则增加而增长）
/// - Or：阈值固定为 1
/// - AtLeast：显式阈值（`N of {...}`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMode {
    And,
    Or,
    AtLeast,
}

impl ListMode {
    /// 连接关键字（AtLeast没有中缀关键字）
    pub fn keyword(self) -> &'static str {
        match self {
            ListMode::And => "and",
            ListMode::Or => "or",
            ListMode::AtLeast => "of",
        }
    }
}

/// And 的阈值随子规则数量增长，Or 固定为 1
#[inline]
fn list_threshold(mode: ListMode, count: usize, len: usize) -> usize {
    match mode {
        ListMode::And => len,
        ListMode::Or => 1,
        ListMode::AtLeast => count,
    }
}

/// 规则树节点
/// 封闭的枚举类型，check / 文本输出 / 结构相等 全部穷尽匹配
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Rule {
    /// 角色存在即满足；label 为打印用缩写，不参与相等比较
    Primitive { role: String, label: Option<String> },
    /// 取反
    Not(Box<Rule>),
    /// 至少 threshold 个子规则满足
    List {
        mode: ListMode,
        count: usize,
        children: Vec<Rule>,
    },
    /// 无法解析的标识符，永远不满足
    Fail(String),
    /// 解析期括号占位，求值时透明；编译器返回前会被完全剥离
    Placeholder(Option<Box<Rule>>),
}

impl Rule {
    /// 角色原子规则
    pub fn primitive(role: impl Into<String>) -> Self {
        Rule::Primitive {
            role: role.into(),
            label: None,
        }
    }

    /// 带缩写的角色原子规则
    pub fn labeled(role: impl Into<String>, label: impl Into<String>) -> Self {
        Rule::Primitive {
            role: role.into(),
            label: Some(label.into()),
        }
    }

    pub fn not(child: Rule) -> Self {
        Rule::Not(Box::new(child))
    }

    pub fn and(children: Vec<Rule>) -> Self {
        Rule::List {
            mode: ListMode::And,
            count: children.len(),
            children,
        }
    }

    pub fn or(children: Vec<Rule>) -> Self {
        Rule::List {
            mode: ListMode::Or,
            count: 1,
            children,
        }
    }

    pub fn at_least(count: usize, children: Vec<Rule>) -> Self {
        Rule::List {
            mode: ListMode::AtLeast,
            count,
            children,
        }
    }

    /// 列表规则的有效阈值
    pub fn threshold(&self) -> Option<usize> {
        match self.unwrapped() {
            Rule::List {
                mode,
                count,
                children,
            } => Some(list_threshold(*mode, *count, children.len())),
            _ => None,
        }
    }

    /// 检查规则是否满足（纯函数，无追踪）
    #[inline]
    pub fn check<R: RolePresence + ?Sized>(&self, roles: &R) -> bool {
        self.evaluate(roles, &mut NoTrace)
    }

    /// 带追踪的求值
    /// 列表从左到右求值，满足阈值后短路；追踪器要求完整诊断时不短路
    pub fn evaluate<R, T>(&self, roles: &R, tracer: &mut T) -> bool
    where
        R: RolePresence + ?Sized,
        T: Tracer + ?Sized,
    {
        match self {
            Rule::Primitive { role, label } => {
                let found = roles.has_role(role);
                tracer.record(role, label.as_deref(), found);
                found
            }
            Rule::Not(child) => !child.evaluate(roles, tracer),
            Rule::List {
                mode,
                count,
                children,
            } => {
                let needed = list_threshold(*mode, *count, children.len());
                let exhaustive = tracer.exhaustive();
                let mut satisfied = 0;
                for child in children {
                    if satisfied >= needed && !exhaustive {
                        break;
                    }
                    if child.evaluate(roles, tracer) {
                        satisfied += 1;
                    }
                }
                satisfied >= needed
            }
            Rule::Fail(_) => false,
            Rule::Placeholder(inner) => inner
                .as_deref()
                .is_some_and(|rule| rule.evaluate(roles, tracer)),
        }
    }

    /// 剥离占位包装，返回第一个具体节点
    pub fn unwrapped(&self) -> &Rule {
        let mut current = self;
        while let Rule::Placeholder(Some(inner)) = current {
            current = inner;
        }
        current
    }

    /// 递归剥离整棵树中的所有占位包装
    pub fn unspool(self) -> Rule {
        match self {
            Rule::Placeholder(Some(inner)) => inner.unspool(),
            Rule::Not(child) => Rule::Not(Box::new(child.unspool())),
            Rule::List {
                mode,
                count,
                children,
            } => Rule::List {
                mode,
                count,
                children: children.into_iter().map(Rule::unspool).collect(),
            },
            other => other,
        }
    }

    /// 树中是否仍有占位节点
    pub fn has_placeholder(&self) -> bool {
        match self {
            Rule::Placeholder(_) => true,
            Rule::Not(child) => child.has_placeholder(),
            Rule::List { children, .. } => children.iter().any(Rule::has_placeholder),
            _ => false,
        }
    }

    /// 收集树中所有Fail节点的名字
    pub fn failures(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_failures(&mut out);
        out
    }

    fn collect_failures<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self.unwrapped() {
            Rule::Fail(name) => out.push(name),
            Rule::Not(child) => child.collect_failures(out),
            Rule::List { children, .. } => {
                children.iter().for_each(|c| c.collect_failures(out))
            }
            _ => {}
        }
    }

    /// 输出规则语言文本
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// 作为复合表达式的操作数时是否需要加括号
    fn needs_parens(&self) -> bool {
        match self.unwrapped() {
            Rule::List { children, .. } => children.len() > 1 || self.is_count_list(),
            _ => false,
        }
    }

    fn is_count_list(&self) -> bool {
        matches!(
            self.unwrapped(),
            Rule::List {
                mode: ListMode::AtLeast,
                ..
            }
        )
    }

    fn fmt_operand(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.needs_parens() {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// 结构相等：双方都剥离占位包装后逐层比较
impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        match (self.unwrapped(), other.unwrapped()) {
            (Rule::Primitive { role: a, .. }, Rule::Primitive { role: b, .. }) => a == b,
            (Rule::Not(a), Rule::Not(b)) => a == b,
            (
                Rule::List {
                    mode: ma,
                    count: na,
                    children: ca,
                },
                Rule::List {
                    mode: mb,
                    count: nb,
                    children: cb,
                },
            ) => {
                ma == mb
                    && list_threshold(*ma, *na, ca.len()) == list_threshold(*mb, *nb, cb.len())
                    && ca == cb
            }
            (Rule::Fail(a), Rule::Fail(b)) => a == b,
            (Rule::Placeholder(None), Rule::Placeholder(None)) => true,
            _ => false,
        }
    }
}

impl Eq for Rule {}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.unwrapped() {
            Rule::Primitive { role, label } => f.write_str(label.as_deref().unwrap_or(role)),
            Rule::Not(child) => {
                f.write_str("not ")?;
                child.fmt_operand(f)
            }
            Rule::List {
                mode: ListMode::AtLeast,
                count,
                children,
            } => {
                write!(f, "{} of {{", count)?;
                for (idx, child) in children.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    child.fmt_operand(f)?;
                }
                f.write_str("}")
            }
            Rule::List { mode, children, .. } => {
                for (idx, child) in children.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " {} ", mode.keyword())?;
                    }
                    child.fmt_operand(f)?;
                }
                Ok(())
            }
            Rule::Fail(name) => f.write_str(name),
            Rule::Placeholder(_) => Ok(()),
        }
    }
}
