use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::hash::BuildHasher;

/// 角色存在集合抽象
/// check只需要成员判断，任意集合类型都可以作为输入
pub trait RolePresence {
    fn has_role(&self, role: &str) -> bool;
}

impl<S: BuildHasher> RolePresence for HashSet<String, S> {
    #[inline]
    fn has_role(&self, role: &str) -> bool {
        self.contains(role)
    }
}

impl RolePresence for BTreeSet<String> {
    #[inline]
    fn has_role(&self, role: &str) -> bool {
        self.contains(role)
    }
}

impl RolePresence for [&str] {
    #[inline]
    fn has_role(&self, role: &str) -> bool {
        self.iter().any(|r| *r == role)
    }
}

impl<T: RolePresence + ?Sized> RolePresence for &T {
    #[inline]
    fn has_role(&self, role: &str) -> bool {
        (**self).has_role(role)
    }
}

/// 默认的角色集合类型
pub type RoleSet = FxHashSet<String>;

/// 诊断模式
/// - ShortCircuit：列表满足阈值后立即返回，只记录实际访问过的子规则
/// - Exhaustive：关闭短路，记录所有角色的命中状态（逻辑结果不变）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    #[default]
    ShortCircuit,
    Exhaustive,
}

/// 求值追踪器
/// Primitive节点每次被检查都会回调record，取代原先挂在节点上的可变计数器
pub trait Tracer {
    /// 记录一次角色检查结果
    fn record(&mut self, role: &str, label: Option<&str>, found: bool);

    /// 是否需要完整诊断（关闭列表短路）
    fn exhaustive(&self) -> bool {
        false
    }
}

/// 空追踪器：零开销，并行投影时使用
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrace;

impl Tracer for NoTrace {
    #[inline(always)]
    fn record(&mut self, _role: &str, _label: Option<&str>, _found: bool) {}
}

/// 单条追踪记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub role: String,
    pub label: Option<String>,
    pub found: bool,
}

impl TraceEntry {
    /// 展示名：优先缩写，其次角色ID
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.role)
    }
}

/// 按调用作用域收集的追踪结果，以返回值形式交给调用方
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalTrace {
    pub mode: TraceMode,
    pub entries: Vec<TraceEntry>,
}

impl EvalTrace {
    pub fn new(mode: TraceMode) -> Self {
        Self {
            mode,
            entries: Vec::new(),
        }
    }

    /// 命中的角色（按访问顺序，去重）
    pub fn found(&self) -> Vec<&str> {
        self.collect(true)
    }

    /// 未命中的角色（按访问顺序，去重）
    pub fn not_found(&self) -> Vec<&str> {
        self.collect(false)
    }

    fn collect(&self, found: bool) -> Vec<&str> {
        let mut seen = FxHashSet::default();
        self.entries
            .iter()
            .filter(|e| e.found == found)
            .map(TraceEntry::display_name)
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

impl Tracer for EvalTrace {
    fn record(&mut self, role: &str, label: Option<&str>, found: bool) {
        self.entries.push(TraceEntry {
            role: role.to_string(),
            label: label.map(str::to_string),
            found,
        });
    }

    fn exhaustive(&self) -> bool {
        self.mode == TraceMode::Exhaustive
    }
}
