//! Variant classifier
//! 变体分类器
//! 核心职责：
//! 1. 按规则文件顺序检查已编译的变体规则，首次匹配生效
//! 2. 诊断重放：单线程返回某条规则的命中/未命中轨迹
//! 3. 多基因组批量分类（rayon 并行，始终不追踪）

use rayon::prelude::*;
use rsvariant_engine::utils::compress_role_set;
use rsvariant_engine::{EvalTrace, RolePresence, RoleSet, SubsystemRules, TraceMode};
use serde::Serialize;
use std::sync::Arc;

use crate::config::RuleConfig;
use crate::error::{RsvError, RsvResult};
use crate::rule::RuleLoader;

/// 单条规则的诊断结果
#[derive(Debug, Clone, Serialize)]
pub struct RuleAnalysis {
    pub code: String,
    pub matched: bool,
    pub found: Vec<String>,
    pub not_found: Vec<String>,
    pub trace: EvalTrace,
}

impl RuleAnalysis {
    fn new(code: &str, matched: bool, trace: EvalTrace) -> Self {
        Self {
            code: code.to_string(),
            matched,
            found: trace.found().into_iter().map(str::to_string).collect(),
            not_found: trace.not_found().into_iter().map(str::to_string).collect(),
            trace,
        }
    }
}

/// 一个基因组的角色存在集合
#[derive(Debug, Clone, Default)]
pub struct GenomeRoles {
    pub genome: String,
    pub roles: RoleSet,
}

impl GenomeRoles {
    pub fn new<I, S>(genome: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            genome: genome.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

/// 单个基因组的分类结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub genome: String,
    pub variant: Option<String>,
}

/// 变体分类器
/// 编译后的规则集通过Arc共享，克隆开销只有引用计数
#[derive(Debug, Clone)]
pub struct VariantClassifier {
    rules: Arc<SubsystemRules>,
    trace_mode: TraceMode,
}

impl VariantClassifier {
    pub fn new(rules: SubsystemRules) -> Self {
        Self {
            rules: Arc::new(rules),
            trace_mode: TraceMode::default(),
        }
    }

    /// 按配置加载规则并创建分类器
    pub fn with_config(config: &RuleConfig) -> RsvResult<Self> {
        let rules = RuleLoader::new().load(config)?;
        Ok(Self::new(rules).trace_mode(config.options.trace_mode))
    }

    pub fn trace_mode(mut self, mode: TraceMode) -> Self {
        self.trace_mode = mode;
        self
    }

    pub fn name(&self) -> &str {
        &self.rules.name
    }

    pub fn rules(&self) -> &SubsystemRules {
        &self.rules
    }

    /// 首个满足的变体代码
    pub fn classify<R: RolePresence + ?Sized>(&self, roles: &R) -> Option<&str> {
        self.rules.classify(roles).map(|v| v.code.as_str())
    }

    /// 重放指定变体规则
    pub fn analyze_rule<R: RolePresence + ?Sized>(
        &self,
        code: &str,
        roles: &R,
    ) -> RsvResult<RuleAnalysis> {
        let (matched, trace) = self
            .rules
            .trace(code, roles, self.trace_mode)
            .ok_or_else(|| RsvError::UnknownVariant(code.to_string()))?;
        Ok(RuleAnalysis::new(code, matched, trace))
    }

    /// 依次重放所有变体规则（直到首次匹配为止）
    pub fn analyze<R: RolePresence + ?Sized>(&self, roles: &R) -> Vec<RuleAnalysis> {
        let mut out = Vec::new();
        for variant in &self.rules.variants {
            let mut trace = EvalTrace::new(self.trace_mode);
            let matched = variant.rule.evaluate(roles, &mut trace);
            out.push(RuleAnalysis::new(&variant.code, matched, trace));
            if matched {
                break;
            }
        }
        out
    }

    /// 批量分类，结果顺序与输入一致
    pub fn classify_batch(&self, genomes: &[GenomeRoles]) -> Vec<Classification> {
        let results: Vec<Classification> = genomes
            .par_iter()
            .map(|genome| Classification {
                genome: genome.genome.clone(),
                variant: self.classify(&genome.roles).map(str::to_string),
            })
            .collect();

        log::debug!(
            "Batch classification done | Subsystem: {} | Genomes: {} | Unclassified: {}",
            self.name(),
            results.len(),
            compress_role_set(
                results
                    .iter()
                    .filter(|r| r.variant.is_none())
                    .map(|r| r.genome.as_str())
            )
        );
        results
    }
}
