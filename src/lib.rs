//! rsvariant - 子系统变体规则编译、分类与归纳

pub mod classifier;
pub mod config;
pub mod error;
pub mod induction;
pub mod rule;

// 导出全局错误类型
pub use self::error::{RsvError, RsvResult};

// 导出配置模块核心结构体与构建器
pub use crate::config::{CustomConfigBuilder, RuleConfig, RuleOptions, RuleOrigin};

// 导出规则加载接口
pub use crate::rule::{RuleFileParser, RuleLine, RuleLoader, RulePathManager};

// 导出分类与投影接口
pub use crate::classifier::{
    Classification, GenomeRoles, Projection, ProjectionEntry, RuleAnalysis, SubsystemProjector,
    VariantClassifier,
};

// 导出归纳接口
pub use crate::induction::{induce, write_rule_files, SubsystemSheet};

// 内核常用类型
pub use rsvariant_engine::{
    EvalTrace, ExampleRow, GeneratedRules, GeneratorOptions, NameSpace, ParseError, RoleColumn,
    RoleColumns, RolePresence, RoleSet, Rule, RuleCompiler, RuleGenerator, SubsystemRules,
    TraceMode,
};
