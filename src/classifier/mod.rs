//! 分类模块：变体规则的首次匹配分类与多子系统投影
#[allow(clippy::module_inception)]
pub mod classifier;
pub mod projector;

// 导出核心接口
pub use self::classifier::{Classification, GenomeRoles, RuleAnalysis, VariantClassifier};
pub use self::projector::{Projection, ProjectionEntry, SubsystemProjector};
