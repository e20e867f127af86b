//! 配置模块：规则来源与加载选项
pub mod rule;

pub use rule::{CustomConfigBuilder, RuleConfig, RuleOptions, RuleOrigin};
