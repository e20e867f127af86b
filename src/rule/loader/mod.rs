//! 规则加载模块
//! 统一导出规则加载相关组件
pub mod path_manager;
pub mod rule_loader;
pub mod rule_parser;

// 导出加载器
pub use path_manager::RulePathManager;
pub use rule_loader::RuleLoader;
pub use rule_parser::{ParsedRuleFile, RuleFileParser, RuleLine};
