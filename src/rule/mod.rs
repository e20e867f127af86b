//! 规则模块：负责规则文件的读取、逐行解析与编译
pub mod loader;

// 统一导出核心公共接口
pub use loader::{RuleFileParser, RuleLine, RuleLoader, RulePathManager};
