//! 归纳模块：表格导出 → 变体规则 → 规则文件
pub mod spreadsheet;

pub use spreadsheet::{induce, write_rule_files, SubsystemSheet};
