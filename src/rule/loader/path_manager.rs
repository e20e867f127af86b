use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RuleOptions;
use crate::error::{RsvError, RsvResult};

/// 子系统目录路径管理器
#[derive(Debug, Default, Clone, Copy)]
pub struct RulePathManager;

impl RulePathManager {
    /// 定义文件路径（目录/checkvariant_definitions）
    pub fn definitions_path(&self, dir: &Path, options: &RuleOptions) -> PathBuf {
        dir.join(&options.definitions_file)
    }

    /// 规则文件路径（目录/checkvariant_rules）
    pub fn rules_path(&self, dir: &Path, options: &RuleOptions) -> PathBuf {
        dir.join(&options.rules_file)
    }

    /// 角色列文件路径（目录/roles.json）
    pub fn roles_path(&self, dir: &Path, options: &RuleOptions) -> PathBuf {
        dir.join(&options.roles_file)
    }

    /// 子系统名：目录名，下划线还原为空格
    pub fn subsystem_name(&self, dir: &Path) -> String {
        dir.file_name()
            .map(|name| name.to_string_lossy().replace('_', " "))
            .unwrap_or_else(|| "subsystem".to_string())
    }

    /// 目录名：子系统名中的空格替换为下划线
    pub fn dir_name(&self, subsystem: &str) -> String {
        subsystem.trim().replace(' ', "_")
    }

    /// 读取文本文件，错误信息带上路径
    pub fn read_text(&self, path: &Path) -> RsvResult<String> {
        fs::read_to_string(path).map_err(|e| {
            RsvError::RuleLoadError(format!("读取文件[{}]失败: {}", path.display(), e))
        })
    }

    /// 确保目录存在
    pub fn ensure_dir(&self, dir: &Path) -> RsvResult<()> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
