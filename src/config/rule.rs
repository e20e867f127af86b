//! 子系统规则配置管理

use rsvariant_engine::{RoleColumns, TraceMode};
use std::path::PathBuf;

/// 规则来源
#[derive(Debug, Clone)]
pub enum RuleOrigin {
    /// 内存中的规则文本（定义块 + 规则块）
    Inline { definitions: String, rules: String },
    /// 显式指定的规则文件（定义文件可选）
    Files {
        definitions: Option<PathBuf>,
        rules: PathBuf,
    },
    /// 子系统目录（checkvariant_definitions / checkvariant_rules / roles.json）
    SubsystemDir(PathBuf),
}

/// 核心规则选项
#[derive(Debug, Clone)]
pub struct RuleOptions {
    /// 诊断模式：短路 / 完整
    pub trace_mode: TraceMode,
    /// 存在未解析标识符时加载失败
    pub strict_references: bool,
    /// 跳过无法编译的行（记录警告），否则遇到第一条坏行即失败
    pub skip_bad_lines: bool,
    /// 子系统目录下的定义文件名
    pub definitions_file: String,
    /// 子系统目录下的规则文件名
    pub rules_file: String,
    /// 子系统目录下的角色列文件名（JSON）
    pub roles_file: String,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            trace_mode: TraceMode::ShortCircuit,
            strict_references: false,
            skip_bad_lines: false,
            definitions_file: "checkvariant_definitions".to_string(),
            rules_file: "checkvariant_rules".to_string(),
            roles_file: "roles.json".to_string(),
        }
    }
}

/// 完整规则配置
#[derive(Debug, Clone)]
pub struct RuleConfig {
    pub origin: RuleOrigin,
    /// 显式角色列；为空时从子系统目录的角色列文件读取
    pub columns: Option<RoleColumns>,
    pub options: RuleOptions,
}

impl RuleConfig {
    /// 内存规则文本
    pub fn inline(definitions: impl Into<String>, rules: impl Into<String>) -> Self {
        Self {
            origin: RuleOrigin::Inline {
                definitions: definitions.into(),
                rules: rules.into(),
            },
            columns: None,
            options: RuleOptions::default(),
        }
    }

    /// 显式规则文件
    pub fn files(definitions: Option<PathBuf>, rules: impl Into<PathBuf>) -> Self {
        Self {
            origin: RuleOrigin::Files {
                definitions,
                rules: rules.into(),
            },
            columns: None,
            options: RuleOptions::default(),
        }
    }

    /// 子系统目录
    pub fn subsystem_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            origin: RuleOrigin::SubsystemDir(dir.into()),
            columns: None,
            options: RuleOptions::default(),
        }
    }

    /// 附带角色列
    pub fn with_columns(mut self, columns: RoleColumns) -> Self {
        self.columns = Some(columns);
        self
    }
}

/// 自定义构建器（链式 API）
#[derive(Debug, Clone)]
pub struct CustomConfigBuilder {
    config: RuleConfig,
}

impl CustomConfigBuilder {
    pub fn new(origin: RuleOrigin) -> Self {
        Self {
            config: RuleConfig {
                origin,
                columns: None,
                options: RuleOptions::default(),
            },
        }
    }

    pub fn origin(mut self, origin: RuleOrigin) -> Self {
        self.config.origin = origin;
        self
    }

    pub fn columns(mut self, columns: RoleColumns) -> Self {
        self.config.columns = Some(columns);
        self
    }

    pub fn trace_mode(mut self, mode: TraceMode) -> Self {
        self.config.options.trace_mode = mode;
        self
    }

    pub fn strict_references(mut self, strict: bool) -> Self {
        self.config.options.strict_references = strict;
        self
    }

    pub fn skip_bad_lines(mut self, skip: bool) -> Self {
        self.config.options.skip_bad_lines = skip;
        self
    }

    pub fn definitions_file(mut self, name: impl Into<String>) -> Self {
        self.config.options.definitions_file = name.into();
        self
    }

    pub fn rules_file(mut self, name: impl Into<String>) -> Self {
        self.config.options.rules_file = name.into();
        self
    }

    pub fn roles_file(mut self, name: impl Into<String>) -> Self {
        self.config.options.roles_file = name.into();
        self
    }

    pub fn options(mut self, options: RuleOptions) -> Self {
        self.config.options = options;
        self
    }

    pub fn build(self) -> RuleConfig {
        self.config
    }
}
