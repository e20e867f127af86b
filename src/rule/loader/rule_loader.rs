use rsvariant_engine::utils::compress_role_set;
use rsvariant_engine::{ParseResult, RoleColumns, RuleProcessor, SubsystemRules};
use std::path::Path;
use std::time::Instant;

use super::path_manager::RulePathManager;
use super::rule_parser::{RuleFileParser, RuleLine};
use crate::config::{RuleConfig, RuleOptions, RuleOrigin};
use crate::error::{RsvError, RsvResult};

/// 读取完成、尚未编译的规则文本
#[derive(Debug)]
struct RuleSources {
    name: String,
    columns: Option<RoleColumns>,
    /// (来源标识, 文本)
    definitions: Option<(String, String)>,
    rules: (String, String),
}

/// 规则加载器：读取规则来源 → 逐行解析 → 编译为子系统规则集
#[derive(Debug, Default)]
pub struct RuleLoader {
    path_manager: RulePathManager,
    parser: RuleFileParser,
}

impl RuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, config: &RuleConfig) -> RsvResult<SubsystemRules> {
        let total_start = Instant::now();

        let read_start = Instant::now();
        let sources = self.read_sources(config)?;
        log::info!(
            "[Stage 1] Rule sources read | {} | Time: {}ms | Role columns: {}",
            sources.name,
            read_start.elapsed().as_millis(),
            sources.columns.as_ref().map_or(0, |c| c.len())
        );

        let compile_start = Instant::now();
        let rules = self.compile_sources(&sources, &config.options)?;
        log::info!(
            "[Stage 2] Rules compiled | Time: {}ms | Definitions: {} | Variants: {}",
            compile_start.elapsed().as_millis(),
            rules.definitions,
            rules.len()
        );

        log::debug!(
            "Subsystem rules ready | {} | Total time: {}ms",
            rules.name,
            total_start.elapsed().as_millis()
        );
        Ok(rules)
    }

    /// 读取并校验角色列文件（JSON）
    pub fn load_columns(&self, path: &Path) -> RsvResult<RoleColumns> {
        let text = self.path_manager.read_text(path)?;
        let columns: RoleColumns = serde_json::from_str(&text)?;
        columns.validate()?;
        Ok(columns)
    }

    fn read_sources(&self, config: &RuleConfig) -> RsvResult<RuleSources> {
        match &config.origin {
            RuleOrigin::Inline { definitions, rules } => Ok(RuleSources {
                name: config
                    .columns
                    .as_ref()
                    .map_or_else(|| "inline".to_string(), |c| c.name.clone()),
                columns: config.columns.clone(),
                definitions: Some(("definitions".to_string(), definitions.clone())),
                rules: ("rules".to_string(), rules.clone()),
            }),

            RuleOrigin::Files { definitions, rules } => {
                let definitions = match definitions {
                    Some(path) => Some((
                        path.display().to_string(),
                        self.path_manager.read_text(path)?,
                    )),
                    None => None,
                };
                let name = config.columns.as_ref().map_or_else(
                    || {
                        rules
                            .file_stem()
                            .map_or_else(|| "rules".to_string(), |s| s.to_string_lossy().into_owned())
                    },
                    |c| c.name.clone(),
                );
                Ok(RuleSources {
                    name,
                    columns: config.columns.clone(),
                    definitions,
                    rules: (rules.display().to_string(), self.path_manager.read_text(rules)?),
                })
            }

            RuleOrigin::SubsystemDir(dir) => {
                if !dir.is_dir() {
                    return Err(RsvError::RuleLoadError(format!(
                        "子系统目录[{}]不存在",
                        dir.display()
                    )));
                }
                let options = &config.options;

                let columns = match &config.columns {
                    Some(columns) => Some(columns.clone()),
                    None => {
                        let roles_path = self.path_manager.roles_path(dir, options);
                        if roles_path.is_file() {
                            Some(self.load_columns(&roles_path)?)
                        } else {
                            log::warn!(
                                "No role columns file at {}; only defined names will resolve",
                                roles_path.display()
                            );
                            None
                        }
                    }
                };

                let definitions_path = self.path_manager.definitions_path(dir, options);
                let definitions = if definitions_path.is_file() {
                    Some((
                        definitions_path.display().to_string(),
                        self.path_manager.read_text(&definitions_path)?,
                    ))
                } else {
                    None
                };

                let rules_path = self.path_manager.rules_path(dir, options);
                let rules = (
                    rules_path.display().to_string(),
                    self.path_manager.read_text(&rules_path)?,
                );

                let name = columns
                    .as_ref()
                    .map_or_else(|| self.path_manager.subsystem_name(dir), |c| c.name.clone());
                Ok(RuleSources {
                    name,
                    columns,
                    definitions,
                    rules,
                })
            }
        }
    }

    fn compile_sources(
        &self,
        sources: &RuleSources,
        options: &RuleOptions,
    ) -> RsvResult<SubsystemRules> {
        let mut processor = match &sources.columns {
            Some(columns) => RuleProcessor::with_columns(columns),
            None => RuleProcessor::new(sources.name.as_str()),
        };

        if let Some((origin, text)) = &sources.definitions {
            self.compile_lines(origin, text, options, |line| {
                processor.define(&line.name, &line.expression)
            })?;
        }
        let (origin, text) = &sources.rules;
        self.compile_lines(origin, text, options, |line| {
            processor.add_variant(&line.name, &line.expression)
        })?;

        let rules = processor.finish();
        if !rules.unresolved.is_empty() {
            log::warn!(
                "Unresolved rule identifiers | Subsystem: {} | {}",
                rules.name,
                compress_role_set(rules.unresolved.iter().map(String::as_str))
            );
            if options.strict_references {
                return Err(RsvError::UnresolvedReferences(
                    rules.unresolved.iter().cloned().collect(),
                ));
            }
        }
        Ok(rules)
    }

    /// 解析并逐行编译；坏行按选项跳过或立即失败
    fn compile_lines<F>(
        &self,
        origin: &str,
        text: &str,
        options: &RuleOptions,
        mut compile: F,
    ) -> RsvResult<()>
    where
        F: FnMut(&RuleLine) -> ParseResult<()>,
    {
        let parsed = self.parser.parse(origin, text);
        for err in parsed.errors {
            if !options.skip_bad_lines {
                return Err(err);
            }
            log::warn!("Skip malformed rule line | {}", err);
        }

        for line in &parsed.lines {
            if let Err(source) = compile(line) {
                let err = RsvError::RuleParseError {
                    origin: origin.to_string(),
                    line: line.line_no,
                    source,
                };
                if !options.skip_bad_lines {
                    return Err(err);
                }
                log::warn!("Skip rule line | {}", err);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CustomConfigBuilder;
    use rsvariant_engine::{ParseError, RoleColumn, RoleSet};

    fn columns() -> RoleColumns {
        RoleColumns::new(
            "Methylmalonyl-CoA pathway",
            vec![
                RoleColumn::new("MethCoaMuta", "1.3"),
                RoleColumn::new("MethCoaMutaN", "1.3.N"),
                RoleColumn::new("MethCoaMutaC", "1.3.C"),
                RoleColumn::new("MalyCoaLyas", "mcl1"),
            ],
        )
    }

    #[test]
    fn test_inline_rules_load_in_order() {
        let config = RuleConfig::inline(
            "mutase means 1.3 or (1.3.N and 1.3.C)\n",
            "1 means mutase and mcl1\n2 means mutase\n",
        )
        .with_columns(columns());
        let rules = RuleLoader::new().load(&config).unwrap();

        assert_eq!(rules.name, "Methylmalonyl-CoA pathway");
        assert_eq!(rules.codes().collect::<Vec<_>>(), vec!["1", "2"]);
        let roles: RoleSet = ["MethCoaMuta".to_string()].into_iter().collect();
        assert_eq!(rules.classify(&roles).map(|v| v.code.as_str()), Some("2"));
    }

    #[test]
    fn test_bad_line_fails_with_line_number() {
        let config = RuleConfig::inline("", "1 means 1.3\n\n2 means (mcl1\n").with_columns(columns());
        let err = RuleLoader::new().load(&config).unwrap_err();
        match err {
            RsvError::RuleParseError { origin, line, source } => {
                assert_eq!(origin, "rules");
                assert_eq!(line, 3);
                assert!(matches!(source, ParseError::UnbalancedDelimiter(_)));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_skip_bad_lines_keeps_the_rest() {
        let config = CustomConfigBuilder::new(RuleOrigin::Inline {
            definitions: "oops\n".to_string(),
            rules: "1 means (1.3 mcl1)\n2 means mcl1\n".to_string(),
        })
        .columns(columns())
        .skip_bad_lines(true)
        .build();
        let rules = RuleLoader::new().load(&config).unwrap();
        assert_eq!(rules.codes().collect::<Vec<_>>(), vec!["2"]);
    }

    #[test]
    fn test_strict_references_report_all_names() {
        let config = CustomConfigBuilder::new(RuleOrigin::Inline {
            definitions: "x means ghost1\n".to_string(),
            rules: "1 means x and ghost2\n2 means mcl1\n".to_string(),
        })
        .columns(columns())
        .strict_references(true)
        .build();
        match RuleLoader::new().load(&config) {
            Err(RsvError::UnresolvedReferences(names)) => {
                assert_eq!(names, vec!["ghost1".to_string(), "ghost2".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.len())),
        }
    }
}
