//! 子系统表格导出（JSON）→ 规则归纳 → 规则文件
use rsvariant_engine::{
    ExampleRow, GeneratedRules, GeneratorOptions, RoleColumn, RoleColumns, RuleGenerator,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::RuleOptions;
use crate::error::{RsvError, RsvResult};
use crate::rule::RulePathManager;

/// 子系统表格：有序角色列 + 历史样本行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsystemSheet {
    pub name: String,
    pub roles: Vec<RoleColumn>,
    #[serde(default)]
    pub rows: Vec<ExampleRow>,
}

impl SubsystemSheet {
    pub fn from_json_str(text: &str) -> RsvResult<Self> {
        let sheet: SubsystemSheet = serde_json::from_str(text)?;
        sheet.columns().validate()?;
        Ok(sheet)
    }

    pub fn from_path(path: &Path) -> RsvResult<Self> {
        let text = RulePathManager.read_text(path)?;
        Self::from_json_str(&text)
    }

    pub fn columns(&self) -> RoleColumns {
        RoleColumns::new(self.name.as_str(), self.roles.clone())
    }
}

/// 从表格归纳变体规则
pub fn induce(sheet: &SubsystemSheet, options: &GeneratorOptions) -> RsvResult<GeneratedRules> {
    let start = Instant::now();
    let mut generator = RuleGenerator::with_options(Arc::new(sheet.columns()), options.clone())?;
    let used = generator.add_rows(&sheet.rows)?;
    if used == 0 {
        return Err(RsvError::InvalidInput(format!(
            "subsystem `{}` has no active rows with primary roles",
            sheet.name
        )));
    }

    let generated = generator.generate();
    log::info!(
        "Rule induction done | {} | Time: {}ms | Rows used: {}/{} | Rules: {} | Conflicts: {}",
        sheet.name,
        start.elapsed().as_millis(),
        used,
        sheet.rows.len(),
        generated.rules.len(),
        generated.conflicts().len()
    );
    Ok(generated)
}

/// 写出定义文件、规则文件与角色列文件，返回写入的路径
pub fn write_rule_files(
    dir: &Path,
    columns: &RoleColumns,
    generated: &GeneratedRules,
    options: &RuleOptions,
) -> RsvResult<Vec<PathBuf>> {
    let paths = RulePathManager;
    paths.ensure_dir(dir)?;

    let definitions = paths.definitions_path(dir, options);
    let rules = paths.rules_path(dir, options);
    let roles = paths.roles_path(dir, options);

    fs::write(&definitions, generated.definitions_text())?;
    fs::write(&rules, generated.rules_text())?;
    fs::write(&roles, serde_json::to_string_pretty(columns)?)?;

    log::info!("Rule files written | {}", dir.display());
    Ok(vec![definitions, rules, roles])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = r#"{
        "name": "Methylmalonyl-CoA pathway",
        "roles": [
            {"id": "MethCoaMuta", "abbr": "1.3"},
            {"id": "MalyCoaLyas", "abbreviation": "mcl1"},
            {"id": "TranRegu", "abbr": "reg", "auxiliary": true}
        ],
        "rows": [
            {"genome": "83333.1", "variant": "1", "cells": [["fig|83333.1.peg.1"], ["fig|83333.1.peg.2"], []]},
            {"genome": "562.1", "variant": "2", "cells": [["fig|562.1.peg.7"], [], ["fig|562.1.peg.9"]]},
            {"genome": "1280.3", "variant": "2", "active": false, "cells": [[], ["fig|1280.3.peg.4"], []]}
        ]
    }"#;

    #[test]
    fn test_sheet_parses_aliases_and_defaults() {
        let sheet = SubsystemSheet::from_json_str(SHEET).unwrap();
        assert_eq!(sheet.roles[1].abbr, "mcl1");
        assert!(sheet.roles[2].auxiliary);
        assert!(sheet.rows[0].active);
        assert!(!sheet.rows[2].active);
    }

    #[test]
    fn test_induce_from_sheet() {
        let sheet = SubsystemSheet::from_json_str(SHEET).unwrap();
        let generated = induce(&sheet, &GeneratorOptions::default()).unwrap();
        assert_eq!(
            generated.rules_text(),
            "1 means 1.3 and mcl1\n2 means 1.3\n0 means any\n"
        );
        assert_eq!(generated.definitions_text(), "any means 1 of {1.3, mcl1}\n");
    }

    #[test]
    fn test_induce_rejects_sheet_without_usable_rows() {
        let mut sheet = SubsystemSheet::from_json_str(SHEET).unwrap();
        sheet.rows.retain(|r| !r.active);
        assert!(matches!(
            induce(&sheet, &GeneratorOptions::default()),
            Err(RsvError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_abbreviation_shadowing_generated_names_is_rejected() {
        let text = r#"{
            "name": "s",
            "roles": [{"id": "RoleA", "abbr": "any"}, {"id": "RoleB", "abbr": "b"}],
            "rows": [
                {"genome": "g1", "variant": "1", "cells": [["p1"], ["p2"]]},
                {"genome": "g2", "variant": "2", "cells": [[], ["p3"]]}
            ]
        }"#;
        let sheet = SubsystemSheet::from_json_str(text).unwrap();
        assert!(matches!(
            induce(&sheet, &GeneratorOptions::default()),
            Err(RsvError::CoreError(_))
        ));
    }

    #[test]
    fn test_invalid_abbreviation_is_rejected() {
        let text = r#"{"name": "s", "roles": [{"id": "R", "abbr": "and"}]}"#;
        assert!(matches!(
            SubsystemSheet::from_json_str(text),
            Err(RsvError::CoreError(_))
        ));
    }
}
