use rsvariant::{
    CustomConfigBuilder, ParseError, RoleColumn, RoleColumns, RoleSet, RsvError, RuleConfig,
    RuleLoader, RuleOrigin, SubsystemRules,
};
use std::fs;
use std::path::Path;

const DEFINITIONS: &str = "\
# shared building blocks
mutase means 1.3 or (1.3.N and 1.3.C)
lyase means mcl1
";

const RULES: &str = "\
1 means mutase and lyase
2 means mutase
-1 means 1 of {1.3, 1.3.N, 1.3.C, mcl1}
";

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

fn write_subsystem(dir: &Path, definitions: &str, rules: &str, with_roles: bool) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("checkvariant_definitions"), definitions).unwrap();
    fs::write(dir.join("checkvariant_rules"), rules).unwrap();
    if with_roles {
        fs::write(
            dir.join("roles.json"),
            serde_json::to_string_pretty(&columns()).unwrap(),
        )
        .unwrap();
    }
}

fn roles(ids: &[&str]) -> RoleSet {
    ids.iter().map(|s| s.to_string()).collect()
}

fn code_for(rules: &SubsystemRules, ids: &[&str]) -> Option<String> {
    rules.classify(&roles(ids)).map(|v| v.code.clone())
}

#[test]
fn loads_subsystem_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("Methylmalonyl-CoA_pathway");
    write_subsystem(&dir, DEFINITIONS, RULES, true);

    let rules = RuleLoader::new()
        .load(&RuleConfig::subsystem_dir(&dir))
        .unwrap();

    assert_eq!(rules.name, "Methylmalonyl-CoA pathway");
    assert_eq!(rules.definitions, 2);
    assert_eq!(rules.codes().collect::<Vec<_>>(), vec!["1", "2", "-1"]);
    assert!(rules.unresolved.is_empty());

    assert_eq!(code_for(&rules, &["MethCoaMuta", "MalyCoaLyas"]).as_deref(), Some("1"));
    assert_eq!(code_for(&rules, &["MethCoaMutaN", "MethCoaMutaC"]).as_deref(), Some("2"));
    assert_eq!(code_for(&rules, &["MethCoaMutaN"]).as_deref(), Some("-1"));
    assert_eq!(code_for(&rules, &[]), None);
}

#[test]
fn missing_definitions_file_is_optional() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("sub");
    write_subsystem(&dir, "", "1 means mcl1\n", true);
    fs::remove_file(dir.join("checkvariant_definitions")).unwrap();

    let rules = RuleLoader::new()
        .load(&RuleConfig::subsystem_dir(&dir))
        .unwrap();
    assert_eq!(rules.definitions, 0);
    assert_eq!(rules.len(), 1);
}

#[test]
fn missing_directory_or_rules_file_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let err = RuleLoader::new()
        .load(&RuleConfig::subsystem_dir(tmp.path().join("nope")))
        .unwrap_err();
    assert!(matches!(err, RsvError::RuleLoadError(_)));

    let dir = tmp.path().join("empty");
    fs::create_dir_all(&dir).unwrap();
    let err = RuleLoader::new()
        .load(&RuleConfig::subsystem_dir(&dir))
        .unwrap_err();
    assert!(matches!(err, RsvError::RuleLoadError(_)));
}

#[test]
fn unresolved_identifiers_are_reported_together() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("sub");
    write_subsystem(
        &dir,
        "mutase means 1.3 or mcm9\n",
        "1 means mutase and mcl7\n2 means mutase\n",
        true,
    );

    let lenient = RuleLoader::new()
        .load(&RuleConfig::subsystem_dir(&dir))
        .unwrap();
    assert_eq!(
        lenient.unresolved.iter().cloned().collect::<Vec<_>>(),
        vec!["mcl7".to_string(), "mcm9".to_string()]
    );
    // Fail 节点永远不满足，其余分支仍可用
    assert_eq!(
        lenient
            .classify(&roles(&["MethCoaMuta", "MalyCoaLyas"]))
            .map(|v| v.code.as_str()),
        Some("2")
    );

    let strict = CustomConfigBuilder::new(RuleOrigin::SubsystemDir(dir))
        .strict_references(true)
        .build();
    match RuleLoader::new().load(&strict) {
        Err(RsvError::UnresolvedReferences(names)) => assert_eq!(names, vec!["mcl7", "mcm9"]),
        other => panic!("expected unresolved references, got {:?}", other.map(|r| r.len())),
    }
}

#[test]
fn roles_file_absent_leaves_abbreviations_unresolved() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("sub");
    write_subsystem(&dir, DEFINITIONS, RULES, false);

    let rules = RuleLoader::new()
        .load(&RuleConfig::subsystem_dir(&dir))
        .unwrap();
    assert_eq!(rules.name, "sub");
    assert!(rules.unresolved.contains("mcl1"));

    // 显式角色列优先
    let with_columns = RuleLoader::new()
        .load(&RuleConfig::subsystem_dir(&dir).with_columns(columns()))
        .unwrap();
    assert!(with_columns.unresolved.is_empty());
}

#[test]
fn explicit_files_report_bad_line_location() {
    let tmp = tempfile::tempdir().unwrap();
    let rules_path = tmp.path().join("variant_rules.txt");
    fs::write(&rules_path, "1 means mcl1\n2 means 1.3 of {mcl1}\n").unwrap();

    let config = RuleConfig::files(None, &rules_path).with_columns(columns());
    match RuleLoader::new().load(&config) {
        Err(RsvError::RuleParseError { origin, line, source }) => {
            assert!(origin.ends_with("variant_rules.txt"));
            assert_eq!(line, 2);
            assert!(matches!(source, ParseError::NonNumericCount(_)));
        }
        other => panic!("expected a parse error, got {:?}", other.map(|r| r.len())),
    }
}
