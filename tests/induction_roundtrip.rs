use rsvariant::{
    induce, write_rule_files, ExampleRow, GeneratorOptions, RoleColumn, RuleConfig, RuleLoader,
    RuleOptions, SubsystemSheet, VariantClassifier,
};
use std::collections::HashSet;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn cell(genome: &str, present: bool, idx: usize) -> Vec<String> {
    if present {
        vec![format!("fig|{}.peg.{}", genome, idx)]
    } else {
        Vec::new()
    }
}

fn row(genome: &str, variant: &str, present: [bool; 6]) -> ExampleRow {
    let cells = present
        .iter()
        .enumerate()
        .map(|(idx, p)| cell(genome, *p, idx))
        .collect();
    ExampleRow::new(genome, variant, cells)
}

fn sheet() -> SubsystemSheet {
    let t = true;
    let f = false;
    SubsystemSheet {
        name: "Propionyl-CoA to Succinyl-CoA Module".to_string(),
        roles: vec![
            RoleColumn::new("PropCoaCarbAlph", "pccA"),
            RoleColumn::new("PropCoaCarbBeta", "pccB"),
            RoleColumn::new("MethCoaEpim", "mce"),
            RoleColumn::new("MethCoaMuta", "mcm"),
            RoleColumn::new("MethCoaMutaSmal", "mcmS"),
            RoleColumn::new("TranRegu", "reg").auxiliary(true),
        ],
        rows: vec![
            row("83333.1", "1", [t, t, t, t, f, f]),
            row("1280.3", "1", [t, t, t, t, t, t]),
            row("562.4", "1", [t, t, t, f, t, f]),
            row("1773.1", "2", [t, t, f, t, f, t]),
            row("1773.2", "2", [t, t, f, f, t, f]),
            row("287.1", "3", [f, f, t, t, f, f]),
            row("287.2", "*3", [f, f, f, t, t, f]),
            row("99.1", "-1", [f, f, f, f, f, t]),
            row("100.1", "2", [t, f, t, f, f, f]).inactive(),
        ],
    }
}

#[test]
fn generated_rules_classify_their_examples() {
    init_logger();
    let sheet = sheet();
    let generated = induce(&sheet, &GeneratorOptions::default()).unwrap();
    let columns = sheet.columns();

    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("Propionyl-CoA_to_Succinyl-CoA_Module");
    let written = write_rule_files(&dir, &columns, &generated, &RuleOptions::default()).unwrap();
    assert_eq!(written.len(), 3);

    let strict = RuleConfig {
        options: RuleOptions {
            strict_references: true,
            ..RuleOptions::default()
        },
        ..RuleConfig::subsystem_dir(&dir)
    };
    let rules = RuleLoader::new().load(&strict).unwrap();
    assert_eq!(rules.name, sheet.name);
    assert_eq!(rules.codes().last(), Some("0"));

    let classifier = VariantClassifier::new(rules);
    let conflicted: HashSet<&str> = generated
        .conflicts()
        .iter()
        .map(|c| c.genome.as_str())
        .collect();

    for example in sheet.rows.iter().filter(|r| r.active) {
        let roles = example.role_set(&columns);
        let primary = columns
            .primary_indices()
            .any(|idx| example.has_column(idx));
        if !primary || conflicted.contains(example.genome.as_str()) {
            continue;
        }
        assert_eq!(
            classifier.classify(&roles),
            Some(example.variant.as_str()),
            "genome {} should classify to its own variant",
            example.genome
        );
    }
}

#[test]
fn active_variants_are_emitted_before_inactive_ones() {
    let generated = induce(&sheet(), &GeneratorOptions::default()).unwrap();
    let codes: Vec<&str> = generated.rules.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(codes, vec!["1", "2", "3", "*3", "0"]);

    let last = generated.definitions.last().unwrap();
    assert_eq!(last.name, "any");
    assert_eq!(last.expression, "1 of {pccA, pccB, mce, mcm, mcmS}");
}

#[test]
fn shared_intersection_becomes_a_group() {
    let generated = induce(&sheet(), &GeneratorOptions::default()).unwrap();
    let groups: Vec<_> = generated
        .definitions
        .iter()
        .filter(|d| d.name.starts_with("group"))
        .collect();
    assert!(!groups.is_empty());
    assert_eq!(groups[0].name, "group0");

    let rule_one = &generated.rules[0];
    assert_eq!(rule_one.name, "1");
    assert!(rule_one.expression.starts_with("group0 and ("));
}
