//! rsvariant 命令行
//! - check：编译子系统规则文件并报告未解析标识符
//! - classify：按角色列表分类一个基因组
//! - generate：从表格导出归纳规则

use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};
use rsvariant::{
    induce, write_rule_files, CustomConfigBuilder, GeneratorOptions, RoleSet, RuleLoader,
    RuleOptions, RuleOrigin, RulePathManager, SubsystemSheet, TraceMode, VariantClassifier,
};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rsvariant",
    about = "Subsystem variant rules: check, classify and generate",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a subsystem's rule files and report problems
    Check {
        /// Subsystem directory
        dir: PathBuf,

        /// Keep compiling past bad lines
        #[arg(long)]
        skip_bad_lines: bool,
    },

    /// Classify one genome from a file of role IDs (one per line)
    Classify {
        /// Subsystem directory
        dir: PathBuf,

        /// Role list file
        roles_file: PathBuf,

        /// Print the found / not-found roles of the matching rule (or of every rule tried)
        #[arg(long)]
        trace: bool,

        /// Disable short-circuiting while tracing
        #[arg(long)]
        exhaustive: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Induce variant rules from a spreadsheet export
    Generate {
        /// Spreadsheet JSON export
        sheet: PathBuf,

        /// Write checkvariant_definitions / checkvariant_rules / roles.json here
        #[arg(long)]
        out: Option<PathBuf>,

        /// Variant code of the fallback rule
        #[arg(long, default_value = "0")]
        unclassified: String,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check {
            dir,
            skip_bad_lines,
        } => check(dir, skip_bad_lines),
        Commands::Classify {
            dir,
            roles_file,
            trace,
            exhaustive,
            json,
        } => classify(dir, roles_file, trace, exhaustive, json),
        Commands::Generate {
            sheet,
            out,
            unclassified,
        } => generate(sheet, out, unclassified),
    }
}

fn check(dir: PathBuf, skip_bad_lines: bool) -> Result<(), Box<dyn Error>> {
    let config = CustomConfigBuilder::new(RuleOrigin::SubsystemDir(dir))
        .skip_bad_lines(skip_bad_lines)
        .build();
    let rules = RuleLoader::new().load(&config)?;

    println!(
        "{}: {} definitions, {} variant rules",
        rules.name,
        rules.definitions,
        rules.len()
    );
    if !rules.unresolved.is_empty() {
        for name in &rules.unresolved {
            println!("unresolved: {}", name);
        }
        return Err(format!("{} unresolved identifiers", rules.unresolved.len()).into());
    }
    Ok(())
}

fn classify(
    dir: PathBuf,
    roles_file: PathBuf,
    trace: bool,
    exhaustive: bool,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let mode = if exhaustive {
        TraceMode::Exhaustive
    } else {
        TraceMode::ShortCircuit
    };
    let config = CustomConfigBuilder::new(RuleOrigin::SubsystemDir(dir))
        .trace_mode(mode)
        .build();
    let classifier = VariantClassifier::with_config(&config)?;

    let roles: RoleSet = RulePathManager
        .read_text(&roles_file)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    let variant = classifier.classify(&roles);
    let analyses = match (trace, variant) {
        (false, _) => Vec::new(),
        (true, Some(code)) => vec![classifier.analyze_rule(code, &roles)?],
        (true, None) => classifier.analyze(&roles),
    };

    if json {
        let report = serde_json::json!({
            "subsystem": classifier.name(),
            "variant": variant,
            "trace": analyses,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", variant.unwrap_or("none"));
    for analysis in &analyses {
        println!(
            "rule {} ({}): found [{}] not found [{}]",
            analysis.code,
            if analysis.matched { "matched" } else { "failed" },
            analysis.found.join(", "),
            analysis.not_found.join(", ")
        );
    }
    Ok(())
}

fn generate(
    sheet: PathBuf,
    out: Option<PathBuf>,
    unclassified: String,
) -> Result<(), Box<dyn Error>> {
    let sheet = SubsystemSheet::from_path(&sheet)?;
    let options = GeneratorOptions {
        unclassified_code: unclassified,
        ..GeneratorOptions::default()
    };
    let generated = induce(&sheet, &options)?;

    match out {
        Some(dir) => {
            for path in write_rule_files(&dir, &sheet.columns(), &generated, &RuleOptions::default())? {
                println!("wrote {}", path.display());
            }
        }
        None => {
            print!("{}", generated.definitions_text());
            println!();
            print!("{}", generated.rules_text());
        }
    }
    for conflict in generated.conflicts() {
        eprintln!(
            "conflict: genome {} (variant {}) is matched first by variant {}",
            conflict.genome, conflict.variant, conflict.matched_variant
        );
    }
    Ok(())
}
