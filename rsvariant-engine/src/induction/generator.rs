use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::antichain::Antichain;
use super::rule_bits::RuleBits;
use crate::core::{ExampleRow, RoleColumns};
use crate::error::{CoreError, CoreResult};

/// 规则生成选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// 兜底规则使用的变体代码
    pub unclassified_code: String,
    /// 兜底定义名（`1 of {所有非辅助角色}`）
    pub fallback_name: String,
    /// 公共交集分组的名字前缀
    pub group_prefix: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            unclassified_code: "0".to_string(),
            fallback_name: "any".to_string(),
            group_prefix: "group".to_string(),
        }
    }
}

impl GeneratorOptions {
    /// 生成器自己会定义的名字：兜底名与 `{group_prefix}{N}`
    pub fn is_reserved(&self, name: &str) -> bool {
        if name == self.fallback_name {
            return true;
        }
        name.strip_prefix(self.group_prefix.as_str())
            .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
    }
}

/// 变体代码是否活跃：`-1`、`0` 以及 `*` 开头的代码为非活跃
pub fn is_active_code(code: &str) -> bool {
    !(code == "-1" || code == "0" || code.starts_with('*'))
}

/// 一行 `name means expression`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub name: String,
    pub expression: String,
}

impl RuleDefinition {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
        }
    }
}

impl fmt::Display for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} means {}", self.name, self.expression)
    }
}

/// 被更早输出的变体规则抢先匹配的样本行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub genome: String,
    pub variant: String,
    /// 按首次匹配顺序实际会得到的变体
    pub matched_variant: String,
}

/// 生成结果：定义块 + 规则块
#[derive(Debug, Clone, Default, Serialize)]
pub struct GeneratedRules {
    pub definitions: Vec<RuleDefinition>,
    pub rules: Vec<RuleDefinition>,
    conflicts: Vec<Conflict>,
}

impl GeneratedRules {
    pub fn definitions_text(&self) -> String {
        render_lines(&self.definitions)
    }

    pub fn rules_text(&self) -> String {
        render_lines(&self.rules)
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }
}

fn render_lines(lines: &[RuleDefinition]) -> String {
    lines.iter().map(|line| format!("{}\n", line)).collect()
}

/// 样本行的RuleBits，保留下来用于冲突检查
#[derive(Debug, Clone)]
struct Sample {
    genome: String,
    variant: String,
    bits: RuleBits,
}

/// 规则归纳器
/// 按变体代码把样本行折叠成反链，再为每个变体输出最简的覆盖表达式
#[derive(Debug, Clone)]
pub struct RuleGenerator {
    context: Arc<RoleColumns>,
    options: GeneratorOptions,
    variants: BTreeMap<String, Antichain>,
    samples: Vec<Sample>,
    skipped: usize,
}

impl RuleGenerator {
    pub fn new(context: Arc<RoleColumns>) -> CoreResult<Self> {
        Self::with_options(context, GeneratorOptions::default())
    }

    pub fn with_options(context: Arc<RoleColumns>, options: GeneratorOptions) -> CoreResult<Self> {
        context.validate()?;
        // 与生成的定义同名的缩写在回读时会被定义覆盖
        if let Some(column) = context.columns.iter().find(|c| options.is_reserved(&c.abbr)) {
            return Err(CoreError::InvalidInput(format!(
                "role abbreviation `{}` in subsystem `{}` collides with a generated rule name",
                column.abbr, context.name
            )));
        }
        if context.primary_indices().next().is_none() {
            return Err(CoreError::InvalidInput(format!(
                "subsystem `{}` has no non-auxiliary roles",
                context.name
            )));
        }
        Ok(Self {
            context,
            options,
            variants: BTreeMap::new(),
            samples: Vec::new(),
            skipped: 0,
        })
    }

    pub fn context(&self) -> &Arc<RoleColumns> {
        &self.context
    }

    /// 折叠一行样本；非活跃行与空位图行被跳过（返回 false）
    pub fn add_row(&mut self, row: &ExampleRow) -> CoreResult<bool> {
        if !row.active {
            self.skipped += 1;
            log::debug!("Skip inactive row: genome={}", row.genome);
            return Ok(false);
        }
        let bits = RuleBits::from_row(&self.context, row)?;
        if bits.is_empty() {
            self.skipped += 1;
            log::debug!("Skip row without primary roles: genome={}", row.genome);
            return Ok(false);
        }

        let chain = self
            .variants
            .entry(row.variant.clone())
            .or_insert_with(|| Antichain::new(self.context.clone()));
        chain.merge(bits.clone())?;
        self.samples.push(Sample {
            genome: row.genome.clone(),
            variant: row.variant.clone(),
            bits,
        });
        Ok(true)
    }

    /// 批量折叠，返回实际参与归纳的行数
    pub fn add_rows<'a, I>(&mut self, rows: I) -> CoreResult<usize>
    where
        I: IntoIterator<Item = &'a ExampleRow>,
    {
        let mut used = 0;
        for row in rows {
            if self.add_row(row)? {
                used += 1;
            }
        }
        Ok(used)
    }

    pub fn antichain(&self, code: &str) -> Option<&Antichain> {
        self.variants.get(code)
    }

    /// 输出顺序下的变体代码：活跃代码在前，各自按字典序
    pub fn variant_codes(&self) -> Vec<&str> {
        let (mut codes, inactive): (Vec<&str>, Vec<&str>) = self
            .variants
            .keys()
            .map(String::as_str)
            .partition(|code| is_active_code(code));
        codes.extend(inactive);
        codes
    }

    pub fn generate(&self) -> GeneratedRules {
        let mut out = GeneratedRules::default();
        let mut groups: Vec<RuleBits> = Vec::new();
        let codes = self.variant_codes();

        for code in &codes {
            let Some(chain) = self.variants.get(*code) else {
                continue;
            };
            let members = chain.sorted();
            let expression = match members.as_slice() {
                [] => continue,
                [only] => only.to_conjunction(),
                _ => {
                    let common = chain.intersection();
                    if common.is_empty() {
                        join_operands(members.iter().map(|m| m.to_operand()))
                    } else {
                        let group = self.group_name(&common, &mut groups, &mut out.definitions);
                        let rest = join_operands(members.iter().map(|m| m.minus(&common).to_operand()));
                        format!("{} and ({})", group, rest)
                    }
                }
            };
            out.rules.push(RuleDefinition::new(*code, expression));
        }

        let fallback = self
            .context
            .primary_indices()
            .map(|idx| self.context.abbr(idx))
            .collect::<Vec<_>>()
            .join(", ");
        out.definitions.push(RuleDefinition::new(
            self.options.fallback_name.as_str(),
            format!("1 of {{{}}}", fallback),
        ));
        out.rules.push(RuleDefinition::new(
            self.options.unclassified_code.as_str(),
            self.options.fallback_name.as_str(),
        ));

        out.conflicts = self.find_conflicts(&codes);
        for conflict in &out.conflicts {
            log::warn!(
                "Example row shadowed by an earlier variant | genome: {} | variant: {} | matched: {}",
                conflict.genome,
                conflict.variant,
                conflict.matched_variant
            );
        }

        log::debug!(
            "规则归纳完成：subsystem={}, samples={}, skipped={}, variants={}, groups={}, conflicts={}",
            self.context.name,
            self.samples.len(),
            self.skipped,
            codes.len(),
            groups.len(),
            out.conflicts.len()
        );
        out
    }

    /// 分组名（相同交集复用之前的分组）
    fn group_name(
        &self,
        common: &RuleBits,
        groups: &mut Vec<RuleBits>,
        definitions: &mut Vec<RuleDefinition>,
    ) -> String {
        if let Some(pos) = groups.iter().position(|g| g == common) {
            return format!("{}{}", self.options.group_prefix, pos);
        }
        let name = format!("{}{}", self.options.group_prefix, groups.len());
        definitions.push(RuleDefinition::new(name.as_str(), common.to_conjunction()));
        groups.push(common.clone());
        name
    }

    fn find_conflicts(&self, codes: &[&str]) -> Vec<Conflict> {
        let rank: BTreeMap<&str, usize> = codes.iter().enumerate().map(|(i, c)| (*c, i)).collect();
        self.samples
            .iter()
            .filter_map(|sample| {
                let own = rank.get(sample.variant.as_str()).copied()?;
                codes[..own]
                    .iter()
                    .find(|code| {
                        self.variants
                            .get(**code)
                            .is_some_and(|chain| sample.bits.matches(chain))
                    })
                    .map(|code| Conflict {
                        genome: sample.genome.clone(),
                        variant: sample.variant.clone(),
                        matched_variant: code.to_string(),
                    })
            })
            .collect()
    }
}

fn join_operands<I: Iterator<Item = String>>(operands: I) -> String {
    operands.collect::<Vec<_>>().join(" or ")
}
