//! 规则文件文本解析：`name (means|if|is) expression`
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::RsvError;

// 规则行正则（懒加载，避免重复编译）
static RULE_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S+)\s+(?i:means|if|is)\s+(.*\S)\s*$").unwrap()
});

/// 规则文件中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleLine {
    /// 1起始的行号
    pub line_no: usize,
    pub name: String,
    pub expression: String,
}

/// 一个规则文件的解析结果：合法行 + 格式错误行
#[derive(Debug, Default)]
pub struct ParsedRuleFile {
    pub lines: Vec<RuleLine>,
    pub errors: Vec<RsvError>,
}

/// 规则文件解析器
/// 注释行（`#` 开头）与空行被忽略
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleFileParser;

impl RuleFileParser {
    pub fn parse(&self, origin: &str, text: &str) -> ParsedRuleFile {
        let mut parsed = ParsedRuleFile::default();
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match RULE_LINE_REGEX.captures(trimmed) {
                Some(caps) => parsed.lines.push(RuleLine {
                    line_no,
                    name: caps[1].to_string(),
                    expression: caps[2].to_string(),
                }),
                None => parsed.errors.push(RsvError::RuleLoadError(format!(
                    "{}:{}: expected `name means expression`, got `{}`",
                    origin, line_no, trimmed
                ))),
            }
        }
        parsed
    }
}
