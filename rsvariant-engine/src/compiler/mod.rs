//! 规则语言编译：令牌化 + 栈式编译 + 名字空间
#[allow(clippy::module_inception)]
mod compiler;
mod namespace;
mod tokenizer;

pub use compiler::RuleCompiler;
pub use namespace::NameSpace;
pub use tokenizer::{tokenize, Token};

/// 规则语言关键字
pub const KEYWORDS: [&str; 4] = ["and", "or", "not", "of"];

/// 是否为关键字（大小写不敏感）
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}
