// 核心公共结构体+枚举（规则树、角色列、求值追踪）
pub mod core;
// 规则语言：令牌化 + 栈式编译 + 名字空间
pub mod compiler;
// 规则归纳：RuleBits / 反链 / 规则生成
pub mod induction;
// 子系统规则集编译（定义行 + 变体规则行）
pub mod processor;
pub mod error;
pub mod utils;

// 顶层导出常用类型
pub use core::{
    EvalTrace, ExampleRow, ListMode, NoTrace, RoleColumn, RoleColumns, RolePresence, RoleSet, Rule,
    TraceEntry, TraceMode, Tracer,
};
pub use compiler::{is_keyword, tokenize, NameSpace, RuleCompiler, Token, KEYWORDS};
pub use error::{CoreError, CoreResult, ParseError, ParseResult};
pub use induction::{
    is_active_code, Antichain, Conflict, GeneratedRules, GeneratorOptions, RuleBits,
    RuleDefinition, RuleGenerator, Subsumption,
};
pub use processor::{RuleProcessor, SubsystemRules, VariantRule};
