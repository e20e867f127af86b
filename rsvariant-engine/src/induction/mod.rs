//! 规则归纳：样本行 → RuleBits → 反链 → 最简覆盖规则
mod antichain;
mod generator;
mod rule_bits;

pub use antichain::Antichain;
pub use generator::{
    is_active_code, Conflict, GeneratedRules, GeneratorOptions, RuleDefinition, RuleGenerator,
};
pub use rule_bits::{RuleBits, Subsumption};
