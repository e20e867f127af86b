mod columns;
mod rule;
mod trace;

// 导出常用项
pub use columns::{ExampleRow, RoleColumn, RoleColumns};
pub use rule::{ListMode, Rule};
pub use trace::{EvalTrace, NoTrace, RolePresence, RoleSet, TraceEntry, TraceMode, Tracer};
