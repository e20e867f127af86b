//! rsvariant-engine 内核错误定义
//! 规则编译错误（单行致命）与归纳输入错误分开定义，基于thiserror实现类型安全处理
use thiserror::Error;

/// 单行规则编译错误
/// 只影响当前编译的这一行，名字空间与编译器在出错后仍可继续使用
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// 关闭符号找不到对应的开启符号（多余的 `)` / `}` / `,`，或行尾仍有未关闭的分组）
    #[error("Unbalanced delimiter: {0}")]
    UnbalancedDelimiter(String),

    /// 只接受一个操作数的节点收到了第二个操作数
    #[error("Too many operands: {0}")]
    TooManyOperands(String),

    /// 计数列表格式错误（缺少 `{`、孤立的 `{` 或 `of`）
    #[error("Malformed count list: {0}")]
    MalformedCountList(String),

    /// `of` 前面不是数字
    #[error("Non-numeric count: {0}")]
    NonNumericCount(String),

    /// 计数超出可表示范围
    #[error("Invalid count: {0}")]
    InvalidCount(String),

    /// 运算符或分组缺少操作数（包括空表达式）
    #[error("Missing operand: {0}")]
    MissingOperand(String),
}

/// 内核核心错误枚举（归纳输入/上下文校验）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// 无效输入参数（行宽与列数不一致等）
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 两个RuleBits不属于同一个子系统上下文
    #[error("Rule context mismatch: expected `{expected}`, found `{found}`")]
    ContextMismatch { expected: String, found: String },
}

/// 单行编译Result类型别名
pub type ParseResult<T> = Result<T, ParseError>;

/// 内核层全局Result类型别名
/// 统一使用CoreError作为内核层错误类型
pub type CoreResult<T> = Result<T, CoreError>;
