//! 全局错误类型定义
use rsvariant_engine::{CoreError, ParseError};
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RsvError {
    // 规则相关错误
    #[error("规则加载失败：{0}")]
    RuleLoadError(String),
    #[error("规则解析失败：{origin}:{line}: {source}")]
    RuleParseError {
        origin: String,
        line: usize,
        source: ParseError,
    },
    #[error("未解析的规则标识符：{}", .0.join(", "))]
    UnresolvedReferences(Vec<String>),
    #[error("未知变体代码：{0}")]
    UnknownVariant(String),

    // 内核错误（归纳输入/上下文校验）
    #[error("内核错误：{0}")]
    CoreError(#[from] CoreError),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("无效输入：{0}")]
    InvalidInput(String),
}

// 全局Result类型
pub type RsvResult<T> = Result<T, RsvError>;
