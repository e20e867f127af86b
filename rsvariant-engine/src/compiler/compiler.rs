use std::iter::Peekable;
use std::vec::IntoIter;

use super::namespace::NameSpace;
use super::tokenizer::{tokenize, Token};
use crate::core::{ListMode, Rule};
use crate::error::{ParseError, ParseResult};
use crate::utils::log_format::preview_compact;

/// 编译栈上的未完成节点
/// 每个帧在挂到父节点之前都是唯一持有的
#[derive(Debug)]
enum Frame {
    /// 括号占位：只接受一个操作数
    Group(Option<Rule>),
    /// 取反：收到操作数后立即闭合
    Not,
    /// 列表：And/Or 由运算符打开，AtLeast 由 `N of {` 打开、`}` 关闭
    List {
        mode: ListMode,
        count: usize,
        children: Vec<Rule>,
    },
}

impl Frame {
    fn list(mode: ListMode, count: usize, children: Vec<Rule>) -> Self {
        Frame::List {
            mode,
            count,
            children,
        }
    }

    fn is_count_list(&self) -> bool {
        matches!(
            self,
            Frame::List {
                mode: ListMode::AtLeast,
                ..
            }
        )
    }

    /// 帧 → 规则节点
    fn finish(self) -> ParseResult<Rule> {
        match self {
            Frame::Group(Some(rule)) => Ok(Rule::Placeholder(Some(Box::new(rule)))),
            Frame::Group(None) => Err(ParseError::MissingOperand(
                "empty expression".to_string(),
            )),
            Frame::Not => Err(ParseError::MissingOperand(
                "`not` has no operand".to_string(),
            )),
            Frame::List {
                mode: ListMode::AtLeast,
                count,
                children,
            } => Ok(Rule::at_least(count, children)),
            Frame::List { mode, children, .. } if children.len() < 2 => {
                Err(ParseError::MissingOperand(format!(
                    "`{}` needs an operand on each side",
                    mode.keyword()
                )))
            }
            Frame::List {
                mode: ListMode::And,
                children,
                ..
            } => Ok(Rule::and(children)),
            Frame::List { children, .. } => Ok(Rule::or(children)),
        }
    }
}

/// 单行编译状态机
struct LineState<'ns> {
    stack: Vec<Frame>,
    tokens: Peekable<IntoIter<Token>>,
    names: &'ns mut NameSpace,
    /// 当前未闭合的 `(` 数量
    open_parens: usize,
    /// 每个打开的计数列表在 `{` 处记录的 open_parens
    count_list_parens: Vec<usize>,
}

impl<'ns> LineState<'ns> {
    fn new(line: &str, names: &'ns mut NameSpace) -> Self {
        Self {
            stack: vec![Frame::Group(None)],
            tokens: tokenize(line).into_iter().peekable(),
            names,
            open_parens: 0,
            count_list_parens: Vec::new(),
        }
    }

    fn run(mut self) -> ParseResult<Rule> {
        while let Some(token) = self.tokens.next() {
            match token {
                Token::LParen => {
                    self.stack.push(Frame::Group(None));
                    self.open_parens += 1;
                }
                Token::RParen => {
                    self.close_group()?;
                    self.open_parens = self.open_parens.saturating_sub(1);
                }
                Token::LBrace => {
                    return Err(ParseError::MalformedCountList(
                        "`{` must follow `N of`".to_string(),
                    ))
                }
                Token::Comma => self.unwind_to_count_list(",")?,
                Token::RBrace => {
                    self.unwind_to_count_list("}")?;
                    self.pop_and_attach()?;
                    self.count_list_parens.pop();
                }
                Token::Word(word) => self.word(word)?,
            }
        }

        if matches!(self.stack.last(), Some(Frame::Not)) {
            return Err(ParseError::MissingOperand(
                "`not` has no operand".to_string(),
            ));
        }
        if self.stack.len() != 1 {
            return Err(ParseError::UnbalancedDelimiter(
                "unclosed `(` or `{` at end of rule".to_string(),
            ));
        }
        let root = self
            .stack
            .pop()
            .ok_or_else(|| ParseError::MissingOperand("empty expression".to_string()))?;
        Ok(root.finish()?.unspool())
    }

    fn word(&mut self, word: String) -> ParseResult<()> {
        if word.eq_ignore_ascii_case("and") {
            return self.switch_mode(ListMode::And);
        }
        if word.eq_ignore_ascii_case("or") {
            return self.switch_mode(ListMode::Or);
        }
        if word.eq_ignore_ascii_case("not") {
            self.stack.push(Frame::Not);
            return Ok(());
        }
        if word.eq_ignore_ascii_case("of") {
            return Err(ParseError::MalformedCountList(
                "`of` must follow a count".to_string(),
            ));
        }

        if self.tokens.peek().is_some_and(|t| t.is_keyword("of")) {
            return self.open_count_list(&word);
        }

        let operand = match self.names.resolve(&word) {
            Some(rule) => rule.clone(),
            None => {
                self.names.mark_unresolved(&word);
                Rule::Fail(word)
            }
        };
        self.add_operand(operand)
    }

    /// `N of {` ：校验计数并压入 AtLeast 列表
    fn open_count_list(&mut self, word: &str) -> ParseResult<()> {
        if word.is_empty() || !word.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::NonNumericCount(word.to_string()));
        }
        let count: usize = word
            .parse()
            .map_err(|_| ParseError::InvalidCount(word.to_string()))?;

        // 消费 `of`
        self.tokens.next();
        match self.tokens.next() {
            Some(Token::LBrace) => {
                self.stack.push(Frame::list(ListMode::AtLeast, count, Vec::new()));
                self.count_list_parens.push(self.open_parens);
                Ok(())
            }
            other => Err(ParseError::MalformedCountList(format!(
                "expected `{{` after `{} of`, found {}",
                count,
                other.map_or_else(|| "end of rule".to_string(), |t| format!("`{}`", t))
            ))),
        }
    }

    /// and / or 处理
    /// - 栈顶已是同模式列表：继续累积
    /// - 栈顶是 `{...}` 中的计数列表：取出最后一个子规则，包进新列表
    /// - 否则：把栈顶整体包进新列表（无优先级，在切换点重新定根）
    fn switch_mode(&mut self, mode: ListMode) -> ParseResult<()> {
        let lifted = match self.stack.last_mut() {
            Some(Frame::List { mode: current, .. }) if *current == mode => return Ok(()),
            Some(Frame::List {
                mode: ListMode::AtLeast,
                children,
                ..
            }) => children.pop().ok_or_else(|| {
                ParseError::MissingOperand(format!("`{}` has no left operand", mode.keyword()))
            })?,
            _ => {
                let top = self.stack.pop().ok_or_else(|| {
                    ParseError::MissingOperand(format!(
                        "`{}` has no left operand",
                        mode.keyword()
                    ))
                })?;
                top.finish().map_err(|_| {
                    ParseError::MissingOperand(format!(
                        "`{}` has no left operand",
                        mode.keyword()
                    ))
                })?
            }
        };
        self.stack.push(Frame::list(mode, 0, vec![lifted]));
        Ok(())
    }

    /// 把操作数挂到栈顶；取反帧收到操作数后闭合并继续向下挂
    fn add_operand(&mut self, rule: Rule) -> ParseResult<()> {
        let mut operand = rule;
        loop {
            match self.stack.last_mut() {
                Some(Frame::Not) => {
                    self.stack.pop();
                    operand = Rule::not(operand);
                }
                Some(Frame::Group(slot)) => {
                    if slot.is_some() {
                        return Err(ParseError::TooManyOperands(format!(
                            "unexpected operand `{}`",
                            operand
                        )));
                    }
                    *slot = Some(operand);
                    return Ok(());
                }
                Some(Frame::List { children, .. }) => {
                    children.push(operand);
                    return Ok(());
                }
                None => {
                    return Err(ParseError::UnbalancedDelimiter(format!(
                        "no open expression for operand `{}`",
                        operand
                    )))
                }
            }
        }
    }

    /// 弹出栈顶帧，完成后挂到新的栈顶
    fn pop_and_attach(&mut self) -> ParseResult<()> {
        let frame = self.stack.pop().ok_or_else(|| {
            ParseError::UnbalancedDelimiter("nothing to close".to_string())
        })?;
        let rule = frame.finish()?;
        self.add_operand(rule)
    }

    /// `)`
    fn close_group(&mut self) -> ParseResult<()> {
        if self.stack.len() <= 1 {
            return Err(ParseError::UnbalancedDelimiter(
                "unmatched `)`".to_string(),
            ));
        }
        if self.stack.last().is_some_and(Frame::is_count_list) {
            return Err(ParseError::UnbalancedDelimiter(
                "`)` cannot close a count list opened with `{`".to_string(),
            ));
        }
        self.pop_and_attach()
    }

    /// `,` / `}`：逐层闭合，直到栈顶是计数列表
    /// 计数列表内未闭合的 `(` 不能被 `,` / `}` 穿过
    fn unwind_to_count_list(&mut self, delimiter: &str) -> ParseResult<()> {
        if let Some(&opened_at) = self.count_list_parens.last() {
            if self.open_parens != opened_at {
                return Err(ParseError::UnbalancedDelimiter(format!(
                    "unclosed `(` before `{}`",
                    delimiter
                )));
            }
        }
        loop {
            if self.stack.last().is_some_and(Frame::is_count_list) {
                return Ok(());
            }
            if self.stack.len() <= 1 {
                return Err(ParseError::UnbalancedDelimiter(format!(
                    "`{}` outside of a count list",
                    delimiter
                )));
            }
            self.pop_and_attach()?;
        }
    }
}

/// 规则编译器
/// 单遍扫描令牌，显式维护未完成节点栈，每行产出一棵规则树。
/// 单行致命错误只影响该行，编译器与名字空间可继续用于后续行；
/// 未解析的标识符替换为 `Fail` 并累计到名字空间中。
#[derive(Debug, Default, Clone)]
pub struct RuleCompiler {
    compiled: usize,
    failed: usize,
}

impl RuleCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 编译一行规则表达式
    pub fn compile(&mut self, line: &str, names: &mut NameSpace) -> ParseResult<Rule> {
        match LineState::new(line, names).run() {
            Ok(rule) => {
                self.compiled += 1;
                Ok(rule)
            }
            Err(e) => {
                self.failed += 1;
                log::debug!(
                    "Rule compile failed | Expression: {} | Error: {}",
                    preview_compact(line, 120),
                    e
                );
                Err(e)
            }
        }
    }

    /// 编译并以给定名字绑定到名字空间
    pub fn compile_definition(
        &mut self,
        name: &str,
        line: &str,
        names: &mut NameSpace,
    ) -> ParseResult<Rule> {
        let rule = self.compile(line, names)?;
        if names.define(name, rule.clone()).is_some() {
            log::debug!("Rule definition `{}` replaced an earlier binding", name);
        }
        Ok(rule)
    }

    /// 成功编译的行数
    pub fn compiled_count(&self) -> usize {
        self.compiled
    }

    /// 编译失败的行数
    pub fn failed_count(&self) -> usize {
        self.failed
    }
}
