use std::fmt::{self, Display, Formatter};
use std::mem;

/// 规则文本的原子令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// 标识符、数字或关键字
    Word(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
}

impl Token {
    /// 令牌对应的源文本
    pub fn as_str(&self) -> &str {
        match self {
            Token::Word(w) => w,
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
        }
    }

    /// 是否为指定关键字（大小写不敏感）
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 将一行规则文本拆分为令牌
/// - 空白是分隔符，不输出
/// - `{` `}` `,` 总是单字符令牌
/// - `(` 只有出现在新令牌开头时才是分组符号，否则计入标识符并增加嵌套计数
/// - `)` 在嵌套计数为正时计入标识符，否则是分组符号
///
/// 因此 `1.3s1(a)` 是一个标识符，而独立的 `(` `)` 是分组运算符。
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut buf = String::with_capacity(16);
    let mut depth = 0usize;

    fn flush(tokens: &mut Vec<Token>, buf: &mut String, depth: &mut usize) {
        if !buf.is_empty() {
            tokens.push(Token::Word(mem::take(buf)));
        }
        *depth = 0;
    }

    for ch in line.chars() {
        match ch {
            c if c.is_whitespace() => flush(&mut tokens, &mut buf, &mut depth),
            '{' | '}' | ',' => {
                flush(&mut tokens, &mut buf, &mut depth);
                tokens.push(match ch {
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    _ => Token::Comma,
                });
            }
            '(' => {
                if buf.is_empty() {
                    tokens.push(Token::LParen);
                } else {
                    buf.push(ch);
                    depth += 1;
                }
            }
            ')' => {
                if depth > 0 {
                    buf.push(ch);
                    depth -= 1;
                } else {
                    flush(&mut tokens, &mut buf, &mut depth);
                    tokens.push(Token::RParen);
                }
            }
            _ => buf.push(ch),
        }
    }
    flush(&mut tokens, &mut buf, &mut depth);

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<String> {
        tokenize(line).iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_tokenize_reference_line() {
        let got = texts("1.3 or (1.3.N and 1.3.C) or 2 of {1.3l, 1.3s1(a), 6}");
        let expected = [
            "1.3", "or", "(", "1.3.N", "and", "1.3.C", ")", "or", "2", "of", "{", "1.3l", ",",
            "1.3s1(a)", ",", "6", "}",
        ];
        assert_eq!(got, expected);
    }

    #[test]
    fn test_tokenize_nested_identifier_parens() {
        assert_eq!(texts("x(a(b)))"), vec!["x(a(b))", ")"]);
        assert_eq!(texts("((a))"), vec!["(", "(", "a", ")", ")"]);
    }

    #[test]
    fn test_tokenize_delimiters_end_pending_word() {
        assert_eq!(texts("a,b}c{"), vec!["a", ",", "b", "}", "c", "{"]);
        assert_eq!(texts("  \t "), Vec::<String>::new());
    }

    #[test]
    fn test_keyword_detection_is_case_insensitive() {
        let tokens = tokenize("A AND not B");
        assert!(tokens[1].is_keyword("and"));
        assert!(tokens[2].is_keyword("NOT"));
        assert!(!tokens[0].is_keyword("and"));
        assert!(!Token::Comma.is_keyword(","));
    }
}
