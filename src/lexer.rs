//! Filter的词法分析器
//!
//! 每次调用 [`scan`] 都会构造一个新的 [`Scanner`]，游标只属于这一次扫描，
//! 因此扫描是纯函数，可以在多个线程中并发调用。

use crate::error::LexError;
use crate::token::{Connective, Span, Token, TokenKind, OPERATORS, SUB_OPERATORS};

/// 除字母和数字以外，可以出现在未加引号的标识符中的符号
const IDENTIFIER_SYMBOLS: &str = "_-.!@#$%^&*+=/?:;<>[]{}|\\`";

/// 扫描整个输入，返回 token 序列和词法错误列表
///
/// 遇到无法识别的字符时记录错误并跳过该字符，不会中止扫描。
pub fn scan(input: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut scanner = Scanner::new(input);
    let tokens: Vec<Token> = scanner.by_ref().collect();
    (tokens, scanner.into_errors())
}

pub struct Scanner<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
    errors: Vec<LexError>,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Scanner {
            input,
            position: 0,
            errors: Vec::new(),
        }
    }

    /// 已收集的词法错误
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<LexError> {
        self.errors
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 跳过空白字符
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// 读取连续的标识符字符
    fn eat_word(&mut self) {
        while let Some(c) = self.peek() {
            if is_identifier_char(c) {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// 读取标识符、运算符或子运算符
    ///
    /// 先按最长匹配读取完整的单词，再与白名单比较，
    /// 所以 `likes` 是标识符而不是 `like` 加 `s`。
    fn read_word(&mut self, start: usize) -> Token {
        self.eat_word();
        let literal = &self.input[start..self.position];
        Token::new(classify_word(literal), literal, Span::new(start, self.position))
    }

    /// 读取单引号或双引号包围的标识符
    /// 注意：开始的引号已经被调用者消费
    ///
    /// 反斜杠转义下一个字符，所以 `\"` 和 `\'` 可以出现在同类引号中。
    fn read_quoted(&mut self, start: usize, quote: char) -> Option<Token> {
        let mut content = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(escaped) => content.push(escaped),
                    None => break,
                },
                Some(c) if c == quote => {
                    return Some(Token::new(
                        TokenKind::QuotedIdentifier,
                        content,
                        Span::new(start, self.position),
                    ));
                }
                Some(c) => content.push(c),
                None => break,
            }
        }
        self.errors.push(LexError::new(
            format!("unterminated quoted identifier starting with {quote}"),
            Span::new(start, self.position),
        ));
        None
    }

    /// 读取 `~and`、`~or`、`~not`
    /// 注意：`~` 已经被调用者消费
    fn read_connective(&mut self, start: usize) -> Option<Token> {
        let word_start = self.position;
        self.eat_word();
        let word = &self.input[word_start..self.position];
        let span = Span::new(start, self.position);
        let kind = match word.to_ascii_lowercase().as_str() {
            "and" => TokenKind::LogicalAndOr(Connective::And),
            "or" => TokenKind::LogicalAndOr(Connective::Or),
            "not" => TokenKind::Not,
            _ => {
                self.errors.push(LexError::new(
                    format!(
                        "unexpected '~{word}', expected '~and', '~or' or '~not'"
                    ),
                    span,
                ));
                return None;
            }
        };
        Some(Token::new(kind, &self.input[start..self.position], span))
    }

    fn punctuation(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(
            kind,
            &self.input[start..self.position],
            Span::new(start, self.position),
        )
    }
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || IDENTIFIER_SYMBOLS.contains(c)
}

fn classify_word(word: &str) -> TokenKind {
    if OPERATORS.contains(&word) {
        TokenKind::Operator
    } else if SUB_OPERATORS.contains(&word) {
        TokenKind::SubOperator
    } else {
        TokenKind::Identifier
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.skip_whitespace();
            let start = self.position;

            let c = self.bump()?; // 到达输入末尾

            let token = match c {
                '(' => Some(self.punctuation(TokenKind::LParen, start)),
                ')' => Some(self.punctuation(TokenKind::RParen, start)),
                ',' => Some(self.punctuation(TokenKind::Comma, start)),
                '~' => self.read_connective(start),
                '"' | '\'' => self.read_quoted(start, c),
                c if is_identifier_char(c) => Some(self.read_word(start)),
                _ => {
                    self.errors.push(LexError::new(
                        format!("unexpected character '{c}'"),
                        Span::new(start, self.position),
                    ));
                    None
                }
            };
            if token.is_some() {
                return token;
            }
        }
    }
}
