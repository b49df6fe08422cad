//! Filter的语法分析器
//!
//! ## 解析流程图
//!
//! ```text
//! parse()
//!   └─ parse_filter()                 (clause*, 隐式 AND)
//!        └─ parse_clause()
//!             ├─ "~not"        → parse_paren_clause()
//!             ├─ "~and"/"~or"  → parse_paren_clause()
//!             └─ "("           → parse_paren_clause()
//!                                  ├─ 下一个是 "(" / "~" → parse_filter() (递归)
//!                                  └─ 其他             → parse_call()
//!                                                          ├─ 字段名 (一个或多个单词)
//!                                                          ├─ 期望 ','
//!                                                          ├─ 期望运算符
//!                                                          └─ (',' 子运算符? 值 (',' 值)*)?
//! ```
//!
//! ## 解析示例
//!
//! ```text
//! (field1, eq, "hello, 'world")
//! (Category,is,blank)
//! ~not(a,eq,1)~and((b,eq,2)~or(b,eq,3))~or(c,not,4)
//! ```
//!
//! 解析器不做错误恢复：遇到第一个结构错误就停止，返回错误列表而不是 panic。
//! 每次调用 [`parse`] 都使用新的解析器实例。

use crate::ast::{Argument, CallExpression, Clause, Filter, ParenBody, ParenClause};
use crate::error::{Expected, ParseError};
use crate::token::{Span, Token, TokenKind};

/// 将 token 序列解析为语法树
///
/// 成功时返回语法树和空的错误列表；失败时不返回语法树。
pub fn parse(tokens: &[Token]) -> (Option<Filter>, Vec<ParseError>) {
    let mut parser = Parser::new(tokens);
    match parser.parse_root() {
        Ok(filter) => (Some(filter), Vec::new()),
        Err(error) => (None, vec![error]),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// 返回当前 token，不推进位置
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    /// 返回当前之后第 n 个 token，不推进位置
    fn peek_nth(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.position + n)
    }

    /// 返回当前 token 并推进位置
    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// 检查当前 token 是否匹配给定类型
    fn match_kind(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    /// 当前位置（用于空参数和输入结束时的定位）
    fn here(&self) -> Span {
        match self.peek() {
            Some(token) => Span::new(token.span.start, token.span.start),
            None => {
                let end = self.tokens.last().map(|t| t.span.end).unwrap_or(0);
                Span::new(end, end)
            }
        }
    }

    /// 构造一个“期望 X，实际遇到当前 token”的错误
    fn error(&self, expected: Vec<Expected>) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::new(expected, Some(token.text.clone()), Some(token.span)),
            None => ParseError::new(expected, None, Some(self.here())),
        }
    }

    /// 期望特定类型的 token 并推进，否则返回错误
    fn expect(&mut self, kind: TokenKind, expected: Vec<Expected>) -> Result<&'a Token, ParseError> {
        if self.match_kind(kind) {
            if let Some(token) = self.advance() {
                return Ok(token);
            }
        }
        Err(self.error(expected))
    }

    /// 当前 token 是否可以开始一个子句
    fn at_clause_start(&self) -> bool {
        self.peek().is_some_and(|t| {
            matches!(
                t.kind,
                TokenKind::LParen | TokenKind::LogicalAndOr(_) | TokenKind::Not
            )
        })
    }

    fn parse_root(&mut self) -> Result<Filter, ParseError> {
        if !self.at_clause_start() {
            return Err(self.error(vec![Expected::Clause]));
        }
        let filter = self.parse_filter();
        if self.peek().is_some() {
            return Err(self.error(vec![Expected::Clause]));
        }
        filter
    }

    /// 解析零个或多个子句，直到遇到无法开始子句的 token
    fn parse_filter(&mut self) -> Result<Filter, ParseError> {
        let start = self.here();
        let mut clauses = Vec::new();
        while self.at_clause_start() {
            clauses.push(self.parse_clause()?);
        }
        let span = clauses
            .iter()
            .map(Clause::span)
            .fold(start, |acc, s| acc.to(s));
        Ok(Filter { clauses, span })
    }

    fn parse_clause(&mut self) -> Result<Clause, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.error(vec![Expected::Clause]));
        };
        match token.kind {
            TokenKind::Not => {
                self.advance(); // 消费 ~not
                let clause = self.parse_paren_clause()?;
                let span = token.span.to(clause.span);
                Ok(Clause::Not { clause, span })
            }
            TokenKind::LogicalAndOr(operator) => {
                self.advance(); // 消费 ~and / ~or
                let clause = self.parse_paren_clause()?;
                let span = token.span.to(clause.span);
                Ok(Clause::AndOr {
                    operator,
                    clause,
                    span,
                })
            }
            TokenKind::LParen => Ok(Clause::Paren(self.parse_paren_clause()?)),
            _ => Err(self.error(vec![Expected::Clause])),
        }
    }

    fn parse_paren_clause(&mut self) -> Result<ParenClause, ParseError> {
        let open = self.expect(TokenKind::LParen, vec![Expected::LParen])?;

        let (inner, close_expected) = if self.at_clause_start() {
            // 括号内是嵌套的 filter
            (
                ParenBody::Filter(self.parse_filter()?),
                vec![Expected::Clause, Expected::RParen],
            )
        } else {
            (
                ParenBody::Call(self.parse_call()?),
                vec![Expected::Comma, Expected::RParen],
            )
        };

        let close = self.expect(TokenKind::RParen, close_expected)?;
        Ok(ParenClause {
            inner,
            span: open.span.to(close.span),
        })
    }

    /// 解析 `field, operator (, sub_operator)? (, value)*`
    fn parse_call(&mut self) -> Result<CallExpression, ParseError> {
        let field = match self.parse_words() {
            Some(field) => field,
            None => return Err(self.error(vec![Expected::Field])),
        };

        self.expect(TokenKind::Comma, vec![Expected::Comma])?;

        let operator = match self.peek() {
            Some(token) if token.kind == TokenKind::Operator => {
                self.advance();
                Argument::new(token.text.clone(), false, token.span)
            }
            _ => return Err(self.error(vec![Expected::Operator])),
        };

        let mut sub_operator = None;
        let mut arguments = Vec::new();

        if self.match_kind(TokenKind::Comma) {
            self.advance(); // 消费 ','

            // 第一个参数是子运算符，当且仅当它单独成为一个参数
            if let Some(token) = self.peek() {
                let stands_alone = self
                    .peek_nth(1)
                    .is_none_or(|next| matches!(next.kind, TokenKind::Comma | TokenKind::RParen));
                if token.kind == TokenKind::SubOperator && stands_alone {
                    self.advance();
                    sub_operator = Some(Argument::new(token.text.clone(), false, token.span));
                    if self.match_kind(TokenKind::Comma) {
                        self.advance();
                    } else {
                        return self.finish_call(field, operator, sub_operator, arguments);
                    }
                }
            }

            // 解析逗号分隔的值列表，逗号之间允许为空
            loop {
                let value = self
                    .parse_words()
                    .unwrap_or_else(|| Argument::new("", false, self.here()));
                arguments.push(value);
                if self.match_kind(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        self.finish_call(field, operator, sub_operator, arguments)
    }

    fn finish_call(
        &self,
        field: Argument,
        operator: Argument,
        sub_operator: Option<Argument>,
        arguments: Vec<Argument>,
    ) -> Result<CallExpression, ParseError> {
        let mut span = field.span.to(operator.span);
        if let Some(sub) = &sub_operator {
            span = span.to(sub.span);
        }
        if let Some(last) = arguments.last() {
            span = span.to(last.span);
        }
        Ok(CallExpression {
            field,
            operator,
            sub_operator,
            arguments,
            span,
        })
    }

    /// 读取一个或多个相邻的单词，合并为一个参数
    fn parse_words(&mut self) -> Option<Argument> {
        let mut words: Vec<&Token> = Vec::new();
        while let Some(token) = self.peek() {
            if token.is_word() {
                words.push(token);
                self.advance();
            } else {
                break;
            }
        }
        let first = words.first()?;
        let last = words.last()?;
        let text = words
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let quoted = words.iter().any(|t| t.kind == TokenKind::QuotedIdentifier);
        Some(Argument::new(text, quoted, first.span.to(last.span)))
    }
}
