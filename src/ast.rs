//! 语法树：形状与文法一一对应，构建后不再修改
//!
//! ```text
//! filter       := clause*
//! clause       := not_clause | and_or_clause | paren_clause
//! not_clause   := '~not' paren_clause
//! and_or_clause:= ('~and' | '~or') paren_clause
//! paren_clause := '(' (filter | call_expr) ')'
//! call_expr    := FIELD ',' OPERATOR (',' args)?
//! args         := (SUBOP | value) (',' value)*
//! ```

use crate::token::{Connective, Span};

/// 一串隐式 AND 连接的子句 (multi clause)
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub clauses: Vec<Clause>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `~and(...)` 或 `~or(...)`
    AndOr {
        operator: Connective,
        clause: ParenClause,
        span: Span,
    },
    /// `~not(...)`
    Not { clause: ParenClause, span: Span },
    /// 不带连接词的 `(...)`
    Paren(ParenClause),
}

impl Clause {
    pub fn span(&self) -> Span {
        match self {
            Clause::AndOr { span, .. } | Clause::Not { span, .. } => *span,
            Clause::Paren(paren) => paren.span,
        }
    }
}

/// 括号内要么是嵌套的 filter，要么是一个比较表达式
#[derive(Debug, Clone, PartialEq)]
pub struct ParenClause {
    pub inner: ParenBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParenBody {
    Filter(Filter),
    Call(CallExpression),
}

/// 叶子条件：`(field, operator, sub_operator?, value...)`
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub field: Argument,
    pub operator: Argument,
    pub sub_operator: Option<Argument>,
    /// 逗号分隔的值；逗号之间没有内容时为空字符串
    pub arguments: Vec<Argument>,
    pub span: Span,
}

/// 一个字段名、运算符或值
///
/// 相邻的多个单词（中间只有空白）合并为一个参数，用单个空格连接。
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub text: String,
    pub quoted: bool,
    pub span: Span,
}

impl Argument {
    pub fn new(text: impl Into<String>, quoted: bool, span: Span) -> Self {
        Self {
            text: text.into(),
            quoted,
            span,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && !self.quoted
    }
}
