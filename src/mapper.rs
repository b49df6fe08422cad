//! 语法树到 Filter 领域模型的转换
//!
//! - 顶层只有一个子句时直接返回该节点，否则包装为 `and` 组
//! - `~and` / `~or` / `~not` 作为所生成节点的 `logical_op`；
//!   没有连接词的子句显式填入 `and`
//! - 每个叶子子句再经过 [`normalize`] 处理

use crate::ast::{Argument, CallExpression, Clause, Filter, ParenBody, ParenClause};
use crate::error::{Expected, ParseError};
use crate::filter::{
    ComparisonOp, ComparisonSubOp, FilterClause, FilterGroup, FilterNode, FilterValue, LogicalOp,
};
use crate::token::Connective;

/// 将语法树转换为领域模型
pub fn map(filter: &Filter) -> Result<FilterNode, ParseError> {
    let mut nodes = filter
        .clauses
        .iter()
        .map(map_clause)
        .collect::<Result<Vec<_>, _>>()?;
    if nodes.len() == 1 {
        if let Some(node) = nodes.pop() {
            return Ok(node);
        }
    }
    Ok(FilterNode::Group(FilterGroup::new(LogicalOp::And, nodes)))
}

fn map_clause(clause: &Clause) -> Result<FilterNode, ParseError> {
    let (logical_op, paren) = match clause {
        Clause::AndOr {
            operator: Connective::And,
            clause,
            ..
        } => (LogicalOp::And, clause),
        Clause::AndOr {
            operator: Connective::Or,
            clause,
            ..
        } => (LogicalOp::Or, clause),
        Clause::Not { clause, .. } => (LogicalOp::Not, clause),
        Clause::Paren(clause) => (LogicalOp::And, clause),
    };
    map_paren(paren, logical_op)
}

fn map_paren(paren: &ParenClause, logical_op: LogicalOp) -> Result<FilterNode, ParseError> {
    match &paren.inner {
        ParenBody::Filter(filter) => {
            let children = filter
                .clauses
                .iter()
                .map(map_clause)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(FilterNode::Group(FilterGroup::new(logical_op, children)))
        }
        ParenBody::Call(call) => {
            let clause = map_call(call)?.with_logical_op(logical_op);
            Ok(FilterNode::Clause(normalize_clause(clause)))
        }
    }
}

fn map_call(call: &CallExpression) -> Result<FilterClause, ParseError> {
    let comparison_op: ComparisonOp = call
        .operator
        .text
        .parse()
        .map_err(|_| unrecognized(&call.operator, Expected::Operator))?;

    let comparison_sub_op = call
        .sub_operator
        .as_ref()
        .map(|sub| {
            sub.text
                .parse::<ComparisonSubOp>()
                .map_err(|_| unrecognized(sub, Expected::Value))
        })
        .transpose()?;

    let value = match call.arguments.as_slice() {
        [] => None,
        [single] => Some(FilterValue::Text(single.text.clone())),
        many => Some(FilterValue::List(
            many.iter().map(|arg| arg.text.clone()).collect(),
        )),
    };

    Ok(FilterClause {
        fk_column_id: None,
        field: Some(call.field.text.clone()),
        comparison_op,
        comparison_sub_op,
        logical_op: None,
        value,
    })
}

fn unrecognized(argument: &Argument, expected: Expected) -> ParseError {
    ParseError::new(vec![expected], Some(argument.text.clone()), Some(argument.span))
}

/// 对整棵树的每个叶子子句做规范化；重复调用结果不变
pub fn normalize(node: FilterNode) -> FilterNode {
    match node {
        FilterNode::Group(group) => FilterNode::Group(FilterGroup::new(
            group.logical_op,
            group.children.into_iter().map(normalize).collect(),
        )),
        FilterNode::Clause(clause) => FilterNode::Clause(normalize_clause(clause)),
    }
}

/// 按顺序应用三条规则
pub fn normalize_clause(mut clause: FilterClause) -> FilterClause {
    // 1. `is blank` / `is notblank` 改写为 blank / notblank 运算符
    if clause.comparison_op == ComparisonOp::Is {
        let rewritten = match clause.value.as_ref().and_then(FilterValue::as_text) {
            Some("blank") => Some(ComparisonOp::Blank),
            Some("notblank") => Some(ComparisonOp::NotBlank),
            _ => None,
        };
        if let Some(op) = rewritten {
            clause.comparison_op = op;
            clause.value = None;
        }
    }

    // 2. in 的字符串值按逗号拆分为数组
    if clause.comparison_op == ComparisonOp::In {
        if let Some(FilterValue::Text(text)) = &clause.value {
            let items = text.split(',').map(str::to_string).collect();
            clause.value = Some(FilterValue::List(items));
        }
    }

    // 3. 多个值重新用逗号连接；全部是 null 时值为 null
    if clause.comparison_op.collapses_multi_value() {
        if let Some(FilterValue::List(items)) = &clause.value {
            clause.value = if !items.is_empty() && items.iter().all(|item| item == "null") {
                Some(FilterValue::Null)
            } else {
                Some(FilterValue::Text(items.join(",")))
            };
        }
    }

    // 等值类运算符没有值时默认为空字符串
    if clause.comparison_op.is_equality_family() && clause.value.is_none() {
        clause.value = Some(FilterValue::Text(String::new()));
    }

    clause
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_filter;
    use crate::token::OPERATORS;

    fn only_clause(input: &str) -> FilterClause {
        match parse_filter(input).unwrap() {
            FilterNode::Clause(clause) => clause,
            other => panic!("Expected clause, got {other:?}"),
        }
    }

    #[test]
    fn test_every_operator_word_maps() {
        for word in OPERATORS {
            assert!(word.parse::<ComparisonOp>().is_ok(), "{word} should map");
        }
    }

    #[test]
    fn test_quoted_value_with_comma() {
        let clause = only_clause(r#"(field1, eq, "hello, 'world")"#);
        assert_eq!(clause.field.as_deref(), Some("field1"));
        assert_eq!(clause.comparison_op, ComparisonOp::Eq);
        assert_eq!(clause.value, Some(FilterValue::text("hello, 'world")));
    }

    #[test]
    fn test_is_blank_rewrite() {
        let clause = only_clause("(Category,is,blank)");
        assert_eq!(clause.field.as_deref(), Some("Category"));
        assert_eq!(clause.comparison_op, ComparisonOp::Blank);
        assert_eq!(clause.value, None);

        let clause = only_clause("(Category,is,notblank)");
        assert_eq!(clause.comparison_op, ComparisonOp::NotBlank);
        assert_eq!(clause.value, None);

        assert_eq!(only_clause("(a,is_blank)").comparison_op, ComparisonOp::Blank);
        assert_eq!(only_clause("(a,isnotblank)").comparison_op, ComparisonOp::NotBlank);
        assert_eq!(only_clause("(a,is_notblank)").comparison_op, ComparisonOp::NotBlank);
    }

    #[test]
    fn test_equality_family_defaults_to_empty_string() {
        let clause = only_clause("(Category,gb_eq,)");
        assert_eq!(clause.comparison_op, ComparisonOp::GbEq);
        assert_eq!(clause.value, Some(FilterValue::text("")));

        let clause = only_clause("(Category,eq)");
        assert_eq!(clause.value, Some(FilterValue::text("")));

        let clause = only_clause("(Category,like)");
        assert_eq!(clause.value, None);
    }

    #[test]
    fn test_multi_token_rejoin() {
        let clause = only_clause(r#"("field(1)",eq, hello, world,  baby!)"#);
        assert_eq!(clause.field.as_deref(), Some("field(1)"));
        assert_eq!(clause.value, Some(FilterValue::text("hello,world,baby!")));

        let clause = only_clause("(a,eq,null,null)");
        assert_eq!(clause.value, Some(FilterValue::Null));

        let clause = only_clause("(a,btw,1,5)");
        assert_eq!(clause.value, Some(FilterValue::list(["1", "5"])));
    }

    #[test]
    fn test_in_is_split() {
        let clause = only_clause(r#"(a,in,"x,y,z")"#);
        assert_eq!(clause.value, Some(FilterValue::list(["x", "y", "z"])));

        let clause = only_clause("(a,in,x,y)");
        assert_eq!(clause.value, Some(FilterValue::list(["x", "y"])));
    }

    #[test]
    fn test_nested_tree_shape() {
        let node = parse_filter(
            "~not(field1, isWithin, nextNumberOfDays, 10)~and((field2, eq, 2)~or(field2, eq, 3))~or(field3, not, 4)",
        )
        .unwrap();
        let FilterNode::Group(root) = node else {
            panic!("Expected group");
        };
        assert_eq!(root.logical_op, LogicalOp::And);
        assert_eq!(root.children.len(), 3);

        match &root.children[0] {
            FilterNode::Clause(clause) => {
                assert_eq!(clause.logical_op, Some(LogicalOp::Not));
                assert_eq!(clause.comparison_op, ComparisonOp::IsWithin);
                assert_eq!(
                    clause.comparison_sub_op,
                    Some(ComparisonSubOp::NextNumberOfDays)
                );
                assert_eq!(clause.value, Some(FilterValue::text("10")));
            }
            other => panic!("Expected clause, got {other:?}"),
        }
        match &root.children[1] {
            FilterNode::Group(group) => {
                assert_eq!(group.logical_op, LogicalOp::And);
                assert_eq!(group.children.len(), 2);
                assert_eq!(group.children[0].logical_op(), Some(LogicalOp::And));
                assert_eq!(group.children[1].logical_op(), Some(LogicalOp::Or));
            }
            other => panic!("Expected group, got {other:?}"),
        }
        match &root.children[2] {
            FilterNode::Clause(clause) => {
                assert_eq!(clause.logical_op, Some(LogicalOp::Or));
                assert_eq!(clause.comparison_op, ComparisonOp::Not);
            }
            other => panic!("Expected clause, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_input_has_no_tree() {
        assert!(parse_filter("(field1)").is_err());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            r#"(field1, eq, "hello, 'world")"#,
            "(Category,is,blank)",
            "(Category,gb_eq,)",
            r#"("field(1)",eq, hello, world,  baby!)"#,
            "(a,in,x,y)~or(b,eq,null,null)~and((c,anyof,p,q)~not(d,btw,1,2))",
        ];
        for input in inputs {
            let once = parse_filter(input).unwrap();
            let twice = normalize(once.clone());
            assert_eq!(once, twice, "normalization changed {input}");
        }

        let raw = FilterNode::Clause(
            FilterClause::new("a", ComparisonOp::Is).with_value(FilterValue::text("blank")),
        );
        let once = normalize(raw);
        assert_eq!(normalize(once.clone()), once);
    }

    #[test]
    fn test_print_then_parse_round_trip() {
        let inputs = [
            r#"(field1, eq, "hello, 'world")"#,
            "(Category,is,blank)",
            "(Category,gb_eq,)",
            r#"("field(1)",eq, hello, world,  baby!)"#,
            "~not(field1, isWithin, nextNumberOfDays, 10)~and((field2, eq, 2)~or(field2, eq, 3))~or(field3, not, 4)",
            "(a,in,x,today)(b,eq,null,null)",
            "((a,eq,1))",
            "~not((a,eq,1)(b,eq,2))",
            "(Full Name, like, 'John  Smith')~or(名前, eq, 値)",
            "(Due,eq,daysAgo,3)~and(Due,gt,exactDate,2024-01-01)",
        ];
        for input in inputs {
            let tree = parse_filter(input).unwrap();
            let printed = tree.to_string();
            let reparsed = parse_filter(&printed)
                .unwrap_or_else(|e| panic!("{printed} did not re-parse: {e}"));
            assert_eq!(tree, reparsed, "round trip through {printed}");
        }
    }
}
