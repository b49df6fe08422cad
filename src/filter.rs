//! The filter domain model.
//!
//! Trees are produced by [`crate::mapper`] from text or deserialized from the
//! JSON shape callers build in a UI:
//!
//! ```json
//! { "is_group": true, "logical_op": "and", "children": [
//!     { "is_group": false, "field": "Title", "comparison_op": "like", "value": "abc" }
//! ] }
//! ```
//!
//! `Display` prints a tree back in the text grammar.

use crate::lexer::is_identifier_char;
use crate::token::SUB_OPERATORS;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Implements `as_str`-based `Display`, `Serialize` and `FromStr`-based
/// `Deserialize` for a string-valued enum.
macro_rules! string_enum_serde {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse()
                    .map_err(|_| de::Error::custom(format!("unknown {} '{s}'", $what)))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    #[default]
    And,
    Or,
    Not,
}

impl LogicalOp {
    /// The connective prefix in the text grammar.
    pub fn connective(&self) -> &'static str {
        match self {
            LogicalOp::And => "~and",
            LogicalOp::Or => "~or",
            LogicalOp::Not => "~not",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Not,
    Like,
    Nlike,
    Empty,
    NotEmpty,
    Null,
    NotNull,
    Checked,
    NotChecked,
    Blank,
    NotBlank,
    AllOf,
    AnyOf,
    NAllOf,
    NAnyOf,
    Gt,
    Lt,
    Gte,
    Lte,
    Ge,
    Le,
    In,
    IsNot,
    Is,
    IsWithin,
    Btw,
    Nbtw,
    GbEq,
    GbNull,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "eq",
            ComparisonOp::Neq => "neq",
            ComparisonOp::Not => "not",
            ComparisonOp::Like => "like",
            ComparisonOp::Nlike => "nlike",
            ComparisonOp::Empty => "empty",
            ComparisonOp::NotEmpty => "notempty",
            ComparisonOp::Null => "null",
            ComparisonOp::NotNull => "notnull",
            ComparisonOp::Checked => "checked",
            ComparisonOp::NotChecked => "notchecked",
            ComparisonOp::Blank => "blank",
            ComparisonOp::NotBlank => "notblank",
            ComparisonOp::AllOf => "allof",
            ComparisonOp::AnyOf => "anyof",
            ComparisonOp::NAllOf => "nallof",
            ComparisonOp::NAnyOf => "nanyof",
            ComparisonOp::Gt => "gt",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Gte => "gte",
            ComparisonOp::Lte => "lte",
            ComparisonOp::Ge => "ge",
            ComparisonOp::Le => "le",
            ComparisonOp::In => "in",
            ComparisonOp::IsNot => "isnot",
            ComparisonOp::Is => "is",
            ComparisonOp::IsWithin => "isWithin",
            ComparisonOp::Btw => "btw",
            ComparisonOp::Nbtw => "nbtw",
            ComparisonOp::GbEq => "gb_eq",
            ComparisonOp::GbNull => "gb_null",
        }
    }

    /// Operators whose missing value means "equals the empty string".
    pub fn is_equality_family(&self) -> bool {
        matches!(
            self,
            ComparisonOp::Eq | ComparisonOp::Neq | ComparisonOp::Not | ComparisonOp::GbEq
        )
    }

    /// Operators whose comma separated value tokens are joined back into a
    /// single string.
    pub fn collapses_multi_value(&self) -> bool {
        matches!(
            self,
            ComparisonOp::Eq
                | ComparisonOp::Neq
                | ComparisonOp::Not
                | ComparisonOp::GbEq
                | ComparisonOp::Like
                | ComparisonOp::Nlike
                | ComparisonOp::Blank
                | ComparisonOp::NotBlank
                | ComparisonOp::Empty
                | ComparisonOp::NotEmpty
                | ComparisonOp::Null
                | ComparisonOp::NotNull
                | ComparisonOp::AllOf
                | ComparisonOp::AnyOf
                | ComparisonOp::NAllOf
                | ComparisonOp::NAnyOf
                | ComparisonOp::Gt
                | ComparisonOp::Lt
                | ComparisonOp::Gte
                | ComparisonOp::Lte
                | ComparisonOp::Ge
                | ComparisonOp::Le
                | ComparisonOp::Is
                | ComparisonOp::IsNot
        )
    }
}

impl FromStr for ComparisonOp {
    type Err = ();

    /// Accepts the canonical words plus the `isblank` family of aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "eq" => ComparisonOp::Eq,
            "neq" => ComparisonOp::Neq,
            "not" => ComparisonOp::Not,
            "like" => ComparisonOp::Like,
            "nlike" => ComparisonOp::Nlike,
            "empty" => ComparisonOp::Empty,
            "notempty" => ComparisonOp::NotEmpty,
            "null" => ComparisonOp::Null,
            "notnull" => ComparisonOp::NotNull,
            "checked" => ComparisonOp::Checked,
            "notchecked" => ComparisonOp::NotChecked,
            "blank" | "isblank" | "is_blank" => ComparisonOp::Blank,
            "notblank" | "isnotblank" | "is_not_blank" | "is_notblank" => ComparisonOp::NotBlank,
            "allof" => ComparisonOp::AllOf,
            "anyof" => ComparisonOp::AnyOf,
            "nallof" => ComparisonOp::NAllOf,
            "nanyof" => ComparisonOp::NAnyOf,
            "gt" => ComparisonOp::Gt,
            "lt" => ComparisonOp::Lt,
            "gte" => ComparisonOp::Gte,
            "lte" => ComparisonOp::Lte,
            "ge" => ComparisonOp::Ge,
            "le" => ComparisonOp::Le,
            "in" => ComparisonOp::In,
            "isnot" => ComparisonOp::IsNot,
            "is" => ComparisonOp::Is,
            "isWithin" => ComparisonOp::IsWithin,
            "btw" => ComparisonOp::Btw,
            "nbtw" => ComparisonOp::Nbtw,
            "gb_eq" => ComparisonOp::GbEq,
            "gb_null" => ComparisonOp::GbNull,
            _ => return Err(()),
        };
        Ok(op)
    }
}

string_enum_serde!(ComparisonOp, "comparison operator");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonSubOp {
    Today,
    Tomorrow,
    Yesterday,
    OneWeekAgo,
    OneWeekFromNow,
    OneMonthAgo,
    OneMonthFromNow,
    DaysAgo,
    DaysFromNow,
    ExactDate,
    PastWeek,
    PastMonth,
    PastYear,
    NextWeek,
    NextMonth,
    NextYear,
    PastNumberOfDays,
    NextNumberOfDays,
}

impl ComparisonSubOp {
    pub const ALL: [ComparisonSubOp; 18] = [
        ComparisonSubOp::Today,
        ComparisonSubOp::Tomorrow,
        ComparisonSubOp::Yesterday,
        ComparisonSubOp::OneWeekAgo,
        ComparisonSubOp::OneWeekFromNow,
        ComparisonSubOp::OneMonthAgo,
        ComparisonSubOp::OneMonthFromNow,
        ComparisonSubOp::DaysAgo,
        ComparisonSubOp::DaysFromNow,
        ComparisonSubOp::ExactDate,
        ComparisonSubOp::PastWeek,
        ComparisonSubOp::PastMonth,
        ComparisonSubOp::PastYear,
        ComparisonSubOp::NextWeek,
        ComparisonSubOp::NextMonth,
        ComparisonSubOp::NextYear,
        ComparisonSubOp::PastNumberOfDays,
        ComparisonSubOp::NextNumberOfDays,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonSubOp::Today => "today",
            ComparisonSubOp::Tomorrow => "tomorrow",
            ComparisonSubOp::Yesterday => "yesterday",
            ComparisonSubOp::OneWeekAgo => "oneWeekAgo",
            ComparisonSubOp::OneWeekFromNow => "oneWeekFromNow",
            ComparisonSubOp::OneMonthAgo => "oneMonthAgo",
            ComparisonSubOp::OneMonthFromNow => "oneMonthFromNow",
            ComparisonSubOp::DaysAgo => "daysAgo",
            ComparisonSubOp::DaysFromNow => "daysFromNow",
            ComparisonSubOp::ExactDate => "exactDate",
            ComparisonSubOp::PastWeek => "pastWeek",
            ComparisonSubOp::PastMonth => "pastMonth",
            ComparisonSubOp::PastYear => "pastYear",
            ComparisonSubOp::NextWeek => "nextWeek",
            ComparisonSubOp::NextMonth => "nextMonth",
            ComparisonSubOp::NextYear => "nextYear",
            ComparisonSubOp::PastNumberOfDays => "pastNumberOfDays",
            ComparisonSubOp::NextNumberOfDays => "nextNumberOfDays",
        }
    }

    /// Sub-operators that only make sense with `isWithin`.
    pub fn is_within_range(&self) -> bool {
        matches!(
            self,
            ComparisonSubOp::PastWeek
                | ComparisonSubOp::PastMonth
                | ComparisonSubOp::PastYear
                | ComparisonSubOp::NextWeek
                | ComparisonSubOp::NextMonth
                | ComparisonSubOp::NextYear
                | ComparisonSubOp::PastNumberOfDays
                | ComparisonSubOp::NextNumberOfDays
        )
    }
}

impl FromStr for ComparisonSubOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComparisonSubOp::ALL
            .into_iter()
            .find(|sub| sub.as_str() == s)
            .ok_or(())
    }
}

string_enum_serde!(ComparisonSubOp, "comparison sub-operator");

/// A clause value: `null`, a string or a list of strings.
///
/// JSON numbers and booleans are accepted and kept as their text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Null,
    Text(String),
    List(Vec<String>),
}

impl FilterValue {
    pub fn text(s: impl Into<String>) -> Self {
        FilterValue::Text(s.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The individual values: a list as-is, a string as one item, `null` as none.
    pub fn items(&self) -> Vec<&str> {
        match self {
            FilterValue::Null => Vec::new(),
            FilterValue::Text(s) => vec![s.as_str()],
            FilterValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

impl Serialize for FilterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterValue::Null => serializer.serialize_none(),
            FilterValue::Text(s) => serializer.serialize_str(s),
            FilterValue::List(items) => items.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FilterValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        fn scalar<E: de::Error>(value: Value) -> Result<String, E> {
            match value {
                Value::String(s) => Ok(s),
                Value::Number(n) => Ok(n.to_string()),
                Value::Bool(b) => Ok(b.to_string()),
                Value::Null => Ok("null".to_string()),
                other => Err(E::custom(format!("unsupported filter value {other}"))),
            }
        }

        match Value::deserialize(deserializer)? {
            Value::Null => Ok(FilterValue::Null),
            Value::Array(items) => items
                .into_iter()
                .map(scalar)
                .collect::<Result<Vec<_>, _>>()
                .map(FilterValue::List),
            other => scalar(other).map(FilterValue::Text),
        }
    }
}

/// Keeps an explicit JSON `null` apart from an absent `value`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<FilterValue>, D::Error>
where
    D: Deserializer<'de>,
{
    FilterValue::deserialize(deserializer).map(Some)
}

/// A leaf condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    /// Column id; takes precedence over `field`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fk_column_id: Option<String>,
    /// Column id, title or column name, resolved against the model's columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub comparison_op: ComparisonOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_sub_op: Option<ComparisonSubOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_op: Option<LogicalOp>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<FilterValue>,
}

impl FilterClause {
    pub fn new(field: impl Into<String>, comparison_op: ComparisonOp) -> Self {
        Self {
            fk_column_id: None,
            field: Some(field.into()),
            comparison_op,
            comparison_sub_op: None,
            logical_op: None,
            value: None,
        }
    }

    pub fn for_column(column_id: impl Into<String>, comparison_op: ComparisonOp) -> Self {
        Self {
            fk_column_id: Some(column_id.into()),
            field: None,
            ..Self::new("", comparison_op)
        }
    }

    pub fn with_value(mut self, value: FilterValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_sub_op(mut self, sub_op: ComparisonSubOp) -> Self {
        self.comparison_sub_op = Some(sub_op);
        self
    }

    pub fn with_logical_op(mut self, logical_op: LogicalOp) -> Self {
        self.logical_op = Some(logical_op);
        self
    }

    /// The reference used to find the column: `fk_column_id`, else `field`.
    pub fn field_ref(&self) -> &str {
        self.fk_column_id
            .as_deref()
            .or(self.field.as_deref())
            .unwrap_or("")
    }

    /// The value as one string; lists are joined with `,`.
    pub fn value_text(&self) -> Option<String> {
        match &self.value {
            Some(FilterValue::Text(s)) => Some(s.clone()),
            Some(FilterValue::List(items)) => Some(items.join(",")),
            _ => None,
        }
    }
}

/// A logical container of clauses and nested groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    #[serde(default)]
    pub logical_op: LogicalOp,
    #[serde(default)]
    pub children: Vec<FilterNode>,
}

impl FilterGroup {
    pub fn new(logical_op: LogicalOp, children: Vec<FilterNode>) -> Self {
        Self {
            logical_op,
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Group(FilterGroup),
    Clause(FilterClause),
}

impl FilterNode {
    pub fn is_group(&self) -> bool {
        matches!(self, FilterNode::Group(_))
    }

    /// The connective of this node to the siblings before it.
    pub fn logical_op(&self) -> Option<LogicalOp> {
        match self {
            FilterNode::Group(group) => Some(group.logical_op),
            FilterNode::Clause(clause) => clause.logical_op,
        }
    }

    /// Parses the JSON tree shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<FilterClause> for FilterNode {
    fn from(clause: FilterClause) -> Self {
        FilterNode::Clause(clause)
    }
}

impl From<FilterGroup> for FilterNode {
    fn from(group: FilterGroup) -> Self {
        FilterNode::Group(group)
    }
}

#[derive(Serialize)]
struct Tagged<'a, T> {
    is_group: bool,
    #[serde(flatten)]
    inner: &'a T,
}

impl Serialize for FilterNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterNode::Group(group) => Tagged {
                is_group: true,
                inner: group,
            }
            .serialize(serializer),
            FilterNode::Clause(clause) => Tagged {
                is_group: false,
                inner: clause,
            }
            .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FilterNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        // 没有 is_group 时，以 children 是否存在来判断
        let is_group = value
            .get("is_group")
            .and_then(Value::as_bool)
            .unwrap_or_else(|| value.get("children").is_some());
        if is_group {
            serde_json::from_value(value)
                .map(FilterNode::Group)
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(FilterNode::Clause)
                .map_err(de::Error::custom)
        }
    }
}

// ---- text printer ----

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // A root AND group is the implicit top-level sequence. With a
            // single child it needs its own parentheses, otherwise re-parsing
            // would unwrap it.
            FilterNode::Group(group)
                if group.logical_op == LogicalOp::And && group.children.len() != 1 =>
            {
                write_children(f, &group.children)
            }
            node => write_node(f, node, true),
        }
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        write_call(f, self)?;
        write!(f, ")")
    }
}

fn write_children(f: &mut fmt::Formatter<'_>, children: &[FilterNode]) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        write_node(f, child, i == 0)?;
    }
    Ok(())
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &FilterNode, first: bool) -> fmt::Result {
    match node.logical_op() {
        Some(LogicalOp::And) | None if first => {}
        Some(op) => f.write_str(op.connective())?,
        None => f.write_str(LogicalOp::And.connective())?,
    }
    write!(f, "(")?;
    match node {
        FilterNode::Group(group) => write_children(f, &group.children)?,
        FilterNode::Clause(clause) => write_call(f, clause)?,
    }
    write!(f, ")")
}

fn write_call(f: &mut fmt::Formatter<'_>, clause: &FilterClause) -> fmt::Result {
    let field = clause.field_ref();
    if field.is_empty() {
        f.write_str("\"\"")?;
    } else {
        write_word(f, field, false)?;
    }
    write!(f, ",{}", clause.comparison_op)?;
    if let Some(sub_op) = clause.comparison_sub_op {
        write!(f, ",{sub_op}")?;
    }
    // 第一个值如果是子运算符单词，需要加引号以免被解析为子运算符
    let guard_first = clause.comparison_sub_op.is_none();
    match &clause.value {
        None => {}
        Some(FilterValue::Null) => f.write_str(",null,null")?,
        Some(FilterValue::Text(s)) => {
            f.write_str(",")?;
            write_word(f, s, guard_first)?;
        }
        Some(FilterValue::List(items)) => {
            for (i, item) in items.iter().enumerate() {
                f.write_str(",")?;
                write_word(f, item, guard_first && i == 0)?;
            }
        }
    }
    Ok(())
}

fn write_word(f: &mut fmt::Formatter<'_>, word: &str, guard_sub_op: bool) -> fmt::Result {
    let plain = word.chars().all(is_identifier_char)
        && !(guard_sub_op && SUB_OPERATORS.contains(&word));
    if plain {
        return f.write_str(word);
    }
    f.write_str("\"")?;
    for c in word.chars() {
        if c == '"' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_words() {
        assert_eq!("isWithin".parse(), Ok(ComparisonOp::IsWithin));
        assert_eq!("is_notblank".parse(), Ok(ComparisonOp::NotBlank));
        assert_eq!("isblank".parse(), Ok(ComparisonOp::Blank));
        assert_eq!("EQ".parse::<ComparisonOp>(), Err(()));
        assert_eq!(ComparisonOp::GbEq.to_string(), "gb_eq");
        assert_eq!("nextNumberOfDays".parse(), Ok(ComparisonSubOp::NextNumberOfDays));
        assert!(ComparisonSubOp::PastWeek.is_within_range());
        assert!(!ComparisonSubOp::DaysAgo.is_within_range());
    }

    #[test]
    fn test_sub_operator_words_match_token_vocabulary() {
        let words: Vec<_> = ComparisonSubOp::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(words, SUB_OPERATORS);
    }

    #[test]
    fn test_deserialize_tree() {
        let json = r#"{
            "is_group": true,
            "logical_op": "or",
            "children": [
                { "is_group": false, "fk_column_id": "c1", "comparison_op": "eq", "value": 5 },
                { "is_group": false, "field": "Tags", "comparison_op": "anyof", "value": ["a", "b"] },
                { "is_group": false, "field": "Due", "comparison_op": "eq",
                  "comparison_sub_op": "daysAgo", "value": null, "logical_op": "or" },
                { "logical_op": "not", "children": [] }
            ]
        }"#;
        let node = FilterNode::from_json(json).unwrap();
        let FilterNode::Group(group) = node else {
            panic!("Expected group");
        };
        assert_eq!(group.logical_op, LogicalOp::Or);
        assert_eq!(group.children.len(), 4);
        match &group.children[0] {
            FilterNode::Clause(clause) => {
                assert_eq!(clause.field_ref(), "c1");
                assert_eq!(clause.value, Some(FilterValue::text("5")));
            }
            other => panic!("Expected clause, got {other:?}"),
        }
        match &group.children[1] {
            FilterNode::Clause(clause) => {
                assert_eq!(clause.value, Some(FilterValue::list(["a", "b"])));
            }
            other => panic!("Expected clause, got {other:?}"),
        }
        match &group.children[2] {
            FilterNode::Clause(clause) => {
                assert_eq!(clause.comparison_sub_op, Some(ComparisonSubOp::DaysAgo));
                assert_eq!(clause.value, Some(FilterValue::Null));
                assert_eq!(clause.logical_op, Some(LogicalOp::Or));
            }
            other => panic!("Expected clause, got {other:?}"),
        }
        assert!(group.children[3].is_group());
    }

    #[test]
    fn test_absent_value_is_not_null() {
        let node =
            FilterNode::from_json(r#"{"is_group":false,"field":"a","comparison_op":"blank"}"#)
                .unwrap();
        match node {
            FilterNode::Clause(clause) => assert_eq!(clause.value, None),
            other => panic!("Expected clause, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let err = FilterNode::from_json(r#"{"field":"a","comparison_op":"equals"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown comparison operator 'equals'"));
    }

    #[test]
    fn test_serialize_tree() {
        let node = FilterNode::Group(FilterGroup::new(
            LogicalOp::And,
            vec![FilterClause::new("Title", ComparisonOp::Like)
                .with_value(FilterValue::text("abc"))
                .into()],
        ));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "is_group": true,
                "logical_op": "and",
                "children": [
                    { "is_group": false, "field": "Title", "comparison_op": "like", "value": "abc" }
                ]
            })
        );
    }

    #[test]
    fn test_print_clause() {
        let clause = FilterClause::new("field1", ComparisonOp::Eq)
            .with_value(FilterValue::text("hello, 'world"));
        assert_eq!(clause.to_string(), r#"(field1,eq,"hello, 'world")"#);

        let clause = FilterClause::new("Due", ComparisonOp::IsWithin)
            .with_sub_op(ComparisonSubOp::NextNumberOfDays)
            .with_value(FilterValue::text("10"));
        assert_eq!(clause.to_string(), "(Due,isWithin,nextNumberOfDays,10)");

        let clause = FilterClause::new("Note", ComparisonOp::Eq).with_value(FilterValue::text("today"));
        assert_eq!(clause.to_string(), r#"(Note,eq,"today")"#);

        let clause = FilterClause::new("Say", ComparisonOp::Eq)
            .with_value(FilterValue::text(r#"a "b" \c"#));
        assert_eq!(clause.to_string(), r#"(Say,eq,"a \"b\" \\c")"#);
    }

    #[test]
    fn test_print_tree() {
        let node = FilterNode::Group(FilterGroup::new(
            LogicalOp::And,
            vec![
                FilterClause::new("a", ComparisonOp::Eq)
                    .with_value(FilterValue::text("1"))
                    .with_logical_op(LogicalOp::Not)
                    .into(),
                FilterGroup::new(
                    LogicalOp::And,
                    vec![
                        FilterClause::new("b", ComparisonOp::Eq)
                            .with_value(FilterValue::text("2"))
                            .with_logical_op(LogicalOp::And)
                            .into(),
                        FilterClause::new("b", ComparisonOp::Eq)
                            .with_value(FilterValue::text("3"))
                            .with_logical_op(LogicalOp::Or)
                            .into(),
                    ],
                )
                .into(),
                FilterClause::new("c", ComparisonOp::Not)
                    .with_value(FilterValue::text("4"))
                    .with_logical_op(LogicalOp::Or)
                    .into(),
            ],
        ));
        assert_eq!(
            node.to_string(),
            "~not(a,eq,1)~and((b,eq,2)~or(b,eq,3))~or(c,not,4)"
        );
    }
}
