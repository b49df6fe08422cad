//! Negated operators on relation and lookup columns.
//!
//! A subquery over related rows can only test set membership, so a negated
//! operator is compiled as its positive counterpart and the membership test is
//! inverted at the boundary: `nlike x` becomes `key NOT IN (rows where like x)`.

use crate::filter::ComparisonOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Negation {
    /// The operator applied inside the subquery.
    pub positive: ComparisonOp,
    /// Whether the outer membership test is `NOT IN`.
    pub invert: bool,
}

const NEGATION_MAP: &[(ComparisonOp, ComparisonOp)] = &[
    (ComparisonOp::Neq, ComparisonOp::Eq),
    (ComparisonOp::Not, ComparisonOp::Eq),
    (ComparisonOp::Nlike, ComparisonOp::Like),
    (ComparisonOp::NAllOf, ComparisonOp::AllOf),
    (ComparisonOp::NAnyOf, ComparisonOp::AnyOf),
    (ComparisonOp::Nbtw, ComparisonOp::Btw),
];

pub(crate) fn resolve(op: ComparisonOp) -> Negation {
    NEGATION_MAP
        .iter()
        .find(|(negated, _)| *negated == op)
        .map(|&(_, positive)| Negation {
            positive,
            invert: true,
        })
        .unwrap_or(Negation {
            positive: op,
            invert: false,
        })
}
