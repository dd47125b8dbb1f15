//! Query grammar productions and their tree-shaping actions.
//!
//! ```text
//! query         ::= expr | ε
//! expr          ::= expr expr | union | term | STOPWORD
//!                 | modifier COLON (expr | TERM | tag_list | numeric_range | geo_filter)
//!                 | modifierlist COLON expr
//!                 | LP expr RP | QUOTE termlist QUOTE
//!                 | MINUS expr | TILDE expr | term STAR
//! union         ::= expr OR expr | union OR expr
//! termlist      ::= term term | termlist term | termlist STOPWORD
//! modifierlist  ::= modifier OR term | modifierlist OR term
//! tag_list      ::= LB (term | termlist) | tag_list COMMA (term | termlist) | tag_list RB
//! numeric_range ::= LSQB num num RSQB
//! geo_filter    ::= LSQB num num num TERM RSQB
//! num           ::= NUMBER | LP num | MINUS num
//! term          ::= TERM | NUMBER | QUOTE term QUOTE
//! ```
//!
//! A missing operand (`None`) is what a stopword reduces to. Actions propagate it rather
//! than building empty wrappers.

use std::fmt;

use crate::{
    ast::{FieldMask, GeoFilter, NumericFilter, QueryNode},
    normalize::normalize,
};

/// A grammar rule, numbered in catalogue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Production {
    /// `query ::= expr`
    Query,
    /// `query ::=`
    QueryEmpty,
    /// `expr ::= expr expr`
    Intersect,
    /// `expr ::= union`
    ExprUnion,
    /// `union ::= expr OR expr`
    UnionStart,
    /// `union ::= union OR expr`
    UnionAppend,
    /// `expr ::= modifier COLON expr`
    ScopedExpr,
    /// `expr ::= modifier COLON TERM`
    ScopedTerm,
    /// `expr ::= modifierlist COLON expr`
    MultiScopedExpr,
    /// `expr ::= LP expr RP`
    Group,
    /// `expr ::= QUOTE termlist QUOTE`
    ExactPhrase,
    /// `term ::= QUOTE term QUOTE`
    QuotedTerm,
    /// `expr ::= term`
    ExprTerm,
    /// `expr ::= STOPWORD`
    ExprStopword,
    /// `termlist ::= term term`
    TermListStart,
    /// `termlist ::= termlist term`
    TermListAppend,
    /// `termlist ::= termlist STOPWORD`
    TermListStopword,
    /// `expr ::= MINUS expr`
    Not,
    /// `expr ::= TILDE expr`
    Optional,
    /// `expr ::= term STAR`
    Prefix,
    /// `modifier ::= MODIFIER`
    Modifier,
    /// `modifierlist ::= modifier OR term`
    ModifierListStart,
    /// `modifierlist ::= modifierlist OR term`
    ModifierListAppend,
    /// `expr ::= modifier COLON tag_list`
    Tag,
    /// `tag_list ::= LB term`
    TagListTerm,
    /// `tag_list ::= LB termlist`
    TagListTermList,
    /// `tag_list ::= tag_list COMMA term`
    TagListAppendTerm,
    /// `tag_list ::= tag_list COMMA termlist`
    TagListAppendTermList,
    /// `tag_list ::= tag_list RB`
    TagListClose,
    /// `expr ::= modifier COLON numeric_range`
    Numeric,
    /// `numeric_range ::= LSQB num num RSQB`
    NumericRange,
    /// `expr ::= modifier COLON geo_filter`
    Geo,
    /// `geo_filter ::= LSQB num num num TERM RSQB`
    GeoFilter,
    /// `num ::= NUMBER`
    NumNumber,
    /// `num ::= LP num`
    NumExclusive,
    /// `num ::= MINUS num`
    NumNegate,
    /// `term ::= TERM`
    TermTerm,
    /// `term ::= NUMBER`
    TermNumber,
}

impl Production {
    /// Every production, in catalogue order.
    pub const ALL: [Self; 38] = [
        Self::Query,
        Self::QueryEmpty,
        Self::Intersect,
        Self::ExprUnion,
        Self::UnionStart,
        Self::UnionAppend,
        Self::ScopedExpr,
        Self::ScopedTerm,
        Self::MultiScopedExpr,
        Self::Group,
        Self::ExactPhrase,
        Self::QuotedTerm,
        Self::ExprTerm,
        Self::ExprStopword,
        Self::TermListStart,
        Self::TermListAppend,
        Self::TermListStopword,
        Self::Not,
        Self::Optional,
        Self::Prefix,
        Self::Modifier,
        Self::ModifierListStart,
        Self::ModifierListAppend,
        Self::Tag,
        Self::TagListTerm,
        Self::TagListTermList,
        Self::TagListAppendTerm,
        Self::TagListAppendTermList,
        Self::TagListClose,
        Self::Numeric,
        Self::NumericRange,
        Self::Geo,
        Self::GeoFilter,
        Self::NumNumber,
        Self::NumExclusive,
        Self::NumNegate,
        Self::TermTerm,
        Self::TermNumber,
    ];

    /// Returns the rule number.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the rule as `lhs ::= rhs`.
    pub fn text(self) -> &'static str {
        match self {
            Self::Query => "query ::= expr",
            Self::QueryEmpty => "query ::=",
            Self::Intersect => "expr ::= expr expr",
            Self::ExprUnion => "expr ::= union",
            Self::UnionStart => "union ::= expr OR expr",
            Self::UnionAppend => "union ::= union OR expr",
            Self::ScopedExpr => "expr ::= modifier COLON expr",
            Self::ScopedTerm => "expr ::= modifier COLON TERM",
            Self::MultiScopedExpr => "expr ::= modifierlist COLON expr",
            Self::Group => "expr ::= LP expr RP",
            Self::ExactPhrase => "expr ::= QUOTE termlist QUOTE",
            Self::QuotedTerm => "term ::= QUOTE term QUOTE",
            Self::ExprTerm => "expr ::= term",
            Self::ExprStopword => "expr ::= STOPWORD",
            Self::TermListStart => "termlist ::= term term",
            Self::TermListAppend => "termlist ::= termlist term",
            Self::TermListStopword => "termlist ::= termlist STOPWORD",
            Self::Not => "expr ::= MINUS expr",
            Self::Optional => "expr ::= TILDE expr",
            Self::Prefix => "expr ::= term STAR",
            Self::Modifier => "modifier ::= MODIFIER",
            Self::ModifierListStart => "modifierlist ::= modifier OR term",
            Self::ModifierListAppend => "modifierlist ::= modifierlist OR term",
            Self::Tag => "expr ::= modifier COLON tag_list",
            Self::TagListTerm => "tag_list ::= LB term",
            Self::TagListTermList => "tag_list ::= LB termlist",
            Self::TagListAppendTerm => "tag_list ::= tag_list COMMA term",
            Self::TagListAppendTermList => "tag_list ::= tag_list COMMA termlist",
            Self::TagListClose => "tag_list ::= tag_list RB",
            Self::Numeric => "expr ::= modifier COLON numeric_range",
            Self::NumericRange => "numeric_range ::= LSQB num num RSQB",
            Self::Geo => "expr ::= modifier COLON geo_filter",
            Self::GeoFilter => "geo_filter ::= LSQB num num num TERM RSQB",
            Self::NumNumber => "num ::= NUMBER",
            Self::NumExclusive => "num ::= LP num",
            Self::NumNegate => "num ::= MINUS num",
            Self::TermTerm => "term ::= TERM",
            Self::TermNumber => "term ::= NUMBER",
        }
    }

    /// Returns the nonterminal on the left-hand side.
    pub fn lhs(self) -> &'static str {
        self.text().split(" ::=").next().unwrap_or_default()
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// A range bound: its value and whether the bound itself matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Num {
    /// Bound value.
    pub value: f64,
    /// Whether the bound is inclusive.
    pub inclusive: bool,
}

impl Num {
    /// An inclusive bound.
    pub fn new(value: f64) -> Self {
        Self {
            value,
            inclusive: true,
        }
    }

    /// `LP num`: the same bound, exclusive.
    pub fn exclusive(self) -> Self {
        Self {
            inclusive: false,
            ..self
        }
    }

    /// `MINUS num`: the bound negated.
    pub fn negate(self) -> Self {
        Self {
            value: -self.value,
            ..self
        }
    }
}

/// `expr ::= term`: a token node for a literal.
pub fn term(text: &str) -> QueryNode {
    QueryNode::token(normalize(text))
}

/// `expr ::= term STAR`
pub fn prefix(text: &str) -> QueryNode {
    QueryNode::prefix(normalize(text))
}

/// `expr ::= expr expr`
///
/// An unscoped inexact phrase on the left absorbs the right side. A missing side yields
/// the other one unchanged, never a one-child phrase: `the cat` is just the token `cat`.
pub fn intersect(left: Option<QueryNode>, right: Option<QueryNode>) -> Option<QueryNode> {
    match (left, right) {
        (None, None) => None,
        (Some(node), None) | (None, Some(node)) => Some(node),
        (Some(mut left), Some(right)) => {
            if let Some(children) = left.open_phrase_mut() {
                children.push(right);
                Some(left)
            } else {
                Some(QueryNode::phrase_from(vec![left, right]))
            }
        }
    }
}

/// `union ::= expr OR expr`
///
/// An unscoped union on the left is reused instead of being nested.
pub fn union_start(left: Option<QueryNode>, right: Option<QueryNode>) -> QueryNode {
    let mut union = match left {
        Some(node) if node.is_open_union() => node,
        other => QueryNode::union_from(other.into_iter().collect()),
    };
    union_append(&mut union, right);
    union
}

/// `union ::= union OR expr`
pub fn union_append(union: &mut QueryNode, right: Option<QueryNode>) {
    if let Some(right) = right
        && let Some(children) = union.open_union_mut()
    {
        children.push(right);
    }
}

/// `expr ::= union`
///
/// A union left with no alternatives is dropped; one with a single alternative is
/// replaced by it.
pub fn finish_union(mut union: QueryNode) -> Option<QueryNode> {
    match union.children().len() {
        0 => None,
        1 => union.take_children().pop(),
        _ => Some(union),
    }
}

/// `expr ::= modifier COLON expr` and `expr ::= modifierlist COLON expr`
pub fn scope(expr: Option<QueryNode>, mask: FieldMask) -> Option<QueryNode> {
    expr.map(|node| node.with_mask(mask))
}

/// `expr ::= MINUS expr`
pub fn not(expr: Option<QueryNode>) -> Option<QueryNode> {
    expr.map(QueryNode::not)
}

/// `expr ::= TILDE expr`
pub fn optional(expr: Option<QueryNode>) -> Option<QueryNode> {
    expr.map(QueryNode::optional)
}

/// `termlist ::= term term`
pub fn termlist_start(first: &str, second: &str) -> QueryNode {
    QueryNode::phrase_from(vec![term(first), term(second)])
}

/// `termlist ::= termlist term`
pub fn termlist_append(list: &mut QueryNode, text: &str) {
    if let Some(children) = list.open_phrase_mut() {
        children.push(term(text));
    }
}

/// `expr ::= QUOTE termlist QUOTE`
pub fn exact_phrase(mut list: QueryNode) -> QueryNode {
    list.set_exact();
    list
}

/// `tag_list ::= LB term` and `tag_list ::= LB termlist`
pub fn tag_list_start(first: QueryNode) -> QueryNode {
    QueryNode::phrase_from(vec![first])
}

/// `tag_list ::= tag_list COMMA term` and `tag_list ::= tag_list COMMA termlist`
pub fn tag_list_append(list: &mut QueryNode, element: QueryNode) {
    if let Some(children) = list.open_phrase_mut() {
        children.push(element);
    }
}

/// `expr ::= modifier COLON tag_list`
///
/// The list's children are moved into the tag node and the emptied list is dropped.
pub fn tag(field: &str, mut list: QueryNode) -> QueryNode {
    QueryNode::tag_from(field, list.take_children())
}

/// `numeric_range ::= LSQB num num RSQB` followed by `expr ::= modifier COLON numeric_range`
pub fn numeric(field: &str, min: Num, max: Num) -> QueryNode {
    QueryNode::numeric(NumericFilter {
        field: field.to_string(),
        min: min.value,
        max: max.value,
        min_inclusive: min.inclusive,
        max_inclusive: max.inclusive,
    })
}

/// `geo_filter ::= LSQB num num num TERM RSQB`
///
/// Inclusivity of the bounds is ignored. The unit is normalized.
pub fn geo_filter(field: &str, lon: Num, lat: Num, radius: Num, unit: &str) -> GeoFilter {
    GeoFilter {
        property: field.to_string(),
        lon: lon.value,
        lat: lat.value,
        radius: radius.value,
        unit: normalize(unit),
    }
}
