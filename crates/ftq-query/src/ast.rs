//! Query abstract syntax tree.
//!
//! Represents parsed query nodes before they are evaluated against an index. Every node
//! owns its children outright; there is no sharing between nodes.

use std::{fmt, mem, ops::BitOr};

use serde::{Serialize, Serializer};

/// A set of schema fields a node applies to.
///
/// Bit *i* selects the *i*-th field of the schema. [`FieldMask::ALL`] is the unscoped
/// sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldMask(u64);

impl FieldMask {
    /// Matches every field.
    pub const ALL: Self = Self(u64::MAX);

    /// Matches no field.
    pub const NONE: Self = Self(0);

    /// Creates a mask from raw bits.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the mask selecting only field number `index`, or `None` past the 64th field.
    pub fn for_field(index: usize) -> Option<Self> {
        u32::try_from(index)
            .ok()
            .and_then(|i| 1u64.checked_shl(i))
            .map(Self)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns true for the unscoped sentinel.
    pub const fn is_all(self) -> bool {
        self.0 == u64::MAX
    }

    /// Returns true if no field is selected.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for FieldMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for FieldMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            f.write_str("ALL")
        } else {
            write!(f, "{:#x}", self.0)
        }
    }
}

impl Serialize for FieldMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_all() {
            serializer.serialize_str("all")
        } else {
            serializer.serialize_u64(self.0)
        }
    }
}

/// A numeric range filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericFilter {
    /// Field the range applies to, as written in the query.
    pub field: String,
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
    /// Whether `min` itself matches.
    pub min_inclusive: bool,
    /// Whether `max` itself matches.
    pub max_inclusive: bool,
}

/// A radius filter around a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoFilter {
    /// Geo field the filter applies to, as written in the query.
    pub property: String,
    /// Longitude of the center.
    pub lon: f64,
    /// Latitude of the center.
    pub lat: f64,
    /// Search radius, in `unit`.
    pub radius: f64,
    /// Distance unit (normalized, e.g. `km`).
    pub unit: String,
}

/// A node of the query tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryNode {
    /// Fields this node is restricted to.
    pub field_mask: FieldMask,
    /// Variant-specific payload.
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// The payload of a [`QueryNode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// A single normalized term.
    Token {
        /// The term.
        text: String,
    },

    /// A sequence of nodes. Exact phrases come from quotes; inexact ones from adjacency.
    Phrase {
        /// Whether the children must appear in order, adjacent.
        exact: bool,
        /// Children in query order.
        children: Vec<QueryNode>,
    },

    /// Alternatives: at least one child must match.
    Union {
        /// Alternatives in query order.
        children: Vec<QueryNode>,
    },

    /// Negation: results must NOT match the child.
    Not {
        /// The negated node.
        child: Box<QueryNode>,
    },

    /// The child may match; it affects ranking only.
    Optional {
        /// The optional node.
        child: Box<QueryNode>,
    },

    /// A set of tag values on a tag field.
    Tag {
        /// Tag field name, as written in the query.
        field: String,
        /// Tag values in query order.
        children: Vec<QueryNode>,
    },

    /// A numeric range.
    Numeric {
        /// The range.
        filter: NumericFilter,
    },

    /// A geo radius.
    Geo {
        /// The radius filter.
        filter: GeoFilter,
    },

    /// A term matched as a prefix.
    Prefix {
        /// The normalized prefix.
        text: String,
    },
}

impl QueryNode {
    /// Wraps a payload in an unscoped node.
    fn unscoped(kind: NodeKind) -> Self {
        Self {
            field_mask: FieldMask::ALL,
            kind,
        }
    }

    /// Creates a token node. The text must already be normalized.
    pub fn token(text: impl Into<String>) -> Self {
        Self::unscoped(NodeKind::Token { text: text.into() })
    }

    /// Creates an empty phrase.
    pub fn phrase(exact: bool) -> Self {
        Self::unscoped(NodeKind::Phrase {
            exact,
            children: Vec::new(),
        })
    }

    /// Creates an empty union.
    pub fn union() -> Self {
        Self::unscoped(NodeKind::Union {
            children: Vec::new(),
        })
    }

    /// Creates a negation of `child`.
    pub fn not(child: Self) -> Self {
        Self::unscoped(NodeKind::Not {
            child: Box::new(child),
        })
    }

    /// Creates an optional wrapper around `child`.
    pub fn optional(child: Self) -> Self {
        Self::unscoped(NodeKind::Optional {
            child: Box::new(child),
        })
    }

    /// Creates an empty tag set on `field`.
    pub fn tag(field: impl Into<String>) -> Self {
        Self::unscoped(NodeKind::Tag {
            field: field.into(),
            children: Vec::new(),
        })
    }

    /// Creates a numeric range node.
    pub fn numeric(filter: NumericFilter) -> Self {
        Self::unscoped(NodeKind::Numeric { filter })
    }

    /// Creates a geo radius node.
    pub fn geo(filter: GeoFilter) -> Self {
        Self::unscoped(NodeKind::Geo { filter })
    }

    /// Creates a prefix node. The text must already be normalized.
    pub fn prefix(text: impl Into<String>) -> Self {
        Self::unscoped(NodeKind::Prefix { text: text.into() })
    }

    /// Returns this node restricted to `mask`.
    pub fn with_mask(mut self, mask: FieldMask) -> Self {
        self.field_mask = mask;
        self
    }

    /// Returns the children of a phrase, union or tag; an empty slice otherwise.
    pub fn children(&self) -> &[Self] {
        match &self.kind {
            NodeKind::Phrase { children, .. }
            | NodeKind::Union { children }
            | NodeKind::Tag { children, .. } => children,
            NodeKind::Token { .. }
            | NodeKind::Not { .. }
            | NodeKind::Optional { .. }
            | NodeKind::Numeric { .. }
            | NodeKind::Geo { .. }
            | NodeKind::Prefix { .. } => &[],
        }
    }

    /// Mutable access to the child list of a phrase, union or tag.
    fn children_mut(&mut self) -> Option<&mut Vec<Self>> {
        match &mut self.kind {
            NodeKind::Phrase { children, .. }
            | NodeKind::Union { children }
            | NodeKind::Tag { children, .. } => Some(children),
            NodeKind::Token { .. }
            | NodeKind::Not { .. }
            | NodeKind::Optional { .. }
            | NodeKind::Numeric { .. }
            | NodeKind::Geo { .. }
            | NodeKind::Prefix { .. } => None,
        }
    }

    /// Appends `child` to a phrase, union or tag.
    ///
    /// Other node kinds cannot hold a list of children; the child is handed back in `Err`.
    pub fn add_child(&mut self, child: Self) -> Result<(), Self> {
        match self.children_mut() {
            Some(children) => {
                children.push(child);
                Ok(())
            }
            None => Err(child),
        }
    }

    /// Moves every child out of a phrase, union or tag, leaving it empty.
    ///
    /// Dropping the emptied node afterwards releases only the node itself.
    pub fn take_children(&mut self) -> Vec<Self> {
        self.children_mut().map(mem::take).unwrap_or_default()
    }

    /// Creates an inexact phrase holding `children`.
    pub(crate) fn phrase_from(children: Vec<Self>) -> Self {
        Self::unscoped(NodeKind::Phrase {
            exact: false,
            children,
        })
    }

    /// Creates a union holding `children`.
    pub(crate) fn union_from(children: Vec<Self>) -> Self {
        Self::unscoped(NodeKind::Union { children })
    }

    /// Creates a tag set on `field` holding `children`.
    pub(crate) fn tag_from(field: impl Into<String>, children: Vec<Self>) -> Self {
        Self::unscoped(NodeKind::Tag {
            field: field.into(),
            children,
        })
    }

    /// Returns the child list if this is an inexact, unscoped phrase.
    ///
    /// Adjacent expressions are merged into such a phrase instead of nesting a new one.
    pub(crate) fn open_phrase_mut(&mut self) -> Option<&mut Vec<Self>> {
        match &mut self.kind {
            NodeKind::Phrase {
                exact: false,
                children,
            } if self.field_mask.is_all() => Some(children),
            _ => None,
        }
    }

    /// Returns true if this is an unscoped union.
    pub(crate) fn is_open_union(&self) -> bool {
        matches!(self.kind, NodeKind::Union { .. }) && self.field_mask.is_all()
    }

    /// Returns the child list if this is an unscoped union.
    pub(crate) fn open_union_mut(&mut self) -> Option<&mut Vec<Self>> {
        match &mut self.kind {
            NodeKind::Union { children } if self.field_mask.is_all() => Some(children),
            _ => None,
        }
    }

    /// Marks a phrase as exact.
    pub(crate) fn set_exact(&mut self) {
        if let NodeKind::Phrase { exact, .. } = &mut self.kind {
            *exact = true;
        }
    }

    /// Returns the short label used in tree output.
    fn label(&self) -> String {
        match &self.kind {
            NodeKind::Token { text } => format!("Token({text:?})"),
            NodeKind::Phrase { exact: true, .. } => "Phrase(exact)".to_string(),
            NodeKind::Phrase { exact: false, .. } => "Phrase".to_string(),
            NodeKind::Union { .. } => "Union".to_string(),
            NodeKind::Not { .. } => "Not".to_string(),
            NodeKind::Optional { .. } => "Optional".to_string(),
            NodeKind::Tag { field, .. } => format!("Tag({field:?})"),
            NodeKind::Numeric { filter } => format!(
                "Numeric({:?} {}{} {}{})",
                filter.field,
                if filter.min_inclusive { "[" } else { "(" },
                filter.min,
                filter.max,
                if filter.max_inclusive { "]" } else { ")" },
            ),
            NodeKind::Geo { filter } => format!(
                "Geo({:?} {} {} {} {})",
                filter.property, filter.lon, filter.lat, filter.radius, filter.unit
            ),
            NodeKind::Prefix { text } => format!("Prefix({text:?})"),
        }
    }

    /// Formats the node as a tree structure with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        write!(f, "{prefix}{}", self.label())?;
        if !self.field_mask.is_all() {
            write!(f, " @{}", self.field_mask)?;
        }
        writeln!(f)?;
        match &self.kind {
            NodeKind::Not { child } | NodeKind::Optional { child } => {
                child.fmt_tree(f, indent + 1)
            }
            _ => {
                for child in self.children() {
                    child.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}
