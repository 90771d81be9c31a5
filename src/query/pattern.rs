//! Typed query AST: statement templates with variables, filters, and
//! result modifiers.
//!
//! Every caller-influenced query path is built through this AST rather than
//! by splicing text, so a category name or search keyword can never change
//! the shape of a query, only its constants.

use serde::{Deserialize, Serialize};

use crate::term::{Iri, Literal};

/// One position of a statement template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TermPattern {
    /// A named variable, bound during evaluation.
    Var(String),
    Iri(Iri),
    Literal(Literal),
}

impl TermPattern {
    pub fn var(name: impl Into<String>) -> Self {
        TermPattern::Var(name.into())
    }

    pub fn iri(value: impl Into<String>) -> Self {
        TermPattern::Iri(Iri::new(value))
    }
}

/// A statement template. Matches statements position-wise; variables bind,
/// constants must be equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriplePattern {
    pub subject: TermPattern,
    pub predicate: TermPattern,
    pub object: TermPattern,
}

impl TriplePattern {
    pub fn new(subject: TermPattern, predicate: TermPattern, object: TermPattern) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

/// Row filters, applied after pattern matching. Rows whose referenced
/// variable is unbound are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpr {
    /// Case-insensitive equality on the variable's lexical form.
    EqualsIgnoreCase { variable: String, value: String },
    /// Case-insensitive substring match on the variable's lexical form.
    ContainsIgnoreCase { variable: String, value: String },
}

/// Sort specification. Numeric literals compare numerically, datetimes
/// chronologically, everything else case-insensitively by lexical form;
/// unbound values sort last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub variable: String,
    pub descending: bool,
}

/// An ordered conjunction of statement templates with optional groups,
/// filters, sorting, and pagination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternQuery {
    /// Projected variables. Empty selects every bound variable per row.
    pub select: Vec<String>,
    /// Required patterns: every one must match.
    pub required: Vec<TriplePattern>,
    /// Optional groups: each group extends a row when it matches as a whole
    /// and leaves the row untouched (variables unbound) when it does not.
    pub optional: Vec<Vec<TriplePattern>>,
    pub filters: Vec<FilterExpr>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl PatternQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the projected variables.
    pub fn select<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = variables.into_iter().map(Into::into).collect();
        self
    }

    /// Append a required pattern.
    pub fn pattern(mut self, pattern: TriplePattern) -> Self {
        self.required.push(pattern);
        self
    }

    /// Append an optional group.
    pub fn optional(mut self, group: Vec<TriplePattern>) -> Self {
        self.optional.push(group);
        self
    }

    /// Append a filter.
    pub fn filter(mut self, filter: FilterExpr) -> Self {
        self.filters.push(filter);
        self
    }

    /// Sort rows by a variable.
    pub fn order_by(mut self, variable: impl Into<String>, descending: bool) -> Self {
        self.order = Some(OrderBy {
            variable: variable.into(),
            descending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}
