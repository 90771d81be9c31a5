//! Graph-pattern query engine.
//!
//! Three request classes share one evaluator:
//!
//! - **Fixed templates** and **semantic search** are built through the typed
//!   [`pattern`] AST; no caller text ever reaches the engine as a string.
//! - **Trusted ad-hoc pattern queries** are parsed by [`parse`] from a small
//!   SELECT-shaped subset. This capability is equivalent to direct store
//!   access; keep it behind an elevated-trust boundary.
//!
//! Evaluation ([`eval`]) always runs against a consistent store snapshot and
//! reports unbound optional variables with an explicit [`BoundValue::Unbound`]
//! marker instead of dropping them from the row.

pub mod eval;
pub mod parse;
pub mod pattern;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::term::Term;

pub use eval::{distinct_values, evaluate};
pub use parse::parse_query;
pub use pattern::{FilterExpr, OrderBy, PatternQuery, TermPattern, TriplePattern};

/// A value bound to an output variable, normalized to its lexical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundValue {
    /// A resource identifier string.
    Iri(String),
    /// A literal's lexical form.
    Literal(String),
    /// An optional variable that matched nothing.
    Unbound,
}

impl BoundValue {
    pub fn from_term(term: &Term) -> Self {
        match term {
            Term::Iri(iri) => BoundValue::Iri(iri.as_str().to_string()),
            Term::Literal(lit) => BoundValue::Literal(lit.lexical_form()),
        }
    }

    /// The lexical form, or `None` when unbound.
    pub fn lexical(&self) -> Option<&str> {
        match self {
            BoundValue::Iri(s) | BoundValue::Literal(s) => Some(s),
            BoundValue::Unbound => None,
        }
    }
}

/// One result row: variable name → bound value. Selected variables are
/// always present, unbound ones explicitly so.
pub type Row = BTreeMap<String, BoundValue>;

/// Result of the trusted ad-hoc query path: rows plus an explicit error
/// indicator for malformed pattern text. Never both populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    pub rows: Vec<Row>,
    pub error: Option<String>,
}

/// Parameters for the dynamic semantic-search mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Case-insensitive match against the category display text.
    pub category: Option<String>,
    /// Case-insensitive substring match against the product description.
    pub keyword: Option<String>,
    /// Page size; `0` means unlimited.
    pub limit: usize,
    pub offset: usize,
    /// Sort key; must be one of the allow-listed bound output variables.
    /// Unsupported keys are logged and ignored.
    pub sort: Option<String>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            category: None,
            keyword: None,
            limit: 20,
            offset: 0,
            sort: None,
        }
    }
}
