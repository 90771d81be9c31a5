//! Diagnostic error types for the semantic catalog layer.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes and help text. The taxonomy is deliberately
//! small: schema-resolution gaps and per-unit conversion skips are logged and
//! degrade output instead of erroring, so the only hard failures are invalid
//! entity identifiers, an unreachable relational source, and malformed ad-hoc
//! query text (which is caught again at the facade boundary).

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the semantic catalog layer.
#[derive(Debug, Error, Diagnostic)]
pub enum AgoraError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),
}

// ---------------------------------------------------------------------------
// Converter errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConvertError {
    #[error("cannot convert product with invalid identifier {id}")]
    #[diagnostic(
        code(agora::convert::invalid_id),
        help(
            "Product aggregates must carry a positive relational identifier. \
             A zero or negative id usually means the row was never persisted; \
             commit it before mirroring it into the graph."
        )
    )]
    InvalidProductId { id: i64 },
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("invalid entity identifier {id}")]
    #[diagnostic(
        code(agora::store::invalid_id),
        help(
            "Upsert and remove require a positive relational identifier to \
             mint the entity's resource. Check the caller passed a persisted id."
        )
    )]
    InvalidEntityId { id: i64 },

    #[error("catalog source failed: {message}")]
    #[diagnostic(
        code(agora::store::source),
        help(
            "The authoritative relational source could not be read during a \
             refresh. The store keeps its previous contents; retry once the \
             source is reachable."
        )
    )]
    Source { message: String },
}

// ---------------------------------------------------------------------------
// Query errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("pattern query parse error: {message}")]
    #[diagnostic(
        code(agora::query::parse),
        help(
            "The ad-hoc pattern text is malformed. The accepted shape is \
             `SELECT ?v ... WHERE {{ patterns }}` with optional OPTIONAL/FILTER \
             blocks and ORDER BY / LIMIT / OFFSET modifiers."
        )
    )]
    Parse { message: String },
}

/// Convenience alias for functions returning catalog-layer results.
pub type AgoraResult<T> = std::result::Result<T, AgoraError>;
