//! # agora-graph
//!
//! Semantic catalog layer: mirrors relational marketplace data (products,
//! sellers, reviews, reviewers, categories) as an in-memory graph of typed
//! statements, keeps the graph consistent as the relational data changes,
//! and answers graph-pattern queries, including a dynamic semantic-search
//! mode with filtering, pagination, and sorting.
//!
//! The store is a disposable derived cache of the relational source of
//! record: always rebuildable via `refresh()`, never durable on its own.
//!
//! ## Architecture
//!
//! - **Statement model** (`term`): resources, typed literals, statements,
//!   deterministic identifier minting
//! - **Schema loader** (`schema`): TOML vocabulary resolved once at startup,
//!   degrading gracefully on missing terms
//! - **Converter** (`convert`): pure, deterministic aggregate → statement set
//! - **Graph store** (`store`): lock-guarded shared statement set with
//!   replace-style upserts and cascading removal
//! - **Query engine** (`query`): typed pattern AST, snapshot evaluation, and
//!   a trusted ad-hoc parser
//! - **Facade** (`layer`): the owning type the host application injects
//!
//! ## Library usage
//!
//! ```
//! use agora_graph::catalog::ProductAggregate;
//! use agora_graph::{GraphConfig, SearchRequest, SemanticLayer};
//!
//! let layer = SemanticLayer::new(GraphConfig::default());
//! layer.upsert(&ProductAggregate {
//!     id: 1,
//!     name: Some("Linen Shirt".into()),
//!     category: Some("Shirt".into()),
//!     price: Some(49.90),
//!     ..Default::default()
//! }).unwrap();
//!
//! let rows = layer.semantic_search(&SearchRequest {
//!     category: Some("shirt".into()),
//!     ..Default::default()
//! });
//! assert_eq!(rows.len(), 1);
//! ```

pub mod catalog;
pub mod convert;
pub mod error;
pub mod layer;
pub mod query;
pub mod schema;
pub mod store;
pub mod term;

pub use error::{AgoraError, AgoraResult};
pub use layer::{GraphConfig, SemanticLayer};
pub use query::{BoundValue, QueryResponse, Row, SearchRequest};
