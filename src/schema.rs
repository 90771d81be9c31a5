//! Schema loader: resolves catalog class and property terms once at startup.
//!
//! The schema is a TOML document with `[classes]` and `[properties]` tables
//! mapping handle keys to local term names; each name is resolved against the
//! configured schema namespace into an [`Iri`]. A default document is bundled
//! into the crate; a configured path overrides it.
//!
//! Missing documents and missing terms are a degraded mode, not a failure:
//! the corresponding handle stays `None`, a warning is logged, and every
//! conversion or query step depending on that handle is skipped.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::term::Iri;

/// Catalog vocabulary bundled into the crate.
const DEFAULT_SCHEMA_DOC: &str = include_str!("catalog_vocab.toml");

#[derive(Debug, Default, Deserialize)]
struct SchemaDoc {
    #[serde(default)]
    classes: HashMap<String, String>,
    #[serde(default)]
    properties: HashMap<String, String>,
}

/// Resolved vocabulary handles. Immutable after load.
///
/// Every handle is optional: an absent term degrades the feature that needs
/// it rather than failing the layer.
#[derive(Debug, Clone, Default)]
pub struct SchemaVocab {
    // Classes
    pub product: Option<Iri>,
    pub seller: Option<Iri>,
    pub review: Option<Iri>,
    pub reviewer: Option<Iri>,
    pub category_class: Option<Iri>,

    // Properties
    pub name: Option<Iri>,
    pub description: Option<Iri>,
    pub price: Option<Iri>,
    pub photo: Option<Iri>,
    pub category: Option<Iri>,
    pub category_name: Option<Iri>,
    pub sold_by: Option<Iri>,
    pub has_review: Option<Iri>,
    pub reviewed_by: Option<Iri>,
    pub rating: Option<Iri>,
    pub comment: Option<Iri>,
    pub review_date: Option<Iri>,
    pub first_name: Option<Iri>,
    pub last_name: Option<Iri>,
    pub email: Option<Iri>,
    pub average_rating: Option<Iri>,
    pub review_count: Option<Iri>,
}

impl SchemaVocab {
    /// Load the vocabulary, resolving terms against `schema_ns`.
    ///
    /// With no path, the bundled default document is used. A configured path
    /// that cannot be read leaves every handle unset (warned, not fatal);
    /// the layer still runs, it just mirrors nothing.
    pub fn load(path: Option<&Path>, schema_ns: &str) -> Self {
        match path {
            None => Self::from_document(DEFAULT_SCHEMA_DOC, schema_ns),
            Some(path) => match std::fs::read_to_string(path) {
                Ok(text) => Self::from_document(&text, schema_ns),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "schema document unreadable; all vocabulary handles unset"
                    );
                    Self::default()
                }
            },
        }
    }

    /// Resolve a vocabulary from schema document text.
    pub fn from_document(text: &str, schema_ns: &str) -> Self {
        let doc: SchemaDoc = match toml::from_str(text) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "malformed schema document; all vocabulary handles unset");
                SchemaDoc::default()
            }
        };

        let ns = normalize_namespace(schema_ns);
        let resolve = |table: &HashMap<String, String>, kind: &str, key: &str| -> Option<Iri> {
            match table.get(key) {
                Some(local) => Some(Iri::new(format!("{ns}{local}"))),
                None => {
                    tracing::warn!(kind, key, "schema term missing; dependent steps will be skipped");
                    None
                }
            }
        };
        let class = |key| resolve(&doc.classes, "class", key);
        let prop = |key| resolve(&doc.properties, "property", key);

        Self {
            product: class("product"),
            seller: class("seller"),
            review: class("review"),
            reviewer: class("reviewer"),
            category_class: class("category"),
            name: prop("name"),
            description: prop("description"),
            price: prop("price"),
            photo: prop("photo"),
            category: prop("category"),
            category_name: prop("category_name"),
            sold_by: prop("sold_by"),
            has_review: prop("has_review"),
            reviewed_by: prop("reviewed_by"),
            rating: prop("rating"),
            comment: prop("comment"),
            review_date: prop("review_date"),
            first_name: prop("first_name"),
            last_name: prop("last_name"),
            email: prop("email"),
            average_rating: prop("average_rating"),
            review_count: prop("review_count"),
        }
    }
}

/// Append a trailing delimiter to a namespace if it lacks one.
pub fn normalize_namespace(ns: &str) -> String {
    if ns.ends_with('/') || ns.ends_with('#') {
        ns.to_string()
    } else {
        format!("{ns}#")
    }
}
