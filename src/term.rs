//! Core statement model: resources, typed literals, and statements.
//!
//! Everything the graph layer stores is a [`Statement`]: a
//! (subject, predicate, object) fact. Subjects and predicates are always
//! [`Iri`] resources; objects are either resources or typed [`Literal`]s.
//! Resource identifiers are minted deterministically through [`InstanceNs`]
//! so that converting the same relational row twice always yields the same
//! node, which is what makes replace-style updates safe.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// The standard `rdf:type` predicate, used to classify instance nodes.
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// An opaque, stable resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iri(String);

impl Iri {
    /// Create an identifier from its string form.
    pub fn new(value: impl Into<String>) -> Self {
        Iri(value.into())
    }

    /// The underlying identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Iri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// The `rdf:type` predicate as an [`Iri`].
pub fn rdf_type() -> Iri {
    Iri::new(RDF_TYPE)
}

/// A typed literal value.
///
/// Numeric and temporal values keep their native type so that downstream
/// comparison and sorting are numeric/chronological rather than lexical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    /// An ISO-8601 UTC instant.
    DateTime(DateTime<Utc>),
}

impl Literal {
    /// The lexical form used in query result rows.
    ///
    /// Datetimes render as ISO-8601 UTC with a `Z` suffix.
    pub fn lexical_form(&self) -> String {
        match self {
            Literal::String(s) => s.clone(),
            Literal::Integer(i) => i.to_string(),
            Literal::Float(x) => x.to_string(),
            Literal::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Numeric coercion for sorting. `None` for strings and datetimes.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Integer(i) => Some(*i as f64),
            Literal::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{s:?}"),
            Literal::Integer(i) => write!(f, "{i}"),
            Literal::Float(x) => write!(f, "{x}"),
            Literal::DateTime(_) => write!(f, "\"{}\"", self.lexical_form()),
        }
    }
}

/// Either a resource identifier or a typed literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    Iri(Iri),
    Literal(Literal),
}

impl Term {
    /// The resource identifier, if this term is one.
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            Term::Literal(_) => None,
        }
    }

    /// The lexical form used in query result rows.
    pub fn lexical_form(&self) -> String {
        match self {
            Term::Iri(iri) => iri.as_str().to_string(),
            Term::Literal(lit) => lit.lexical_form(),
        }
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Term::Iri(iri)
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Term::Literal(lit)
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Iri(iri) => iri.fmt(f),
            Term::Literal(lit) => lit.fmt(f),
        }
    }
}

/// A (subject, predicate, object) fact. Subject and predicate are never
/// absent; the object may be a resource or a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub subject: Iri,
    pub predicate: Iri,
    pub object: Term,
}

impl Statement {
    /// Create a statement. The object accepts either an [`Iri`] or a [`Literal`].
    pub fn new(subject: Iri, predicate: Iri, object: impl Into<Term>) -> Self {
        Self {
            subject,
            predicate,
            object: object.into(),
        }
    }

    /// Whether the given resource appears as this statement's subject or object.
    pub fn mentions(&self, iri: &Iri) -> bool {
        self.subject == *iri || matches!(&self.object, Term::Iri(o) if o == iri)
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// Generate a stable, URL-safe slug from free text.
///
/// Lowercases, maps whitespace to hyphens, strips everything outside
/// `[a-z0-9-]`, and collapses hyphen runs. Differently cased or spaced
/// inputs for the same logical label resolve to the same slug.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                Some(c)
            } else if c.is_whitespace() {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Deterministic instance-identifier minting for catalog nodes.
///
/// Identical input always yields an identical identifier, which is what
/// allows the store to replace an entity's subgraph wholesale on update.
#[derive(Debug, Clone)]
pub struct InstanceNs {
    base: String,
}

impl InstanceNs {
    /// Create a minting namespace. A trailing `/` or `#` is appended if missing.
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') && !base.ends_with('#') {
            base.push('/');
        }
        Self { base }
    }

    pub fn product(&self, id: i64) -> Iri {
        Iri::new(format!("{}product/{id}", self.base))
    }

    pub fn seller(&self, id: i64) -> Iri {
        Iri::new(format!("{}seller/{id}", self.base))
    }

    pub fn review(&self, id: i64) -> Iri {
        Iri::new(format!("{}review/{id}", self.base))
    }

    pub fn reviewer(&self, id: i64) -> Iri {
        Iri::new(format!("{}reviewer/{id}", self.base))
    }

    /// Category identifiers are keyed by slug so that differently cased or
    /// spaced display texts share one node.
    pub fn category(&self, slug: &str) -> Iri {
        Iri::new(format!("{}category/{slug}", self.base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
        assert_eq!(slugify("Outdoor "), "outdoor");
        assert_eq!(slugify("outdoor"), "outdoor");
    }

    #[test]
    fn slugify_strips_punctuation() {
        // Non-alphanumeric, non-whitespace characters are dropped, not hyphenated.
        assert_eq!(slugify("Kids' Wear"), "kids-wear");
        assert_eq!(slugify("special!@#chars"), "specialchars");
    }

    #[test]
    fn minting_is_deterministic() {
        let ns = InstanceNs::new("https://agora.dev/catalog");
        assert_eq!(ns.product(7), ns.product(7));
        assert_eq!(ns.product(7).as_str(), "https://agora.dev/catalog/product/7");
        assert_eq!(ns.category("dress"), ns.category("dress"));
    }

    #[test]
    fn datetime_lexical_form_is_utc_iso8601() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        assert_eq!(
            Literal::DateTime(dt).lexical_form(),
            "2024-03-15T09:30:00Z"
        );
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(Literal::Integer(4).as_f64(), Some(4.0));
        assert_eq!(Literal::Float(129.99).as_f64(), Some(129.99));
        assert_eq!(Literal::String("4".into()).as_f64(), None);
    }

    #[test]
    fn statement_mentions() {
        let s = Statement::new(
            Iri::new("urn:a"),
            Iri::new("urn:p"),
            Iri::new("urn:b"),
        );
        assert!(s.mentions(&Iri::new("urn:a")));
        assert!(s.mentions(&Iri::new("urn:b")));
        assert!(!s.mentions(&Iri::new("urn:p")));

        let lit = Statement::new(Iri::new("urn:a"), Iri::new("urn:p"), Literal::Integer(1));
        assert!(!lit.mentions(&Iri::new("urn:missing")));
    }

    #[test]
    fn statement_display() {
        let s = Statement::new(
            Iri::new("urn:a"),
            Iri::new("urn:p"),
            Literal::String("x".into()),
        );
        assert_eq!(s.to_string(), "<urn:a> <urn:p> \"x\" .");
    }
}
