//! Relational catalog aggregates consumed from the surrounding application.
//!
//! These are plain data records: a fully-hydrated product with its seller,
//! reviews, and reviewers attached. The graph layer never loads them itself;
//! the host application hands them over after its relational commits, or
//! implements [`CatalogSource`] so `refresh()` can pull the full set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A fully-hydrated product aggregate.
///
/// Only `id` is required; every other field and sub-object may be absent,
/// in which case the converter simply omits the corresponding edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductAggregate {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    /// Free-text category label, e.g. `"Dress"`. Normalized to a shared
    /// slug-keyed category node during conversion.
    pub category: Option<String>,
    /// Reference to the product photo in the host application's image store.
    pub photo: Option<String>,
    pub average_rating: Option<f64>,
    pub review_count: Option<i64>,
    pub seller: Option<SellerRecord>,
    #[serde(default)]
    pub reviews: Vec<ReviewRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SellerRecord {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: i64,
    pub rating: Option<i64>,
    pub comment: Option<String>,
    pub date: Option<DateTime<Utc>>,
    /// A review without a reviewer (or with an unpersisted one) is skipped
    /// during conversion; the rest of the aggregate still converts.
    pub reviewer: Option<ReviewerRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewerRecord {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// The authoritative relational source the store is rebuilt from.
///
/// `refresh()` clears the graph and reloads every aggregate this returns.
/// The graph itself is a disposable derived cache; this is the system of
/// record.
pub trait CatalogSource {
    fn load_all(&self) -> Result<Vec<ProductAggregate>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_default_is_bare() {
        let p = ProductAggregate::default();
        assert_eq!(p.id, 0);
        assert!(p.name.is_none());
        assert!(p.reviews.is_empty());
    }

    #[test]
    fn aggregate_round_trips_through_json() {
        let p = ProductAggregate {
            id: 7,
            name: Some("Linen Shirt".into()),
            price: Some(49.90),
            reviews: vec![ReviewRecord {
                id: 1,
                rating: Some(5),
                reviewer: Some(ReviewerRecord {
                    id: 3,
                    first_name: Some("Ada".into()),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        };
        let json = serde_json::to_string(&p).unwrap();
        let back: ProductAggregate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
