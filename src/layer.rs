//! Facade: the owning type for the semantic catalog layer.
//!
//! [`SemanticLayer`] owns the loaded vocabulary, the identifier-minting
//! namespace, and the statement store, and exposes the whole public surface:
//! lifecycle hooks invoked after relational commits (`upsert`, `remove`,
//! `bulk_load`, `refresh`), the fixed query templates, semantic search with
//! its count companion, and the trusted ad-hoc query path. The surrounding
//! application constructs one and shares it via `Arc`; there is no ambient
//! global state.

use std::path::PathBuf;

use crate::catalog::{CatalogSource, ProductAggregate};
use crate::convert::aggregate_statements;
use crate::error::{AgoraResult, StoreError};
use crate::query::{
    distinct_values, evaluate, parse_query, FilterExpr, PatternQuery, QueryResponse, Row,
    SearchRequest, TermPattern, TriplePattern,
};
use crate::schema::{normalize_namespace, SchemaVocab};
use crate::store::GraphStore;
use crate::term::{rdf_type, InstanceNs, Iri};

/// Sort keys accepted by semantic search; anything else is logged and ignored.
const SEARCH_SORT_KEYS: [&str; 4] = ["name", "price", "avgRating", "reviewCount"];

/// Configuration for the semantic catalog layer.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Namespace the schema document's terms resolve against.
    pub schema_ns: String,
    /// Namespace instance identifiers are minted under.
    pub data_ns: String,
    /// Schema document path. `None` uses the bundled default vocabulary.
    pub schema_path: Option<PathBuf>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            schema_ns: "https://agora.dev/vocab#".into(),
            data_ns: "https://agora.dev/catalog/".into(),
            schema_path: None,
        }
    }
}

/// The semantic catalog layer: vocabulary + store + query surface.
pub struct SemanticLayer {
    vocab: SchemaVocab,
    ns: InstanceNs,
    store: GraphStore,
}

impl SemanticLayer {
    /// Create the layer. Schema problems degrade (warn + unset handles)
    /// rather than fail, so construction itself cannot error.
    pub fn new(config: GraphConfig) -> Self {
        let schema_ns = normalize_namespace(&config.schema_ns);
        let vocab = SchemaVocab::load(config.schema_path.as_deref(), &schema_ns);
        tracing::info!(
            schema_ns = %schema_ns,
            data_ns = %config.data_ns,
            "initializing semantic catalog layer"
        );
        Self {
            vocab,
            ns: InstanceNs::new(config.data_ns),
            store: GraphStore::new(),
        }
    }

    /// The loaded vocabulary handles.
    pub fn vocab(&self) -> &SchemaVocab {
        &self.vocab
    }

    /// Number of statements currently mirrored.
    pub fn statement_count(&self) -> usize {
        self.store.len()
    }

    /// The canonical resource identifier for a product row.
    pub fn product_iri(&self, product_id: i64) -> Iri {
        self.ns.product(product_id)
    }

    // -----------------------------------------------------------------------
    // Lifecycle: invoked after relational commits
    // -----------------------------------------------------------------------

    /// Mirror one aggregate, replacing any previous version of its subgraph.
    pub fn upsert(&self, aggregate: &ProductAggregate) -> AgoraResult<()> {
        let fresh = aggregate_statements(&self.vocab, &self.ns, aggregate)?;
        self.store.upsert(&self.ns.product(aggregate.id), fresh);
        Ok(())
    }

    /// Remove a product and its review subgraph. Returns removed statements.
    pub fn remove(&self, product_id: i64) -> AgoraResult<usize> {
        if product_id <= 0 {
            return Err(StoreError::InvalidEntityId { id: product_id }.into());
        }
        Ok(self
            .store
            .remove_entity(&self.ns.product(product_id), self.vocab.has_review.as_ref()))
    }

    /// Atomically replace the whole store from a full aggregate set.
    /// Aggregates that fail to convert are skipped with a warning.
    pub fn bulk_load(&self, aggregates: &[ProductAggregate]) -> usize {
        let sets: Vec<_> = aggregates
            .iter()
            .filter_map(|aggregate| {
                match aggregate_statements(&self.vocab, &self.ns, aggregate) {
                    Ok(set) => Some(set),
                    Err(e) => {
                        tracing::warn!(product = aggregate.id, error = %e, "aggregate skipped during bulk load");
                        None
                    }
                }
            })
            .collect();
        self.store.bulk_load(sets)
    }

    /// Rebuild the store from the authoritative relational source. The
    /// consistency-restoring operation for any suspected drift; the store
    /// is a derived cache, never repaired in place.
    pub fn refresh(&self, source: &dyn CatalogSource) -> AgoraResult<usize> {
        let aggregates = source.load_all()?;
        tracing::info!(products = aggregates.len(), "refreshing statement store from source");
        Ok(self.bulk_load(&aggregates))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Evaluate trusted ad-hoc pattern text against a consistent snapshot.
    ///
    /// This is equivalent to direct store access; expose it only across an
    /// elevated-trust boundary. Malformed text yields empty rows plus an
    /// explicit error payload, never a fault.
    pub fn query(&self, pattern_text: &str) -> QueryResponse {
        match parse_query(pattern_text) {
            Ok(query) => QueryResponse {
                rows: evaluate(&self.store.snapshot(), &query),
                error: None,
            },
            Err(e) => {
                tracing::error!(error = %e, "ad-hoc pattern query rejected");
                QueryResponse {
                    rows: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// All products with their names; products without a name report an
    /// explicit unbound marker.
    pub fn list_all_product_names(&self) -> Vec<Row> {
        let Some(product) = self.vocab.product.clone() else {
            return Vec::new();
        };
        let mut query = PatternQuery::new()
            .select(["product", "name"])
            .pattern(TriplePattern::new(
                TermPattern::var("product"),
                TermPattern::Iri(rdf_type()),
                TermPattern::Iri(product),
            ));
        if let Some(name) = self.vocab.name.clone() {
            query = query.optional(vec![TriplePattern::new(
                TermPattern::var("product"),
                TermPattern::Iri(name),
                TermPattern::var("name"),
            )]);
        }
        evaluate(&self.store.snapshot(), &query)
    }

    /// Products whose category display text matches `name`, compared
    /// case-insensitively against the stored display text (not the slug).
    pub fn query_by_category(&self, name: &str) -> Vec<Row> {
        let Some(mut query) = self.category_query(name) else {
            return Vec::new();
        };
        if let Some(prop) = self.vocab.name.clone() {
            query = query.optional(vec![TriplePattern::new(
                TermPattern::var("product"),
                TermPattern::Iri(prop),
                TermPattern::var("name"),
            )]);
        }
        evaluate(&self.store.snapshot(), &query)
    }

    /// Dynamic semantic search: optional category and keyword filters,
    /// pagination, and an allow-listed sort key.
    pub fn semantic_search(&self, request: &SearchRequest) -> Vec<Row> {
        let Some(mut query) =
            self.search_query(request.category.as_deref(), request.keyword.as_deref())
        else {
            return Vec::new();
        };

        if let Some(key) = request.sort.as_deref() {
            if SEARCH_SORT_KEYS.contains(&key) {
                query = query.order_by(key, false);
            } else {
                tracing::warn!(key, "unsupported sort key ignored");
            }
        }
        query = query.offset(request.offset);
        if request.limit > 0 {
            query = query.limit(request.limit);
        }

        evaluate(&self.store.snapshot(), &query)
    }

    /// Total matching-product count for the same filters, distinct by
    /// product identifier.
    pub fn count_semantic_search(&self, category: Option<&str>, keyword: Option<&str>) -> usize {
        let Some(query) = self.search_query(category, keyword) else {
            return 0;
        };
        let rows = evaluate(&self.store.snapshot(), &query);
        distinct_values(&rows, "product")
    }

    /// The shared semantic-search pattern. `None` when the vocabulary is too
    /// degraded to express the request (unresolvable handles would otherwise
    /// silently drop the caller's filter).
    fn search_query(&self, category: Option<&str>, keyword: Option<&str>) -> Option<PatternQuery> {
        let product_class = self.vocab.product.clone()?;
        let name = self.vocab.name.clone()?;

        let mut query = PatternQuery::new()
            .select([
                "product",
                "name",
                "description",
                "price",
                "avgRating",
                "reviewCount",
                "category",
                "categoryName",
            ])
            .pattern(TriplePattern::new(
                TermPattern::var("product"),
                TermPattern::Iri(rdf_type()),
                TermPattern::Iri(product_class),
            ))
            .pattern(TriplePattern::new(
                TermPattern::var("product"),
                TermPattern::Iri(name),
                TermPattern::var("name"),
            ));

        // Description: optional output, required when a keyword filters on it.
        match (keyword, self.vocab.description.clone()) {
            (Some(keyword), Some(description)) => {
                query = query
                    .pattern(TriplePattern::new(
                        TermPattern::var("product"),
                        TermPattern::Iri(description),
                        TermPattern::var("description"),
                    ))
                    .filter(FilterExpr::ContainsIgnoreCase {
                        variable: "description".into(),
                        value: keyword.into(),
                    });
            }
            (None, Some(description)) => {
                query = query.optional(vec![TriplePattern::new(
                    TermPattern::var("product"),
                    TermPattern::Iri(description),
                    TermPattern::var("description"),
                )]);
            }
            (Some(_), None) => {
                tracing::warn!("keyword filter unusable: description term unresolved");
                return None;
            }
            (None, None) => {}
        }

        // Category chain: optional output, required when filtered.
        match (category, self.category_chain()) {
            (Some(category), Some(chain)) => {
                let [membership, display] = chain;
                query = query.pattern(membership).pattern(display).filter(
                    FilterExpr::EqualsIgnoreCase {
                        variable: "categoryName".into(),
                        value: category.into(),
                    },
                );
            }
            (None, Some(chain)) => {
                query = query.optional(chain.to_vec());
            }
            (Some(_), None) => {
                tracing::warn!("category filter unusable: category terms unresolved");
                return None;
            }
            (None, None) => {}
        }

        for (variable, prop) in [
            ("price", self.vocab.price.clone()),
            ("avgRating", self.vocab.average_rating.clone()),
            ("reviewCount", self.vocab.review_count.clone()),
        ] {
            if let Some(prop) = prop {
                query = query.optional(vec![TriplePattern::new(
                    TermPattern::var("product"),
                    TermPattern::Iri(prop),
                    TermPattern::var(variable),
                )]);
            }
        }

        Some(query)
    }

    /// Typed-product + category-membership + display-text pattern with a
    /// case-insensitive display-text filter.
    fn category_query(&self, name: &str) -> Option<PatternQuery> {
        let product_class = self.vocab.product.clone()?;
        let [membership, display] = self.category_chain()?;
        Some(
            PatternQuery::new()
                .select(["product", "name", "category", "categoryName"])
                .pattern(TriplePattern::new(
                    TermPattern::var("product"),
                    TermPattern::Iri(rdf_type()),
                    TermPattern::Iri(product_class),
                ))
                .pattern(membership)
                .pattern(display)
                .filter(FilterExpr::EqualsIgnoreCase {
                    variable: "categoryName".into(),
                    value: name.into(),
                }),
        )
    }

    fn category_chain(&self) -> Option<[TriplePattern; 2]> {
        let membership = self.vocab.category.clone()?;
        let display = self.vocab.category_name.clone()?;
        Some([
            TriplePattern::new(
                TermPattern::var("product"),
                TermPattern::Iri(membership),
                TermPattern::var("category"),
            ),
            TriplePattern::new(
                TermPattern::var("category"),
                TermPattern::Iri(display),
                TermPattern::var("categoryName"),
            ),
        ])
    }
}

impl std::fmt::Debug for SemanticLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticLayer")
            .field("statements", &self.store.len())
            .finish()
    }
}
