//! Entity-to-graph conversion: one product aggregate → one statement set.
//!
//! Conversion is a pure function of the aggregate and the loaded vocabulary.
//! It is deterministic: identical aggregate state always produces an
//! identical statement set, which is what lets the store implement updates
//! as remove-then-add without leaving stale edges behind.
//!
//! Every optional field and sub-object is guarded: an absent value means the
//! corresponding edge is omitted, never an error. The only hard failure is a
//! product without a valid identifier.

use crate::catalog::ProductAggregate;
use crate::error::ConvertError;
use crate::schema::SchemaVocab;
use crate::term::{rdf_type, slugify, InstanceNs, Iri, Literal, Statement, Term};

/// Convert a fully-hydrated product aggregate into a fresh statement set.
///
/// The returned collection is isolated: it never aliases store internals;
/// the caller merges it explicitly.
pub fn aggregate_statements(
    vocab: &SchemaVocab,
    ns: &InstanceNs,
    product: &ProductAggregate,
) -> Result<Vec<Statement>, ConvertError> {
    if product.id <= 0 {
        return Err(ConvertError::InvalidProductId { id: product.id });
    }

    let mut out = Vec::new();
    let subject = ns.product(product.id);

    push_type(&mut out, &subject, &vocab.product);
    push_string(&mut out, &subject, &vocab.name, product.name.as_deref());
    push_string(
        &mut out,
        &subject,
        &vocab.description,
        product.description.as_deref(),
    );
    push_literal(
        &mut out,
        &subject,
        &vocab.price,
        product.price.map(Literal::Float),
    );
    push_string(&mut out, &subject, &vocab.photo, product.photo.as_deref());
    push_literal(
        &mut out,
        &subject,
        &vocab.average_rating,
        product.average_rating.map(Literal::Float),
    );
    push_literal(
        &mut out,
        &subject,
        &vocab.review_count,
        product.review_count.map(Literal::Integer),
    );

    convert_category(vocab, ns, product, &subject, &mut out);
    convert_seller(vocab, ns, product, &subject, &mut out);
    convert_reviews(vocab, ns, product, &subject, &mut out);

    Ok(out)
}

/// Category: slug-keyed shared node, display text preserved as a literal.
fn convert_category(
    vocab: &SchemaVocab,
    ns: &InstanceNs,
    product: &ProductAggregate,
    subject: &Iri,
    out: &mut Vec<Statement>,
) {
    let Some(text) = product.category.as_deref() else {
        return;
    };
    let slug = slugify(text);
    if slug.is_empty() {
        tracing::warn!(product = product.id, text, "category text yields empty slug; edge omitted");
        return;
    }

    let node = ns.category(&slug);
    if let Some(prop) = &vocab.category {
        out.push(Statement::new(subject.clone(), prop.clone(), node.clone()));
    }
    push_type(out, &node, &vocab.category_class);
    push_string(out, &node, &vocab.category_name, Some(text));
}

fn convert_seller(
    vocab: &SchemaVocab,
    ns: &InstanceNs,
    product: &ProductAggregate,
    subject: &Iri,
    out: &mut Vec<Statement>,
) {
    let Some(seller) = &product.seller else {
        return;
    };
    if seller.id <= 0 {
        tracing::warn!(product = product.id, "seller lacks a valid identifier; edges omitted");
        return;
    }

    let node = ns.seller(seller.id);
    if let Some(prop) = &vocab.sold_by {
        out.push(Statement::new(subject.clone(), prop.clone(), node.clone()));
    }
    push_type(out, &node, &vocab.seller);
    push_string(out, &node, &vocab.first_name, seller.first_name.as_deref());
    push_string(out, &node, &vocab.last_name, seller.last_name.as_deref());
    push_string(out, &node, &vocab.email, seller.email.as_deref());
}

/// Reviews: each entry becomes a review node linked to its reviewer.
/// Incomplete entries are skipped individually; the rest still convert.
fn convert_reviews(
    vocab: &SchemaVocab,
    ns: &InstanceNs,
    product: &ProductAggregate,
    subject: &Iri,
    out: &mut Vec<Statement>,
) {
    for review in &product.reviews {
        let Some(reviewer) = review.reviewer.as_ref().filter(|r| r.id > 0) else {
            tracing::warn!(
                product = product.id,
                review = review.id,
                "review lacks a reviewer identifier; skipped"
            );
            continue;
        };
        if review.id <= 0 {
            tracing::warn!(product = product.id, "review lacks a valid identifier; skipped");
            continue;
        }

        let review_node = ns.review(review.id);
        if let Some(prop) = &vocab.has_review {
            out.push(Statement::new(
                subject.clone(),
                prop.clone(),
                review_node.clone(),
            ));
        }
        push_type(out, &review_node, &vocab.review);
        push_literal(
            out,
            &review_node,
            &vocab.rating,
            review.rating.map(Literal::Integer),
        );
        push_string(out, &review_node, &vocab.comment, review.comment.as_deref());
        push_literal(
            out,
            &review_node,
            &vocab.review_date,
            review.date.map(Literal::DateTime),
        );

        let reviewer_node = ns.reviewer(reviewer.id);
        if let Some(prop) = &vocab.reviewed_by {
            out.push(Statement::new(
                review_node.clone(),
                prop.clone(),
                reviewer_node.clone(),
            ));
        }
        push_type(out, &reviewer_node, &vocab.reviewer);
        push_string(
            out,
            &reviewer_node,
            &vocab.first_name,
            reviewer.first_name.as_deref(),
        );
        push_string(
            out,
            &reviewer_node,
            &vocab.last_name,
            reviewer.last_name.as_deref(),
        );
        push_string(out, &reviewer_node, &vocab.email, reviewer.email.as_deref());
    }
}

fn push_type(out: &mut Vec<Statement>, subject: &Iri, class: &Option<Iri>) {
    if let Some(class) = class {
        out.push(Statement::new(subject.clone(), rdf_type(), class.clone()));
    }
}

fn push_string(out: &mut Vec<Statement>, subject: &Iri, prop: &Option<Iri>, value: Option<&str>) {
    push_literal(out, subject, prop, value.map(|v| Literal::String(v.to_string())));
}

fn push_literal(
    out: &mut Vec<Statement>,
    subject: &Iri,
    prop: &Option<Iri>,
    value: Option<Literal>,
) {
    if let (Some(prop), Some(value)) = (prop, value) {
        out.push(Statement::new(subject.clone(), prop.clone(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ReviewRecord, ReviewerRecord, SellerRecord};
    use chrono::{TimeZone, Utc};

    fn vocab() -> SchemaVocab {
        SchemaVocab::load(None, "https://agora.dev/vocab#")
    }

    fn ns() -> InstanceNs {
        InstanceNs::new("https://agora.dev/catalog/")
    }

    fn full_product() -> ProductAggregate {
        ProductAggregate {
            id: 1,
            name: Some("Linen Shirt".into()),
            description: Some("A crisp summer shirt".into()),
            price: Some(49.90),
            category: Some("Shirt".into()),
            photo: Some("shirts/linen-1.jpg".into()),
            average_rating: Some(4.5),
            review_count: Some(2),
            seller: Some(SellerRecord {
                id: 9,
                first_name: Some("Maren".into()),
                last_name: Some("Holt".into()),
                email: Some("maren@example.com".into()),
            }),
            reviews: vec![
                ReviewRecord {
                    id: 11,
                    rating: Some(5),
                    comment: Some("Great fit".into()),
                    date: Some(Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()),
                    reviewer: Some(ReviewerRecord {
                        id: 21,
                        first_name: Some("Ada".into()),
                        last_name: Some("Byron".into()),
                        email: Some("ada@example.com".into()),
                    }),
                },
                ReviewRecord {
                    id: 12,
                    rating: Some(4),
                    comment: None,
                    date: None,
                    reviewer: Some(ReviewerRecord {
                        id: 22,
                        ..Default::default()
                    }),
                },
            ],
        }
    }

    /// Multiset comparison: sort the rendered forms and compare.
    fn canonical(statements: &[Statement]) -> Vec<String> {
        let mut rendered: Vec<String> = statements.iter().map(|s| s.to_string()).collect();
        rendered.sort();
        rendered
    }

    #[test]
    fn conversion_is_deterministic() {
        let product = full_product();
        let a = aggregate_statements(&vocab(), &ns(), &product).unwrap();
        let b = aggregate_statements(&vocab(), &ns(), &product).unwrap();
        assert_eq!(canonical(&a), canonical(&b));
    }

    #[test]
    fn invalid_product_id_is_a_hard_failure() {
        let product = ProductAggregate::default();
        let err = aggregate_statements(&vocab(), &ns(), &product).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidProductId { id: 0 }));
    }

    #[test]
    fn bare_product_converts_to_type_statement_only() {
        let product = ProductAggregate {
            id: 5,
            ..Default::default()
        };
        let statements = aggregate_statements(&vocab(), &ns(), &product).unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].predicate, rdf_type());
    }

    #[test]
    fn typed_literals_are_emitted() {
        let statements = aggregate_statements(&vocab(), &ns(), &full_product()).unwrap();
        let v = vocab();

        let price = statements
            .iter()
            .find(|s| Some(&s.predicate) == v.price.as_ref())
            .unwrap();
        assert_eq!(price.object, Term::Literal(Literal::Float(49.90)));

        let count = statements
            .iter()
            .find(|s| Some(&s.predicate) == v.review_count.as_ref())
            .unwrap();
        assert_eq!(count.object, Term::Literal(Literal::Integer(2)));

        let date = statements
            .iter()
            .find(|s| Some(&s.predicate) == v.review_date.as_ref())
            .unwrap();
        assert!(matches!(
            &date.object,
            Term::Literal(Literal::DateTime(_))
        ));
    }

    #[test]
    fn category_nodes_merge_across_casing_and_whitespace() {
        let v = vocab();
        let a = ProductAggregate {
            id: 1,
            category: Some("Outdoor ".into()),
            ..Default::default()
        };
        let b = ProductAggregate {
            id: 2,
            category: Some("outdoor".into()),
            ..Default::default()
        };

        let sa = aggregate_statements(&v, &ns(), &a).unwrap();
        let sb = aggregate_statements(&v, &ns(), &b).unwrap();

        let cat = |stmts: &[Statement]| {
            stmts
                .iter()
                .find(|s| Some(&s.predicate) == v.category.as_ref())
                .and_then(|s| s.object.as_iri().cloned())
                .unwrap()
        };
        assert_eq!(cat(&sa), cat(&sb));

        // Display text keeps the original form on each side.
        let display = sa
            .iter()
            .find(|s| Some(&s.predicate) == v.category_name.as_ref())
            .unwrap();
        assert_eq!(
            display.object,
            Term::Literal(Literal::String("Outdoor ".into()))
        );
    }

    #[test]
    fn review_without_reviewer_is_skipped() {
        let v = vocab();
        let product = ProductAggregate {
            id: 1,
            reviews: vec![
                ReviewRecord {
                    id: 11,
                    rating: Some(3),
                    reviewer: None,
                    ..Default::default()
                },
                ReviewRecord {
                    id: 12,
                    rating: Some(4),
                    reviewer: Some(ReviewerRecord {
                        id: 21,
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let statements = aggregate_statements(&v, &ns(), &product).unwrap();
        let review_edges: Vec<_> = statements
            .iter()
            .filter(|s| Some(&s.predicate) == v.has_review.as_ref())
            .collect();
        assert_eq!(review_edges.len(), 1);
        assert_eq!(
            review_edges[0].object.as_iri().unwrap(),
            &ns().review(12)
        );
    }

    #[test]
    fn absent_sub_objects_omit_edges() {
        let v = vocab();
        let product = ProductAggregate {
            id: 3,
            name: Some("Plain".into()),
            ..Default::default()
        };
        let statements = aggregate_statements(&v, &ns(), &product).unwrap();
        assert!(statements
            .iter()
            .all(|s| Some(&s.predicate) != v.sold_by.as_ref()));
        assert!(statements
            .iter()
            .all(|s| Some(&s.predicate) != v.category.as_ref()));
    }

    #[test]
    fn degraded_vocabulary_skips_dependent_steps() {
        let sparse = SchemaVocab::from_document(
            r#"
            [classes]
            product = "Product"
            [properties]
            name = "name"
            "#,
            "https://agora.dev/vocab#",
        );
        let statements = aggregate_statements(&sparse, &ns(), &full_product()).unwrap();

        // Only the type statement and the name literal survive.
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn output_never_aliases_inputs() {
        let product = full_product();
        let mut statements = aggregate_statements(&vocab(), &ns(), &product).unwrap();
        statements.clear();
        // A second conversion is unaffected by mutating the first output.
        let again = aggregate_statements(&vocab(), &ns(), &product).unwrap();
        assert!(!again.is_empty());
    }
}
