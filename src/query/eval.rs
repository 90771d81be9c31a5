//! Pattern evaluation: conjunctive binding joins over a statement snapshot.
//!
//! The evaluator is a straightforward nested-loop join; the store is
//! catalog-bounded, so scans beat index maintenance here. Bindings flow left
//! to right through the required patterns, optional groups extend surviving
//! bindings where they can, and filters, sorting, and pagination are applied
//! to the final binding set before projection.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::term::{Literal, Statement, Term};

use super::pattern::{FilterExpr, OrderBy, PatternQuery, TermPattern, TriplePattern};
use super::{BoundValue, Row};

type Binding = BTreeMap<String, Term>;

/// Evaluate a query against a statement snapshot.
pub fn evaluate(statements: &[Statement], query: &PatternQuery) -> Vec<Row> {
    let mut bindings = join(&query.required, statements, vec![Binding::new()]);

    for group in &query.optional {
        bindings = bindings
            .into_iter()
            .flat_map(|binding| {
                let extended = join(group, statements, vec![binding.clone()]);
                if extended.is_empty() {
                    vec![binding]
                } else {
                    extended
                }
            })
            .collect();
    }

    bindings.retain(|b| query.filters.iter().all(|f| filter_passes(f, b)));

    if let Some(order) = &query.order {
        sort_bindings(&mut bindings, order);
    }

    bindings
        .into_iter()
        .skip(query.offset)
        .take(query.limit.unwrap_or(usize::MAX))
        .map(|b| project(&b, &query.select))
        .collect()
}

/// Number of distinct values a variable takes across rows. Unbound rows do
/// not contribute. This is what keeps counts from double-counting a product
/// that matches through several optional-bound paths.
pub fn distinct_values(rows: &[Row], variable: &str) -> usize {
    rows.iter()
        .filter_map(|row| row.get(variable).and_then(|v| v.lexical()))
        .collect::<BTreeSet<_>>()
        .len()
}

fn join(patterns: &[TriplePattern], statements: &[Statement], seeds: Vec<Binding>) -> Vec<Binding> {
    let mut bindings = seeds;
    for pattern in patterns {
        let mut next = Vec::new();
        for binding in &bindings {
            for statement in statements {
                if let Some(extended) = unify(pattern, statement, binding) {
                    next.push(extended);
                }
            }
        }
        bindings = next;
        if bindings.is_empty() {
            break;
        }
    }
    bindings
}

fn unify(pattern: &TriplePattern, statement: &Statement, binding: &Binding) -> Option<Binding> {
    let mut candidate = binding.clone();
    let subject = Term::Iri(statement.subject.clone());
    let predicate = Term::Iri(statement.predicate.clone());
    if bind(&pattern.subject, &subject, &mut candidate)
        && bind(&pattern.predicate, &predicate, &mut candidate)
        && bind(&pattern.object, &statement.object, &mut candidate)
    {
        Some(candidate)
    } else {
        None
    }
}

fn bind(pattern: &TermPattern, actual: &Term, binding: &mut Binding) -> bool {
    match pattern {
        TermPattern::Var(name) => match binding.get(name) {
            Some(bound) => bound == actual,
            None => {
                binding.insert(name.clone(), actual.clone());
                true
            }
        },
        TermPattern::Iri(iri) => matches!(actual, Term::Iri(a) if a == iri),
        TermPattern::Literal(lit) => matches!(actual, Term::Literal(a) if a == lit),
    }
}

fn filter_passes(filter: &FilterExpr, binding: &Binding) -> bool {
    let (variable, value, contains) = match filter {
        FilterExpr::EqualsIgnoreCase { variable, value } => (variable, value, false),
        FilterExpr::ContainsIgnoreCase { variable, value } => (variable, value, true),
    };
    let Some(term) = binding.get(variable) else {
        return false;
    };
    let lexical = term.lexical_form().to_lowercase();
    let needle = value.to_lowercase();
    if contains {
        lexical.contains(&needle)
    } else {
        lexical == needle
    }
}

fn sort_bindings(bindings: &mut [Binding], order: &OrderBy) {
    bindings.sort_by(|a, b| {
        let ordering = compare_terms(a.get(&order.variable), b.get(&order.variable));
        if order.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// Type-aware comparison: numeric literals numerically, datetimes
/// chronologically, otherwise case-insensitive lexical. Unbound compares
/// greater than any bound value.
fn compare_terms(a: Option<&Term>, b: Option<&Term>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            if let (Some(nx), Some(ny)) = (numeric(x), numeric(y)) {
                return nx.partial_cmp(&ny).unwrap_or(Ordering::Equal);
            }
            if let (
                Term::Literal(Literal::DateTime(dx)),
                Term::Literal(Literal::DateTime(dy)),
            ) = (x, y)
            {
                return dx.cmp(dy);
            }
            x.lexical_form()
                .to_lowercase()
                .cmp(&y.lexical_form().to_lowercase())
        }
    }
}

fn numeric(term: &Term) -> Option<f64> {
    match term {
        Term::Literal(lit) => lit.as_f64(),
        Term::Iri(_) => None,
    }
}

fn project(binding: &Binding, select: &[String]) -> Row {
    if select.is_empty() {
        return binding
            .iter()
            .map(|(name, term)| (name.clone(), BoundValue::from_term(term)))
            .collect();
    }
    select
        .iter()
        .map(|name| {
            let value = binding
                .get(name)
                .map(BoundValue::from_term)
                .unwrap_or(BoundValue::Unbound);
            (name.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Iri;
    use chrono::{TimeZone, Utc};

    fn iri(s: &str) -> Iri {
        Iri::new(s)
    }

    fn edge(s: &str, p: &str, o: &str) -> Statement {
        Statement::new(iri(s), iri(p), iri(o))
    }

    fn lit(s: &str, p: &str, o: Literal) -> Statement {
        Statement::new(iri(s), iri(p), o)
    }

    fn sample() -> Vec<Statement> {
        vec![
            edge("urn:p1", "urn:type", "urn:Product"),
            lit("urn:p1", "urn:name", Literal::String("Linen Shirt".into())),
            lit("urn:p1", "urn:price", Literal::Float(49.90)),
            edge("urn:p2", "urn:type", "urn:Product"),
            lit("urn:p2", "urn:name", Literal::String("Dress".into())),
            lit("urn:p2", "urn:price", Literal::Float(129.99)),
            edge("urn:p3", "urn:type", "urn:Product"),
            lit("urn:p3", "urn:name", Literal::String("anorak".into())),
        ]
    }

    fn products_by_name() -> PatternQuery {
        PatternQuery::new()
            .select(["p", "name", "price"])
            .pattern(TriplePattern::new(
                TermPattern::var("p"),
                TermPattern::iri("urn:type"),
                TermPattern::iri("urn:Product"),
            ))
            .pattern(TriplePattern::new(
                TermPattern::var("p"),
                TermPattern::iri("urn:name"),
                TermPattern::var("name"),
            ))
            .optional(vec![TriplePattern::new(
                TermPattern::var("p"),
                TermPattern::iri("urn:price"),
                TermPattern::var("price"),
            )])
    }

    #[test]
    fn conjunction_joins_on_shared_variables() {
        let rows = evaluate(&sample(), &products_by_name());
        assert_eq!(rows.len(), 3);
        assert!(rows
            .iter()
            .any(|r| r["name"] == BoundValue::Literal("Dress".into())));
    }

    #[test]
    fn optional_variables_report_explicit_unbound() {
        let rows = evaluate(&sample(), &products_by_name());
        let anorak = rows
            .iter()
            .find(|r| r["name"] == BoundValue::Literal("anorak".into()))
            .unwrap();
        assert_eq!(anorak["price"], BoundValue::Unbound);
        assert!(anorak.contains_key("price"));
    }

    #[test]
    fn filters_are_case_insensitive() {
        let q = products_by_name().filter(FilterExpr::EqualsIgnoreCase {
            variable: "name".into(),
            value: "DRESS".into(),
        });
        let rows = evaluate(&sample(), &q);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["p"], BoundValue::Iri("urn:p2".into()));
    }

    #[test]
    fn substring_filter_drops_unbound_rows() {
        let q = PatternQuery::new()
            .select(["p", "price"])
            .pattern(TriplePattern::new(
                TermPattern::var("p"),
                TermPattern::iri("urn:type"),
                TermPattern::iri("urn:Product"),
            ))
            .optional(vec![TriplePattern::new(
                TermPattern::var("p"),
                TermPattern::iri("urn:price"),
                TermPattern::var("price"),
            )])
            .filter(FilterExpr::ContainsIgnoreCase {
                variable: "price".into(),
                value: "9".into(),
            });
        let rows = evaluate(&sample(), &q);
        // p3 has no price and is dropped by the filter.
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn numeric_sort_is_numeric_not_lexical() {
        let q = products_by_name().order_by("price", false);
        let rows = evaluate(&sample(), &q);
        assert_eq!(rows[0]["price"], BoundValue::Literal("49.9".into()));
        assert_eq!(rows[1]["price"], BoundValue::Literal("129.99".into()));
        // Unbound last.
        assert_eq!(rows[2]["price"], BoundValue::Unbound);
    }

    #[test]
    fn string_sort_ignores_case() {
        let q = products_by_name().order_by("name", false);
        let rows = evaluate(&sample(), &q);
        let names: Vec<_> = rows.iter().map(|r| r["name"].clone()).collect();
        assert_eq!(
            names,
            vec![
                BoundValue::Literal("anorak".into()),
                BoundValue::Literal("Dress".into()),
                BoundValue::Literal("Linen Shirt".into()),
            ]
        );
    }

    #[test]
    fn datetime_sort_is_chronological() {
        let statements = vec![
            lit(
                "urn:r1",
                "urn:date",
                Literal::DateTime(Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap()),
            ),
            lit(
                "urn:r2",
                "urn:date",
                Literal::DateTime(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            ),
        ];
        let q = PatternQuery::new()
            .select(["r", "date"])
            .pattern(TriplePattern::new(
                TermPattern::var("r"),
                TermPattern::iri("urn:date"),
                TermPattern::var("date"),
            ))
            .order_by("date", false);
        let rows = evaluate(&statements, &q);
        assert_eq!(rows[0]["r"], BoundValue::Iri("urn:r2".into()));
    }

    #[test]
    fn offset_and_limit_slice_after_sort() {
        let q = products_by_name().order_by("name", false).offset(1).limit(1);
        let rows = evaluate(&sample(), &q);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], BoundValue::Literal("Dress".into()));
    }

    #[test]
    fn distinct_value_counting() {
        let rows = evaluate(&sample(), &products_by_name());
        assert_eq!(distinct_values(&rows, "p"), 3);
        assert_eq!(distinct_values(&rows, "missing"), 0);
    }

    #[test]
    fn no_match_yields_empty() {
        let q = PatternQuery::new().pattern(TriplePattern::new(
            TermPattern::var("s"),
            TermPattern::iri("urn:absent"),
            TermPattern::var("o"),
        ));
        assert!(evaluate(&sample(), &q).is_empty());
    }

    #[test]
    fn constant_literal_patterns_match_exactly() {
        let q = PatternQuery::new()
            .select(["p"])
            .pattern(TriplePattern::new(
                TermPattern::var("p"),
                TermPattern::iri("urn:price"),
                TermPattern::Literal(Literal::Float(129.99)),
            ));
        let rows = evaluate(&sample(), &q);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["p"], BoundValue::Iri("urn:p2".into()));
    }
}
