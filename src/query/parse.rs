//! Parser for the trusted ad-hoc pattern query text.
//!
//! Accepts a small SELECT-shaped subset of the usual graph-pattern syntax:
//!
//! ```text
//! SELECT ?product ?name
//! WHERE {
//!   ?product a <https://agora.dev/vocab#Product> .
//!   ?product <https://agora.dev/vocab#name> ?name .
//!   OPTIONAL { ?product <https://agora.dev/vocab#price> ?price . }
//!   FILTER(CONTAINS(?name, "shirt"))
//! }
//! ORDER BY ?name LIMIT 10 OFFSET 0
//! ```
//!
//! `SELECT *` projects every bound variable, `a` abbreviates `rdf:type`,
//! filters are the engine's two case-insensitive forms (`CONTAINS`,
//! `EQUALS`). General query-language compliance is a non-goal; anything
//! outside the subset is a [`QueryError::Parse`], which the facade catches
//! and surfaces as an empty result with an error payload.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::QueryError;
use crate::term::{Literal, RDF_TYPE};

use super::pattern::{FilterExpr, PatternQuery, TermPattern, TriplePattern};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\s+|<[^>]*>|\?[A-Za-z_][A-Za-z0-9_]*|"(?:[^"\\]|\\.)*"|-?[0-9]+(?:\.[0-9]+)?|[A-Za-z][A-Za-z0-9_]*|[{}().,;*]"#,
    )
    .expect("token pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Var(String),
    IriRef(String),
    Str(String),
    Num(String),
    Word(String),
    Punct(char),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Var(name) => write!(f, "?{name}"),
            Token::IriRef(iri) => write!(f, "<{iri}>"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Num(n) => write!(f, "{n}"),
            Token::Word(w) => write!(f, "{w}"),
            Token::Punct(c) => write!(f, "{c}"),
        }
    }
}

/// Parse ad-hoc pattern text into a [`PatternQuery`].
pub fn parse_query(input: &str) -> Result<PatternQuery, QueryError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let query = parser.select_query()?;
    parser.expect_end()?;
    Ok(query)
}

fn tokenize(input: &str) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    let mut cursor = 0;
    for m in TOKEN.find_iter(input) {
        if m.start() != cursor {
            return Err(parse_error(format!(
                "unexpected character {:?}",
                &input[cursor..].chars().next().unwrap_or('?')
            )));
        }
        cursor = m.end();
        let text = m.as_str();
        if text.trim().is_empty() {
            continue;
        }
        let token = match text.chars().next().unwrap_or(' ') {
            '?' => Token::Var(text[1..].to_string()),
            '<' => Token::IriRef(text[1..text.len() - 1].to_string()),
            '"' => Token::Str(unescape(&text[1..text.len() - 1])),
            c if c.is_ascii_digit() || c == '-' => Token::Num(text.to_string()),
            c if c.is_ascii_alphabetic() => Token::Word(text.to_string()),
            c => Token::Punct(c),
        };
        tokens.push(token);
    }
    if cursor != input.len() {
        return Err(parse_error(format!(
            "unexpected character {:?}",
            &input[cursor..].chars().next().unwrap_or('?')
        )));
    }
    Ok(tokens)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_error(message: impl Into<String>) -> QueryError {
    QueryError::Parse {
        message: message.into(),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn keyword(&mut self, kw: &str) -> Result<(), QueryError> {
        match self.next() {
            Some(Token::Word(w)) if w.eq_ignore_ascii_case(kw) => Ok(()),
            Some(other) => Err(parse_error(format!("expected {kw}, found `{other}`"))),
            None => Err(parse_error(format!("expected {kw}, found end of input"))),
        }
    }

    fn punct(&mut self, c: char) -> Result<(), QueryError> {
        match self.next() {
            Some(Token::Punct(p)) if p == c => Ok(()),
            Some(other) => Err(parse_error(format!("expected `{c}`, found `{other}`"))),
            None => Err(parse_error(format!("expected `{c}`, found end of input"))),
        }
    }

    fn at_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(kw))
    }

    fn select_query(&mut self) -> Result<PatternQuery, QueryError> {
        self.keyword("SELECT")?;

        let mut select = Vec::new();
        if matches!(self.peek(), Some(Token::Punct('*'))) {
            self.next();
        } else {
            while let Some(Token::Var(_)) = self.peek() {
                if let Some(Token::Var(name)) = self.next() {
                    select.push(name);
                }
            }
            if select.is_empty() {
                return Err(parse_error("SELECT needs `*` or at least one variable"));
            }
        }

        self.keyword("WHERE")?;
        let mut query = PatternQuery::new().select(select);
        query = self.group_block(query)?;
        self.modifiers(query)
    }

    /// `{ triple* (OPTIONAL { triple* })* (FILTER(...))* }` in any order.
    fn group_block(&mut self, mut query: PatternQuery) -> Result<PatternQuery, QueryError> {
        self.punct('{')?;
        loop {
            match self.peek() {
                Some(Token::Punct('}')) => {
                    self.next();
                    return Ok(query);
                }
                Some(Token::Word(w)) if w.eq_ignore_ascii_case("OPTIONAL") => {
                    self.next();
                    query = query.optional(self.optional_group()?);
                }
                Some(Token::Word(w)) if w.eq_ignore_ascii_case("FILTER") => {
                    self.next();
                    query = query.filter(self.filter_expr()?);
                }
                Some(_) => {
                    let triple = self.triple()?;
                    query = query.pattern(triple);
                }
                None => return Err(parse_error("unterminated `{` block")),
            }
        }
    }

    fn optional_group(&mut self) -> Result<Vec<TriplePattern>, QueryError> {
        self.punct('{')?;
        let mut group = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Punct('}')) => {
                    self.next();
                    if group.is_empty() {
                        return Err(parse_error("empty OPTIONAL block"));
                    }
                    return Ok(group);
                }
                Some(Token::Word(w))
                    if w.eq_ignore_ascii_case("OPTIONAL") || w.eq_ignore_ascii_case("FILTER") =>
                {
                    return Err(parse_error("OPTIONAL blocks contain only triple patterns"));
                }
                Some(_) => group.push(self.triple()?),
                None => return Err(parse_error("unterminated OPTIONAL block")),
            }
        }
    }

    fn filter_expr(&mut self) -> Result<FilterExpr, QueryError> {
        self.punct('(')?;
        let op = match self.next() {
            Some(Token::Word(w)) => w,
            Some(other) => {
                return Err(parse_error(format!(
                    "expected CONTAINS or EQUALS, found `{other}`"
                )))
            }
            None => return Err(parse_error("expected CONTAINS or EQUALS, found end of input")),
        };
        self.punct('(')?;
        let variable = match self.next() {
            Some(Token::Var(name)) => name,
            Some(other) => {
                return Err(parse_error(format!(
                    "expected a variable in FILTER, found `{other}`"
                )))
            }
            None => return Err(parse_error("expected a variable in FILTER")),
        };
        self.punct(',')?;
        let value = match self.next() {
            Some(Token::Str(s)) => s,
            Some(other) => {
                return Err(parse_error(format!(
                    "expected a string in FILTER, found `{other}`"
                )))
            }
            None => return Err(parse_error("expected a string in FILTER")),
        };
        self.punct(')')?;
        self.punct(')')?;

        if op.eq_ignore_ascii_case("CONTAINS") {
            Ok(FilterExpr::ContainsIgnoreCase { variable, value })
        } else if op.eq_ignore_ascii_case("EQUALS") {
            Ok(FilterExpr::EqualsIgnoreCase { variable, value })
        } else {
            Err(parse_error(format!(
                "unknown filter function `{op}` (expected CONTAINS or EQUALS)"
            )))
        }
    }

    fn triple(&mut self) -> Result<TriplePattern, QueryError> {
        let subject = self.term()?;
        let predicate = self.term()?;
        let object = self.term()?;
        // Trailing separator is optional before `}`.
        if matches!(self.peek(), Some(Token::Punct('.')) | Some(Token::Punct(';'))) {
            self.next();
        }
        Ok(TriplePattern::new(subject, predicate, object))
    }

    fn term(&mut self) -> Result<TermPattern, QueryError> {
        match self.next() {
            Some(Token::Var(name)) => Ok(TermPattern::Var(name)),
            Some(Token::IriRef(iri)) => Ok(TermPattern::iri(iri)),
            Some(Token::Str(s)) => Ok(TermPattern::Literal(Literal::String(s))),
            Some(Token::Num(n)) => {
                if n.contains('.') {
                    n.parse::<f64>()
                        .map(|x| TermPattern::Literal(Literal::Float(x)))
                        .map_err(|_| parse_error(format!("invalid number `{n}`")))
                } else {
                    n.parse::<i64>()
                        .map(|i| TermPattern::Literal(Literal::Integer(i)))
                        .map_err(|_| parse_error(format!("invalid number `{n}`")))
                }
            }
            Some(Token::Word(w)) if w == "a" => Ok(TermPattern::iri(RDF_TYPE)),
            Some(other) => Err(parse_error(format!(
                "expected a term (variable, IRI, or literal), found `{other}`"
            ))),
            None => Err(parse_error("expected a term, found end of input")),
        }
    }

    fn modifiers(&mut self, mut query: PatternQuery) -> Result<PatternQuery, QueryError> {
        if self.at_keyword("ORDER") {
            self.next();
            self.keyword("BY")?;
            let mut descending = false;
            if self.at_keyword("DESC") {
                self.next();
                descending = true;
            } else if self.at_keyword("ASC") {
                self.next();
            }
            let parenthesized = matches!(self.peek(), Some(Token::Punct('(')));
            if parenthesized {
                self.next();
            }
            let variable = match self.next() {
                Some(Token::Var(name)) => name,
                Some(other) => {
                    return Err(parse_error(format!(
                        "expected a variable after ORDER BY, found `{other}`"
                    )))
                }
                None => return Err(parse_error("expected a variable after ORDER BY")),
            };
            if parenthesized {
                self.punct(')')?;
            }
            query = query.order_by(variable, descending);
        }

        if self.at_keyword("LIMIT") {
            self.next();
            query = query.limit(self.number("LIMIT")?);
        }
        if self.at_keyword("OFFSET") {
            self.next();
            query = query.offset(self.number("OFFSET")?);
        }
        Ok(query)
    }

    fn number(&mut self, context: &str) -> Result<usize, QueryError> {
        match self.next() {
            Some(Token::Num(n)) => n
                .parse::<usize>()
                .map_err(|_| parse_error(format!("{context} needs a non-negative integer"))),
            Some(other) => Err(parse_error(format!(
                "{context} needs a number, found `{other}`"
            ))),
            None => Err(parse_error(format!("{context} needs a number"))),
        }
    }

    fn expect_end(&mut self) -> Result<(), QueryError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(parse_error(format!("unexpected trailing `{token}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_select() {
        let q = parse_query(
            "SELECT ?s ?o WHERE { ?s <urn:p> ?o . ?s a <urn:Product> }",
        )
        .unwrap();
        assert_eq!(q.select, vec!["s", "o"]);
        assert_eq!(q.required.len(), 2);
        assert_eq!(q.required[1].predicate, TermPattern::iri(RDF_TYPE));
    }

    #[test]
    fn parses_star_projection() {
        let q = parse_query("SELECT * WHERE { ?s ?p ?o }").unwrap();
        assert!(q.select.is_empty());
        assert_eq!(q.required.len(), 1);
    }

    #[test]
    fn parses_optional_filter_and_modifiers() {
        let q = parse_query(
            r#"SELECT ?p ?name WHERE {
                ?p a <urn:Product> .
                OPTIONAL { ?p <urn:name> ?name . }
                FILTER(CONTAINS(?name, "shirt"))
            } ORDER BY DESC(?name) LIMIT 5 OFFSET 10"#,
        )
        .unwrap();
        assert_eq!(q.optional.len(), 1);
        assert_eq!(
            q.filters,
            vec![FilterExpr::ContainsIgnoreCase {
                variable: "name".into(),
                value: "shirt".into(),
            }]
        );
        let order = q.order.unwrap();
        assert_eq!(order.variable, "name");
        assert!(order.descending);
        assert_eq!(q.limit, Some(5));
        assert_eq!(q.offset, 10);
    }

    #[test]
    fn parses_literal_terms() {
        let q = parse_query(r#"SELECT ?s WHERE { ?s <urn:price> 129.99 . ?s <urn:n> 2 . ?s <urn:c> "x \"y\"" }"#)
            .unwrap();
        assert_eq!(
            q.required[0].object,
            TermPattern::Literal(Literal::Float(129.99))
        );
        assert_eq!(
            q.required[1].object,
            TermPattern::Literal(Literal::Integer(2))
        );
        assert_eq!(
            q.required[2].object,
            TermPattern::Literal(Literal::String("x \"y\"".into()))
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert!(parse_query("select ?s where { ?s ?p ?o } order by ?s limit 1").is_ok());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_query("").is_err());
        assert!(parse_query("SELECT WHERE { ?s ?p ?o }").is_err());
        assert!(parse_query("SELECT ?s { ?s ?p ?o }").is_err());
        assert!(parse_query("SELECT ?s WHERE { ?s ?p }").is_err());
        assert!(parse_query("SELECT ?s WHERE { ?s ?p ?o").is_err());
        assert!(parse_query("SELECT ?s WHERE { ?s ?p ?o } LIMIT many").is_err());
        assert!(parse_query("DELETE WHERE { ?s ?p ?o }").is_err());
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = parse_query("SELECT ?s WHERE { ?s ?p ?o } %").unwrap_err();
        assert!(format!("{err}").contains("unexpected character"));
    }

    #[test]
    fn rejects_nested_optional() {
        assert!(parse_query(
            "SELECT ?s WHERE { OPTIONAL { OPTIONAL { ?s ?p ?o } } }"
        )
        .is_err());
    }

    #[test]
    fn rejects_trailing_tokens() {
        assert!(parse_query("SELECT ?s WHERE { ?s ?p ?o } garbage").is_err());
    }
}
