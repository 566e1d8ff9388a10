//! Match query construction
//!
//! Query text is tokenized through the same analyzer each field was indexed
//! with, so a stemmed body term matches its stemmed query term and a keyword
//! field only matches the verbatim value.

use std::collections::BTreeSet;
use tantivy::{
    Term,
    query::{BooleanQuery, Occur, Query, TermQuery},
    tokenizer::{Token, TokenStream},
};

use crate::search::engine::SearchEngine;

/// Build a free-text match query over every default search field
///
/// Each distinct analysed term becomes a `Should` clause, so a document
/// matching any of them is a hit. Returns `None` when analysis yields no
/// terms at all (for example a query made only of stop words).
pub(crate) fn build_match_query(engine: &SearchEngine, text: &str) -> Option<Box<dyn Query>> {
    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

    for (field, record_option) in engine.schema().default_search_fields() {
        let Some(mut analyzer) = engine.get_text_analyzer(field) else {
            continue;
        };

        let mut tokens = BTreeSet::new();
        let mut stream = analyzer.token_stream(text);
        stream.process(&mut |token: &Token| {
            tokens.insert(token.text.clone());
        });

        for token in tokens {
            let term = Term::from_field_text(field, &token);
            clauses.push((
                Occur::Should,
                Box::new(TermQuery::new(term, record_option)),
            ));
        }
    }

    match clauses.len() {
        0 => None,
        1 => clauses.pop().map(|(_, query)| query),
        _ => Some(Box::new(BooleanQuery::new(clauses))),
    }
}
