//! Executes a [`SearchRequest`] against one collection's documents and indexes.
//!
//! Pipeline: text match (OR across query fields, last token as prefix) ->
//! conjunctive filters (intersection of index lookups) -> sort -> page.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::config::MAX_PAGE_SIZE;
use crate::error::StoreError;
use crate::search::filter::{FilterOp, parse_filter_expression};
use crate::search::request::{SearchHit, SearchRequest, SearchResponse, SortClause, TEXT_MATCH};
use crate::store::{CollectionState, Document, FieldValue};
use crate::utils::tokenizer::{is_wildcard, tokenize_query};

pub(crate) fn execute<D: Document>(
    state: &CollectionState<D>,
    request: &SearchRequest,
) -> Result<SearchResponse<D>, StoreError> {
    if request.per_page > MAX_PAGE_SIZE {
        return Err(StoreError::InvalidQuery(format!(
            "per_page must not exceed {}",
            MAX_PAGE_SIZE
        )));
    }
    let page = request.page.max(1);

    let query_fields = resolve_query_fields::<D>(request)?;
    let filters = resolve_filters::<D>(request)?;
    let sorts = resolve_sorts::<D>(request)?;

    let scores = if is_wildcard(&request.q) {
        None
    } else {
        Some(text_scores(state, &request.q, &query_fields))
    };

    let mut candidates: Option<BTreeSet<&str>> =
        scores.as_ref().map(|s| s.keys().copied().collect());
    for (field, op, value) in &filters {
        let ids = state.index.field_ids(field, *op, value);
        candidates = Some(match candidates {
            Some(current) => current.intersection(&ids).copied().collect(),
            None => ids,
        });
    }
    let candidates = candidates
        .unwrap_or_else(|| state.documents.keys().map(String::as_str).collect());

    let mut ranked: Vec<(&D, u64)> = candidates
        .into_iter()
        .filter_map(|id| {
            let score = scores
                .as_ref()
                .and_then(|s| s.get(id).copied())
                .unwrap_or(0);
            state.documents.get(id).map(|doc| (doc, score))
        })
        .collect();
    ranked.sort_by(|a, b| compare(a, b, &sorts));

    let found = ranked.len();
    let hits = ranked
        .into_iter()
        .skip((page - 1).saturating_mul(request.per_page))
        .take(request.per_page)
        .map(|(doc, text_match)| SearchHit {
            document: doc.clone(),
            text_match,
        })
        .collect();

    Ok(SearchResponse {
        found,
        out_of: state.documents.len(),
        page,
        search_time_ms: 0,
        hits,
    })
}

fn resolve_query_fields<D: Document>(request: &SearchRequest) -> Result<Vec<&'static str>, StoreError> {
    let requested = request.query_fields();
    if requested.is_empty() {
        return Ok(D::SEARCHABLE_FIELDS.to_vec());
    }
    requested
        .into_iter()
        .map(|field| {
            D::SEARCHABLE_FIELDS
                .iter()
                .copied()
                .find(|known| *known == field)
                .ok_or_else(|| {
                    StoreError::InvalidQuery(format!(
                        "'{}' is not searchable in {}",
                        field,
                        D::COLLECTION
                    ))
                })
        })
        .collect()
}

fn resolve_filters<D: Document>(
    request: &SearchRequest,
) -> Result<Vec<(String, FilterOp, FieldValue)>, StoreError> {
    let Some(expr) = request.filter_by.as_deref() else {
        return Ok(Vec::new());
    };
    parse_filter_expression(expr)?
        .into_iter()
        .map(|clause| {
            let kind = D::filter_kind(&clause.field).ok_or_else(|| {
                StoreError::InvalidQuery(format!(
                    "'{}' is not filterable in {}",
                    clause.field,
                    D::COLLECTION
                ))
            })?;
            let value = kind.parse(&clause.field, &clause.value)?;
            Ok((clause.field, clause.op, value))
        })
        .collect()
}

fn resolve_sorts<D: Document>(request: &SearchRequest) -> Result<Vec<SortClause>, StoreError> {
    let clauses = request.sort_clauses()?;
    for clause in &clauses {
        if clause.field != TEXT_MATCH && !D::SORT_FIELDS.contains(&clause.field.as_str()) {
            return Err(StoreError::InvalidQuery(format!(
                "'{}' is not sortable in {}",
                clause.field,
                D::COLLECTION
            )));
        }
    }

    if !clauses.is_empty() {
        return Ok(clauses);
    }
    if is_wildcard(&request.q) {
        Ok(vec![SortClause::desc(D::DEFAULT_SORT)])
    } else {
        Ok(vec![SortClause::desc(TEXT_MATCH), SortClause::desc(D::DEFAULT_SORT)])
    }
}

/// Number of distinct query tokens each matching document contains in any of
/// `fields`.
fn text_scores<'a, D: Document>(
    state: &'a CollectionState<D>,
    query: &str,
    fields: &[&str],
) -> HashMap<&'a str, u64> {
    let tokens = tokenize_query(query);
    let last = tokens.len().saturating_sub(1);
    let mut scores: HashMap<&str, u64> = HashMap::new();

    for (position, token) in tokens.iter().enumerate() {
        let prefix = position == last;
        let matched: BTreeSet<&str> = fields
            .iter()
            .flat_map(|field| state.index.token_ids(field, token, prefix))
            .collect();
        for id in matched {
            *scores.entry(id).or_insert(0) += 1;
        }
    }
    scores
}

/// Total order: the sort clauses in turn, then id ascending.
///
/// Documents without a value for a sort field go last in either direction.
fn compare<D: Document>(a: &(&D, u64), b: &(&D, u64), sorts: &[SortClause]) -> Ordering {
    for clause in sorts {
        let ordering = if clause.field == TEXT_MATCH {
            directed(a.1.cmp(&b.1), clause.descending)
        } else {
            match (a.0.sort_value(&clause.field), b.0.sort_value(&clause.field)) {
                (Some(x), Some(y)) => directed(x.cmp(&y), clause.descending),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.0.id().cmp(b.0.id())
}

fn directed(ordering: Ordering, descending: bool) -> Ordering {
    if descending { ordering.reverse() } else { ordering }
}
