// src/store/index.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

use chrono::{Datelike, NaiveDate};

use crate::error::StoreError;
use crate::models::question::Difficulty;
use crate::search::filter::FilterOp;
use crate::store::Document;
use crate::utils::tokenizer::tokenize_text;

/// How the raw text of a filter value is interpreted for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Text,
    Bool,
    /// Indexed by rank so range filters follow easy < medium < hard < legendary.
    Difficulty,
    /// `YYYY-MM-DD`, indexed as days from the common era.
    Date,
}

impl FieldKind {
    pub fn parse(&self, field: &str, raw: &str) -> Result<FieldValue, StoreError> {
        let invalid = || {
            StoreError::InvalidQuery(format!("invalid value '{}' for field '{}'", raw, field))
        };
        let value = match self {
            FieldKind::Int => FieldValue::Int(raw.parse().map_err(|_| invalid())?),
            FieldKind::Text => FieldValue::Text(raw.to_string()),
            FieldKind::Bool => FieldValue::Bool(raw.parse().map_err(|_| invalid())?),
            FieldKind::Difficulty => {
                FieldValue::Int(raw.parse::<Difficulty>().map_err(|_| invalid())?.rank())
            }
            FieldKind::Date => {
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
                FieldValue::Int(date.num_days_from_ce().into())
            }
        };
        Ok(value)
    }
}

/// An indexed value of a filterable field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldValue {
    Int(i64),
    Text(String),
    Bool(bool),
}

/// Inverted and secondary indexes for one collection.
///
/// Text postings are kept per searchable field (token -> ids) and field values
/// per filterable field (value -> ids). Both maps are ordered so prefix and
/// range lookups are plain B-tree range scans.
#[derive(Debug, Default)]
pub struct CollectionIndex {
    text: HashMap<&'static str, BTreeMap<String, BTreeSet<String>>>,
    fields: HashMap<&'static str, BTreeMap<FieldValue, BTreeSet<String>>>,
}

impl CollectionIndex {
    pub fn insert<D: Document>(&mut self, doc: &D) {
        let id = doc.id();

        for &field in D::SEARCHABLE_FIELDS {
            let Some(text) = doc.text_field(field) else {
                continue;
            };
            let postings = self.text.entry(field).or_default();
            for token in tokenize_text(text) {
                postings.entry(token).or_default().insert(id.to_string());
            }
        }

        for &(field, _) in D::FILTER_FIELDS {
            if let Some(value) = doc.filter_value(field) {
                self.fields
                    .entry(field)
                    .or_default()
                    .entry(value)
                    .or_default()
                    .insert(id.to_string());
            }
        }
    }

    /// Removes every entry `insert` created for this exact document.
    pub fn remove<D: Document>(&mut self, doc: &D) {
        let id = doc.id();

        for &field in D::SEARCHABLE_FIELDS {
            let (Some(text), Some(postings)) = (doc.text_field(field), self.text.get_mut(field))
            else {
                continue;
            };
            for token in tokenize_text(text) {
                if let Some(ids) = postings.get_mut(&token) {
                    ids.remove(id);
                    if ids.is_empty() {
                        postings.remove(&token);
                    }
                }
            }
        }

        for &(field, _) in D::FILTER_FIELDS {
            let (Some(value), Some(values)) = (doc.filter_value(field), self.fields.get_mut(field))
            else {
                continue;
            };
            if let Some(ids) = values.get_mut(&value) {
                ids.remove(id);
                if ids.is_empty() {
                    values.remove(&value);
                }
            }
        }
    }

    /// Ids whose `field` contains `token`, or a token starting with it when
    /// `prefix` is set.
    pub fn token_ids(&self, field: &str, token: &str, prefix: bool) -> BTreeSet<&str> {
        let Some(postings) = self.text.get(field) else {
            return BTreeSet::new();
        };

        if !prefix {
            return postings
                .get(token)
                .map(|ids| ids.iter().map(String::as_str).collect())
                .unwrap_or_default();
        }

        postings
            .range::<str, _>((Bound::Included(token), Bound::Unbounded))
            .take_while(|(candidate, _)| candidate.starts_with(token))
            .flat_map(|(_, ids)| ids.iter().map(String::as_str))
            .collect()
    }

    /// Ids whose `field` satisfies `op value`.
    pub fn field_ids(&self, field: &str, op: FilterOp, value: &FieldValue) -> BTreeSet<&str> {
        let Some(values) = self.fields.get(field) else {
            return BTreeSet::new();
        };

        match op {
            FilterOp::Eq => union_ids(values.get_key_value(value).into_iter()),
            FilterOp::NotEq => union_ids(values.iter().filter(|(v, _)| *v != value)),
            FilterOp::Gt => union_ids(values.range((Bound::Excluded(value), Bound::Unbounded))),
            FilterOp::Gte => union_ids(values.range(value..)),
            FilterOp::Lt => union_ids(values.range(..value)),
            FilterOp::Lte => union_ids(values.range(..=value)),
        }
    }

    /// Distinct tokens indexed for `field`.
    pub fn vocabulary_size(&self, field: &str) -> usize {
        self.text.get(field).map(BTreeMap::len).unwrap_or(0)
    }
}

fn union_ids<'a>(
    entries: impl Iterator<Item = (&'a FieldValue, &'a BTreeSet<String>)>,
) -> BTreeSet<&'a str> {
    entries
        .flat_map(|(_, ids)| ids.iter().map(String::as_str))
        .collect()
}
