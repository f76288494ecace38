//! Document store for the `questions` and `leaderboard` collections.
//!
//! Each collection keeps its documents and their indexes behind one lock, so an
//! upsert replaces a document and its index entries as a single step and a
//! reader never sees a half-indexed document.

pub mod index;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use validator::Validate;

use crate::error::StoreError;
use crate::models::{leaderboard::LeaderboardEntry, question::QuestionDocument};
use crate::search::executor;
use crate::search::request::{SearchRequest, SearchResponse};

pub use index::{CollectionIndex, FieldKind, FieldValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionName {
    Questions,
    Leaderboard,
}

impl CollectionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionName::Questions => "questions",
            CollectionName::Leaderboard => "leaderboard",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionName {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "questions" => Ok(CollectionName::Questions),
            "leaderboard" => Ok(CollectionName::Leaderboard),
            other => Err(StoreError::NotFound {
                collection: other.to_string(),
                id: "*".to_string(),
            }),
        }
    }
}

/// A record type the store can hold and index.
pub trait Document:
    Clone + PartialEq + Serialize + DeserializeOwned + Validate + Send + Sync + 'static
{
    const COLLECTION: CollectionName;

    /// Fields tokenized into the inverted index.
    const SEARCHABLE_FIELDS: &'static [&'static str];

    /// Fields with an equality/range index, and how filter values are typed.
    const FILTER_FIELDS: &'static [(&'static str, FieldKind)];

    /// Fields accepted by `sort_by`; each must also be an integer-valued filter field.
    const SORT_FIELDS: &'static [&'static str];

    /// Sorted descending when a request gives no `sort_by`.
    const DEFAULT_SORT: &'static str;

    fn id(&self) -> &str;

    fn text_field(&self, field: &str) -> Option<&str>;

    fn filter_value(&self, field: &str) -> Option<FieldValue>;

    fn sort_value(&self, field: &str) -> Option<i64> {
        match self.filter_value(field) {
            Some(FieldValue::Int(value)) => Some(value),
            _ => None,
        }
    }

    fn filter_kind(field: &str) -> Option<FieldKind> {
        Self::FILTER_FIELDS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
    }

    /// Checks invariants and fills derived fields before the document is stored.
    fn prepare(self) -> Result<Self, StoreError> {
        self.validate()?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Updated,
    /// The stored document was already identical.
    Unchanged,
}

pub(crate) struct CollectionState<D> {
    pub(crate) documents: BTreeMap<String, D>,
    pub(crate) index: CollectionIndex,
}

pub struct Collection<D: Document> {
    state: RwLock<CollectionState<D>>,
}

impl<D: Document> Default for Collection<D> {
    fn default() -> Self {
        Self {
            state: RwLock::new(CollectionState {
                documents: BTreeMap::new(),
                index: CollectionIndex::default(),
            }),
        }
    }
}

impl<D: Document> Collection<D> {
    /// Inserts or replaces a document by id.
    pub async fn upsert(&self, doc: D) -> Result<UpsertOutcome, StoreError> {
        let doc = doc.prepare()?;
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let outcome = match state.documents.get(doc.id()) {
            Some(existing) if *existing == doc => return Ok(UpsertOutcome::Unchanged),
            Some(existing) => {
                state.index.remove(existing);
                UpsertOutcome::Updated
            }
            None => UpsertOutcome::Created,
        };

        state.index.insert(&doc);
        tracing::debug!("{} {:?} in {}", doc.id(), outcome, D::COLLECTION);
        state.documents.insert(doc.id().to_string(), doc);

        Ok(outcome)
    }

    pub async fn get(&self, id: &str) -> Result<D, StoreError> {
        self.state
            .read()
            .await
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection: D::COLLECTION.to_string(),
                id: id.to_string(),
            })
    }

    /// Full scan; matching documents in id order.
    pub async fn scan<F>(&self, predicate: F) -> Vec<D>
    where
        F: Fn(&D) -> bool,
    {
        self.state
            .read()
            .await
            .documents
            .values()
            .filter(|doc| predicate(doc))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse<D>, StoreError> {
        let started = Instant::now();
        let state = self.state.read().await;
        let mut response = executor::execute(&*state, request)?;
        response.search_time_ms = started.elapsed().as_millis() as u64;
        Ok(response)
    }
}

/// Documents loaded at startup from `SEED_FILE`.
#[derive(Debug, Default, Deserialize)]
pub struct SeedDocuments {
    #[serde(default)]
    pub questions: Vec<QuestionDocument>,
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Default)]
pub struct DocumentStore {
    questions: Collection<QuestionDocument>,
    leaderboard: Collection<LeaderboardEntry>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn questions(&self) -> &Collection<QuestionDocument> {
        &self.questions
    }

    pub fn leaderboard(&self) -> &Collection<LeaderboardEntry> {
        &self.leaderboard
    }

    /// Upserts a JSON document into the named collection.
    pub async fn upsert_json(
        &self,
        collection: CollectionName,
        document: serde_json::Value,
    ) -> Result<UpsertOutcome, StoreError> {
        match collection {
            CollectionName::Questions => self.questions.upsert(decode(document)?).await,
            CollectionName::Leaderboard => self.leaderboard.upsert(decode(document)?).await,
        }
    }

    pub async fn get_json(
        &self,
        collection: CollectionName,
        id: &str,
    ) -> Result<serde_json::Value, StoreError> {
        match collection {
            CollectionName::Questions => encode(&self.questions.get(id).await?),
            CollectionName::Leaderboard => encode(&self.leaderboard.get(id).await?),
        }
    }

    /// Runs a wire search, returning untyped documents with `include_fields` applied.
    pub async fn search_json(
        &self,
        collection: CollectionName,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        let response = match collection {
            CollectionName::Questions => self.questions.search(request).await?.into_json()?,
            CollectionName::Leaderboard => self.leaderboard.search(request).await?.into_json()?,
        };
        Ok(response.project(&request.projected_fields()))
    }

    /// Loads seed documents, skipping (and logging) the invalid ones.
    pub async fn load_seed(&self, seed: SeedDocuments) -> usize {
        let mut loaded = 0;
        for question in seed.questions {
            let id = question.id.clone();
            match self.questions.upsert(question).await {
                Ok(_) => loaded += 1,
                Err(e) => tracing::warn!("Skipping seed question {}: {}", id, e),
            }
        }
        for entry in seed.leaderboard {
            let id = entry.student_id.clone();
            match self.leaderboard.upsert(entry).await {
                Ok(_) => loaded += 1,
                Err(e) => tracing::warn!("Skipping seed leaderboard entry {}: {}", id, e),
            }
        }
        loaded
    }
}

fn decode<D: Document>(document: serde_json::Value) -> Result<D, StoreError> {
    serde_json::from_value(document).map_err(|e| StoreError::Validation(e.to_string()))
}

fn encode<D: Document>(document: &D) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(document).map_err(|e| StoreError::Retrieval(e.to_string()))
}
