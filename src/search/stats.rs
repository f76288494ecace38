// src/search/stats.rs

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::error::StoreError;
use crate::models::{leaderboard::LeaderboardEntry, question::QuestionDocument, search::GlobalStats};
use crate::search::engine::{QueryEngine, log_failure};
use crate::search::filter::FilterClause;
use crate::search::request::SearchRequest;
use crate::store::{CollectionName, Document};

/// Projection used when summing today's answers.
#[derive(Debug, Deserialize)]
struct TodayCount {
    #[serde(default)]
    today_questions: u64,
}

/// Sum of today's answers plus whether the page cap cut the sum short.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodaySum {
    pub total: u64,
    pub approximate: bool,
}

/// Global counters composed from count-only and projected searches.
pub struct Aggregator {
    engine: Arc<QueryEngine>,
    today_page_cap: usize,
}

impl Aggregator {
    pub fn new(engine: Arc<QueryEngine>) -> Self {
        let today_page_cap = engine.settings().today_page_cap;
        Self {
            engine,
            today_page_cap,
        }
    }

    pub fn with_page_cap(mut self, cap: usize) -> Self {
        self.today_page_cap = cap;
        self
    }

    pub async fn try_total_questions(&self) -> Result<usize, StoreError> {
        self.count(CollectionName::Questions).await
    }

    pub async fn try_active_students(&self) -> Result<usize, StoreError> {
        self.count(CollectionName::Leaderboard).await
    }

    async fn count(&self, collection: CollectionName) -> Result<usize, StoreError> {
        let request = count_request(collection);
        Ok(self.engine.raw_search(collection, &request).await?.found)
    }

    /// Sums `today_questions` over entries whose `today_date` is `today`.
    ///
    /// Only the first `today_page_cap` matches are fetched; when more match,
    /// the sum is flagged approximate.
    pub async fn try_today_questions(&self, today: NaiveDate) -> Result<TodaySum, StoreError> {
        let request = today_request(today, self.today_page_cap);

        let response = self
            .engine
            .raw_search(CollectionName::Leaderboard, &request)
            .await?
            .into_typed::<TodayCount>()?;

        let approximate = response.found > response.hits.len();
        if approximate {
            tracing::warn!(
                "today_questions summed over {} of {} entries",
                response.hits.len(),
                response.found
            );
        }

        Ok(TodaySum {
            total: response.hits.iter().map(|hit| hit.document.today_questions).sum(),
            approximate,
        })
    }

    pub async fn global_stats(&self) -> GlobalStats {
        self.global_stats_on(Utc::now().date_naive()).await
    }

    /// All three counters run concurrently; a failed counter reports zero
    /// without affecting the others.
    pub async fn global_stats_on(&self, today: NaiveDate) -> GlobalStats {
        let started = Instant::now();

        let (total_questions, active_students, today_sum) = tokio::join!(
            self.try_total_questions(),
            self.try_active_students(),
            self.try_today_questions(today),
        );

        let total_questions = total_questions.unwrap_or_else(|e| {
            log_failure("total_questions", &e);
            0
        });
        let active_students = active_students.unwrap_or_else(|e| {
            log_failure("active_students", &e);
            0
        });
        let today_sum = today_sum.unwrap_or_else(|e| {
            log_failure("today_questions", &e);
            TodaySum::default()
        });

        GlobalStats {
            total_questions,
            active_students,
            today_questions: today_sum.total,
            today_is_approximate: today_sum.approximate,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}

fn searchable_fields(collection: CollectionName) -> &'static [&'static str] {
    match collection {
        CollectionName::Questions => QuestionDocument::SEARCHABLE_FIELDS,
        CollectionName::Leaderboard => LeaderboardEntry::SEARCHABLE_FIELDS,
    }
}

/// Wildcard count-only search. Remote stores reject a search without `query_by`.
fn count_request(collection: CollectionName) -> SearchRequest {
    SearchRequest::new("*")
        .query_by(searchable_fields(collection))
        .per_page(0)
}

fn today_request(today: NaiveDate, page_cap: usize) -> SearchRequest {
    SearchRequest::new("*")
        .query_by(LeaderboardEntry::SEARCHABLE_FIELDS)
        .filters(&[FilterClause::eq("today_date", today.format("%Y-%m-%d"))])
        .include_fields(&["today_questions"])
        .per_page(page_cap)
}
