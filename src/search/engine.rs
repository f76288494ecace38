// src/search/engine.rs

use std::sync::Arc;
use std::time::{Duration, Instant};

use validator::Validate;

use crate::config::{BackendMode, Config};
use crate::error::StoreError;
use crate::models::leaderboard::LeaderboardEntry;
use crate::models::question::QuestionDocument;
use crate::models::search::{
    LeaderboardParams, LeaderboardResult, QuestionSearchParams, QuestionSearchResult,
};
use crate::search::backend::{EmbeddedBackend, SearchBackend};
use crate::search::filter::FilterClause;
use crate::search::remote::HttpBackend;
use crate::search::request::{SearchRequest, SearchResponse};
use crate::store::{CollectionName, Document, DocumentStore};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Result of the configuration presence check.
    pub available: bool,
    pub timeout: Duration,
    /// Locale applied when a question search sets `lang_filter`.
    pub question_lang: String,
    pub today_page_cap: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            available: config.is_search_available(),
            timeout: config.request_timeout(),
            question_lang: config.question_lang.clone(),
            today_page_cap: config.today_page_cap,
        }
    }
}

/// Runs question and leaderboard queries against a [`SearchBackend`].
///
/// The public operations never fail: any error becomes an empty result and is
/// logged. The `try_*` variants return the error instead, including
/// `InvalidQuery` for parameters outside their validated ranges (a `limit`
/// of 0 or above 250).
pub struct QueryEngine {
    backend: Option<Arc<dyn SearchBackend>>,
    settings: EngineSettings,
}

impl QueryEngine {
    pub fn new(backend: Arc<dyn SearchBackend>, settings: EngineSettings) -> Self {
        Self {
            backend: Some(backend),
            settings,
        }
    }

    /// An engine with no backend; every query short-circuits as unavailable.
    pub fn unconfigured(settings: EngineSettings) -> Self {
        Self {
            backend: None,
            settings: EngineSettings {
                available: false,
                ..settings
            },
        }
    }

    pub fn from_config(config: &Config, store: Arc<DocumentStore>) -> Self {
        let settings = EngineSettings::from_config(config);
        match config.backend_mode {
            BackendMode::Embedded => Self::new(Arc::new(EmbeddedBackend::new(store)), settings),
            BackendMode::Remote => match HttpBackend::from_config(config) {
                Ok(backend) => Self::new(Arc::new(backend), settings),
                Err(e) => {
                    tracing::warn!("Remote search store unavailable: {}", e);
                    Self::unconfigured(settings)
                }
            },
        }
    }

    pub fn is_available(&self) -> bool {
        self.settings.available && self.backend.is_some()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// One bounded call to the backend.
    ///
    /// Returns `Configuration` without touching the backend when the engine
    /// is unavailable.
    pub async fn raw_search(
        &self,
        collection: CollectionName,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        let backend = match &self.backend {
            Some(backend) if self.settings.available => backend,
            _ => {
                return Err(StoreError::Configuration(
                    "search host or credential missing".to_string(),
                ));
            }
        };

        match tokio::time::timeout(self.settings.timeout, backend.search(collection, request)).await
        {
            Ok(result) => result,
            Err(_) => Err(StoreError::Retrieval(format!(
                "{} search on {} timed out after {:?}",
                backend.backend_tag(),
                collection,
                self.settings.timeout
            ))),
        }
    }

    async fn typed_search<D: Document>(
        &self,
        request: &SearchRequest,
    ) -> Result<SearchResponse<D>, StoreError> {
        self.raw_search(D::COLLECTION, request).await?.into_typed()
    }

    pub fn question_request(&self, params: &QuestionSearchParams) -> SearchRequest {
        let mut clauses = Vec::new();
        if params.lang_filter {
            clauses.push(FilterClause::eq("lang", &self.settings.question_lang));
        }
        if let Some(grade) = params.grade {
            clauses.push(FilterClause::eq("grade", grade));
        }
        if let Some(subject_code) = &params.subject_code {
            clauses.push(FilterClause::eq("subject_code", subject_code));
        }
        if let Some(difficulty) = params.difficulty {
            clauses.push(FilterClause::eq("difficulty", difficulty));
        }

        let q = params
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or("*");

        SearchRequest::new(q)
            .query_by(QuestionDocument::SEARCHABLE_FIELDS)
            .filters(&clauses)
            .sort_by("created_at:desc")
            .per_page(params.limit)
    }

    pub fn leaderboard_request(params: &LeaderboardParams) -> SearchRequest {
        let mut clauses = Vec::new();
        if let Some(country_code) = &params.country_code {
            clauses.push(FilterClause::eq("country_code", country_code));
        }
        if let Some(city_global_id) = &params.city_global_id {
            clauses.push(FilterClause::eq("city_global_id", city_global_id));
        }

        SearchRequest::new("*")
            .query_by(LeaderboardEntry::SEARCHABLE_FIELDS)
            .filters(&clauses)
            .sort_by("total_points:desc")
            .per_page(params.limit)
    }

    pub async fn try_search_questions(
        &self,
        params: &QuestionSearchParams,
    ) -> Result<QuestionSearchResult, StoreError> {
        params
            .validate()
            .map_err(|e| StoreError::InvalidQuery(e.to_string()))?;

        let started = Instant::now();
        let response = self
            .typed_search::<QuestionDocument>(&self.question_request(params))
            .await?;

        let total = response.found;
        let mut questions = response.documents();
        // A remote store may order ties differently; pin newest-first, then id.
        questions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        questions.truncate(params.limit);

        Ok(QuestionSearchResult {
            questions,
            total,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Question search; an empty result when the backend is unavailable or fails.
    pub async fn search_questions(&self, params: &QuestionSearchParams) -> QuestionSearchResult {
        self.try_search_questions(params)
            .await
            .unwrap_or_else(|e| {
                log_failure("search_questions", &e);
                QuestionSearchResult::empty()
            })
    }

    pub async fn try_global_leaderboard(
        &self,
        params: &LeaderboardParams,
    ) -> Result<LeaderboardResult, StoreError> {
        params
            .validate()
            .map_err(|e| StoreError::InvalidQuery(e.to_string()))?;

        let started = Instant::now();
        let response = self
            .typed_search::<LeaderboardEntry>(&Self::leaderboard_request(params))
            .await?;

        let total = response.found;
        let mut leaders = response.documents();
        leaders.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then_with(|| a.student_id.cmp(&b.student_id))
        });
        leaders.truncate(params.limit);

        Ok(LeaderboardResult {
            leaders,
            total,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    pub async fn global_leaderboard(&self, params: &LeaderboardParams) -> LeaderboardResult {
        self.try_global_leaderboard(params)
            .await
            .unwrap_or_else(|e| {
                log_failure("global_leaderboard", &e);
                LeaderboardResult::empty()
            })
    }
}

/// Unavailability is expected in some deployments; everything else is an error.
pub(crate) fn log_failure(operation: &str, err: &StoreError) {
    match err {
        StoreError::Configuration(_) => tracing::warn!("{} skipped: {}", operation, err),
        _ => tracing::error!("{} failed: {}", operation, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::Difficulty;

    #[test]
    fn test_question_request_encodes_filters_in_order() {
        let engine = QueryEngine::unconfigured(EngineSettings::default());
        let params = QuestionSearchParams {
            q: Some("  ".to_string()),
            grade: Some(9),
            subject_code: Some("matematik".to_string()),
            difficulty: Some(Difficulty::Hard),
            lang_filter: true,
            limit: 20,
        };

        let request = engine.question_request(&params);
        assert_eq!(request.q, "*");
        assert_eq!(
            request.filter_by.as_deref(),
            Some("lang:=en && grade:=9 && subject_code:=matematik && difficulty:=hard")
        );
        assert_eq!(
            request.query_by.as_deref(),
            Some("question_text,main_topic,sub_topic,explanation")
        );
        assert_eq!(request.sort_by.as_deref(), Some("created_at:desc"));
        assert_eq!(request.per_page, 20);
    }

    #[test]
    fn test_leaderboard_request_without_filters() {
        let request = QueryEngine::leaderboard_request(&LeaderboardParams::default());
        assert_eq!(request.filter_by, None);
        assert_eq!(request.sort_by.as_deref(), Some("total_points:desc"));
        assert_eq!(request.per_page, 50);
    }

    #[tokio::test]
    async fn test_unconfigured_engine_is_empty() {
        let engine = QueryEngine::unconfigured(EngineSettings::default());
        assert!(!engine.is_available());

        let result = engine.search_questions(&QuestionSearchParams::default()).await;
        assert_eq!(result, QuestionSearchResult::empty());

        let err = engine
            .try_global_leaderboard(&LeaderboardParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));
    }
}
