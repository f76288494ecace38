// tests/engine_tests.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use practice_search::{
    error::StoreError,
    models::{
        leaderboard::LeaderboardEntry,
        question::{Difficulty, QuestionDocument},
        search::{LeaderboardParams, QuestionSearchParams, QuestionSearchResult},
    },
    search::{
        Aggregator, EmbeddedBackend, EngineSettings, QueryEngine, SearchBackend,
        request::{SearchRequest, SearchResponse},
    },
    store::{CollectionName, DocumentStore},
};
use serde_json::json;

fn question(id: &str, grade: i32, subject_code: &str, created_at: i64) -> QuestionDocument {
    serde_json::from_value(json!({
        "id": id,
        "question_id": format!("logical-{}", id),
        "question_text": format!("Practice question {}", id),
        "option_a": "1",
        "option_b": "2",
        "correct_answer": "A",
        "subject_id": "subj",
        "subject_code": subject_code,
        "subject_name": "Subject",
        "topic_id": "topic",
        "main_topic": "Numbers",
        "grade": grade,
        "difficulty": "medium",
        "lang": "en",
        "created_at": created_at
    }))
    .unwrap()
}

fn entry(student_id: &str, total_points: u64) -> LeaderboardEntry {
    serde_json::from_value(json!({
        "student_id": student_id,
        "full_name": format!("Student {}", student_id),
        "country_code": "TR",
        "city_global_id": "city-6",
        "grade": 10,
        "total_points": total_points
    }))
    .unwrap()
}

fn settings() -> EngineSettings {
    EngineSettings {
        available: true,
        timeout: Duration::from_millis(200),
        ..EngineSettings::default()
    }
}

fn embedded_engine(store: Arc<DocumentStore>) -> QueryEngine {
    QueryEngine::new(Arc::new(EmbeddedBackend::new(store)), settings())
}

/// Counts calls and optionally stalls or fails before delegating.
struct FakeBackend {
    inner: EmbeddedBackend,
    calls: AtomicU64,
    delay: Option<Duration>,
    failure: Option<StoreError>,
}

impl FakeBackend {
    fn new(store: Arc<DocumentStore>) -> Self {
        Self {
            inner: EmbeddedBackend::new(store),
            calls: AtomicU64::new(0),
            delay: None,
            failure: None,
        }
    }

    fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for FakeBackend {
    fn backend_tag(&self) -> &'static str {
        "fake"
    }

    async fn search(
        &self,
        collection: CollectionName,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        self.inner.search(collection, request).await
    }
}

/// Answers every search with a document that does not fit any collection.
struct MalformedBackend;

#[async_trait]
impl SearchBackend for MalformedBackend {
    fn backend_tag(&self) -> &'static str {
        "malformed"
    }

    async fn search(
        &self,
        _collection: CollectionName,
        _request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        Ok(serde_json::from_value(json!({
            "found": 1,
            "hits": [{"document": {"id": 42}}]
        }))
        .unwrap())
    }
}

#[tokio::test]
async fn scenario_grade_filter_returns_matching_questions() {
    let store = Arc::new(DocumentStore::new());
    for (id, grade) in [("q1", 9), ("q2", 9), ("q3", 9), ("q4", 10), ("q5", 10)] {
        store
            .questions()
            .upsert(question(id, grade, "matematik", 100))
            .await
            .unwrap();
    }
    let engine = embedded_engine(store);

    let result = engine
        .search_questions(&QuestionSearchParams {
            q: Some(String::new()),
            grade: Some(9),
            ..QuestionSearchParams::default()
        })
        .await;

    assert_eq!(result.questions.len(), 3);
    assert_eq!(result.total, 3);
    assert!(result.questions.iter().all(|q| q.grade == 9));
}

#[tokio::test]
async fn scenario_leaderboard_ties_break_on_student_id() {
    let store = Arc::new(DocumentStore::new());
    for (id, points) in [("b", 500), ("a", 500), ("c", 300)] {
        store.leaderboard().upsert(entry(id, points)).await.unwrap();
    }
    let engine = embedded_engine(store);

    let result = engine.global_leaderboard(&LeaderboardParams::default()).await;

    let order: Vec<(&str, u64)> = result
        .leaders
        .iter()
        .map(|e| (e.student_id.as_str(), e.total_points))
        .collect();
    assert_eq!(order, vec![("a", 500), ("b", 500), ("c", 300)]);
    assert_eq!(result.total, 3);
}

#[tokio::test]
async fn scenario_today_questions_counts_only_today() {
    let store = Arc::new(DocumentStore::new());
    for (id, today, date) in [("1", 5, "2025-01-10"), ("2", 3, "2025-01-09")] {
        let mut e = entry(id, 10);
        e.today_questions = today;
        e.today_date = Some(date.parse().unwrap());
        store.leaderboard().upsert(e).await.unwrap();
    }
    store
        .questions()
        .upsert(question("q1", 9, "matematik", 1))
        .await
        .unwrap();

    let aggregator = Aggregator::new(Arc::new(embedded_engine(store)));
    let stats = aggregator
        .global_stats_on(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap())
        .await;

    assert_eq!(stats.today_questions, 5);
    assert!(!stats.today_is_approximate);
    assert_eq!(stats.total_questions, 1);
    assert_eq!(stats.active_students, 2);
}

#[tokio::test]
async fn scenario_unavailable_backend_is_never_called() {
    let backend = Arc::new(FakeBackend::new(Arc::new(DocumentStore::new())));
    let engine = QueryEngine::new(
        backend.clone(),
        EngineSettings {
            available: false,
            ..settings()
        },
    );

    assert!(!engine.is_available());
    let result = engine.search_questions(&QuestionSearchParams::default()).await;

    assert_eq!(result, QuestionSearchResult::empty());
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn identical_searches_are_deterministic() {
    let store = Arc::new(DocumentStore::new());
    for id in ["q3", "q1", "q2"] {
        store
            .questions()
            .upsert(question(id, 9, "matematik", 500))
            .await
            .unwrap();
    }
    let engine = embedded_engine(store);
    let params = QuestionSearchParams {
        q: Some("practice".to_string()),
        ..QuestionSearchParams::default()
    };

    let first = engine.search_questions(&params).await;
    let second = engine.search_questions(&params).await;

    assert_eq!(first.questions, second.questions);
    let ids: Vec<&str> = first.questions.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["q1", "q2", "q3"]);
}

#[tokio::test]
async fn filters_combine_conjunctively() {
    let store = Arc::new(DocumentStore::new());
    let rows = [
        ("q1", 9, "matematik", Difficulty::Easy),
        ("q2", 9, "fizik", Difficulty::Easy),
        ("q3", 9, "matematik", Difficulty::Hard),
        ("q4", 10, "matematik", Difficulty::Easy),
    ];
    for (id, grade, subject, difficulty) in rows {
        let mut q = question(id, grade, subject, 100);
        q.difficulty = difficulty;
        store.questions().upsert(q).await.unwrap();
    }
    let engine = embedded_engine(store);

    for grade in [None, Some(9), Some(10)] {
        for subject in [None, Some("matematik"), Some("fizik")] {
            for difficulty in [None, Some(Difficulty::Easy), Some(Difficulty::Hard)] {
                let params = QuestionSearchParams {
                    grade,
                    subject_code: subject.map(str::to_string),
                    difficulty,
                    ..QuestionSearchParams::default()
                };
                let result = engine.search_questions(&params).await;
                for q in &result.questions {
                    assert!(grade.is_none_or(|g| q.grade == g));
                    assert!(subject.is_none_or(|s| q.subject_code == s));
                    assert!(difficulty.is_none_or(|d| q.difficulty == d));
                }
                assert_eq!(result.total, result.questions.len());
            }
        }
    }
}

#[tokio::test]
async fn results_never_exceed_limit() {
    let store = Arc::new(DocumentStore::new());
    for i in 0..30 {
        store
            .questions()
            .upsert(question(&format!("q{:02}", i), 9, "matematik", i))
            .await
            .unwrap();
    }
    let engine = embedded_engine(store);

    let result = engine
        .search_questions(&QuestionSearchParams {
            limit: 7,
            ..QuestionSearchParams::default()
        })
        .await;

    assert_eq!(result.questions.len(), 7);
    assert_eq!(result.total, 30);
    assert_eq!(result.questions[0].id, "q29");
}

#[tokio::test]
async fn slow_backend_times_out_to_empty() {
    let store = Arc::new(DocumentStore::new());
    store.leaderboard().upsert(entry("s1", 10)).await.unwrap();

    let backend = Arc::new(FakeBackend {
        delay: Some(Duration::from_secs(2)),
        ..FakeBackend::new(store)
    });
    let engine = QueryEngine::new(backend.clone(), settings());

    let err = engine
        .try_global_leaderboard(&LeaderboardParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Retrieval(_)));

    let result = engine.global_leaderboard(&LeaderboardParams::default()).await;
    assert!(result.leaders.is_empty());
    assert_eq!(result.total, 0);
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn failing_backend_is_empty_and_stats_default_to_zero() {
    let backend = Arc::new(FakeBackend {
        failure: Some(StoreError::Retrieval("connection refused".to_string())),
        ..FakeBackend::new(Arc::new(DocumentStore::new()))
    });
    let engine = Arc::new(QueryEngine::new(backend.clone(), settings()));

    let result = engine.search_questions(&QuestionSearchParams::default()).await;
    assert_eq!(result, QuestionSearchResult::empty());

    let stats = Aggregator::new(engine).global_stats().await;
    assert_eq!(stats.total_questions, 0);
    assert_eq!(stats.active_students, 0);
    assert_eq!(stats.today_questions, 0);
    // One question search plus the three counters.
    assert_eq!(backend.calls(), 4);
}

#[tokio::test]
async fn malformed_response_is_empty() {
    let engine = QueryEngine::new(Arc::new(MalformedBackend), settings());

    let err = engine
        .try_search_questions(&QuestionSearchParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Retrieval(_)));

    let result = engine.global_leaderboard(&LeaderboardParams::default()).await;
    assert!(result.leaders.is_empty());
    assert_eq!(result.total, 0);
}

#[tokio::test]
async fn out_of_range_limits_are_rejected_before_searching() {
    let store = Arc::new(DocumentStore::new());
    for i in 0..5 {
        store
            .questions()
            .upsert(question(&format!("q{}", i), 9, "matematik", i))
            .await
            .unwrap();
        store
            .leaderboard()
            .upsert(entry(&format!("s{}", i), 10 * i as u64))
            .await
            .unwrap();
    }
    let backend = Arc::new(FakeBackend::new(store));
    let engine = QueryEngine::new(backend.clone(), settings());

    for limit in [0, 300] {
        let params = QuestionSearchParams {
            limit,
            ..QuestionSearchParams::default()
        };
        let err = engine.try_search_questions(&params).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidQuery(_)));
        assert_eq!(engine.search_questions(&params).await, QuestionSearchResult::empty());
    }

    for limit in [0, 251] {
        let params = LeaderboardParams {
            limit,
            ..LeaderboardParams::default()
        };
        let err = engine.try_global_leaderboard(&params).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidQuery(_)));
    }

    assert_eq!(backend.calls(), 0);

    let widest = engine
        .try_search_questions(&QuestionSearchParams {
            limit: 250,
            ..QuestionSearchParams::default()
        })
        .await
        .unwrap();
    assert_eq!(widest.questions.len(), 5);
    assert_eq!(widest.total, 5);
}
