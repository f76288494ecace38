// src/models/search.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{
    leaderboard::LeaderboardEntry,
    question::{Difficulty, QuestionDocument},
    validate_filter_value,
};

fn default_question_limit() -> usize {
    20
}

fn default_leaderboard_limit() -> usize {
    50
}

/// Parameters of a practice-question search.
///
/// Every filter is optional; the ones present are ANDed together.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuestionSearchParams {
    /// Free text; absent, empty or `*` matches every question.
    #[serde(default)]
    #[validate(length(max = 200))]
    pub q: Option<String>,

    #[validate(range(min = 1, max = 12))]
    pub grade: Option<i32>,

    #[validate(length(min = 1, max = 64), custom(function = validate_filter_value))]
    pub subject_code: Option<String>,

    pub difficulty: Option<Difficulty>,

    /// Restrict to the configured locale (default: all locales).
    #[serde(default)]
    pub lang_filter: bool,

    /// Page size (default: 20, max: 250).
    #[serde(default = "default_question_limit")]
    #[validate(range(min = 1, max = 250))]
    pub limit: usize,
}

impl Default for QuestionSearchParams {
    fn default() -> Self {
        Self {
            q: None,
            grade: None,
            subject_code: None,
            difficulty: None,
            lang_filter: false,
            limit: default_question_limit(),
        }
    }
}

/// Parameters of a global leaderboard lookup.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LeaderboardParams {
    #[validate(length(min = 1, max = 8), custom(function = validate_filter_value))]
    pub country_code: Option<String>,

    #[validate(length(min = 1, max = 128), custom(function = validate_filter_value))]
    pub city_global_id: Option<String>,

    /// Page size (default: 50, max: 250).
    #[serde(default = "default_leaderboard_limit")]
    #[validate(range(min = 1, max = 250))]
    pub limit: usize,
}

impl Default for LeaderboardParams {
    fn default() -> Self {
        Self {
            country_code: None,
            city_global_id: None,
            limit: default_leaderboard_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSearchResult {
    pub questions: Vec<QuestionDocument>,
    /// Matches before pagination.
    pub total: usize,
    pub duration_ms: u64,
}

impl QuestionSearchResult {
    pub fn empty() -> Self {
        Self {
            questions: Vec::new(),
            total: 0,
            duration_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardResult {
    pub leaders: Vec<LeaderboardEntry>,
    pub total: usize,
    pub duration_ms: u64,
}

impl LeaderboardResult {
    pub fn empty() -> Self {
        Self {
            leaders: Vec::new(),
            total: 0,
            duration_ms: 0,
        }
    }
}

/// Global counters shown on the landing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_questions: usize,
    pub active_students: usize,
    pub today_questions: u64,
    /// Set when more students answered today than the page cap could sum.
    pub today_is_approximate: bool,
    pub duration_ms: u64,
}
