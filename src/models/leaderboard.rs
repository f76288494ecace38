// src/models/leaderboard.rs

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::validate_url_string;

use crate::store::{CollectionName, Document, FieldKind, FieldValue};

/// One student's aggregate standing in the `leaderboard` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_entry_invariants))]
pub struct LeaderboardEntry {
    #[validate(length(min = 1, max = 128))]
    pub student_id: String,

    #[validate(length(min = 1, max = 200))]
    pub full_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub avatar_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 8))]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_global_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_global_id: Option<String>,

    #[validate(range(min = 1, max = 12))]
    pub grade: i32,

    #[serde(default)]
    pub total_points: u64,
    #[serde(default)]
    pub total_questions: u64,
    #[serde(default)]
    pub total_correct: u64,
    #[serde(default)]
    pub max_streak: u32,
    #[serde(default)]
    pub current_streak: u32,

    /// Questions answered on `today_date`; rolled over at the UTC day boundary.
    #[serde(default)]
    pub today_questions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today_date: Option<NaiveDate>,
}

fn validate_entry_invariants(entry: &LeaderboardEntry) -> Result<(), ValidationError> {
    if entry.total_correct > entry.total_questions {
        return Err(ValidationError::new("total_correct_exceeds_total_questions"));
    }
    if entry.current_streak > entry.max_streak {
        return Err(ValidationError::new("current_streak_exceeds_max_streak"));
    }
    Ok(())
}

impl Document for LeaderboardEntry {
    const COLLECTION: CollectionName = CollectionName::Leaderboard;

    const SEARCHABLE_FIELDS: &'static [&'static str] = &["full_name"];

    const FILTER_FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("country_code", FieldKind::Text),
        ("city_global_id", FieldKind::Text),
        ("today_date", FieldKind::Date),
        ("grade", FieldKind::Int),
        ("total_points", FieldKind::Int),
        ("max_streak", FieldKind::Int),
        ("total_questions", FieldKind::Int),
        ("today_questions", FieldKind::Int),
    ];

    const SORT_FIELDS: &'static [&'static str] = &[
        "total_points",
        "max_streak",
        "total_questions",
        "today_questions",
        "grade",
    ];

    const DEFAULT_SORT: &'static str = "total_points";

    fn id(&self) -> &str {
        &self.student_id
    }

    fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            "full_name" => Some(&self.full_name),
            _ => None,
        }
    }

    fn filter_value(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "country_code" => FieldValue::Text(self.country_code.clone()?),
            "city_global_id" => FieldValue::Text(self.city_global_id.clone()?),
            "today_date" => FieldValue::Int(self.today_date?.num_days_from_ce().into()),
            "grade" => FieldValue::Int(self.grade.into()),
            "total_points" => FieldValue::Int(i64::try_from(self.total_points).ok()?),
            "max_streak" => FieldValue::Int(self.max_streak.into()),
            "total_questions" => FieldValue::Int(i64::try_from(self.total_questions).ok()?),
            "today_questions" => FieldValue::Int(self.today_questions.into()),
            _ => return None,
        };
        Some(value)
    }
}
