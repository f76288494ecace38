// src/models/question.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::validate_url_string;

use crate::error::StoreError;
use crate::store::{CollectionName, Document, FieldKind, FieldValue};

/// Keys a `correct_answer` may reference, in option order.
pub const OPTION_KEYS: [&str; 5] = ["A", "B", "C", "D", "E"];

/// Difficulty levels, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Legendary,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Legendary => "legendary",
        }
    }

    /// Position in the easy < medium < hard < legendary order.
    pub fn rank(&self) -> i64 {
        *self as i64
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "legendary" => Ok(Difficulty::Legendary),
            other => Err(StoreError::InvalidQuery(format!(
                "unknown difficulty '{}'",
                other
            ))),
        }
    }
}

/// One practice question, as stored in the `questions` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_question_invariants))]
pub struct QuestionDocument {
    #[validate(length(min = 1, max = 128))]
    pub id: String,

    /// Logical question reference shared by language variants.
    #[validate(length(min = 1, max = 128))]
    pub question_id: String,

    #[validate(length(min = 1, max = 5000))]
    pub question_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 10000))]
    pub explanation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_b: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_c: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_e: Option<String>,

    /// Key of the correct option ("A".."E").
    pub correct_answer: String,

    pub subject_id: String,
    #[validate(length(min = 1, max = 64))]
    pub subject_code: String,
    pub subject_name: String,
    pub topic_id: String,
    pub main_topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_topic: Option<String>,

    #[validate(range(min = 1, max = 12))]
    pub grade: i32,

    pub difficulty: Difficulty,

    /// Locale tag (e.g. "en", "tr").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    #[serde(default)]
    pub is_global: bool,

    #[serde(default)]
    pub has_image: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image_url: Option<String>,

    #[serde(default)]
    pub times_answered: u64,

    #[serde(default)]
    pub times_correct: u64,

    /// times_correct / times_answered; recomputed on every upsert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,

    /// Unix timestamp (seconds), the default freshness sort key.
    pub created_at: i64,
}

impl QuestionDocument {
    /// Text of the option stored under `key`, when present and non-empty.
    pub fn option(&self, key: &str) -> Option<&str> {
        let slot = match key.to_ascii_uppercase().as_str() {
            "A" => &self.option_a,
            "B" => &self.option_b,
            "C" => &self.option_c,
            "D" => &self.option_d,
            "E" => &self.option_e,
            _ => return None,
        };
        slot.as_deref().filter(|text| !text.trim().is_empty())
    }

    /// Present options as (key, text) pairs.
    pub fn options(&self) -> impl Iterator<Item = (&'static str, &str)> {
        OPTION_KEYS
            .into_iter()
            .filter_map(|key| self.option(key).map(|text| (key, text)))
    }

    pub fn derived_success_rate(&self) -> Option<f64> {
        if self.times_answered == 0 {
            return None;
        }
        Some(self.times_correct as f64 / self.times_answered as f64)
    }
}

fn validate_question_invariants(question: &QuestionDocument) -> Result<(), ValidationError> {
    if question.options().count() < 2 {
        return Err(ValidationError::new("at_least_two_options_required"));
    }
    if question.option(&question.correct_answer).is_none() {
        return Err(ValidationError::new("correct_answer_must_reference_option"));
    }
    if question.times_correct > question.times_answered {
        return Err(ValidationError::new("times_correct_exceeds_times_answered"));
    }
    if let Some(rate) = question.success_rate {
        if !(0.0..=1.0).contains(&rate) {
            return Err(ValidationError::new("success_rate_out_of_range"));
        }
    }
    Ok(())
}

impl Document for QuestionDocument {
    const COLLECTION: CollectionName = CollectionName::Questions;

    const SEARCHABLE_FIELDS: &'static [&'static str] =
        &["question_text", "main_topic", "sub_topic", "explanation"];

    const FILTER_FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("grade", FieldKind::Int),
        ("subject_code", FieldKind::Text),
        ("subject_id", FieldKind::Text),
        ("topic_id", FieldKind::Text),
        ("difficulty", FieldKind::Difficulty),
        ("lang", FieldKind::Text),
        ("is_global", FieldKind::Bool),
        ("has_image", FieldKind::Bool),
        ("created_at", FieldKind::Int),
        ("times_answered", FieldKind::Int),
    ];

    const SORT_FIELDS: &'static [&'static str] =
        &["created_at", "times_answered", "grade", "difficulty"];

    const DEFAULT_SORT: &'static str = "created_at";

    fn id(&self) -> &str {
        &self.id
    }

    fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            "question_text" => Some(&self.question_text),
            "main_topic" => Some(&self.main_topic),
            "sub_topic" => self.sub_topic.as_deref(),
            "explanation" => self.explanation.as_deref(),
            _ => None,
        }
    }

    fn filter_value(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "grade" => FieldValue::Int(self.grade.into()),
            "subject_code" => FieldValue::Text(self.subject_code.clone()),
            "subject_id" => FieldValue::Text(self.subject_id.clone()),
            "topic_id" => FieldValue::Text(self.topic_id.clone()),
            "difficulty" => FieldValue::Int(self.difficulty.rank()),
            "lang" => FieldValue::Text(self.lang.clone()?),
            "is_global" => FieldValue::Bool(self.is_global),
            "has_image" => FieldValue::Bool(self.has_image),
            "created_at" => FieldValue::Int(self.created_at),
            "times_answered" => FieldValue::Int(i64::try_from(self.times_answered).ok()?),
            _ => return None,
        };
        Some(value)
    }

    fn prepare(mut self) -> Result<Self, StoreError> {
        self.validate()?;
        self.correct_answer = self.correct_answer.to_ascii_uppercase();
        self.success_rate = self.derived_success_rate();
        Ok(self)
    }
}
