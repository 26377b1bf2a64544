use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::spec::question::{Question, QuestionId};
use crate::spec::rule::ConditionalRule;

/// A labelled score range. `max` is inclusive; a missing `max` is open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreBand {
    pub min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ScoreBand {
    pub fn contains(&self, total: f64) -> bool {
        total >= self.min && self.max.is_none_or(|max| total <= max)
    }
}

/// Scoring configuration for a questionnaire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ScoringSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bands: Vec<ScoreBand>,
}

impl ScoringSpec {
    /// First band containing `total`, in declaration order.
    pub fn band_for(&self, total: f64) -> Option<&ScoreBand> {
        self.bands.iter().find(|band| band.contains(total))
    }
}

/// Top-level questionnaire definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionnaireSpec {
    pub id: String,
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<ConditionalRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringSpec>,
}

impl QuestionnaireSpec {
    pub fn from_json(raw: &str) -> Result<Self, SpecError> {
        serde_json::from_str(raw).map_err(SpecError::Parse)
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn position(&self, id: QuestionId) -> Option<usize> {
        self.questions.iter().position(|question| question.id == id)
    }
}
