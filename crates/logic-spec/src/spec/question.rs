use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifier of a question within a questionnaire.
pub type QuestionId = i64;

/// Supported question kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Text,
    Textarea,
    SingleChoice,
    MultipleChoice,
    Checkbox,
    Scale,
    YesNo,
    Number,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::Textarea => "textarea",
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Checkbox => "checkbox",
            QuestionType::Scale => "scale",
            QuestionType::YesNo => "yes_no",
            QuestionType::Number => "number",
        }
    }

    /// Kinds whose answer is a list of selected option values.
    pub fn is_multi_select(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::Checkbox)
    }

    /// Kinds answered by picking declared options.
    pub fn is_choice(&self) -> bool {
        self.is_multi_select() || matches!(self, QuestionType::SingleChoice | QuestionType::YesNo)
    }
}

/// A selectable option for choice questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl QuestionOption {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
            score: None,
        }
    }

    pub fn scored(value: impl Into<String>, score: f64) -> Self {
        Self {
            score: Some(score),
            ..Self::new(value)
        }
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }
}

/// Answer constraints checked once a visible question has a value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Constraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// A single questionnaire question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    #[serde(default)]
    pub required: bool,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<QuestionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    /// Numeric answers add to the questionnaire score.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub scored: bool,
}

impl Question {
    pub fn new(id: QuestionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            required: false,
            kind: None,
            description: None,
            options: Vec::new(),
            constraint: None,
            scored: false,
        }
    }

    pub fn with_kind(mut self, kind: QuestionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_options(mut self, options: Vec<QuestionOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn is_multi_select(&self) -> bool {
        self.kind.is_some_and(|kind| kind.is_multi_select())
    }

    pub fn option(&self, value: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|option| option.value == value)
    }
}
