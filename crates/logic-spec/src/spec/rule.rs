use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::spec::question::QuestionId;

pub type RuleId = String;

/// Comparison applied between an answer and a rule's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    In,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::Contains => "contains",
            Operator::In => "in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effect of a rule whose condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Show,
    Hide,
    Require,
    SkipTo,
    EndSurvey,
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Show => "show",
            RuleAction::Hide => "hide",
            RuleAction::Require => "require",
            RuleAction::SkipTo => "skip_to",
            RuleAction::EndSurvey => "end_survey",
        }
    }

    /// Every action except `end_survey` applies to a target question.
    pub fn needs_target(&self) -> bool {
        !matches!(self, RuleAction::EndSurvey)
    }

    pub fn affects_visibility(&self) -> bool {
        matches!(self, RuleAction::Show | RuleAction::Hide)
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative condition/action pair.
///
/// The rule reads the answer to `question_id`, compares it with `value`
/// using `operator`, and when the comparison holds applies `action` to
/// `target_question_id` (or to the whole flow for `end_survey`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalRule {
    pub id: RuleId,
    pub question_id: QuestionId,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_question_id: Option<QuestionId>,
    pub action: RuleAction,
}

impl ConditionalRule {
    pub fn new(
        id: impl Into<RuleId>,
        question_id: QuestionId,
        operator: Operator,
        value: impl Into<Value>,
        action: RuleAction,
        target_question_id: Option<QuestionId>,
    ) -> Self {
        Self {
            id: id.into(),
            question_id,
            operator,
            value: value.into(),
            target_question_id: target_question_id.filter(|_| action.needs_target()),
            action,
        }
    }

    /// Replaces the generated id with a caller-chosen one.
    pub fn with_id(mut self, id: impl Into<RuleId>) -> Self {
        self.id = id.into();
        self
    }

    /// Target the action applies to. `None` for `end_survey` and for rules
    /// missing a target, which makes such rules inert.
    pub fn target(&self) -> Option<QuestionId> {
        if self.action.needs_target() {
            self.target_question_id
        } else {
            None
        }
    }
}
