//! Named constructors for common rules.
//!
//! Each helper returns a complete [`ConditionalRule`]; rule ids come from an
//! injected [`RuleIdGenerator`] so that rule construction stays
//! deterministic. Use [`ConditionalRule::with_id`] to supply an id instead.

use serde_json::Value;

use crate::spec::question::QuestionId;
use crate::spec::rule::{ConditionalRule, Operator, RuleAction, RuleId};

/// Source of ids for generated rules.
pub trait RuleIdGenerator {
    fn next_id(&mut self, action: RuleAction) -> RuleId;
}

/// Numbers rules `<prefix>-<n>` starting at 1.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("rule")
    }
}

impl RuleIdGenerator for SequentialIds {
    fn next_id(&mut self, _action: RuleAction) -> RuleId {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

impl<F> RuleIdGenerator for F
where
    F: FnMut(RuleAction) -> RuleId,
{
    fn next_id(&mut self, action: RuleAction) -> RuleId {
        self(action)
    }
}

#[derive(Debug, Clone)]
pub struct RuleBuilder<G = SequentialIds> {
    ids: G,
}

impl Default for RuleBuilder {
    fn default() -> Self {
        Self::new(SequentialIds::default())
    }
}

impl<G: RuleIdGenerator> RuleBuilder<G> {
    pub fn new(ids: G) -> Self {
        Self { ids }
    }

    fn rule(
        &mut self,
        question_id: QuestionId,
        operator: Operator,
        value: Value,
        action: RuleAction,
        target: Option<QuestionId>,
    ) -> ConditionalRule {
        let id = self.ids.next_id(action);
        ConditionalRule::new(id, question_id, operator, value, action, target)
    }

    /// Show `target` when the answer to `question_id` equals `value`.
    pub fn show_if(
        &mut self,
        question_id: QuestionId,
        value: impl Into<Value>,
        target: QuestionId,
    ) -> ConditionalRule {
        self.rule(question_id, Operator::Equals, value.into(), RuleAction::Show, Some(target))
    }

    pub fn hide_if(
        &mut self,
        question_id: QuestionId,
        value: impl Into<Value>,
        target: QuestionId,
    ) -> ConditionalRule {
        self.rule(question_id, Operator::Equals, value.into(), RuleAction::Hide, Some(target))
    }

    pub fn require_if(
        &mut self,
        question_id: QuestionId,
        value: impl Into<Value>,
        target: QuestionId,
    ) -> ConditionalRule {
        self.rule(question_id, Operator::Equals, value.into(), RuleAction::Require, Some(target))
    }

    pub fn skip_to_if(
        &mut self,
        question_id: QuestionId,
        value: impl Into<Value>,
        target: QuestionId,
    ) -> ConditionalRule {
        self.rule(question_id, Operator::Equals, value.into(), RuleAction::SkipTo, Some(target))
    }

    /// End the survey when the answer equals `value`. Carries no target.
    pub fn end_survey_if(&mut self, question_id: QuestionId, value: impl Into<Value>) -> ConditionalRule {
        self.rule(question_id, Operator::Equals, value.into(), RuleAction::EndSurvey, None)
    }

    pub fn show_if_score_above(
        &mut self,
        question_id: QuestionId,
        threshold: f64,
        target: QuestionId,
    ) -> ConditionalRule {
        self.rule(
            question_id,
            Operator::GreaterThan,
            Value::from(threshold),
            RuleAction::Show,
            Some(target),
        )
    }

    pub fn show_if_contains(
        &mut self,
        question_id: QuestionId,
        value: impl Into<Value>,
        target: QuestionId,
    ) -> ConditionalRule {
        self.rule(question_id, Operator::Contains, value.into(), RuleAction::Show, Some(target))
    }
}
