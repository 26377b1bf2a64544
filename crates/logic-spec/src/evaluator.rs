use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::condition::condition_holds;
use crate::responses::Responses;
use crate::spec::question::{Question, QuestionId};
use crate::spec::questionnaire::QuestionnaireSpec;
use crate::spec::rule::{ConditionalRule, RuleAction};
use crate::validate::{ValidationResult, validate_resolved};

pub type VisibilityMap = BTreeMap<QuestionId, bool>;

/// A question that survived visibility resolution, with its effective
/// required flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedQuestion<'q> {
    pub question: &'q Question,
    /// Statically required or required by a holding `require` rule.
    pub required: bool,
}

impl ResolvedQuestion<'_> {
    pub fn id(&self) -> QuestionId {
        self.question.id
    }

    /// Copy of the question carrying the effective required flag.
    pub fn to_question(&self) -> Question {
        Question {
            required: self.required,
            ..self.question.clone()
        }
    }
}

/// Evaluates conditional rules against one snapshot of responses.
///
/// The evaluator borrows its inputs and holds no other state; build a new
/// one whenever an answer changes.
#[derive(Debug, Clone, Copy)]
pub struct LogicEvaluator<'a> {
    rules: &'a [ConditionalRule],
    responses: &'a Responses,
}

impl<'a> LogicEvaluator<'a> {
    pub fn new(rules: &'a [ConditionalRule], responses: &'a Responses) -> Self {
        Self { rules, responses }
    }

    pub fn for_spec(spec: &'a QuestionnaireSpec, responses: &'a Responses) -> Self {
        Self::new(&spec.rules, responses)
    }

    pub fn rules(&self) -> &'a [ConditionalRule] {
        self.rules
    }

    pub fn responses(&self) -> &'a Responses {
        self.responses
    }

    /// Whether a single rule's condition holds.
    pub fn holds(&self, rule: &ConditionalRule) -> bool {
        let holds = condition_holds(rule, self.responses);
        trace!(rule = %rule.id, operator = %rule.operator, holds, "evaluated rule");
        holds
    }

    fn holding(&self, action: RuleAction) -> impl Iterator<Item = &'a ConditionalRule> + '_ {
        self.rules
            .iter()
            .filter(move |rule| rule.action == action && self.holds(rule))
    }

    /// Visibility of every question. Holding `show`/`hide` rules apply in
    /// declaration order, so a later rule overrides an earlier one for the
    /// same target.
    pub fn visibility(&self, questions: &[Question]) -> VisibilityMap {
        let mut map: VisibilityMap = questions.iter().map(|question| (question.id, true)).collect();

        for rule in self.rules.iter().filter(|rule| rule.action.affects_visibility()) {
            let Some(target) = rule.target() else {
                continue;
            };
            if !self.holds(rule) {
                continue;
            }
            if let Some(visible) = map.get_mut(&target) {
                *visible = rule.action == RuleAction::Show;
                debug!(rule = %rule.id, target, action = %rule.action, "visibility rule applied");
            }
        }

        map
    }

    /// Targets of every holding `require` rule, in declaration order and
    /// without duplicates.
    pub fn conditionally_required_questions(&self) -> Vec<QuestionId> {
        let mut seen = BTreeSet::new();
        self.holding(RuleAction::Require)
            .filter_map(ConditionalRule::target)
            .filter(|target| seen.insert(*target))
            .collect()
    }

    /// Questions to render, in their original order, with the effective
    /// required flag.
    pub fn visible_questions<'q>(&self, questions: &'q [Question]) -> Vec<ResolvedQuestion<'q>> {
        let visibility = self.visibility(questions);
        let dynamic: BTreeSet<QuestionId> =
            self.conditionally_required_questions().into_iter().collect();

        questions
            .iter()
            .filter(|question| visibility.get(&question.id).copied().unwrap_or(true))
            .map(|question| ResolvedQuestion {
                question,
                required: question.required || dynamic.contains(&question.id),
            })
            .collect()
    }

    pub fn should_end_survey(&self) -> bool {
        let ended = self.holding(RuleAction::EndSurvey).next().is_some();
        if ended {
            debug!("end_survey rule holds");
        }
        ended
    }

    /// The first declared `skip_to` rule whose condition holds.
    pub fn skip_rule(&self) -> Option<&'a ConditionalRule> {
        self.holding(RuleAction::SkipTo)
            .find(|rule| rule.target().is_some())
    }

    pub fn skip_to_question(&self) -> Option<QuestionId> {
        self.skip_rule().and_then(ConditionalRule::target)
    }

    /// Checks every visible, effectively required question for an answer.
    /// Hidden questions are never reported.
    pub fn validate_conditional_responses(&self, questions: &[Question]) -> ValidationResult {
        validate_resolved(&self.visible_questions(questions), self.responses)
    }
}
