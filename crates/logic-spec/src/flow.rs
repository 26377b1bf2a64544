use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::evaluator::{LogicEvaluator, ResolvedQuestion};
use crate::responses::Responses;
use crate::spec::question::QuestionId;
use crate::spec::questionnaire::QuestionnaireSpec;

/// Where a questionnaire session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    /// A reachable question still needs an answer.
    NeedInput,
    /// Every reachable question is answered.
    Complete,
    /// An `end_survey` rule holds.
    Terminated,
}

impl FlowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStatus::NeedInput => "need_input",
            FlowStatus::Complete => "complete",
            FlowStatus::Terminated => "terminated",
        }
    }

    /// Parses a status label; component-level labels such as `error` are
    /// not flow states.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "need_input" => Some(FlowStatus::NeedInput),
            "complete" => Some(FlowStatus::Complete),
            "terminated" => Some(FlowStatus::Terminated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

/// Navigation snapshot derived from the rules and the current responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlowState {
    pub status: FlowStatus,
    pub next_question_id: Option<QuestionId>,
    pub skip_to: Option<QuestionId>,
    /// Visible questions passed over by the active skip rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<QuestionId>,
    pub progress: Progress,
}

impl FlowState {
    pub fn ended_early(&self) -> bool {
        self.status == FlowStatus::Terminated
    }
}

/// Computes the navigation state of a questionnaire.
///
/// When a skip rule holds, visible questions positioned strictly between the
/// rule's source question and its target are passed over. A skip whose
/// target does not come after its source is ignored.
pub fn flow_state(spec: &QuestionnaireSpec, responses: &Responses) -> FlowState {
    let evaluator = LogicEvaluator::for_spec(spec, responses);
    let visible = evaluator.visible_questions(&spec.questions);
    let skip_to = evaluator.skip_to_question();
    let skipped = skipped_questions(spec, &evaluator, &visible);

    let reachable = visible
        .into_iter()
        .filter(|entry| !skipped.contains(&entry.id()))
        .collect::<Vec<_>>();
    let answered = reachable
        .iter()
        .filter(|entry| responses.is_answered(entry.id()))
        .count();
    let progress = Progress {
        answered,
        total: reachable.len(),
    };

    if evaluator.should_end_survey() {
        return FlowState {
            status: FlowStatus::Terminated,
            next_question_id: None,
            skip_to,
            skipped,
            progress,
        };
    }

    let next_question_id = reachable
        .iter()
        .find(|entry| !responses.is_answered(entry.id()))
        .map(|entry| entry.id());

    FlowState {
        status: if next_question_id.is_some() {
            FlowStatus::NeedInput
        } else {
            FlowStatus::Complete
        },
        next_question_id,
        skip_to,
        skipped,
        progress,
    }
}

/// Visible questions the flow can still reach, in order. Questions passed
/// over by the active skip rule are dropped, so answers left on them from an
/// earlier path are neither validated nor scored.
pub fn reachable_questions<'q>(
    spec: &'q QuestionnaireSpec,
    responses: &Responses,
) -> Vec<ResolvedQuestion<'q>> {
    let evaluator = LogicEvaluator::for_spec(spec, responses);
    let visible = evaluator.visible_questions(&spec.questions);
    let skipped = skipped_questions(spec, &evaluator, &visible);
    visible
        .into_iter()
        .filter(|entry| !skipped.contains(&entry.id()))
        .collect()
}

/// Next question to ask, or `None` once the survey is complete or ended.
pub fn next_question(spec: &QuestionnaireSpec, responses: &Responses) -> Option<QuestionId> {
    flow_state(spec, responses).next_question_id
}

fn skipped_questions(
    spec: &QuestionnaireSpec,
    evaluator: &LogicEvaluator<'_>,
    visible: &[ResolvedQuestion<'_>],
) -> Vec<QuestionId> {
    let Some(rule) = evaluator.skip_rule() else {
        return Vec::new();
    };
    let (Some(from), Some(to)) = (
        spec.position(rule.question_id),
        rule.target().and_then(|target| spec.position(target)),
    ) else {
        return Vec::new();
    };
    if to <= from {
        return Vec::new();
    }

    visible
        .iter()
        .filter(|entry| {
            spec.position(entry.id())
                .is_some_and(|position| position > from && position < to)
        })
        .map(|entry| entry.id())
        .collect()
}
