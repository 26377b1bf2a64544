use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::flow::reachable_questions;
use crate::responses::Responses;
use crate::spec::question::{Question, QuestionId};
use crate::spec::questionnaire::{QuestionnaireSpec, ScoreBand};

/// Score of a response snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ScoreSummary {
    pub total: f64,
    /// Contribution of every reachable question that produced a score.
    pub contributions: BTreeMap<QuestionId, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band: Option<ScoreBand>,
}

/// Scores the reachable questions of a questionnaire. Hidden or skipped
/// questions never contribute, even when an earlier answer is still present.
pub fn score(spec: &QuestionnaireSpec, responses: &Responses) -> ScoreSummary {
    let contributions = reachable_questions(spec, responses)
        .into_iter()
        .filter_map(|entry| {
            let answer = responses.get(entry.id())?;
            question_score(entry.question, answer).map(|points| (entry.id(), points))
        })
        .collect::<BTreeMap<_, _>>();

    let total: f64 = contributions.values().sum();
    let band = spec
        .scoring
        .as_ref()
        .and_then(|scoring| scoring.band_for(total))
        .cloned();

    ScoreSummary {
        total,
        contributions,
        band,
    }
}

/// Points for a single answer: option scores for chosen options (summed for
/// lists), or the number itself for `scored` questions.
pub fn question_score(question: &Question, answer: &Value) -> Option<f64> {
    match answer {
        Value::String(choice) => question.option(choice).and_then(|option| option.score),
        Value::Array(choices) => {
            let points = choices
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|choice| question.option(choice).and_then(|option| option.score))
                .collect::<Vec<_>>();
            (!points.is_empty()).then(|| points.iter().sum::<f64>())
        }
        Value::Number(number) if question.scored => number.as_f64(),
        _ => None,
    }
}
