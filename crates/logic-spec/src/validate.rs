use std::collections::BTreeMap;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::evaluator::ResolvedQuestion;
use crate::flow::reachable_questions;
use crate::responses::{Responses, is_blank};
use crate::spec::question::{Constraint, Question, QuestionId};
use crate::spec::questionnaire::QuestionnaireSpec;

pub const REQUIRED_MESSAGE: &str = "This question is required";
pub const SELECT_ONE_MESSAGE: &str = "Please select at least one option";

/// Outcome of validating responses against the resolved visibility.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: BTreeMap<QuestionId, String>,
}

/// Validates a whole questionnaire: visibility and requirement come from its
/// rules, then each question the flow can reach is checked. Questions passed
/// over by a holding skip rule are left alone, matching what the flow asks.
pub fn validate(spec: &QuestionnaireSpec, responses: &Responses) -> ValidationResult {
    validate_resolved(&reachable_questions(spec, responses), responses)
}

/// Checks already-resolved questions. Required questions without an answer
/// get the required message; answered questions are checked against their
/// options and constraint.
pub fn validate_resolved(resolved: &[ResolvedQuestion<'_>], responses: &Responses) -> ValidationResult {
    let mut errors = BTreeMap::new();

    for entry in resolved {
        let question = entry.question;
        let answer = responses.get(question.id);

        let message = if is_blank(answer) {
            entry.required.then(|| required_message(question).to_string())
        } else {
            answer.and_then(|value| check_answer(question, value))
        };

        if let Some(message) = message {
            errors.insert(question.id, message);
        }
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

fn required_message(question: &Question) -> &'static str {
    if question.is_multi_select() {
        SELECT_ONE_MESSAGE
    } else {
        REQUIRED_MESSAGE
    }
}

fn check_answer(question: &Question, value: &Value) -> Option<String> {
    if let Some(message) = check_options(question, value) {
        return Some(message);
    }
    question
        .constraint
        .as_ref()
        .and_then(|constraint| enforce_constraint(constraint, value))
}

fn check_options(question: &Question, value: &Value) -> Option<String> {
    if question.options.is_empty() || !question.kind.is_some_and(|kind| kind.is_choice()) {
        return None;
    }

    let unknown = match value {
        Value::String(choice) => question.option(choice).is_none(),
        Value::Array(choices) => choices
            .iter()
            .any(|choice| choice.as_str().is_none_or(|choice| question.option(choice).is_none())),
        _ => false,
    };

    unknown.then(|| "Please choose one of the listed options".to_string())
}

fn enforce_constraint(constraint: &Constraint, value: &Value) -> Option<String> {
    if let Some(pattern) = &constraint.pattern
        && let Some(text) = value.as_str()
    {
        match Regex::new(pattern) {
            Ok(regex) if !regex.is_match(text) => {
                return Some("Answer is not in the expected format".into());
            }
            Ok(_) => {}
            Err(err) => warn!(%pattern, error = %err, "ignoring invalid answer pattern"),
        }
    }

    if let Some(min_len) = constraint.min_len
        && let Some(text) = value.as_str()
        && text.chars().count() < min_len
    {
        return Some(format!("Answer must be at least {min_len} characters"));
    }

    if let Some(max_len) = constraint.max_len
        && let Some(text) = value.as_str()
        && text.chars().count() > max_len
    {
        return Some(format!("Answer must be at most {max_len} characters"));
    }

    if let Some(min) = constraint.min
        && let Some(number) = value.as_f64()
        && number < min
    {
        return Some(format!("Value must be at least {min}"));
    }

    if let Some(max) = constraint.max
        && let Some(number) = value.as_f64()
        && number > max
    {
        return Some(format!("Value must be at most {max}"));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::LogicEvaluator;
    use crate::spec::question::{QuestionOption, QuestionType};
    use serde_json::json;

    fn check(questions: &[Question], responses: &Responses) -> ValidationResult {
        LogicEvaluator::new(&[], responses).validate_conditional_responses(questions)
    }

    #[test]
    fn empty_multi_select_gets_select_message() {
        let questions = vec![
            Question::new(1, "Symptoms")
                .with_kind(QuestionType::MultipleChoice)
                .with_required(true),
        ];
        let responses = Responses::new().with(1, json!([]));
        let result = check(&questions, &responses);
        assert!(!result.is_valid);
        assert_eq!(result.errors.get(&1).map(String::as_str), Some(SELECT_ONE_MESSAGE));
    }

    #[test]
    fn missing_answers_get_required_message() {
        let questions = vec![
            Question::new(1, "Name").with_required(true),
            Question::new(2, "Notes").with_kind(QuestionType::Textarea),
            Question::new(3, "Feeling").with_required(true).with_kind(QuestionType::Text),
        ];
        let responses = Responses::new().with(3, "");
        let result = check(&questions, &responses);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[&1], REQUIRED_MESSAGE);
        assert_eq!(result.errors[&3], REQUIRED_MESSAGE);
    }

    #[test]
    fn zero_and_false_count_as_answers() {
        let questions = vec![
            Question::new(1, "Score").with_required(true).with_kind(QuestionType::Scale),
            Question::new(2, "Agree").with_required(true),
        ];
        let responses = Responses::new().with(1, 0).with(2, false);
        assert!(check(&questions, &responses).is_valid);
    }

    #[test]
    fn constraints_apply_to_answered_questions() {
        let questions = vec![
            Question::new(1, "Wellbeing")
                .with_kind(QuestionType::Scale)
                .with_constraint(Constraint {
                    min: Some(1.0),
                    max: Some(10.0),
                    ..Constraint::default()
                }),
            Question::new(2, "Phone").with_constraint(Constraint {
                pattern: Some(r"^\+?[0-9 ]+$".into()),
                ..Constraint::default()
            }),
            Question::new(3, "Notes").with_constraint(Constraint {
                max_len: Some(5),
                ..Constraint::default()
            }),
        ];
        let responses = Responses::new()
            .with(1, 11)
            .with(2, "call me")
            .with(3, "too long");
        let result = check(&questions, &responses);
        assert_eq!(result.errors[&1], "Value must be at most 10");
        assert_eq!(result.errors[&2], "Answer is not in the expected format");
        assert_eq!(result.errors[&3], "Answer must be at most 5 characters");
    }

    #[test]
    fn choice_answers_must_match_options() {
        let questions = vec![
            Question::new(1, "Mood")
                .with_kind(QuestionType::SingleChoice)
                .with_options(vec![QuestionOption::new("low"), QuestionOption::new("ok")]),
            Question::new(2, "Symptoms")
                .with_kind(QuestionType::Checkbox)
                .with_options(vec![QuestionOption::new("sleep"), QuestionOption::new("appetite")]),
        ];
        let responses = Responses::new().with(1, "great").with(2, json!(["sleep", "appetite"]));
        let result = check(&questions, &responses);
        assert_eq!(result.errors.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn serializes_is_valid_in_camel_case() {
        let result = ValidationResult {
            is_valid: false,
            errors: BTreeMap::from([(1, REQUIRED_MESSAGE.to_string())]),
        };
        let value = serde_json::to_value(&result).expect("json");
        assert_eq!(value, json!({ "isValid": false, "errors": { "1": REQUIRED_MESSAGE } }));
    }
}
