use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use logic_spec::{
    LogicEvaluator, QuestionId, QuestionnaireSpec, RenderPayload, Responses,
    SpecError, build_render_payload, flow_state as qa_flow_state, lint,
    render_json_ui as qa_render_json_ui, render_text as qa_render_text, score as qa_score,
    validate,
};

const DEFAULT_SPEC: &str = include_str!("../../logic-spec/tests/fixtures/wellbeing_screening.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error("questionnaire '{0}' is not available")]
    QuestionnaireUnavailable(String),
    #[error("invalid answer value: {0}")]
    AnswerParse(#[source] serde_json::Error),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    questionnaire_json: Option<String>,
}

fn load_spec(config_json: &str) -> Result<QuestionnaireSpec, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    let spec_json = config.questionnaire_json.as_deref().unwrap_or(DEFAULT_SPEC);
    Ok(QuestionnaireSpec::from_json(spec_json)?)
}

fn ensure_questionnaire(
    questionnaire_id: &str,
    config_json: &str,
) -> Result<QuestionnaireSpec, ComponentError> {
    let spec = load_spec(config_json)?;
    if spec.id != questionnaire_id {
        Err(ComponentError::QuestionnaireUnavailable(
            questionnaire_id.to_string(),
        ))
    } else {
        Ok(spec)
    }
}

fn parse_responses(responses_json: &str) -> Responses {
    if responses_json.trim().is_empty() {
        return Responses::new();
    }
    match serde_json::from_str::<Value>(responses_json) {
        Ok(value) => Responses::from_value(&value),
        Err(err) => {
            warn!(error = %err, "responses are not valid JSON; evaluating without answers");
            Responses::new()
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(ComponentError::JsonEncode)
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

pub fn describe(questionnaire_id: &str, config_json: &str) -> String {
    respond(ensure_questionnaire(questionnaire_id, config_json).and_then(|spec| to_json(&spec)))
}

/// Full evaluator output for one response snapshot.
pub fn evaluate(questionnaire_id: &str, config_json: &str, responses_json: &str) -> String {
    respond(
        ensure_questionnaire(questionnaire_id, config_json).and_then(|spec| {
            let responses = parse_responses(responses_json);
            let evaluator = LogicEvaluator::for_spec(&spec, &responses);
            let visible = evaluator
                .visible_questions(&spec.questions)
                .iter()
                .map(|entry| entry.to_question())
                .collect::<Vec<_>>();
            Ok(json!({
                "visible_questions": to_json(&visible)?,
                "conditionally_required": evaluator.conditionally_required_questions(),
                "should_end_survey": evaluator.should_end_survey(),
                "skip_to": evaluator.skip_to_question(),
            }))
        }),
    )
}

pub fn visible_questions(questionnaire_id: &str, config_json: &str, responses_json: &str) -> String {
    respond(
        ensure_questionnaire(questionnaire_id, config_json).and_then(|spec| {
            let responses = parse_responses(responses_json);
            let visible = LogicEvaluator::for_spec(&spec, &responses)
                .visible_questions(&spec.questions)
                .iter()
                .map(|entry| entry.to_question())
                .collect::<Vec<_>>();
            to_json(&visible)
        }),
    )
}

pub fn flow_state(questionnaire_id: &str, config_json: &str, responses_json: &str) -> String {
    respond(
        ensure_questionnaire(questionnaire_id, config_json).and_then(|spec| {
            let responses = parse_responses(responses_json);
            to_json(&qa_flow_state(&spec, &responses))
        }),
    )
}

pub fn next(questionnaire_id: &str, config_json: &str, responses_json: &str) -> String {
    respond(
        ensure_questionnaire(questionnaire_id, config_json).map(|spec| {
            let responses = parse_responses(responses_json);
            let state = qa_flow_state(&spec, &responses);
            json!({
                "status": state.status.as_str(),
                "next_question_id": state.next_question_id,
                "progress": {
                    "answered": state.progress.answered,
                    "total": state.progress.total
                }
            })
        }),
    )
}

pub fn validate_responses(questionnaire_id: &str, config_json: &str, responses_json: &str) -> String {
    respond(
        ensure_questionnaire(questionnaire_id, config_json).and_then(|spec| {
            let responses = Responses::from_json(responses_json)?;
            to_json(&validate(&spec, &responses))
        }),
    )
}

pub fn score(questionnaire_id: &str, config_json: &str, responses_json: &str) -> String {
    respond(
        ensure_questionnaire(questionnaire_id, config_json).and_then(|spec| {
            let responses = parse_responses(responses_json);
            to_json(&qa_score(&spec, &responses))
        }),
    )
}

pub fn lint_rules(questionnaire_id: &str, config_json: &str) -> String {
    respond(ensure_questionnaire(questionnaire_id, config_json).map(|spec| {
        let issues = lint(&spec)
            .iter()
            .map(|issue| issue.to_string())
            .collect::<Vec<_>>();
        json!({
            "valid": issues.is_empty(),
            "issues": issues,
        })
    }))
}

fn render_payload(
    questionnaire_id: &str,
    config_json: &str,
    responses_json: &str,
) -> Result<RenderPayload, ComponentError> {
    let spec = ensure_questionnaire(questionnaire_id, config_json)?;
    let responses = parse_responses(responses_json);
    Ok(build_render_payload(&spec, &responses))
}

pub fn render_text(questionnaire_id: &str, config_json: &str, responses_json: &str) -> String {
    respond_string(
        render_payload(questionnaire_id, config_json, responses_json)
            .map(|payload| qa_render_text(&payload)),
    )
}

pub fn render_json_ui(questionnaire_id: &str, config_json: &str, responses_json: &str) -> String {
    respond(
        render_payload(questionnaire_id, config_json, responses_json)
            .map(|payload| qa_render_json_ui(&payload)),
    )
}

/// Records one answer and reports the resulting flow.
///
/// The status is `error` only when the patched answer itself fails
/// validation; problems with other questions are returned alongside a
/// normal status.
pub fn submit_patch(
    questionnaire_id: &str,
    config_json: &str,
    responses_json: &str,
    question_id: QuestionId,
    value_json: &str,
) -> String {
    respond(
        ensure_questionnaire(questionnaire_id, config_json).and_then(|spec| {
            let value: Value =
                serde_json::from_str(value_json).map_err(ComponentError::AnswerParse)?;
            let mut responses = if responses_json.trim().is_empty() {
                Responses::new()
            } else {
                Responses::from_json(responses_json)?
            };
            responses.insert(question_id, value);
            debug!(questionnaire = %spec.id, question_id, "answer patched");

            let validation = validate(&spec, &responses);
            let state = qa_flow_state(&spec, &responses);
            let status = if validation.errors.contains_key(&question_id) {
                "error"
            } else {
                state.status.as_str()
            };

            Ok(json!({
                "status": status,
                "next_question_id": state.next_question_id,
                "progress": {
                    "answered": state.progress.answered,
                    "total": state.progress.total,
                },
                "ended_early": state.ended_early(),
                "responses": responses.to_value(),
                "validation": to_json(&validation)?,
            }))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ID: &str = "wellbeing-screening";

    #[test]
    fn describe_returns_spec_json() {
        let payload = describe(ID, "");
        let spec: Value = serde_json::from_str(&payload).expect("valid json");
        assert_eq!(spec["id"], ID);
        assert_eq!(spec["rules"][0]["action"], "end_survey");
    }

    #[test]
    fn unknown_questionnaire_is_an_error() {
        let payload = describe("other", "");
        let parsed: Value = serde_json::from_str(&payload).expect("json");
        assert_eq!(parsed["error"], "questionnaire 'other' is not available");
    }

    #[test]
    fn evaluate_reports_all_queries() {
        let responses = json!({ "1": "yes", "2": "no", "4": "not_at_all", "7": "yes" });
        let payload = evaluate(ID, "", &responses.to_string());
        let parsed: Value = serde_json::from_str(&payload).expect("json");
        let ids = parsed["visible_questions"]
            .as_array()
            .expect("visible")
            .iter()
            .filter_map(|question| question["id"].as_i64())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(parsed["conditionally_required"], json!([8]));
        assert_eq!(parsed["should_end_survey"], false);
        assert_eq!(parsed["skip_to"], 7);
        let contact = &parsed["visible_questions"][6];
        assert_eq!(contact["id"], 8);
        assert_eq!(contact["required"], true);
    }

    #[test]
    fn visible_questions_hide_provider() {
        let payload = visible_questions(ID, "", r#"{"2":"no"}"#);
        let parsed: Value = serde_json::from_str(&payload).expect("json");
        let questions = parsed.as_array().expect("array");
        assert_eq!(questions.len(), 9);
        assert!(questions.iter().all(|question| question["id"] != 3));
    }

    #[test]
    fn next_returns_progress_payload() {
        let spec = json!({
            "id": "progress-form",
            "title": "Progress",
            "version": "1.0",
            "questions": [
                { "id": 1, "text": "q1", "required": true },
                { "id": 2, "text": "q2", "required": true }
            ]
        });
        let config = json!({ "questionnaire_json": spec.to_string() });
        let response = next("progress-form", &config.to_string(), r#"{"1": "test"}"#);
        let parsed: Value = serde_json::from_str(&response).expect("json");
        assert_eq!(parsed["status"], "need_input");
        assert_eq!(parsed["next_question_id"], 2);
        assert_eq!(parsed["progress"]["answered"], 1);
    }

    #[test]
    fn flow_state_reports_termination() {
        let response = flow_state(ID, "", r#"{"1": "no"}"#);
        let parsed: Value = serde_json::from_str(&response).expect("json");
        assert_eq!(parsed["status"], "terminated");
        assert!(parsed["next_question_id"].is_null());
    }

    #[test]
    fn validate_responses_reports_required_fields() {
        let answers = json!({ "1": "yes", "2": "yes", "4": "several_days", "5": "several_days", "6": [], "7": "yes", "9": 4 });
        let result = validate_responses(ID, "", &answers.to_string());
        let parsed: Value = serde_json::from_str(&result).expect("json");
        assert_eq!(parsed["isValid"], false);
        assert_eq!(parsed["errors"]["8"], "This question is required");
        assert!(parsed["errors"].get("6").is_none());
    }

    #[test]
    fn validate_responses_rejects_malformed_json() {
        let result = validate_responses(ID, "", "[1, 2");
        let parsed: Value = serde_json::from_str(&result).expect("json");
        assert!(
            parsed["error"]
                .as_str()
                .is_some_and(|error| error.starts_with("invalid responses document"))
        );
    }

    #[test]
    fn score_returns_band() {
        let answers = json!({ "4": "nearly_every_day", "5": "nearly_every_day", "6": ["sleep", "appetite", "fatigue", "concentration"] });
        let result = score(ID, "", &answers.to_string());
        let parsed: Value = serde_json::from_str(&result).expect("json");
        assert_eq!(parsed["total"], 10.0);
        assert_eq!(parsed["band"]["label"], "elevated");
    }

    #[test]
    fn lint_rules_reports_issues() {
        let spec = json!({
            "id": "broken",
            "title": "Broken",
            "version": "1.0",
            "questions": [{ "id": 1, "text": "q1" }],
            "rules": [
                { "id": "r1", "questionId": 1, "operator": "equals", "value": "x", "action": "hide" }
            ]
        });
        let config = json!({ "questionnaire_json": spec.to_string() });
        let result = lint_rules("broken", &config.to_string());
        let parsed: Value = serde_json::from_str(&result).expect("json");
        assert_eq!(parsed["valid"], false);
        assert_eq!(
            parsed["issues"][0],
            "rule 'r1' uses action 'hide' but has no targetQuestionId"
        );
    }

    #[test]
    fn render_text_outputs_summary() {
        let output = render_text(ID, "", "{}");
        assert!(output.contains("Questionnaire:"));
        assert!(output.contains("Visible questions"));
    }

    #[test]
    fn render_json_ui_outputs_json_payload() {
        let payload = render_json_ui(ID, "", r#"{"1":"yes"}"#);
        let parsed: Value = serde_json::from_str(&payload).expect("json");
        assert_eq!(parsed["questionnaire_id"], ID);
        assert_eq!(parsed["progress"]["total"], 10);
        assert_eq!(parsed["progress"]["answered"], 1);
    }

    #[test]
    fn submit_patch_advances() {
        let response = submit_patch(ID, "", "{}", 1, r#""yes""#);
        let parsed: Value = serde_json::from_str(&response).expect("json");
        assert_eq!(parsed["status"], "need_input");
        assert_eq!(parsed["next_question_id"], 2);
        assert_eq!(parsed["responses"]["1"], "yes");
    }

    #[test]
    fn submit_patch_returns_validation_error() {
        let response = submit_patch(ID, "", r#"{"1":"yes"}"#, 9, "42");
        let parsed: Value = serde_json::from_str(&response).expect("json");
        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["validation"]["errors"]["9"], "Value must be at most 10");
    }

    #[test]
    fn submit_patch_ends_survey_without_consent() {
        let response = submit_patch(ID, "", "{}", 1, r#""no""#);
        let parsed: Value = serde_json::from_str(&response).expect("json");
        assert_eq!(parsed["status"], "terminated");
        assert_eq!(parsed["ended_early"], true);
        assert!(parsed["next_question_id"].is_null());
    }

    #[test]
    fn submit_patch_rejects_malformed_responses() {
        let response = submit_patch(ID, "", r#"{"1":"yes","2":"no""#, 4, r#""several_days""#);
        let parsed: Value = serde_json::from_str(&response).expect("json");
        assert!(
            parsed["error"]
                .as_str()
                .is_some_and(|error| error.starts_with("invalid responses document"))
        );
        assert!(parsed.get("responses").is_none());
    }
}
