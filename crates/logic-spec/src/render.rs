use serde_json::{Map, Value, json};

use crate::{
    evaluator::LogicEvaluator,
    flow::{FlowStatus, Progress, flow_state},
    responses::Responses,
    scoring::{ScoreSummary, score},
    spec::{
        question::{QuestionId, QuestionOption, QuestionType},
        questionnaire::QuestionnaireSpec,
    },
};

/// Describes a single question for render outputs.
#[derive(Debug, Clone)]
pub struct RenderQuestion {
    pub id: QuestionId,
    pub text: String,
    pub description: Option<String>,
    pub kind: Option<QuestionType>,
    /// Effective flag: static or rule-driven.
    pub required: bool,
    pub visible: bool,
    pub skipped: bool,
    pub current_value: Option<Value>,
    pub options: Vec<QuestionOption>,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub questionnaire_id: String,
    pub title: String,
    pub version: String,
    pub status: FlowStatus,
    pub next_question_id: Option<QuestionId>,
    pub progress: Progress,
    pub help: Option<String>,
    pub questions: Vec<RenderQuestion>,
    pub score: ScoreSummary,
}

impl RenderPayload {
    pub fn question(&self, id: QuestionId) -> Option<&RenderQuestion> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn visible_count(&self) -> usize {
        self.questions.iter().filter(|question| question.visible).count()
    }
}

/// Build the renderer payload from the questionnaire and responses.
pub fn build_render_payload(spec: &QuestionnaireSpec, responses: &Responses) -> RenderPayload {
    let evaluator = LogicEvaluator::for_spec(spec, responses);
    let visible = evaluator.visible_questions(&spec.questions);
    let state = flow_state(spec, responses);

    let questions = spec
        .questions
        .iter()
        .map(|question| {
            let resolved = visible.iter().find(|entry| entry.id() == question.id);
            RenderQuestion {
                id: question.id,
                text: question.text.clone(),
                description: question.description.clone(),
                kind: question.kind,
                required: resolved.map_or(question.required, |entry| entry.required),
                visible: resolved.is_some(),
                skipped: state.skipped.contains(&question.id),
                current_value: responses.get(question.id).cloned(),
                options: question.options.clone(),
            }
        })
        .collect::<Vec<_>>();

    RenderPayload {
        questionnaire_id: spec.id.clone(),
        title: spec.title.clone(),
        version: spec.version.clone(),
        status: state.status,
        next_question_id: state.next_question_id,
        progress: state.progress,
        help: spec.description.clone(),
        questions,
        score: score(spec, responses),
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let questions = payload
        .questions
        .iter()
        .map(|question| {
            let mut map = Map::new();
            map.insert("id".into(), Value::from(question.id));
            map.insert("text".into(), Value::String(question.text.clone()));
            map.insert(
                "description".into(),
                question
                    .description
                    .clone()
                    .map(Value::String)
                    .unwrap_or(Value::Null),
            );
            map.insert(
                "type".into(),
                Value::String(question_type_label(question.kind).to_string()),
            );
            map.insert("required".into(), Value::Bool(question.required));
            if let Some(current_value) = &question.current_value {
                map.insert("current_value".into(), current_value.clone());
            }
            if !question.options.is_empty() {
                map.insert(
                    "options".into(),
                    Value::Array(
                        question
                            .options
                            .iter()
                            .map(|option| {
                                json!({
                                    "value": option.value,
                                    "label": option.display_label(),
                                })
                            })
                            .collect(),
                    ),
                );
            }
            map.insert("visible".into(), Value::Bool(question.visible));
            map.insert("skipped".into(), Value::Bool(question.skipped));
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "questionnaire_id": payload.questionnaire_id,
        "title": payload.title,
        "version": payload.version,
        "status": payload.status.as_str(),
        "next_question_id": payload.next_question_id,
        "progress": {
            "answered": payload.progress.answered,
            "total": payload.progress.total,
        },
        "help": payload.help,
        "questions": questions,
        "score": {
            "total": payload.score.total,
            "band": payload.score.band.as_ref().map(|band| band.label.clone()),
        },
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Questionnaire: {} ({})",
        payload.title, payload.questionnaire_id
    ));
    lines.push(format!(
        "Status: {} ({}/{})",
        payload.status.as_str(),
        payload.progress.answered,
        payload.progress.total
    ));
    if let Some(help) = &payload.help {
        lines.push(format!("Help: {}", help));
    }

    match (payload.status, payload.next_question_id) {
        (FlowStatus::Terminated, _) => {
            lines.push("The questionnaire ended early.".to_string());
        }
        (_, Some(next_question)) => {
            lines.push(format!("Next question: {}", next_question));
            if let Some(question) = payload.question(next_question) {
                lines.push(format!("  Text: {}", question.text));
                if let Some(description) = &question.description {
                    lines.push(format!("  Description: {}", description));
                }
                if question.required {
                    lines.push("  Required: yes".to_string());
                }
                if !question.options.is_empty() {
                    let options = question
                        .options
                        .iter()
                        .map(|option| option.value.as_str())
                        .collect::<Vec<_>>();
                    lines.push(format!("  Options: {}", options.join(", ")));
                }
            }
        }
        (_, None) => lines.push("All visible questions are answered.".to_string()),
    }

    lines.push("Visible questions:".to_string());
    for question in payload.questions.iter().filter(|question| question.visible) {
        let mut entry = format!(" - {} ({})", question.id, question.text);
        if question.required {
            entry.push_str(" [required]");
        }
        if question.skipped {
            entry.push_str(" [skipped]");
        }
        if let Some(current_value) = &question.current_value {
            entry.push_str(&format!(" = {}", value_to_display(current_value)));
        }
        lines.push(entry);
    }

    if !payload.score.contributions.is_empty() {
        let mut line = format!("Score: {}", payload.score.total);
        if let Some(band) = &payload.score.band {
            line.push_str(&format!(" ({})", band.label));
        }
        lines.push(line);
    }

    lines.join("\n")
}

fn question_type_label(kind: Option<QuestionType>) -> &'static str {
    kind.map_or("text", |kind| kind.as_str())
}

pub fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(num) => num.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_display)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
