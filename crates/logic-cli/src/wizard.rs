use std::collections::BTreeSet;
use std::fmt::Write;

use logic_spec::{FlowStatus, Progress, QuestionId, ResponseSet};
use serde_json::Value;

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: status, visible questions, error details, help text.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and summaries while walking a questionnaire.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_responses_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_responses_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_responses_json,
        }
    }

    pub fn show_header(&mut self, payload: &WizardPayload) {
        if self.header_printed {
            return;
        }
        println!("Questionnaire: {}", payload.title);
        if self.verbosity.is_verbose()
            && let Some(help) = &payload.help
        {
            println!("Help: {}", help);
        }
        self.header_printed = true;
    }

    pub fn show_status(&self, payload: &WizardPayload) {
        if self.verbosity.is_verbose() {
            println!(
                "Status: {} ({}/{})",
                payload.status.as_str(),
                payload.progress.answered,
                payload.progress.total
            );
            self.print_visible_questions(payload);
        } else if payload.status == FlowStatus::NeedInput && payload.visible_count() == 0 {
            println!("No visible questions are available; check your conditional logic.");
        }
    }

    fn print_visible_questions(&self, payload: &WizardPayload) {
        println!("Visible questions:");
        for question in payload.questions.iter().filter(|question| question.visible) {
            let mut entry = format!(" - {} ({})", question.id, question.text);
            if question.required {
                entry.push_str(" [required]");
            }
            if question.skipped {
                entry.push_str(" [skipped]");
            }
            println!("{}", entry);
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = if prompt.total > 0 {
            format!("{}/{} {}", prompt.index, prompt.total, prompt.text)
        } else {
            format!("{} {}", prompt.index, prompt.text)
        };
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if let Some(description) = &prompt.description {
            println!("{}", description);
        }
        if !prompt.choices.is_empty() {
            for (index, choice) in prompt.choices.iter().enumerate() {
                println!("  {}. {}", index + 1, choice);
            }
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_completion(&self, response_set: &ResponseSet) {
        if response_set.terminated_early {
            println!("The questionnaire ended early.");
        }
        println!("Done ✅");
        match response_set.to_cbor() {
            Ok(bytes) => {
                println!("Responses (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize responses to CBOR: {}", err);
            }
        }
        if self.show_responses_json {
            match response_set.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize responses to JSON: {}", err);
                }
            }
        }
    }
}

/// Render payload extracted from the component output.
pub struct WizardPayload {
    pub title: String,
    pub help: Option<String>,
    pub status: FlowStatus,
    pub progress: Progress,
    pub questions: Vec<WizardQuestion>,
}

impl WizardPayload {
    pub fn from_json(json: &Value) -> Result<Self, String> {
        let title = json
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| "wizard payload missing title".to_string())?
            .to_string();
        let help = json
            .get("help")
            .and_then(Value::as_str)
            .map(|value| value.to_string());
        let status = json
            .get("status")
            .and_then(Value::as_str)
            .and_then(FlowStatus::from_label)
            .ok_or_else(|| "wizard payload missing or unknown status".to_string())?;
        let progress = json
            .get("progress")
            .map(|progress| Progress {
                answered: progress
                    .get("answered")
                    .and_then(Value::as_u64)
                    .unwrap_or(0) as usize,
                total: progress.get("total").and_then(Value::as_u64).unwrap_or(0) as usize,
            })
            .unwrap_or_default();
        let questions = json
            .get("questions")
            .and_then(Value::as_array)
            .ok_or_else(|| "wizard payload missing questions".to_string())?
            .iter()
            .map(WizardQuestion::from_json)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            title,
            help,
            status,
            progress,
            questions,
        })
    }

    pub fn visible_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|question| question.visible)
            .count()
    }

    /// First reachable question that still needs an answer, ignoring
    /// optional questions the user already passed on.
    pub fn pending_question(&self, declined: &BTreeSet<QuestionId>) -> Option<&WizardQuestion> {
        self.questions.iter().find(|question| {
            question.visible
                && !question.skipped
                && !question.answered
                && !declined.contains(&question.id)
        })
    }
}

/// Question metadata used for rendering prompts.
pub struct WizardQuestion {
    pub id: QuestionId,
    pub text: String,
    pub description: Option<String>,
    pub kind: QuestionKind,
    pub required: bool,
    pub options: Vec<WizardOption>,
    pub visible: bool,
    pub skipped: bool,
    pub answered: bool,
}

pub struct WizardOption {
    pub value: String,
    pub label: String,
}

impl WizardQuestion {
    fn from_json(value: &Value) -> Result<Self, String> {
        let id = value
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| "question missing id".to_string())?;
        let text = value
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("question {} missing text", id))?
            .to_string();
        let description = value
            .get("description")
            .and_then(Value::as_str)
            .map(|value| value.to_string());
        let required = value
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let kind = QuestionKind::from_label(value.get("type").and_then(Value::as_str).unwrap_or("text"));
        let options = value
            .get("options")
            .and_then(Value::as_array)
            .map(|options| {
                options
                    .iter()
                    .filter_map(|option| {
                        let value = option.get("value").and_then(Value::as_str)?;
                        let label = option
                            .get("label")
                            .and_then(Value::as_str)
                            .unwrap_or(value);
                        Some(WizardOption {
                            value: value.to_string(),
                            label: label.to_string(),
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let visible = value
            .get("visible")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let skipped = value
            .get("skipped")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let answered = value.get("current_value").is_some_and(|current| match current {
            Value::Null => false,
            Value::String(text) => !text.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        });
        Ok(Self {
            id,
            text,
            description,
            kind,
            required,
            options,
            visible,
            skipped,
            answered,
        })
    }

    pub fn option_values(&self) -> Vec<&str> {
        self.options
            .iter()
            .map(|option| option.value.as_str())
            .collect()
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub description: Option<String>,
    pub required: bool,
    pub hint: Option<String>,
    pub choices: Vec<String>,
}

impl PromptContext {
    pub fn new(question: &WizardQuestion, progress: &Progress) -> Self {
        let choices = if question.kind.lists_choices() {
            question
                .options
                .iter()
                .map(|option| {
                    if option.label == option.value {
                        option.value.clone()
                    } else {
                        format!("{} ({})", option.label, option.value)
                    }
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            index: (progress.answered + 1).max(1),
            total: progress.total,
            text: question.text.clone(),
            description: question.description.clone(),
            required: question.required,
            hint: question.kind.hint(),
            choices,
        }
    }
}

/// Prompt families, one per way an answer is typed in.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum QuestionKind {
    Text,
    YesNo,
    Choice,
    MultiChoice,
    Number,
}

impl QuestionKind {
    pub fn from_label(label: &str) -> Self {
        match label {
            "yes_no" => QuestionKind::YesNo,
            "single_choice" => QuestionKind::Choice,
            "multiple_choice" | "checkbox" => QuestionKind::MultiChoice,
            "scale" | "number" => QuestionKind::Number,
            _ => QuestionKind::Text,
        }
    }

    fn lists_choices(&self) -> bool {
        matches!(self, QuestionKind::Choice | QuestionKind::MultiChoice)
    }

    fn hint(&self) -> Option<String> {
        match self {
            QuestionKind::YesNo => Some("(yes/no, y/n)".to_string()),
            QuestionKind::Choice => Some("(option value or number)".to_string()),
            QuestionKind::MultiChoice => Some("(comma-separated values or numbers)".to_string()),
            QuestionKind::Number => Some("(number)".to_string()),
            QuestionKind::Text => None,
        }
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut encoded, "{:02x}", byte);
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> WizardPayload {
        WizardPayload::from_json(&json!({
            "title": "Check-in",
            "status": "need_input",
            "progress": { "answered": 1, "total": 4 },
            "questions": [
                { "id": 1, "text": "Consent?", "type": "yes_no", "required": true, "current_value": "yes", "visible": true, "skipped": false },
                { "id": 2, "text": "Provider", "type": "text", "required": false, "visible": false, "skipped": false },
                { "id": 3, "text": "Mood", "type": "single_choice", "required": false, "visible": true, "skipped": true,
                  "options": [{ "value": "ok", "label": "OK" }] },
                { "id": 4, "text": "Notes", "type": "textarea", "required": false, "visible": true, "skipped": false },
                { "id": 5, "text": "Scale", "type": "scale", "required": true, "visible": true, "skipped": false }
            ]
        }))
        .expect("payload")
    }

    #[test]
    fn pending_question_skips_answered_hidden_and_skipped() {
        let payload = payload();
        let pending = payload.pending_question(&BTreeSet::new()).expect("pending");
        assert_eq!(pending.id, 4);

        let declined = BTreeSet::from([4]);
        let pending = payload.pending_question(&declined).expect("pending");
        assert_eq!(pending.id, 5);
        assert_eq!(pending.kind, QuestionKind::Number);
    }

    #[test]
    fn prompt_lists_labelled_choices() {
        let payload = payload();
        let prompt = PromptContext::new(&payload.questions[2], &payload.progress);
        assert_eq!(prompt.index, 2);
        assert_eq!(prompt.total, 4);
        assert_eq!(prompt.choices, vec!["OK (ok)".to_string()]);
    }

    #[test]
    fn payload_with_error_status_is_rejected() {
        let result = WizardPayload::from_json(&json!({
            "title": "Check-in",
            "status": "error",
            "progress": { "answered": 0, "total": 1 },
            "questions": []
        }));
        match result {
            Err(err) => assert!(err.contains("unknown status")),
            Ok(_) => panic!("error is not a flow status"),
        }
    }

    #[test]
    fn hex_encoding_is_lowercase() {
        assert_eq!(encode_hex(&[0x0a, 0xff]), "0aff");
    }
}
