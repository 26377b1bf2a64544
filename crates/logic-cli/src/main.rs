mod wizard;

use clap::{Parser, Subcommand, ValueEnum};
use component_logic::{evaluate, next, render_json_ui, submit_patch};
use logic_spec::{
    FlowStatus, QuestionId, QuestionnaireSpec, ResponseSet, Responses, ValidationResult,
    build_render_payload, lint, questionnaire_schema, render_text, responses_schema, score,
    validate,
};
use serde_json::{Number, Value, json};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wizard::{
    AnswerParseError, PromptContext, QuestionKind, Verbosity, WizardPayload, WizardPresenter,
    WizardQuestion,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const LOG_ENV: &str = "SURVEY_LOGIC_LOG";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Questionnaire conditional logic CLI",
    long_about = "Walks, evaluates, validates and scores questionnaires whose flow is driven by conditional rules"
)]
struct Cli {
    /// Show verbose output and debug logs (logs go to stderr; SURVEY_LOGIC_LOG overrides the filter).
    #[arg(long, global = true, alias = "debug")]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SchemaKind {
    Questionnaire,
    Responses,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a questionnaire interactively, following its rules.
    Walk {
        /// Path to the questionnaire JSON.
        #[arg(long, value_name = "SPEC", env = "SURVEY_LOGIC_SPEC")]
        spec: PathBuf,
        /// Optional JSON file containing initial responses.
        #[arg(long, value_name = "RESPONSES")]
        responses: Option<PathBuf>,
        /// Also emit the collected responses as JSON.
        #[arg(long)]
        responses_json: bool,
        /// Render output mode for each step.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Show visibility, requirements and flow for a set of responses.
    Evaluate {
        /// Path to the questionnaire JSON.
        #[arg(long, value_name = "SPEC", env = "SURVEY_LOGIC_SPEC")]
        spec: PathBuf,
        /// Path to the responses JSON file.
        #[arg(long, value_name = "RESPONSES")]
        responses: PathBuf,
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Validate responses against the questions visible for them.
    Validate {
        /// Path to the questionnaire JSON.
        #[arg(long, value_name = "SPEC", env = "SURVEY_LOGIC_SPEC")]
        spec: PathBuf,
        /// Path to the responses JSON file.
        #[arg(long, value_name = "RESPONSES")]
        responses: PathBuf,
    },
    /// Total the option scores of visible questions.
    Score {
        /// Path to the questionnaire JSON.
        #[arg(long, value_name = "SPEC", env = "SURVEY_LOGIC_SPEC")]
        spec: PathBuf,
        /// Path to the responses JSON file.
        #[arg(long, value_name = "RESPONSES")]
        responses: PathBuf,
    },
    /// Report rules that can never take effect.
    Lint {
        /// Path to the questionnaire JSON.
        #[arg(long, value_name = "SPEC", env = "SURVEY_LOGIC_SPEC")]
        spec: PathBuf,
    },
    /// Print the JSON schema of questionnaire or responses documents.
    Schema {
        #[arg(value_enum, default_value_t = SchemaKind::Questionnaire)]
        kind: SchemaKind,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Walk {
            spec,
            responses,
            responses_json,
            format,
        } => run_walk(spec, responses, cli.verbose, responses_json, format),
        Command::Evaluate {
            spec,
            responses,
            format,
        } => run_evaluate(spec, responses, format),
        Command::Validate { spec, responses } => run_validate(spec, responses),
        Command::Score { spec, responses } => run_score(spec, responses),
        Command::Lint { spec } => run_lint(spec),
        Command::Schema { kind } => run_schema(kind),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

fn load_spec(path: &Path) -> CliResult<(String, QuestionnaireSpec)> {
    let raw = fs::read_to_string(path)?;
    let spec = QuestionnaireSpec::from_json(&raw)?;
    debug!(questionnaire = %spec.id, questions = spec.questions.len(), rules = spec.rules.len(), "loaded questionnaire");
    Ok((raw, spec))
}

fn load_responses(path: &Path) -> CliResult<Responses> {
    let raw = fs::read_to_string(path)?;
    Ok(Responses::from_json(&raw)?)
}

fn config_for(spec_json: &str) -> String {
    json!({ "questionnaire_json": spec_json }).to_string()
}

fn run_evaluate(spec_path: PathBuf, responses_path: PathBuf, format: RenderMode) -> CliResult<()> {
    let (spec_json, spec) = load_spec(&spec_path)?;
    let responses = load_responses(&responses_path)?;

    match format {
        RenderMode::Text => {
            println!("{}", render_text(&build_render_payload(&spec, &responses)));
        }
        RenderMode::Json => {
            let config_json = config_for(&spec_json);
            let responses_json = responses.to_value().to_string();
            let value = parse_component_result(&evaluate(&spec.id, &config_json, &responses_json))?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

fn run_validate(spec_path: PathBuf, responses_path: PathBuf) -> CliResult<()> {
    let (_, spec) = load_spec(&spec_path)?;
    let responses = load_responses(&responses_path)?;

    let result = validate(&spec, &responses);
    println!(
        "Validation result: {}",
        if result.is_valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.is_valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for (question_id, message) in &result.errors {
            println!("  {} - {}", question_id, message);
        }
    }
}

fn run_score(spec_path: PathBuf, responses_path: PathBuf) -> CliResult<()> {
    let (_, spec) = load_spec(&spec_path)?;
    let responses = load_responses(&responses_path)?;

    let summary = score(&spec, &responses);
    println!("Score: {}", summary.total);
    for (question_id, contribution) in &summary.contributions {
        println!("  {} - {}", question_id, contribution);
    }
    match &summary.band {
        Some(band) => {
            println!("Band: {}", band.label);
            if let Some(description) = &band.description {
                println!("{}", description);
            }
        }
        None => println!("Band: none"),
    }
    Ok(())
}

fn run_lint(spec_path: PathBuf) -> CliResult<()> {
    let (_, spec) = load_spec(&spec_path)?;
    let issues = lint(&spec);
    if issues.is_empty() {
        println!("No rule issues found.");
        return Ok(());
    }
    println!("Rule issues:");
    for issue in &issues {
        println!("  {}", issue);
    }
    Err(format!("{} rule issue(s) found", issues.len()).into())
}

fn run_schema(kind: SchemaKind) -> CliResult<()> {
    let schema = match kind {
        SchemaKind::Questionnaire => questionnaire_schema()?,
        SchemaKind::Responses => responses_schema()?,
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_walk(
    spec_path: PathBuf,
    responses_path: Option<PathBuf>,
    verbose: bool,
    responses_json: bool,
    format: RenderMode,
) -> CliResult<()> {
    let (spec_json, spec) = load_spec(&spec_path)?;
    let questionnaire_id = spec.id.as_str();
    let config_json = config_for(&spec_json);

    let mut responses = match responses_path {
        Some(path) => load_responses(&path)?.to_value(),
        None => json!({}),
    };
    let mut declined = BTreeSet::new();
    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), responses_json);

    loop {
        let responses_str = responses.to_string();
        let next_value = parse_component_result(&next(questionnaire_id, &config_json, &responses_str))?;
        let status = next_value["status"]
            .as_str()
            .and_then(FlowStatus::from_label)
            .ok_or("component returned an unknown flow status")?;
        if status != FlowStatus::NeedInput {
            presenter.show_completion(&response_set(&spec, &responses, status));
            break;
        }

        let ui_raw = render_json_ui(questionnaire_id, &config_json, &responses_str);
        let ui = parse_component_result(&ui_raw)?;
        print_render_output(format, &ui_raw);
        let payload =
            WizardPayload::from_json(&ui).map_err(|err| format!("wizard UI error: {}", err))?;
        presenter.show_header(&payload);
        presenter.show_status(&payload);

        let Some(question) = payload.pending_question(&declined) else {
            presenter.show_completion(&response_set(&spec, &responses, FlowStatus::Complete));
            break;
        };
        let question_id = question.id;
        let prompt = PromptContext::new(question, &payload.progress);
        let Some(answer) = prompt_question(&prompt, question, &presenter)? else {
            debug!(question_id, "optional question left unanswered");
            declined.insert(question_id);
            continue;
        };

        let value_json = serde_json::to_string(&answer)?;
        let submit_value = parse_component_result(&submit_patch(
            questionnaire_id,
            &config_json,
            &responses_str,
            question_id,
            &value_json,
        ))?;

        if submit_value["status"] == "error" {
            print_validation_errors(question_id, &submit_value);
            continue;
        }
        responses = submit_value["responses"].clone();
    }

    Ok(())
}

fn response_set(spec: &QuestionnaireSpec, responses: &Value, status: FlowStatus) -> ResponseSet {
    ResponseSet {
        questionnaire_id: spec.id.clone(),
        spec_version: spec.version.clone(),
        responses: Responses::from_value(responses),
        terminated_early: status == FlowStatus::Terminated,
    }
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

fn prompt_question(
    prompt: &PromptContext,
    question: &WizardQuestion,
    presenter: &WizardPresenter,
) -> CliResult<Option<Value>> {
    loop {
        presenter.show_prompt(prompt);
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err("input ended before the questionnaire was complete".into());
        }

        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("walk aborted by user".into());
        }

        match parse_answer(question, trimmed) {
            Ok(value) => return Ok(value),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

/// Parses typed input; `None` means an optional question was left blank.
fn parse_answer(question: &WizardQuestion, raw: &str) -> Result<Option<Value>, AnswerParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        if question.required {
            return Err(AnswerParseError::new(
                "This question requires an answer.",
                None,
            ));
        }
        return Ok(None);
    }

    let value = match question.kind {
        QuestionKind::YesNo => parse_yes_no(question, raw)?,
        QuestionKind::Choice => Value::String(parse_choice(question, raw)?),
        QuestionKind::MultiChoice => parse_multi_choice(question, raw)?,
        QuestionKind::Number => parse_number(raw)?,
        QuestionKind::Text => Value::String(raw.to_string()),
    };
    Ok(Some(value))
}

fn parse_yes_no(question: &WizardQuestion, raw: &str) -> Result<Value, AnswerParseError> {
    let answer = match raw.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => "yes",
        "false" | "f" | "no" | "n" | "0" => "no",
        _ => {
            return Err(AnswerParseError::new(
                "Please enter yes or no.",
                Some("expected yes/no (y/n/true/false)".to_string()),
            ));
        }
    };
    let values = question.option_values();
    let matched = values
        .iter()
        .find(|value| value.eq_ignore_ascii_case(answer))
        .copied()
        .unwrap_or(answer);
    Ok(Value::String(matched.to_string()))
}

fn parse_choice(question: &WizardQuestion, raw: &str) -> Result<String, AnswerParseError> {
    let allowed = question.option_values();
    if allowed.is_empty() {
        return Ok(raw.to_string());
    }

    if let Ok(index) = raw.parse::<usize>()
        && let Some(choice) = index.checked_sub(1).and_then(|index| allowed.get(index))
    {
        return Ok(choice.to_string());
    }

    if let Some(choice) = allowed
        .iter()
        .find(|choice| choice.eq_ignore_ascii_case(raw))
    {
        Ok(choice.to_string())
    } else {
        Err(AnswerParseError::new(
            format!("Choose one of: {}.", allowed.join(", ")),
            Some(format!("allowed values: {} or 1-{}", allowed.join(", "), allowed.len())),
        ))
    }
}

fn parse_multi_choice(question: &WizardQuestion, raw: &str) -> Result<Value, AnswerParseError> {
    let mut selected = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let choice = parse_choice(question, part)?;
        if !selected.contains(&choice) {
            selected.push(choice);
        }
    }
    Ok(Value::Array(selected.into_iter().map(Value::String).collect()))
}

fn parse_number(raw: &str) -> Result<Value, AnswerParseError> {
    if let Ok(integer) = raw.parse::<i64>() {
        return Ok(Value::Number(Number::from(integer)));
    }
    raw.parse::<f64>()
        .map_err(|_| {
            AnswerParseError::new(
                "Please enter a number.",
                Some("expected number".to_string()),
            )
        })
        .and_then(|value| {
            Number::from_f64(value).map(Value::Number).ok_or_else(|| {
                AnswerParseError::new(
                    "Please enter a finite number.",
                    Some("number must be finite".to_string()),
                )
            })
        })
}

fn print_validation_errors(question_id: QuestionId, response: &Value) {
    let message = response["validation"]["errors"][question_id.to_string()]
        .as_str()
        .unwrap_or("validation failed");
    eprintln!("Validation errors:");
    eprintln!("  {}: {}", question_id, message);
}

fn print_render_output(mode: RenderMode, ui: &str) {
    match mode {
        RenderMode::Text => {}
        RenderMode::Json => println!("JSON UI:\n{}", ui),
    }
}
