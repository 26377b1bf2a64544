use serde_json::json;

use logic_spec::{
    FlowStatus, QuestionnaireSpec, Responses, build_render_payload, render_json_ui, render_text,
};

fn fixture() -> QuestionnaireSpec {
    QuestionnaireSpec::from_json(include_str!("fixtures/wellbeing_screening.json"))
        .expect("deserialize")
}

#[test]
fn render_text_includes_next_question() {
    let spec = fixture();
    let payload = build_render_payload(&spec, &Responses::new());

    assert_eq!(payload.status, FlowStatus::NeedInput);
    assert_eq!(payload.next_question_id, Some(1));

    let text = render_text(&payload);
    assert!(text.contains("Next question: 1"));
    assert!(text.contains("Visible questions"));
    assert!(text.contains("Options: yes, no"));
}

#[test]
fn skip_rule_moves_next_question_forward() {
    let spec = fixture();
    let responses = Responses::from_value(&json!({
        "1": "yes",
        "2": "no",
        "4": "not_at_all"
    }));
    let payload = build_render_payload(&spec, &responses);

    assert_eq!(payload.next_question_id, Some(7));
    assert!(payload.question(5).is_some_and(|question| question.skipped));
    assert!(payload.question(3).is_some_and(|question| !question.visible));
    assert_eq!(payload.progress.answered, 3);
    assert_eq!(payload.progress.total, 7);
}

#[test]
fn declined_consent_terminates() {
    let spec = fixture();
    let responses = Responses::from_value(&json!({ "1": "no" }));
    let payload = build_render_payload(&spec, &responses);

    assert_eq!(payload.status, FlowStatus::Terminated);
    assert_eq!(payload.next_question_id, None);
    assert!(render_text(&payload).contains("ended early"));
}

#[test]
fn render_json_ui_exposes_structure() {
    let spec = fixture();
    let responses = Responses::from_value(&json!({ "1": "yes", "7": "yes" }));
    let payload = build_render_payload(&spec, &responses);

    let ui = render_json_ui(&payload);
    assert_eq!(ui["questionnaire_id"], "wellbeing-screening");
    assert_eq!(ui["status"], "need_input");
    assert_eq!(ui["next_question_id"], 2);
    let questions = ui["questions"].as_array().expect("questions array");
    let contact = questions
        .iter()
        .find(|question| question["id"] == 8)
        .expect("contact question");
    assert_eq!(contact["required"], true);
    assert_eq!(contact["visible"], true);
    assert_eq!(questions[3]["options"][0]["label"], "Not at all");
}
