use proptest::prelude::*;
use serde_json::{Value, json};

use logic_spec::{
    ConditionalRule, LogicEvaluator, Operator, Question, QuestionType, Responses, RuleAction,
    RuleBuilder, SELECT_ONE_MESSAGE,
};

fn questions(count: i64) -> Vec<Question> {
    (1..=count)
        .map(|id| Question::new(id, format!("Question {id}")))
        .collect()
}

#[test]
fn show_after_hide_keeps_target_visible() {
    let mut builder = RuleBuilder::default();
    let rules = vec![builder.hide_if(1, "no", 2), builder.show_if(1, "yes", 2)];
    let responses = Responses::new().with(1, "yes");
    let questions = questions(2);

    let visible = LogicEvaluator::new(&rules, &responses).visible_questions(&questions);
    assert_eq!(visible.len(), 2);
    assert!(visible.iter().any(|entry| entry.id() == 2));
}

#[test]
fn unmet_require_rule_requires_nothing() {
    let mut builder = RuleBuilder::default();
    let rules = vec![builder.require_if(1, "yes", 2)];
    let responses = Responses::new().with(1, "no");
    let evaluator = LogicEvaluator::new(&rules, &responses);
    assert!(evaluator.conditionally_required_questions().is_empty());
}

#[test]
fn end_survey_rule_terminates_only_on_match() {
    let mut builder = RuleBuilder::default();
    let rules = vec![builder.end_survey_if(1, "terminate")];

    let terminate = Responses::new().with(1, "terminate");
    assert!(LogicEvaluator::new(&rules, &terminate).should_end_survey());

    let carry_on = Responses::new().with(1, "continue");
    assert!(!LogicEvaluator::new(&rules, &carry_on).should_end_survey());
}

#[test]
fn empty_multiple_choice_needs_a_selection() {
    let questions = vec![
        Question::new(1, "Which apply?")
            .with_kind(QuestionType::MultipleChoice)
            .with_required(true),
    ];
    let responses = Responses::new().with(1, json!([]));
    let result = LogicEvaluator::new(&[], &responses).validate_conditional_responses(&questions);
    assert!(!result.is_valid);
    assert_eq!(result.errors[&1], SELECT_ONE_MESSAGE);
}

#[test]
fn score_threshold_and_contains_helpers_show_targets() {
    let mut builder = RuleBuilder::default();
    let rules = vec![
        builder.hide_if(9, "never", 3),
        builder.show_if_score_above(1, 10.0, 3),
        builder.hide_if(9, "never", 4),
        builder.show_if_contains(2, "sleep", 4),
    ];
    let questions = questions(4);

    let responses = Responses::new()
        .with(9, "never")
        .with(1, 14)
        .with(2, json!(["appetite", "sleep"]));
    let visible = LogicEvaluator::new(&rules, &responses).visible_questions(&questions);
    assert_eq!(visible.iter().map(|entry| entry.id()).collect::<Vec<_>>(), vec![1, 2, 3, 4]);

    let responses = Responses::new()
        .with(9, "never")
        .with(1, 4)
        .with(2, json!(["appetite"]));
    let visible = LogicEvaluator::new(&rules, &responses).visible_questions(&questions);
    assert_eq!(visible.iter().map(|entry| entry.id()).collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn rules_deserialize_from_wire_format() {
    let rules: Vec<ConditionalRule> = serde_json::from_value(json!([
        { "id": "a", "questionId": 1, "operator": "in", "value": ["x", "y"], "targetQuestionId": 2, "action": "hide" },
        { "id": "b", "questionId": 1, "operator": "not_equals", "value": "x", "action": "end_survey" }
    ]))
    .expect("rules");
    assert_eq!(rules[0].operator, Operator::In);
    assert_eq!(rules[1].action, RuleAction::EndSurvey);

    let responses = Responses::new().with(1, "y");
    let evaluator = LogicEvaluator::new(&rules, &responses);
    assert_eq!(evaluator.visible_questions(&questions(2)).len(), 1);
    assert!(evaluator.should_end_survey());
}

fn operator_strategy() -> impl Strategy<Value = Operator> {
    prop_oneof![
        Just(Operator::Equals),
        Just(Operator::NotEquals),
        Just(Operator::GreaterThan),
        Just(Operator::LessThan),
        Just(Operator::Contains),
        Just(Operator::In),
    ]
}

fn action_strategy() -> impl Strategy<Value = RuleAction> {
    prop_oneof![
        Just(RuleAction::Show),
        Just(RuleAction::Hide),
        Just(RuleAction::Require),
        Just(RuleAction::SkipTo),
        Just(RuleAction::EndSurvey),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::sample::select(vec!["yes", "no", "sleep"]).prop_map(Value::from),
        (0i64..5).prop_map(Value::from),
        Just(json!(["yes", "sleep"])),
        Just(json!(true)),
    ]
}

fn rule_strategy() -> impl Strategy<Value = ConditionalRule> {
    (
        1i64..6,
        operator_strategy(),
        value_strategy(),
        action_strategy(),
        prop::option::of(1i64..8),
    )
        .prop_map(|(question_id, operator, value, action, target)| {
            ConditionalRule::new("generated", question_id, operator, value, action, target)
        })
}

fn responses_strategy() -> impl Strategy<Value = Responses> {
    prop::collection::vec((1i64..6, value_strategy()), 0..6)
        .prop_map(|answers| answers.into_iter().collect())
}

proptest! {
    #[test]
    fn visible_questions_are_an_ordered_subset(
        rules in prop::collection::vec(rule_strategy(), 0..8),
        responses in responses_strategy(),
    ) {
        let questions = questions(6);
        let evaluator = LogicEvaluator::new(&rules, &responses);
        let visible = evaluator.visible_questions(&questions);

        let ids = visible.iter().map(|entry| entry.id()).collect::<Vec<_>>();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(&ids, &sorted);
        prop_assert!(ids.iter().all(|id| (1..=6).contains(id)));

        let again = LogicEvaluator::new(&rules, &responses).visible_questions(&questions);
        prop_assert_eq!(visible, again);
    }

    #[test]
    fn hidden_questions_never_fail_validation(
        rules in prop::collection::vec(rule_strategy(), 0..8),
        responses in responses_strategy(),
    ) {
        let questions = questions(6)
            .into_iter()
            .map(|question| question.with_required(true))
            .collect::<Vec<_>>();
        let evaluator = LogicEvaluator::new(&rules, &responses);
        let visible = evaluator
            .visible_questions(&questions)
            .iter()
            .map(|entry| entry.id())
            .collect::<Vec<_>>();
        let result = evaluator.validate_conditional_responses(&questions);
        prop_assert!(result.errors.keys().all(|id| visible.contains(id)));
    }

    #[test]
    fn end_survey_matches_any_holding_rule(
        rules in prop::collection::vec(rule_strategy(), 0..8),
        responses in responses_strategy(),
    ) {
        let evaluator = LogicEvaluator::new(&rules, &responses);
        let expected = rules
            .iter()
            .any(|rule| rule.action == RuleAction::EndSurvey && evaluator.holds(rule));
        prop_assert_eq!(evaluator.should_end_survey(), expected);
    }
}
