#![allow(missing_docs)]

pub mod builders;
pub mod condition;
pub mod error;
pub mod evaluator;
pub mod flow;
pub mod lint;
pub mod render;
pub mod responses;
pub mod schema;
pub mod scoring;
pub mod spec;
pub mod validate;

pub use builders::{RuleBuilder, RuleIdGenerator, SequentialIds};
pub use condition::condition_holds;
pub use error::SpecError;
pub use evaluator::{LogicEvaluator, ResolvedQuestion, VisibilityMap};
pub use flow::{FlowState, FlowStatus, Progress, flow_state, next_question, reachable_questions};
pub use lint::{RuleIssue, lint};
pub use render::{
    RenderPayload, RenderQuestion, build_render_payload, render_json_ui, render_text,
};
pub use responses::{ResponseSet, Responses};
pub use schema::{questionnaire_schema, responses_schema};
pub use scoring::{ScoreSummary, score};
pub use spec::{
    ConditionalRule, Constraint, Operator, Question, QuestionId, QuestionOption, QuestionType,
    QuestionnaireSpec, RuleAction, RuleId, ScoreBand, ScoringSpec,
};
pub use validate::{REQUIRED_MESSAGE, SELECT_ONE_MESSAGE, ValidationResult, validate};
