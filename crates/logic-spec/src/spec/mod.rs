pub mod question;
pub mod questionnaire;
pub mod rule;

pub use question::{Constraint, Question, QuestionId, QuestionOption, QuestionType};
pub use questionnaire::{QuestionnaireSpec, ScoreBand, ScoringSpec};
pub use rule::{ConditionalRule, Operator, RuleAction, RuleId};
