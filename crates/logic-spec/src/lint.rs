use std::collections::BTreeSet;

use regex::Regex;
use thiserror::Error;

use crate::spec::question::QuestionId;
use crate::spec::questionnaire::QuestionnaireSpec;
use crate::spec::rule::{Operator, RuleAction, RuleId};

/// Structural problems in a questionnaire's rules.
///
/// Evaluation never fails on these; affected rules are simply inert or
/// never hold. Linting surfaces them to the author instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleIssue {
    #[error("rule '{rule}' uses action '{action}' but has no targetQuestionId")]
    MissingTarget { rule: RuleId, action: RuleAction },
    #[error("rule '{rule}' ends the survey and must not carry a targetQuestionId")]
    UnexpectedTarget { rule: RuleId },
    #[error("rule '{rule}' reads unknown question {question}")]
    UnknownSource { rule: RuleId, question: QuestionId },
    #[error("rule '{rule}' targets unknown question {question}")]
    UnknownTarget { rule: RuleId, question: QuestionId },
    #[error("rule '{rule}' uses 'in' with a value that is not a list")]
    InValueNotList { rule: RuleId },
    #[error("rule id '{rule}' is declared more than once")]
    DuplicateRule { rule: RuleId },
    #[error("question id {question} is declared more than once")]
    DuplicateQuestion { question: QuestionId },
    #[error("question {question} has an invalid answer pattern '{pattern}': {reason}")]
    InvalidPattern {
        question: QuestionId,
        pattern: String,
        reason: String,
    },
}

/// Reports every structural issue, in declaration order.
pub fn lint(spec: &QuestionnaireSpec) -> Vec<RuleIssue> {
    let mut issues = Vec::new();

    let mut question_ids = BTreeSet::new();
    for question in &spec.questions {
        if !question_ids.insert(question.id) {
            issues.push(RuleIssue::DuplicateQuestion {
                question: question.id,
            });
        }

        if let Some(pattern) = question
            .constraint
            .as_ref()
            .and_then(|constraint| constraint.pattern.as_ref())
            && let Err(err) = Regex::new(pattern)
        {
            issues.push(RuleIssue::InvalidPattern {
                question: question.id,
                pattern: pattern.clone(),
                reason: err.to_string(),
            });
        }
    }

    let mut rule_ids = BTreeSet::new();
    for rule in &spec.rules {
        if !rule_ids.insert(rule.id.as_str()) {
            issues.push(RuleIssue::DuplicateRule {
                rule: rule.id.clone(),
            });
        }

        if !question_ids.contains(&rule.question_id) {
            issues.push(RuleIssue::UnknownSource {
                rule: rule.id.clone(),
                question: rule.question_id,
            });
        }

        match (rule.action.needs_target(), rule.target_question_id) {
            (true, None) => issues.push(RuleIssue::MissingTarget {
                rule: rule.id.clone(),
                action: rule.action,
            }),
            (true, Some(target)) if !question_ids.contains(&target) => {
                issues.push(RuleIssue::UnknownTarget {
                    rule: rule.id.clone(),
                    question: target,
                })
            }
            (false, Some(_)) => issues.push(RuleIssue::UnexpectedTarget {
                rule: rule.id.clone(),
            }),
            _ => {}
        }

        if rule.operator == Operator::In && !rule.value.is_array() {
            issues.push(RuleIssue::InValueNotList {
                rule: rule.id.clone(),
            });
        }
    }

    issues
}
