use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SpecError;
use crate::spec::question::QuestionId;

/// Answers keyed by question id.
///
/// On the wire this is a JSON object whose keys are decimal question ids.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Responses(BTreeMap<QuestionId, Value>);

impl Responses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(raw: &str) -> Result<Self, SpecError> {
        serde_json::from_str(raw).map_err(SpecError::Responses)
    }

    /// Lenient conversion used at component boundaries: anything other
    /// than an object yields no answers, and keys that are not integers
    /// are dropped.
    pub fn from_value(value: &Value) -> Self {
        let answers = value
            .as_object()
            .map(|map| {
                map.iter()
                    .filter_map(|(key, answer)| {
                        key.trim()
                            .parse::<QuestionId>()
                            .ok()
                            .map(|id| (id, answer.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self(answers)
    }

    pub fn to_value(&self) -> Value {
        let map = self
            .0
            .iter()
            .map(|(id, answer)| (id.to_string(), answer.clone()))
            .collect::<Map<_, _>>();
        Value::Object(map)
    }

    pub fn get(&self, id: QuestionId) -> Option<&Value> {
        self.0.get(&id)
    }

    pub fn insert(&mut self, id: QuestionId, answer: impl Into<Value>) -> Option<Value> {
        self.0.insert(id, answer.into())
    }

    pub fn with(mut self, id: QuestionId, answer: impl Into<Value>) -> Self {
        self.insert(id, answer);
        self
    }

    /// True when the question has a non-empty answer.
    pub fn is_answered(&self, id: QuestionId) -> bool {
        !is_blank(self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(QuestionId, Value)> for Responses {
    fn from_iter<T: IntoIterator<Item = (QuestionId, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Absent, null, empty strings and empty lists count as unanswered.
pub fn is_blank(answer: Option<&Value>) -> bool {
    match answer {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Completed responses for one questionnaire session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSet {
    pub questionnaire_id: String,
    pub spec_version: String,
    pub responses: Responses,
    #[serde(default)]
    pub terminated_early: bool,
}

impl ResponseSet {
    pub fn to_cbor(&self) -> Result<Vec<u8>, SpecError> {
        serde_cbor::to_vec(self).map_err(SpecError::CborEncode)
    }

    pub fn to_json_pretty(&self) -> Result<String, SpecError> {
        serde_json::to_string_pretty(self).map_err(SpecError::JsonEncode)
    }
}
