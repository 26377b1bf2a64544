use schemars::schema_for;
use serde_json::Value;

use crate::error::SpecError;
use crate::responses::Responses;
use crate::spec::questionnaire::QuestionnaireSpec;

/// JSON Schema describing questionnaire documents.
pub fn questionnaire_schema() -> Result<Value, SpecError> {
    serde_json::to_value(schema_for!(QuestionnaireSpec)).map_err(SpecError::JsonEncode)
}

/// JSON Schema describing response documents.
pub fn responses_schema() -> Result<Value, SpecError> {
    serde_json::to_value(schema_for!(Responses)).map_err(SpecError::JsonEncode)
}
