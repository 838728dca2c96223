use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTestPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: JsonValue,
    pub evaluation: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTestPayload {
    pub description: Option<JsonValue>,
    pub evaluation: Option<JsonValue>,
}
