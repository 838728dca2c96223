use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PersonalityTestAnswer {
    pub answer_id: i32,
    pub date: Option<DateTime<Utc>>,
    pub answer_set: Option<JsonValue>,
    pub personality_test_name: Option<String>,
    pub person_id: Option<String>,
}
