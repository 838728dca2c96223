use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

/// Envelope shared by every submission: who answered which test, with which token.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestAnswer {
    pub id: i32,
    pub test_name: String,
    pub person_id: String,
    pub token: Option<String>,
    pub answer_set: Option<JsonValue>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EvaluableTestAnswer {
    pub id: i32,
    pub was_evaluated_with_token: bool,
    pub test_answer_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EvaluableQuestionAnswer {
    pub id: i32,
    pub evaluable_test_answer_id: i32,
    pub question_id: i32,
    pub answer: JsonValue,
}
