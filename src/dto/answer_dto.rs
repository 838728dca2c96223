use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::models::answer::{EvaluableQuestionAnswer, EvaluableTestAnswer, TestAnswer};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitCollectedAnswerRequest {
    #[validate(length(min = 1, max = 200))]
    pub person_id: String,
    #[validate(length(min = 1))]
    pub test_name: String,
    pub answer_set: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnswerInput {
    pub question_id: i32,
    pub answer: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitEvaluableAnswerRequest {
    #[validate(length(min = 1, max = 200))]
    pub person_id: String,
    #[validate(length(min = 1))]
    pub question_answers: Vec<QuestionAnswerInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluableAnswerResponse {
    pub test_answer: TestAnswer,
    pub evaluable_test_answer: EvaluableTestAnswer,
    pub question_answers: Vec<EvaluableQuestionAnswer>,
    /// Uses left on the token afterwards; `null` when unlimited.
    pub remaining_uses: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitPersonalityAnswerRequest {
    #[validate(length(min = 1))]
    pub personality_test_name: String,
    #[validate(length(min = 1, max = 200))]
    pub person_id: String,
    pub answer_set: JsonValue,
}
