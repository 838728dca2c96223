use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::dto::answer_dto::{
    SubmitCollectedAnswerRequest, SubmitEvaluableAnswerRequest, SubmitPersonalityAnswerRequest,
};
use crate::dto::token_dto::TokenQuery;
use crate::error::Result;
use crate::AppState;

#[axum::debug_handler]
pub async fn submit_collected_answer(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    Json(req): Json<SubmitCollectedAnswerRequest>,
) -> Result<impl IntoResponse> {
    let request_token = query.require()?;
    req.validate()?;
    let token = state.token_service.authorize(&request_token).await?;
    let answer = state.answer_service.submit_collected(&token, req).await?;
    Ok((StatusCode::CREATED, Json(answer)))
}

#[axum::debug_handler]
pub async fn submit_evaluable_answer(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    Json(req): Json<SubmitEvaluableAnswerRequest>,
) -> Result<impl IntoResponse> {
    let request_token = query.require()?;
    req.validate()?;
    let stored = state
        .answer_service
        .submit_evaluable(&request_token, &req.person_id, req.question_answers)
        .await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

#[axum::debug_handler]
pub async fn submit_personality_answer(
    State(state): State<AppState>,
    Json(req): Json<SubmitPersonalityAnswerRequest>,
) -> Result<impl IntoResponse> {
    req.validate()?;
    let answer = state.answer_service.submit_personality_answer(req).await?;
    Ok((StatusCode::CREATED, Json(answer)))
}
