use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use validator::Validate;

use crate::dto::test_dto::{CreateTestPayload, UpdateTestPayload};
use crate::dto::token_dto::CreateTokenPayload;
use crate::error::Result;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_tests(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let tests = state.test_service.list_tests().await?;
    Ok(Json(tests))
}

#[axum::debug_handler]
pub async fn create_test(
    State(state): State<AppState>,
    Json(payload): Json<CreateTestPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let test = state.test_service.create_test(payload).await?;
    Ok((StatusCode::CREATED, Json(test)))
}

#[axum::debug_handler]
pub async fn get_test(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    let test = state.test_service.get_test_by_name(&name).await?;
    Ok(Json(test))
}

#[axum::debug_handler]
pub async fn update_test(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<UpdateTestPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let test = state.test_service.update_test(&name, payload).await?;
    Ok(Json(test))
}

#[axum::debug_handler]
pub async fn delete_test(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    state.test_service.delete_test(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn list_tokens(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let tokens = state.token_service.list().await?;
    Ok(Json(tokens))
}

#[axum::debug_handler]
pub async fn create_token(
    State(state): State<AppState>,
    Json(payload): Json<CreateTokenPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let token = state.token_service.generate(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(token)))
}

#[axum::debug_handler]
pub async fn get_token(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse> {
    let token = state.token_service.get(&hash).await?;
    let pre_collect_tests = state.token_service.pre_collect_tests(&token).await?;
    let resolved: Vec<&str> = pre_collect_tests.iter().map(|t| t.name.as_str()).collect();
    Ok(Json(json!({
        "token": token,
        "expired": token.is_expired(),
        "resolved_pre_collect_test_names": resolved,
    })))
}

#[axum::debug_handler]
pub async fn delete_token(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse> {
    state.token_service.delete(&hash).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn list_token_answers(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse> {
    let answers = state.answer_service.list_answers_for_token(&hash).await?;
    Ok(Json(answers))
}

#[axum::debug_handler]
pub async fn get_evaluable_answer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let answer = state.answer_service.get_evaluable_answer(id).await?;
    Ok(Json(answer))
}
