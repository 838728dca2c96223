use axum::{
    extract::{Query, State},
    response::Json,
};
use serde_json::Value as JsonValue;

use crate::dto::token_dto::TokenQuery;
use crate::error::Result;
use crate::AppState;

/// Description documents of every test the token grants.
#[axum::debug_handler]
pub async fn get_tests(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Vec<JsonValue>>> {
    let request_token = query.require()?;
    let token = state.token_service.authorize(&request_token).await?;
    let tests = state.token_service.granted_tests(&token).await?;

    let test_names = tests
        .iter()
        .map(|test| test.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    tracing::info!("Requested tests '{}' with token '{}'.", test_names, token.token);

    Ok(Json(tests.into_iter().map(|test| test.description).collect()))
}
