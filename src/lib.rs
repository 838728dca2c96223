pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::middleware::{
    auth::{require_admin, AdminAuth},
    cors::api_cors,
    rate_limit::{rps_middleware, RateLimiter},
};
use crate::services::{
    answer_service::AnswerService, test_service::TestService, token_service::TokenService,
};
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::path::Path;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub const API_PREFIX: &str = "/api";
pub const DEFAULT_INDEX_FILE: &str = "index.html";

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub test_service: TestService,
    pub token_service: TokenService,
    pub answer_service: AnswerService,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        let test_service = TestService::new(pool.clone());
        let token_service = TokenService::new(
            pool.clone(),
            config.token_generation_max_tries,
            config.remove_expired_tokens,
        );
        let answer_service = AnswerService::new(pool.clone(), config.remove_expired_tokens);

        Self {
            pool,
            test_service,
            token_service,
            answer_service,
        }
    }
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let base_routes = Router::new().route("/health", get(routes::health::health));

    let public_api = Router::new()
        .route(
            &format!("{API_PREFIX}/tests/"),
            get(routes::test_routes::get_tests),
        )
        .route(
            &format!("{API_PREFIX}/answers/"),
            post(routes::answers::submit_collected_answer),
        )
        .route(
            &format!("{API_PREFIX}/answers/evaluable"),
            post(routes::answers::submit_evaluable_answer),
        )
        .route(
            &format!("{API_PREFIX}/personality-test-answers/"),
            post(routes::answers::submit_personality_answer),
        )
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::new("public", config.public_rps),
            rps_middleware,
        ));

    let admin_api = Router::new()
        .route(
            &format!("{API_PREFIX}/admin/tests"),
            get(routes::admin::list_tests).post(routes::admin::create_test),
        )
        .route(
            &format!("{API_PREFIX}/admin/tests/:name"),
            get(routes::admin::get_test)
                .patch(routes::admin::update_test)
                .delete(routes::admin::delete_test),
        )
        .route(
            &format!("{API_PREFIX}/admin/tokens"),
            get(routes::admin::list_tokens).post(routes::admin::create_token),
        )
        .route(
            &format!("{API_PREFIX}/admin/tokens/:token"),
            get(routes::admin::get_token).delete(routes::admin::delete_token),
        )
        .route(
            &format!("{API_PREFIX}/admin/tokens/:token/answers"),
            get(routes::admin::list_token_answers),
        )
        .route(
            &format!("{API_PREFIX}/admin/evaluable-answers/:id"),
            get(routes::admin::get_evaluable_answer),
        )
        .layer(axum::middleware::from_fn_with_state(
            AdminAuth::new(&config.jwt_secret),
            require_admin,
        ))
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::new("admin", config.admin_rps),
            rps_middleware,
        ));

    let static_dir = Path::new(&config.static_dir);
    let frontend = ServeDir::new(static_dir)
        .fallback(ServeFile::new(static_dir.join(DEFAULT_INDEX_FILE)));

    base_routes
        .merge(public_api)
        .merge(admin_api)
        .fallback_service(frontend)
        .with_state(state)
        .layer(api_cors())
        .layer(TraceLayer::new_for_http())
}
