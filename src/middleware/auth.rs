use crate::error::Error;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

/// Verifies HS256 bearer tokens for the administration routes.
#[derive(Clone)]
pub struct AdminAuth {
    key: Arc<DecodingKey>,
    allowed_roles: Arc<[&'static str]>,
}

impl AdminAuth {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            key: Arc::new(DecodingKey::from_secret(jwt_secret.as_bytes())),
            allowed_roles: Arc::from(["admin"].as_slice()),
        }
    }

    fn decode(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<Claims>(token, &self.key, &validation)
            .ok()
            .map(|data| data.claims)
    }

    fn allows(&self, claims: &Claims) -> bool {
        let role = claims.role.as_deref().unwrap_or_default();
        self.allowed_roles
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(role))
    }
}

fn unauthorized(code: &str) -> Response {
    Error::Unauthorized(code.to_string()).into_response()
}

pub async fn require_admin(
    State(auth): State<AdminAuth>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return unauthorized("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized("unsupported_scheme");
    };

    let Some(claims) = auth.decode(token) else {
        return unauthorized("invalid_token");
    };
    if !auth.allows(&claims) {
        tracing::warn!(sub = %claims.sub, "Admin route refused for role {:?}", claims.role);
        return Error::Forbidden("forbidden".to_string()).into_response();
    }

    req.extensions_mut().insert(claims);
    next.run(req).await
}
