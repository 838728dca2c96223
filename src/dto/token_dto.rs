use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::token::{NewToken, UsageBudget};

#[derive(Debug, Clone, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

impl TokenQuery {
    /// The `token` query parameter, rejected with 400 when absent or blank.
    pub fn require(self) -> crate::error::Result<String> {
        match self.token {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(crate::error::Error::BadRequest("Token missing.".to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTokenPayload {
    /// Absent or `null` for unlimited use.
    #[validate(range(min = 1))]
    pub max_usage_count: Option<i32>,
    #[validate(length(min = 1))]
    pub personal_data_test_name: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub pre_collect_test_names: Vec<String>,
    #[validate(length(min = 1))]
    pub evaluable_test_name: String,
    pub creation_timestamp: Option<DateTime<Utc>>,
}

impl From<CreateTokenPayload> for NewToken {
    fn from(payload: CreateTokenPayload) -> Self {
        Self {
            usage: UsageBudget::from(payload.max_usage_count),
            personal_data_test_name: payload.personal_data_test_name,
            pre_collect_test_names: payload.pre_collect_test_names,
            evaluable_test_name: payload.evaluable_test_name,
            creation_timestamp: payload.creation_timestamp,
        }
    }
}
