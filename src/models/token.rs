use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::test::{order_by_names, Test};

/// Remaining uses of a token. Serialized as the nullable `max_usage_count`
/// column: `null` is unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<i32>", into = "Option<i32>")]
pub enum UsageBudget {
    Unlimited,
    Finite(i32),
}

impl UsageBudget {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, UsageBudget::Finite(remaining) if *remaining <= 0)
    }

    /// Budget after one use. Finite budgets are not clamped at zero.
    pub fn consumed(self) -> Self {
        match self {
            UsageBudget::Finite(remaining) => UsageBudget::Finite(remaining.saturating_sub(1)),
            UsageBudget::Unlimited => UsageBudget::Unlimited,
        }
    }

    pub fn remaining(&self) -> Option<i32> {
        (*self).into()
    }
}

impl From<Option<i32>> for UsageBudget {
    fn from(value: Option<i32>) -> Self {
        match value {
            Some(remaining) => UsageBudget::Finite(remaining),
            None => UsageBudget::Unlimited,
        }
    }
}

impl From<UsageBudget> for Option<i32> {
    fn from(value: UsageBudget) -> Self {
        match value {
            UsageBudget::Finite(remaining) => Some(remaining),
            UsageBudget::Unlimited => None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TokenRow {
    pub token: String,
    pub max_usage_count: Option<i32>,
    pub personal_data_test_name: String,
    pub pre_collect_test_names: Vec<String>,
    pub evaluable_test_name: String,
    pub creation_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub token: String,
    #[serde(rename = "max_usage_count")]
    pub usage: UsageBudget,
    pub personal_data_test_name: String,
    pub pre_collect_test_names: Vec<String>,
    pub evaluable_test_name: String,
    pub creation_timestamp: DateTime<Utc>,
}

impl From<TokenRow> for Token {
    fn from(row: TokenRow) -> Self {
        Self {
            token: row.token,
            usage: row.max_usage_count.into(),
            personal_data_test_name: row.personal_data_test_name,
            pre_collect_test_names: row.pre_collect_test_names,
            evaluable_test_name: row.evaluable_test_name,
            creation_timestamp: row.creation_timestamp,
        }
    }
}

impl Token {
    pub fn is_expired(&self) -> bool {
        self.usage.is_exhausted()
    }

    pub fn record_usage(&mut self) {
        self.usage = self.usage.consumed();
    }

    /// Every test the token grants, in the order a respondent takes them.
    pub fn granted_test_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.pre_collect_test_names.len() + 2);
        names.push(self.personal_data_test_name.clone());
        names.extend(self.pre_collect_test_names.iter().cloned());
        names.push(self.evaluable_test_name.clone());
        names
    }

    /// Whether answers for `test_name` are collected (not evaluated) under this token.
    pub fn collects(&self, test_name: &str) -> bool {
        test_name == self.personal_data_test_name
            || self.pre_collect_test_names.iter().any(|name| name == test_name)
    }

    /// Resolved pre-collect tests in configured order; stale names are dropped.
    pub fn pre_collect_tests(&self, resolved: Vec<Test>) -> Vec<Test> {
        order_by_names(&self.pre_collect_test_names, resolved)
    }
}

#[derive(Debug, Clone)]
pub struct NewToken {
    pub usage: UsageBudget,
    pub personal_data_test_name: String,
    pub pre_collect_test_names: Vec<String>,
    pub evaluable_test_name: String,
    pub creation_timestamp: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test::sample;

    fn token(usage: UsageBudget, pre_collect: &[&str]) -> Token {
        Token {
            token: "abc".into(),
            usage,
            personal_data_test_name: "personal".into(),
            pre_collect_test_names: pre_collect.iter().map(|s| s.to_string()).collect(),
            evaluable_test_name: "T1".into(),
            creation_timestamp: Utc::now(),
        }
    }

    #[test]
    fn finite_budget_counts_down_past_zero() {
        let mut t = token(UsageBudget::Finite(3), &[]);
        for _ in 0..5 {
            t.record_usage();
        }
        assert_eq!(t.usage, UsageBudget::Finite(-2));
        assert!(t.is_expired());
    }

    #[test]
    fn unlimited_budget_never_expires() {
        let mut t = token(UsageBudget::Unlimited, &[]);
        for _ in 0..100 {
            t.record_usage();
        }
        assert_eq!(t.usage, UsageBudget::Unlimited);
        assert!(!t.is_expired());
    }

    #[test]
    fn expiry_is_reached_at_zero() {
        assert!(!token(UsageBudget::Finite(1), &[]).is_expired());
        assert!(token(UsageBudget::Finite(0), &[]).is_expired());
        assert!(token(UsageBudget::Finite(-1), &[]).is_expired());
    }

    #[test]
    fn single_use_token_expires_after_one_use() {
        let mut t = token(UsageBudget::Finite(1), &[]);
        t.record_usage();
        assert_eq!(t.usage.remaining(), Some(0));
        assert!(t.is_expired());
    }

    #[test]
    fn stale_pre_collect_names_are_dropped() {
        let t = token(UsageBudget::Unlimited, &["A", "B"]);
        let resolved = t.pre_collect_tests(vec![sample("A")]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "A");
    }

    #[test]
    fn pre_collect_tests_follow_configured_order() {
        let t = token(UsageBudget::Unlimited, &["B", "A"]);
        let resolved = t.pre_collect_tests(vec![sample("A"), sample("B")]);
        let names: Vec<&str> = resolved.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
    }

    #[test]
    fn granted_names_list_personal_then_pre_collect_then_evaluable() {
        let t = token(UsageBudget::Unlimited, &["A", "B"]);
        assert_eq!(t.granted_test_names(), ["personal", "A", "B", "T1"]);
        assert!(t.collects("personal"));
        assert!(t.collects("B"));
        assert!(!t.collects("T1"));
    }

    #[test]
    fn budget_serializes_as_nullable_count() {
        assert_eq!(serde_json::to_value(UsageBudget::Unlimited).unwrap(), serde_json::Value::Null);
        assert_eq!(serde_json::to_value(UsageBudget::Finite(4)).unwrap(), serde_json::json!(4));
        let parsed: UsageBudget = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, UsageBudget::Unlimited);
    }
}
