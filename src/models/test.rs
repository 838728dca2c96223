use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Test {
    pub name: String,
    pub description: JsonValue,
    pub evaluation: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Arranges `tests` in the order of `names`. Names without a matching test are
/// skipped; a name listed twice yields its test twice.
pub fn order_by_names(names: &[String], tests: Vec<Test>) -> Vec<Test> {
    let by_name: HashMap<String, Test> = tests
        .into_iter()
        .map(|test| (test.name.clone(), test))
        .collect();
    names
        .iter()
        .filter_map(|name| by_name.get(name).cloned())
        .collect()
}

#[cfg(test)]
pub(crate) fn sample(name: &str) -> Test {
    let now = Utc::now();
    Test {
        name: name.to_string(),
        description: serde_json::json!({ "title": name }),
        evaluation: None,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_requested_order_and_skips_missing() {
        let names: Vec<String> = ["C", "A", "gone", "B"].iter().map(|s| s.to_string()).collect();
        let ordered = order_by_names(&names, vec![sample("A"), sample("B"), sample("C")]);
        let got: Vec<&str> = ordered.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(got, ["C", "A", "B"]);
    }

    #[test]
    fn ignores_tests_that_were_not_asked_for() {
        let names = vec!["A".to_string()];
        let ordered = order_by_names(&names, vec![sample("A"), sample("Z")]);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].name, "A");
    }
}
