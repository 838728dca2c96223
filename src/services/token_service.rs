use crate::error::{Error, Result};
use crate::models::answer::EvaluableTestAnswer;
use crate::models::test::{order_by_names, Test};
use crate::models::token::{NewToken, Token, TokenRow, UsageBudget};
use crate::services::test_service;
use crate::utils::{time, token::claim_unique_hash};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

pub(crate) const UNAUTHORIZED_TOKEN: &str = "Token doesn't exist or is expired.";

pub async fn find_token(conn: &mut PgConnection, hash: &str) -> Result<Option<Token>> {
    let row = sqlx::query_as::<_, TokenRow>(r#"SELECT * FROM token WHERE token = $1"#)
        .bind(hash)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(Token::from))
}

/// Like [`find_token`] but locks the row until the surrounding transaction ends.
pub async fn find_token_for_update(conn: &mut PgConnection, hash: &str) -> Result<Option<Token>> {
    let row = sqlx::query_as::<_, TokenRow>(r#"SELECT * FROM token WHERE token = $1 FOR UPDATE"#)
        .bind(hash)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(Token::from))
}

pub async fn delete_token(conn: &mut PgConnection, hash: &str) -> Result<bool> {
    let result = sqlx::query(r#"DELETE FROM token WHERE token = $1"#)
        .bind(hash)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Reports whether `token` has used up its budget, deleting the row when
/// `remove_if_expired` is set. Answers linked to the token are kept.
pub async fn is_expired(
    conn: &mut PgConnection,
    token: &Token,
    remove_if_expired: bool,
) -> Result<bool> {
    let expired = token.is_expired();
    if expired && remove_if_expired {
        delete_token(conn, &token.token).await?;
        tracing::info!(token = %token.token, "Removed expired token");
    }
    Ok(expired)
}

/// Marks `answer` as evaluated with `token` and takes one use off a finite budget.
pub async fn use_for(
    conn: &mut PgConnection,
    token: &mut Token,
    answer: &mut EvaluableTestAnswer,
) -> Result<()> {
    sqlx::query(r#"UPDATE evaluable_test_answer SET was_evaluated_with_token = TRUE WHERE id = $1"#)
        .bind(answer.id)
        .execute(&mut *conn)
        .await?;
    answer.was_evaluated_with_token = true;

    if let UsageBudget::Finite(_) = token.usage {
        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE token
            SET max_usage_count = max_usage_count - 1
            WHERE token = $1
            RETURNING max_usage_count
            "#,
        )
        .bind(&token.token)
        .fetch_one(&mut *conn)
        .await?;

        let stored = UsageBudget::from(remaining);
        token.record_usage();
        if token.usage != stored {
            tracing::warn!(
                token = %token.token,
                expected = ?token.usage.remaining(),
                stored = ?remaining,
                "Token usage was changed concurrently, keeping the stored count"
            );
            token.usage = stored;
        }
    }

    tracing::info!(
        token = %token.token,
        evaluable_test_answer_id = answer.id,
        remaining = ?token.usage.remaining(),
        "Token used for evaluable answer"
    );
    Ok(())
}

pub async fn get_pre_collect_tests(conn: &mut PgConnection, token: &Token) -> Result<Vec<Test>> {
    let resolved = test_service::find_tests_by_names(conn, &token.pre_collect_test_names).await?;
    let tests = token.pre_collect_tests(resolved);
    if tests.len() < token.pre_collect_test_names.len() {
        tracing::debug!(
            token = %token.token,
            configured = token.pre_collect_test_names.len(),
            resolved = tests.len(),
            "Skipped stale pre-collect test names"
        );
    }
    Ok(tests)
}

async fn try_insert_token(
    pool: &PgPool,
    hash: String,
    new: &NewToken,
    created_at: DateTime<Utc>,
) -> Result<Option<Token>> {
    let row = sqlx::query_as::<_, TokenRow>(
        r#"
        INSERT INTO token (
            token, max_usage_count, personal_data_test_name,
            pre_collect_test_names, evaluable_test_name, creation_timestamp
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (token) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(hash)
    .bind(new.usage.remaining())
    .bind(&new.personal_data_test_name)
    .bind(new.pre_collect_test_names.as_slice())
    .bind(&new.evaluable_test_name)
    .bind(created_at)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Token::from))
}

#[derive(Clone)]
pub struct TokenService {
    pool: PgPool,
    max_tries: u32,
    remove_expired_tokens: bool,
}

impl TokenService {
    pub fn new(pool: PgPool, max_tries: u32, remove_expired_tokens: bool) -> Self {
        Self {
            pool,
            max_tries,
            remove_expired_tokens,
        }
    }

    pub fn remove_expired_tokens(&self) -> bool {
        self.remove_expired_tokens
    }

    pub async fn generate(&self, new: NewToken) -> Result<Token> {
        let mut referenced = vec![
            new.personal_data_test_name.clone(),
            new.evaluable_test_name.clone(),
        ];
        referenced.extend(new.pre_collect_test_names.iter().cloned());
        if let Some(blank) = referenced.iter().find(|name| name.trim().is_empty()) {
            return Err(Error::BadRequest(format!("Invalid test name: '{}'", blank)));
        }

        let mut conn = self.pool.acquire().await?;
        let known = test_service::find_tests_by_names(&mut conn, &referenced).await?;
        if let Some(missing) = referenced
            .iter()
            .find(|name| !known.iter().any(|test| &test.name == *name))
        {
            return Err(Error::BadRequest(format!("Unknown test: {}", missing)));
        }
        drop(conn);

        let created_at = new.creation_timestamp.unwrap_or_else(time::now);
        let pool = &self.pool;
        let token = claim_unique_hash(self.max_tries, |candidate| {
            try_insert_token(pool, candidate, &new, created_at)
        })
        .await?;

        tracing::info!(
            token = %token.token,
            max_usage_count = ?token.usage.remaining(),
            evaluable_test = %token.evaluable_test_name,
            "Generated token"
        );
        Ok(token)
    }

    /// Returns the token if it exists and is not expired; anything else is unauthorized.
    pub async fn authorize(&self, hash: &str) -> Result<Token> {
        let mut tx = self.pool.begin().await?;
        let Some(token) = find_token_for_update(&mut tx, hash).await? else {
            return Err(Error::Unauthorized(UNAUTHORIZED_TOKEN.to_string()));
        };
        let expired = is_expired(&mut tx, &token, self.remove_expired_tokens).await?;
        tx.commit().await?;

        if expired {
            tracing::info!(token = %hash, "Rejected expired token");
            return Err(Error::Unauthorized(UNAUTHORIZED_TOKEN.to_string()));
        }
        Ok(token)
    }

    /// Every test granted by `token` in presentation order.
    pub async fn granted_tests(&self, token: &Token) -> Result<Vec<Test>> {
        let mut conn = self.pool.acquire().await?;
        let names = token.granted_test_names();
        let tests = test_service::find_tests_by_names(&mut conn, &names).await?;
        Ok(order_by_names(&names, tests))
    }

    pub async fn pre_collect_tests(&self, token: &Token) -> Result<Vec<Test>> {
        let mut conn = self.pool.acquire().await?;
        get_pre_collect_tests(&mut conn, token).await
    }

    pub async fn get(&self, hash: &str) -> Result<Token> {
        let mut conn = self.pool.acquire().await?;
        find_token(&mut conn, hash)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Token not found: {}", hash)))
    }

    pub async fn list(&self) -> Result<Vec<Token>> {
        let rows = sqlx::query_as::<_, TokenRow>(
            r#"SELECT * FROM token ORDER BY creation_timestamp DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Token::from).collect())
    }

    pub async fn delete(&self, hash: &str) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        if !delete_token(&mut conn, hash).await? {
            return Err(Error::NotFound(format!("Token not found: {}", hash)));
        }
        tracing::info!(token = %hash, "Deleted token");
        Ok(())
    }
}
