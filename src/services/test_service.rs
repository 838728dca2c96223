use crate::dto::test_dto::{CreateTestPayload, UpdateTestPayload};
use crate::error::{Error, Result};
use crate::models::test::Test;
use sqlx::{PgConnection, PgPool};

/// Tests whose names appear in `names`, in no particular order.
pub async fn find_tests_by_names(conn: &mut PgConnection, names: &[String]) -> Result<Vec<Test>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let tests = sqlx::query_as::<_, Test>(r#"SELECT * FROM test WHERE name = ANY($1)"#)
        .bind(names)
        .fetch_all(&mut *conn)
        .await?;
    Ok(tests)
}

#[derive(Clone)]
pub struct TestService {
    pool: PgPool,
}

impl TestService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_test(&self, payload: CreateTestPayload) -> Result<Test> {
        let name = payload.name.trim();
        if name.is_empty() {
            return Err(Error::BadRequest("Test name must not be blank".to_string()));
        }

        let test = sqlx::query_as::<_, Test>(
            r#"
            INSERT INTO test (name, description, evaluation)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(payload.description)
        .bind(payload.evaluation)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(test = %test.name, "Created test");
        Ok(test)
    }

    pub async fn get_test_by_name(&self, name: &str) -> Result<Test> {
        sqlx::query_as::<_, Test>(r#"SELECT * FROM test WHERE name = $1"#)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Test not found: {}", name)))
    }

    pub async fn list_tests(&self) -> Result<Vec<Test>> {
        let tests = sqlx::query_as::<_, Test>(r#"SELECT * FROM test ORDER BY name"#)
            .fetch_all(&self.pool)
            .await?;
        Ok(tests)
    }

    pub async fn update_test(&self, name: &str, payload: UpdateTestPayload) -> Result<Test> {
        sqlx::query_as::<_, Test>(
            r#"
            UPDATE test
            SET
                description = COALESCE($1, description),
                evaluation = COALESCE($2, evaluation),
                updated_at = NOW()
            WHERE name = $3
            RETURNING *
            "#,
        )
        .bind(payload.description)
        .bind(payload.evaluation)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Test not found: {}", name)))
    }

    /// Fails with a conflict while a token or an answer still references the test
    /// through a foreign key. Pre-collect references do not block deletion.
    pub async fn delete_test(&self, name: &str) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM test WHERE name = $1"#)
            .bind(name)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Test not found: {}", name)));
        }
        tracing::info!(test = %name, "Deleted test");
        Ok(())
    }
}
