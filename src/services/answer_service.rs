use crate::dto::answer_dto::{
    EvaluableAnswerResponse, QuestionAnswerInput, SubmitCollectedAnswerRequest,
    SubmitPersonalityAnswerRequest,
};
use crate::error::{Error, Result};
use crate::models::answer::{EvaluableQuestionAnswer, EvaluableTestAnswer, TestAnswer};
use crate::models::personality_test_answer::PersonalityTestAnswer;
use crate::models::token::Token;
use crate::services::{test_service, token_service};
use crate::utils::time;
use serde_json::Value as JsonValue;
use sqlx::{PgConnection, PgPool};

async fn ensure_person(conn: &mut PgConnection, person_id: &str) -> Result<()> {
    sqlx::query(r#"INSERT INTO person (id) VALUES ($1) ON CONFLICT (id) DO NOTHING"#)
        .bind(person_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn insert_test_answer(
    conn: &mut PgConnection,
    test_name: &str,
    person_id: &str,
    token: &str,
    answer_set: Option<JsonValue>,
) -> Result<TestAnswer> {
    let answer = sqlx::query_as::<_, TestAnswer>(
        r#"
        INSERT INTO test_answer (test_name, person_id, token, answer_set, submitted_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(test_name)
    .bind(person_id)
    .bind(token)
    .bind(answer_set)
    .bind(time::now())
    .fetch_one(&mut *conn)
    .await?;
    Ok(answer)
}

#[derive(Clone)]
pub struct AnswerService {
    pool: PgPool,
    remove_expired_tokens: bool,
}

impl AnswerService {
    pub fn new(pool: PgPool, remove_expired_tokens: bool) -> Self {
        Self {
            pool,
            remove_expired_tokens,
        }
    }

    /// Stores answers to a personal-data or pre-collect test. Does not consume the token.
    pub async fn submit_collected(
        &self,
        token: &Token,
        req: SubmitCollectedAnswerRequest,
    ) -> Result<TestAnswer> {
        if !token.collects(&req.test_name) {
            return Err(Error::BadRequest(format!(
                "Test '{}' is not collected with this token",
                req.test_name
            )));
        }

        let mut tx = self.pool.begin().await?;
        ensure_person(&mut tx, &req.person_id).await?;
        let answer = insert_test_answer(
            &mut tx,
            &req.test_name,
            &req.person_id,
            &token.token,
            Some(req.answer_set),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            test = %answer.test_name,
            person_id = %answer.person_id,
            token = %token.token,
            "Stored collected answers"
        );
        Ok(answer)
    }

    /// Stores an evaluable answer set and consumes one use of the token.
    ///
    /// The token row stays locked from the expiry check until the decrement is
    /// committed, so two submissions cannot both spend the last use.
    pub async fn submit_evaluable(
        &self,
        token_hash: &str,
        person_id: &str,
        question_answers: Vec<QuestionAnswerInput>,
    ) -> Result<EvaluableAnswerResponse> {
        let mut tx = self.pool.begin().await?;

        let Some(mut token) = token_service::find_token_for_update(&mut tx, token_hash).await?
        else {
            return Err(Error::Unauthorized(token_service::UNAUTHORIZED_TOKEN.to_string()));
        };
        if token_service::is_expired(&mut tx, &token, self.remove_expired_tokens).await? {
            tx.commit().await?;
            return Err(Error::Unauthorized(token_service::UNAUTHORIZED_TOKEN.to_string()));
        }

        ensure_person(&mut tx, person_id).await?;
        let test_answer = insert_test_answer(
            &mut tx,
            &token.evaluable_test_name,
            person_id,
            &token.token,
            None,
        )
        .await?;

        let mut evaluable = sqlx::query_as::<_, EvaluableTestAnswer>(
            r#"
            INSERT INTO evaluable_test_answer (test_answer_id, was_evaluated_with_token)
            VALUES ($1, FALSE)
            RETURNING *
            "#,
        )
        .bind(test_answer.id)
        .fetch_one(&mut *tx)
        .await?;

        let mut stored = Vec::with_capacity(question_answers.len());
        for input in question_answers {
            let row = sqlx::query_as::<_, EvaluableQuestionAnswer>(
                r#"
                INSERT INTO evaluable_question_answer (evaluable_test_answer_id, question_id, answer)
                VALUES ($1, $2, $3)
                RETURNING *
                "#,
            )
            .bind(evaluable.id)
            .bind(input.question_id)
            .bind(input.answer)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }

        token_service::use_for(&mut tx, &mut token, &mut evaluable).await?;
        tx.commit().await?;

        tracing::info!(
            test = %test_answer.test_name,
            person_id = %person_id,
            questions = stored.len(),
            "Stored evaluable answers"
        );
        Ok(EvaluableAnswerResponse {
            test_answer,
            evaluable_test_answer: evaluable,
            question_answers: stored,
            remaining_uses: token.usage.remaining(),
        })
    }

    pub async fn get_evaluable_answer(&self, id: i32) -> Result<EvaluableAnswerResponse> {
        let evaluable = sqlx::query_as::<_, EvaluableTestAnswer>(
            r#"SELECT * FROM evaluable_test_answer WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Evaluable answer not found: {}", id)))?;

        let test_answer = sqlx::query_as::<_, TestAnswer>(r#"SELECT * FROM test_answer WHERE id = $1"#)
            .bind(evaluable.test_answer_id)
            .fetch_one(&self.pool)
            .await?;

        let question_answers = sqlx::query_as::<_, EvaluableQuestionAnswer>(
            r#"
            SELECT * FROM evaluable_question_answer
            WHERE evaluable_test_answer_id = $1
            ORDER BY question_id, id
            "#,
        )
        .bind(evaluable.id)
        .fetch_all(&self.pool)
        .await?;

        let remaining_uses = match &test_answer.token {
            Some(hash) => {
                let mut conn = self.pool.acquire().await?;
                token_service::find_token(&mut conn, hash)
                    .await?
                    .and_then(|token| token.usage.remaining())
            }
            None => None,
        };

        Ok(EvaluableAnswerResponse {
            test_answer,
            evaluable_test_answer: evaluable,
            question_answers,
            remaining_uses,
        })
    }

    pub async fn list_answers_for_token(&self, token_hash: &str) -> Result<Vec<TestAnswer>> {
        let answers = sqlx::query_as::<_, TestAnswer>(
            r#"SELECT * FROM test_answer WHERE token = $1 ORDER BY submitted_at, id"#,
        )
        .bind(token_hash)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }

    pub async fn submit_personality_answer(
        &self,
        req: SubmitPersonalityAnswerRequest,
    ) -> Result<PersonalityTestAnswer> {
        let mut tx = self.pool.begin().await?;
        let names = [req.personality_test_name.clone()];
        if test_service::find_tests_by_names(&mut tx, &names).await?.is_empty() {
            return Err(Error::NotFound(format!(
                "Test not found: {}",
                req.personality_test_name
            )));
        }
        ensure_person(&mut tx, &req.person_id).await?;
        let answer = sqlx::query_as::<_, PersonalityTestAnswer>(
            r#"
            INSERT INTO personality_test_answer (date, answer_set, personality_test_name, person_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(time::now())
        .bind(req.answer_set)
        .bind(&req.personality_test_name)
        .bind(&req.person_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(
            answer_id = answer.answer_id,
            test = %req.personality_test_name,
            person_id = %req.person_id,
            "Stored personality test answer"
        );
        Ok(answer)
    }
}
