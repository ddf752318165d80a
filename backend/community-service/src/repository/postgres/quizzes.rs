use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error_types::ServiceResult;
use sqlx::types::Json;
use uuid::Uuid;

use super::PgStore;
use crate::models::{Question, Quiz, QuizUpdate};
use crate::repository::QuizRepository;

#[derive(sqlx::FromRow)]
struct QuizRow {
    id: Uuid,
    title: String,
    questions: Json<Vec<Question>>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<QuizRow> for Quiz {
    fn from(row: QuizRow) -> Self {
        Quiz {
            id: row.id,
            title: row.title,
            questions: row.questions.0,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl QuizRepository for PgStore {
    async fn insert_quiz(&self, quiz: Quiz) -> ServiceResult<Quiz> {
        sqlx::query(
            r#"
            INSERT INTO quizzes (id, title, questions, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(quiz.id)
        .bind(&quiz.title)
        .bind(Json(&quiz.questions))
        .bind(quiz.created_by)
        .bind(quiz.created_at)
        .bind(quiz.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(quiz)
    }

    async fn list_quizzes(&self) -> ServiceResult<Vec<Quiz>> {
        let rows = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT id, title, questions, created_by, created_at, updated_at
            FROM quizzes
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Quiz::from).collect())
    }

    async fn find_quiz(&self, id: Uuid) -> ServiceResult<Option<Quiz>> {
        let row = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT id, title, questions, created_by, created_at, updated_at
            FROM quizzes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Quiz::from))
    }

    async fn update_quiz(&self, id: Uuid, update: QuizUpdate) -> ServiceResult<Option<Quiz>> {
        let row = sqlx::query_as::<_, QuizRow>(
            r#"
            UPDATE quizzes
            SET title = COALESCE($2, title),
                questions = COALESCE($3, questions),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, questions, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(update.title)
        .bind(update.questions.map(Json))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Quiz::from))
    }

    async fn delete_quiz(&self, id: Uuid) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
