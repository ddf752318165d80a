use std::sync::Arc;

use chrono::Utc;
use error_types::{ServiceError, ServiceResult};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{non_blank, require_admin};
use crate::models::{Question, QuizOption, Quiz, QuizUpdate, QuizView};
use crate::repository::{QuizRepository, Repositories, UserRepository};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizInput {
    pub title: Option<String>,
    pub questions: Option<Vec<Question>>,
}

/// Trim text, drop blank questions and options, then require a correct option on
/// every remaining question and at least one question overall
pub fn clean_questions(questions: Vec<Question>) -> ServiceResult<Vec<Question>> {
    let cleaned: Vec<Question> = questions
        .into_iter()
        .filter_map(|q| {
            let question_text = q.question_text.trim().to_string();
            if question_text.is_empty() {
                return None;
            }
            let options = q
                .options
                .into_iter()
                .filter_map(|o| {
                    let text = o.text.trim().to_string();
                    (!text.is_empty()).then_some(QuizOption {
                        text,
                        is_correct: o.is_correct,
                    })
                })
                .collect();
            Some(Question {
                question_text,
                options,
            })
        })
        .collect();

    if cleaned.is_empty() {
        return Err(ServiceError::Validation(
            "At least one question is required".to_string(),
        ));
    }
    if let Some(q) = cleaned
        .iter()
        .find(|q| !q.options.iter().any(|o| o.is_correct))
    {
        return Err(ServiceError::Validation(format!(
            "Question \"{}\" must have at least one correct option",
            q.question_text
        )));
    }
    Ok(cleaned)
}

pub struct QuizService {
    users: Arc<dyn UserRepository>,
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
            quizzes: repos.quizzes.clone(),
        }
    }

    async fn view(&self, quiz: Quiz) -> ServiceResult<QuizView> {
        let creators = self.users.user_summaries(&[quiz.created_by]).await?;
        Ok(QuizView {
            creator: creators.get(&quiz.created_by).cloned(),
            quiz,
        })
    }

    pub async fn create_quiz(&self, actor_id: Uuid, input: QuizInput) -> ServiceResult<QuizView> {
        require_admin(self.users.as_ref(), actor_id).await?;

        let title = non_blank(input.title)
            .ok_or_else(|| ServiceError::Validation("Quiz title is required".to_string()))?;
        let questions = match input.questions {
            Some(questions) if !questions.is_empty() => clean_questions(questions)?,
            _ => {
                return Err(ServiceError::Validation(
                    "At least one question is required".to_string(),
                ))
            }
        };

        let now = Utc::now();
        let quiz = self
            .quizzes
            .insert_quiz(Quiz {
                id: Uuid::new_v4(),
                title,
                questions,
                created_by: actor_id,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(quiz_id = %quiz.id, questions = quiz.questions.len(), "Quiz created");
        self.view(quiz).await
    }

    pub async fn list_quizzes(&self) -> ServiceResult<Vec<QuizView>> {
        let quizzes = self.quizzes.list_quizzes().await?;

        let mut creator_ids: Vec<Uuid> = quizzes.iter().map(|q| q.created_by).collect();
        creator_ids.sort_unstable();
        creator_ids.dedup();
        let creators = self.users.user_summaries(&creator_ids).await?;

        Ok(quizzes
            .into_iter()
            .map(|quiz| QuizView {
                creator: creators.get(&quiz.created_by).cloned(),
                quiz,
            })
            .collect())
    }

    pub async fn get_quiz(&self, quiz_id: Uuid) -> ServiceResult<QuizView> {
        let quiz = self
            .quizzes
            .find_quiz(quiz_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Quiz not found".to_string()))?;
        self.view(quiz).await
    }

    /// Supplied questions go through the same cleaning as on creation
    pub async fn update_quiz(
        &self,
        actor_id: Uuid,
        quiz_id: Uuid,
        input: QuizInput,
    ) -> ServiceResult<QuizView> {
        require_admin(self.users.as_ref(), actor_id).await?;

        let update = QuizUpdate {
            title: non_blank(input.title),
            questions: input.questions.map(clean_questions).transpose()?,
        };
        let quiz = self
            .quizzes
            .update_quiz(quiz_id, update)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Quiz not found".to_string()))?;

        info!(quiz_id = %quiz_id, "Quiz updated");
        self.view(quiz).await
    }

    pub async fn delete_quiz(&self, actor_id: Uuid, quiz_id: Uuid) -> ServiceResult<()> {
        require_admin(self.users.as_ref(), actor_id).await?;

        if !self.quizzes.delete_quiz(quiz_id).await? {
            return Err(ServiceError::NotFound("Quiz not found".to_string()));
        }
        info!(quiz_id = %quiz_id, "Quiz deleted");
        Ok(())
    }
}
