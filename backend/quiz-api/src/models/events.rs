use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::QuestionType;
use super::quiz::Quiz;

pub const TOPIC_QUIZ_UPDATED: &str = "quiz_updated";
pub const TOPIC_CONTENT_PROGRESSED: &str = "content_progressed";

/// Snapshot published after every successful pool mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizUpdatedEvent {
    pub quiz_id: Uuid,
    pub course_id: Uuid,
    pub questions: Vec<QuestionSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSnapshot {
    pub question_id: Uuid,
    pub number: u32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
}

impl QuizUpdatedEvent {
    pub fn from_quiz(quiz: &Quiz) -> Self {
        Self {
            quiz_id: quiz.id,
            course_id: quiz.course_id,
            questions: quiz
                .question_pool
                .iter()
                .map(|question| QuestionSnapshot {
                    question_id: question.id,
                    number: question.number,
                    question_type: question.kind(),
                })
                .collect(),
        }
    }
}

/// Progress notification emitted when a user completes a quiz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentProgressedEvent {
    pub user_id: Uuid,
    pub content_id: Uuid,
    pub success: bool,
    pub correctness: f64,
    pub hints_used: u32,
    pub time_to_complete: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrudOperation {
    Create,
    Update,
    Delete,
}

/// Change notification about course content, received from other services.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChangeEvent {
    #[serde(default)]
    pub operation: Option<CrudOperation>,
    #[serde(default)]
    pub content_ids: Option<Vec<Uuid>>,
}
