use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{QuizError, QuizResult};
use crate::metrics::{record_mutation, SESSION_SELECTIONS_TOTAL};
use crate::models::{
    AddQuestionRequest, AnswerOutcome, ContentChangeEvent, ContentProgressedEvent,
    CreateQuizRequest, CrudOperation, GenerateQuestionsRequest, GenerationAccepted, PoolingMode,
    QuestionDraft, QuestionView, Quiz, QuizCompletedInput, QuizCompletionFeedback,
    QuizUpdatedEvent, QuizView, UpdateQuestionRequest,
};
use crate::services::event_publisher::{
    spawn_content_progressed, spawn_quiz_updated, QuizEventPublisher,
};
use crate::services::question_pool;
use crate::services::quiz_generation_service::AiQuizGenerationService;
use crate::services::quiz_locks::QuizLocks;
use crate::services::quiz_repository::QuizRepository;
use crate::services::session_selector::{build_quiz_view, select_views};
use crate::services::validation::validate_input;

/// Caller-facing quiz operations.
///
/// Every mutation loads the aggregate under the quiz lock, edits a local
/// copy and saves it whole. Validation and lookup errors abort before the
/// save, so a failed call leaves the stored quiz untouched.
pub struct QuizService {
    repository: Arc<dyn QuizRepository>,
    locks: Arc<QuizLocks>,
    events: Arc<dyn QuizEventPublisher>,
    generation: Arc<AiQuizGenerationService>,
}

impl QuizService {
    pub fn new(
        repository: Arc<dyn QuizRepository>,
        locks: Arc<QuizLocks>,
        events: Arc<dyn QuizEventPublisher>,
        generation: Arc<AiQuizGenerationService>,
    ) -> Self {
        Self {
            repository,
            locks,
            events,
            generation,
        }
    }

    async fn load(&self, quiz_id: Uuid) -> QuizResult<Quiz> {
        self.repository
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| QuizError::quiz_not_found(quiz_id))
    }

    async fn modify_locked<F>(&self, quiz_id: Uuid, edit: F) -> QuizResult<Quiz>
    where
        F: FnOnce(&mut Quiz) -> QuizResult<()> + Send,
    {
        let _guard = self.locks.acquire(quiz_id).await;
        let mut quiz = self.load(quiz_id).await?;
        edit(&mut quiz)?;
        self.repository.save(&quiz).await?;
        Ok(quiz)
    }

    /// Read-modify-write of one quiz followed by a `quiz_updated` event.
    async fn modify_quiz<F>(
        &self,
        operation: &'static str,
        quiz_id: Uuid,
        edit: F,
    ) -> QuizResult<QuizView>
    where
        F: FnOnce(&mut Quiz) -> QuizResult<()> + Send,
    {
        let result = self.modify_locked(quiz_id, edit).await;
        record_mutation(operation, &result);
        let quiz = result?;

        tracing::info!(
            quiz_id = %quiz_id,
            operation,
            questions = quiz.question_pool.len(),
            "Quiz updated"
        );
        spawn_quiz_updated(self.events.clone(), QuizUpdatedEvent::from_quiz(&quiz));
        Ok(build_quiz_view(&quiz))
    }

    pub async fn create_quiz(&self, request: CreateQuizRequest) -> QuizResult<QuizView> {
        request.validate()?;
        let quiz_id = request.id.unwrap_or_else(Uuid::new_v4);

        let result: QuizResult<Quiz> = async {
            let mut quiz = Quiz::new(quiz_id, request.course_id);
            quiz.required_correct_answers = request.required_correct_answers;
            quiz.pooling_mode = request.pooling_mode;
            quiz.random_sample_size = request.random_sample_size;
            for question in request.questions {
                question_pool::add_question(&mut quiz, draft_from_request(question)?)?;
            }

            let _guard = self.locks.acquire(quiz_id).await;
            if self.repository.find_by_id(quiz_id).await?.is_some() {
                return Err(QuizError::validation(format!(
                    "Quiz with id {} already exists",
                    quiz_id
                )));
            }
            self.repository.save(&quiz).await?;
            Ok(quiz)
        }
        .await;
        record_mutation("create", &result);
        let quiz = result?;

        tracing::info!(
            quiz_id = %quiz.id,
            course_id = %quiz.course_id,
            questions = quiz.question_pool.len(),
            "Quiz created"
        );
        spawn_quiz_updated(self.events.clone(), QuizUpdatedEvent::from_quiz(&quiz));
        Ok(build_quiz_view(&quiz))
    }

    pub async fn get_quiz(&self, quiz_id: Uuid) -> QuizResult<QuizView> {
        let quiz = self.load(quiz_id).await?;
        Ok(build_quiz_view(&quiz))
    }

    /// One entry per requested id, in request order; unknown ids map to `None`.
    pub async fn find_quizzes(&self, ids: &[Uuid]) -> QuizResult<Vec<Option<QuizView>>> {
        let found: HashMap<Uuid, Quiz> = self
            .repository
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|quiz| (quiz.id, quiz))
            .collect();
        Ok(ids
            .iter()
            .map(|id| found.get(id).map(build_quiz_view))
            .collect())
    }

    /// Deletes the quiz with all of its questions and their statistics.
    pub async fn delete_quiz(&self, quiz_id: Uuid) -> QuizResult<Uuid> {
        let result: QuizResult<Uuid> = async {
            let _guard = self.locks.acquire(quiz_id).await;
            if self.repository.delete(quiz_id).await? {
                Ok(quiz_id)
            } else {
                Err(QuizError::quiz_not_found(quiz_id))
            }
        }
        .await;
        record_mutation("delete", &result);
        if result.is_ok() {
            tracing::info!(quiz_id = %quiz_id, "Quiz deleted");
        }
        result
    }

    pub async fn add_question(
        &self,
        quiz_id: Uuid,
        request: AddQuestionRequest,
    ) -> QuizResult<QuizView> {
        let draft = draft_from_request(request)?;
        self.modify_quiz("add_question", quiz_id, move |quiz| {
            question_pool::add_question(quiz, draft).map(|_| ())
        })
        .await
    }

    pub async fn update_question(
        &self,
        quiz_id: Uuid,
        question_id: Uuid,
        request: UpdateQuestionRequest,
    ) -> QuizResult<QuizView> {
        let UpdateQuestionRequest {
            number,
            hint,
            question,
        } = request;
        self.modify_quiz("update_question", quiz_id, move |quiz| {
            if quiz.question_by_id(&question_id).is_none() {
                return Err(question_pool::question_id_not_found(quiz.id, question_id));
            }
            let payload = validate_input(question)?;
            question_pool::update_question(quiz, question_id, number, hint, payload)
        })
        .await
    }

    pub async fn remove_question(&self, quiz_id: Uuid, number: u32) -> QuizResult<QuizView> {
        self.modify_quiz("remove_question", quiz_id, move |quiz| {
            question_pool::remove_question(quiz, number).map(|_| ())
        })
        .await
    }

    pub async fn switch_questions(
        &self,
        quiz_id: Uuid,
        first_number: u32,
        second_number: u32,
    ) -> QuizResult<QuizView> {
        self.modify_quiz("switch_questions", quiz_id, move |quiz| {
            question_pool::switch_questions(quiz, first_number, second_number)
        })
        .await
    }

    pub async fn set_required_correct_answers(
        &self,
        quiz_id: Uuid,
        required: u32,
    ) -> QuizResult<QuizView> {
        self.modify_quiz("set_required_correct_answers", quiz_id, move |quiz| {
            question_pool::set_required_correct_answers(quiz, required);
            Ok(())
        })
        .await
    }

    pub async fn set_pooling_mode(
        &self,
        quiz_id: Uuid,
        mode: PoolingMode,
    ) -> QuizResult<QuizView> {
        self.modify_quiz("set_pooling_mode", quiz_id, move |quiz| {
            question_pool::set_pooling_mode(quiz, mode);
            Ok(())
        })
        .await
    }

    pub async fn set_random_sample_size(
        &self,
        quiz_id: Uuid,
        size: Option<u32>,
    ) -> QuizResult<QuizView> {
        self.modify_quiz("set_random_sample_size", quiz_id, move |quiz| {
            question_pool::set_random_sample_size(quiz, size);
            Ok(())
        })
        .await
    }

    /// Questions for one quiz-taking session, drawn fresh on every call.
    pub async fn select_questions_for_session(
        &self,
        quiz_id: Uuid,
    ) -> QuizResult<Vec<QuestionView>> {
        let quiz = self.load(quiz_id).await?;
        SESSION_SELECTIONS_TOTAL
            .with_label_values(&[quiz.pooling_mode.as_str()])
            .inc();
        Ok(select_views(&quiz, &mut rand::rng()))
    }

    /// Checks the quiz exists and hands the request to a background run.
    pub async fn generate_questions(
        &self,
        quiz_id: Uuid,
        request: GenerateQuestionsRequest,
    ) -> QuizResult<GenerationAccepted> {
        request.validate()?;
        self.load(quiz_id).await?;

        tracing::info!(
            quiz_id = %quiz_id,
            documents = request.source_document_ids.len(),
            "Scheduling question generation"
        );
        self.generation.spawn_generation(quiz_id, request);

        Ok(GenerationAccepted {
            quiz_id,
            status: "accepted".to_string(),
        })
    }

    /// Records a finished attempt on the answered questions and reports the
    /// user's progress.
    pub async fn log_quiz_completion(
        &self,
        quiz_id: Uuid,
        input: QuizCompletedInput,
    ) -> QuizResult<QuizCompletionFeedback> {
        let recorded_at = Utc::now();
        let user_id = input.user_id;
        let completed = input.completed_questions.clone();

        let result = self
            .modify_locked(quiz_id, move |quiz| {
                for entry in &completed {
                    let quiz_id = quiz.id;
                    let question = quiz
                        .question_pool
                        .iter_mut()
                        .find(|q| q.id == entry.question_id)
                        .ok_or_else(|| {
                            question_pool::question_id_not_found(quiz_id, entry.question_id)
                        })?;
                    question.statistics.push(AnswerOutcome {
                        user_id,
                        answered_correctly: entry.correct,
                        recorded_at,
                    });
                }
                Ok(())
            })
            .await;
        record_mutation("log_completion", &result);
        let quiz = result?;

        let feedback = completion_feedback(&quiz, &input);
        spawn_content_progressed(
            self.events.clone(),
            ContentProgressedEvent {
                user_id,
                content_id: quiz.id,
                success: feedback.success,
                correctness: feedback.correctness,
                hints_used: feedback.hints_used,
                time_to_complete: None,
            },
        );
        Ok(feedback)
    }

    /// Deletes the quizzes of deleted course content. Other operations are
    /// ignored. Returns the number of removed quizzes.
    pub async fn delete_quizzes_for_content(&self, event: ContentChangeEvent) -> QuizResult<u64> {
        let (Some(operation), Some(content_ids)) = (event.operation, event.content_ids) else {
            return Err(QuizError::validation("incomplete event message"));
        };
        if operation != CrudOperation::Delete || content_ids.is_empty() {
            return Ok(0);
        }

        // Ascending id order keeps concurrent callers from deadlocking.
        let mut ids = content_ids.clone();
        ids.sort_unstable();
        ids.dedup();
        let mut guards = Vec::with_capacity(ids.len());
        for id in &ids {
            guards.push(self.locks.acquire(*id).await);
        }
        let result = self.repository.delete_many(&ids).await;
        drop(guards);
        record_mutation("delete_for_content", &result);
        let deleted = result?;
        tracing::info!(
            requested = content_ids.len(),
            deleted,
            "Deleted quizzes of removed content"
        );
        Ok(deleted)
    }
}

fn draft_from_request(request: AddQuestionRequest) -> QuizResult<QuestionDraft> {
    Ok(QuestionDraft {
        number: request.number,
        hint: request.hint,
        ai_generated: false,
        payload: validate_input(request.question)?,
    })
}

/// Share of correctly answered questions, relative to what a session shows.
pub fn correctness(quiz: &Quiz, correct: u32) -> f64 {
    if correct == 0 {
        return 0.0;
    }
    match (quiz.pooling_mode, quiz.random_sample_size) {
        (PoolingMode::Random, Some(0)) => 1.0,
        (PoolingMode::Random, Some(sample)) => f64::from(correct) / f64::from(sample),
        _ if quiz.question_pool.is_empty() => 1.0,
        _ => f64::from(correct) / quiz.question_pool.len() as f64,
    }
}

pub fn completion_feedback(quiz: &Quiz, input: &QuizCompletedInput) -> QuizCompletionFeedback {
    let correct = input
        .completed_questions
        .iter()
        .filter(|q| q.correct)
        .count() as u32;
    let hints_used = input
        .completed_questions
        .iter()
        .filter(|q| q.used_hint)
        .count() as u32;

    QuizCompletionFeedback {
        success: correct >= quiz.required_correct_answers,
        correctness: correctness(quiz, correct),
        hints_used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExactAnswerQuestion, QuestionCompletedInput, QuestionPayload};

    fn quiz_with(count: usize) -> Quiz {
        let mut quiz = Quiz::new(Uuid::new_v4(), Uuid::new_v4());
        for i in 0..count {
            let payload = QuestionPayload::ExactAnswer(ExactAnswerQuestion {
                text: format!("q{}", i),
                correct_answers: vec!["a".to_string()],
                case_sensitive: false,
                feedback: None,
            });
            question_pool::add_question(&mut quiz, QuestionDraft::new(payload)).unwrap();
        }
        quiz
    }

    fn completed(quiz: &Quiz, correct: &[bool], hints: &[bool]) -> QuizCompletedInput {
        QuizCompletedInput {
            user_id: Uuid::new_v4(),
            completed_questions: quiz
                .question_pool
                .iter()
                .zip(correct.iter().zip(hints))
                .map(|(q, (&correct, &used_hint))| QuestionCompletedInput {
                    question_id: q.id,
                    correct,
                    used_hint,
                })
                .collect(),
        }
    }

    #[test]
    fn correctness_is_relative_to_pool_in_ordered_mode() {
        let quiz = quiz_with(4);
        assert_eq!(correctness(&quiz, 0), 0.0);
        assert_eq!(correctness(&quiz, 2), 0.5);
    }

    #[test]
    fn correctness_uses_sample_size_in_random_mode() {
        let mut quiz = quiz_with(10);
        quiz.pooling_mode = PoolingMode::Random;
        quiz.random_sample_size = Some(4);
        assert_eq!(correctness(&quiz, 3), 0.75);

        quiz.random_sample_size = Some(0);
        assert_eq!(correctness(&quiz, 3), 1.0);

        quiz.random_sample_size = None;
        assert_eq!(correctness(&quiz, 5), 0.5);
    }

    #[test]
    fn correctness_of_empty_pool_is_full() {
        let quiz = quiz_with(0);
        assert_eq!(correctness(&quiz, 1), 1.0);
    }

    #[test]
    fn feedback_counts_correct_answers_and_hints() {
        let mut quiz = quiz_with(3);
        quiz.required_correct_answers = 2;

        let input = completed(&quiz, &[true, true, false], &[false, true, true]);
        let feedback = completion_feedback(&quiz, &input);
        assert!(feedback.success);
        assert_eq!(feedback.hints_used, 2);
        assert!((feedback.correctness - 2.0 / 3.0).abs() < 1e-9);

        let input = completed(&quiz, &[true, false, false], &[false, false, false]);
        assert!(!completion_feedback(&quiz, &input).success);
    }
}
