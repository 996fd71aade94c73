use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::QuizError,
    models::{
        AddQuestionRequest, ContentChangeEvent, CreateQuizRequest, GenerateQuestionsRequest,
        PoolingModeRequest, QuizCompletedInput, QuizLookupRequest, RandomSampleSizeRequest,
        RequiredCorrectAnswersRequest, SwitchQuestionsRequest, UpdateQuestionRequest,
    },
    services::AppState,
};

pub async fn create_quiz(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, QuizError> {
    tracing::info!(
        course_id = %req.course_id,
        questions = req.questions.len(),
        "Creating quiz"
    );

    let quiz = state.quizzes.create_quiz(req).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

pub async fn lookup_quizzes(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuizLookupRequest>,
) -> Result<impl IntoResponse, QuizError> {
    let quizzes = state.quizzes.find_quizzes(&req.ids).await?;
    Ok(Json(quizzes))
}

pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, QuizError> {
    let quiz = state.quizzes.get_quiz(quiz_id).await?;
    Ok(Json(quiz))
}

pub async fn delete_quiz(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, QuizError> {
    let deleted = state.quizzes.delete_quiz(quiz_id).await?;
    Ok(Json(json!({ "id": deleted })))
}

pub async fn add_question(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<AddQuestionRequest>,
) -> Result<impl IntoResponse, QuizError> {
    tracing::debug!(quiz_id = %quiz_id, number = ?req.number, "Adding question");

    let quiz = state.quizzes.add_question(quiz_id, req).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

pub async fn update_question(
    State(state): State<Arc<AppState>>,
    Path((quiz_id, question_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, QuizError> {
    let quiz = state
        .quizzes
        .update_question(quiz_id, question_id, req)
        .await?;
    Ok(Json(quiz))
}

pub async fn remove_question(
    State(state): State<Arc<AppState>>,
    Path((quiz_id, number)): Path<(Uuid, u32)>,
) -> Result<impl IntoResponse, QuizError> {
    let quiz = state.quizzes.remove_question(quiz_id, number).await?;
    Ok(Json(quiz))
}

pub async fn switch_questions(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<SwitchQuestionsRequest>,
) -> Result<impl IntoResponse, QuizError> {
    let quiz = state
        .quizzes
        .switch_questions(quiz_id, req.first_number, req.second_number)
        .await?;
    Ok(Json(quiz))
}

pub async fn set_required_correct_answers(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<RequiredCorrectAnswersRequest>,
) -> Result<impl IntoResponse, QuizError> {
    let quiz = state
        .quizzes
        .set_required_correct_answers(quiz_id, req.required_correct_answers)
        .await?;
    Ok(Json(quiz))
}

pub async fn set_pooling_mode(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<PoolingModeRequest>,
) -> Result<impl IntoResponse, QuizError> {
    let quiz = state
        .quizzes
        .set_pooling_mode(quiz_id, req.pooling_mode)
        .await?;
    Ok(Json(quiz))
}

pub async fn set_random_sample_size(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<RandomSampleSizeRequest>,
) -> Result<impl IntoResponse, QuizError> {
    let quiz = state
        .quizzes
        .set_random_sample_size(quiz_id, req.random_sample_size)
        .await?;
    Ok(Json(quiz))
}

pub async fn session_questions(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, QuizError> {
    let questions = state.quizzes.select_questions_for_session(quiz_id).await?;
    Ok(Json(questions))
}

pub async fn generate_questions(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<GenerateQuestionsRequest>,
) -> Result<impl IntoResponse, QuizError> {
    let accepted = state.quizzes.generate_questions(quiz_id, req).await?;
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

pub async fn log_completion(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<QuizCompletedInput>,
) -> Result<impl IntoResponse, QuizError> {
    tracing::info!(
        quiz_id = %quiz_id,
        user_id = %req.user_id,
        answered = req.completed_questions.len(),
        "Logging quiz completion"
    );

    let feedback = state.quizzes.log_quiz_completion(quiz_id, req).await?;
    Ok(Json(feedback))
}

pub async fn content_changed(
    State(state): State<Arc<AppState>>,
    Json(event): Json<ContentChangeEvent>,
) -> Result<impl IntoResponse, QuizError> {
    let deleted = state.quizzes.delete_quizzes_for_content(event).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
