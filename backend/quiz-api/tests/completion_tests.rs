mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{create_test_app, eventually, exact_answer};
use quiz_api::models::{ContentChangeEvent, CrudOperation};
use quiz_api::services::quiz_repository::QuizRepository;

#[tokio::test]
async fn test_completion_returns_feedback_and_emits_progress() {
    let app = create_test_app();
    let created = app
        .create_quiz(json!({
            "courseId": Uuid::new_v4(),
            "requiredCorrectAnswers": 2,
            "questions": [
                exact_answer("q1", "a"),
                exact_answer("q2", "b"),
                exact_answer("q3", "c"),
                exact_answer("q4", "d")
            ]
        }))
        .await;
    let quiz_id = created["id"].as_str().unwrap();
    let pool = created["questionPool"].as_array().unwrap();
    let user_id = Uuid::new_v4();

    let (status, feedback) = app
        .send(
            "POST",
            &format!("/api/v1/quizzes/{}/completions", quiz_id),
            Some(json!({
                "userId": user_id,
                "completedQuestions": [
                    { "questionId": pool[0]["id"], "correct": true, "usedHint": true },
                    { "questionId": pool[1]["id"], "correct": true },
                    { "questionId": pool[2]["id"], "correct": false }
                ]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(feedback["success"], true);
    assert_eq!(feedback["correctness"], 0.5);
    assert_eq!(feedback["hintsUsed"], 1);

    assert!(eventually(|| app.events.content_progressed.lock().unwrap().len() == 1).await);
    let event = app.events.content_progressed.lock().unwrap()[0].clone();
    assert_eq!(event.user_id, user_id);
    assert_eq!(event.content_id.to_string(), quiz_id);
    assert!(event.success);
    assert_eq!(event.hints_used, 1);
}

#[tokio::test]
async fn test_completion_appends_answer_statistics() {
    let app = create_test_app();
    let created = app
        .create_quiz(json!({
            "courseId": Uuid::new_v4(),
            "questions": [exact_answer("q1", "a")]
        }))
        .await;
    let quiz_id: Uuid = created["id"].as_str().unwrap().parse().unwrap();
    let question_id = created["questionPool"][0]["id"].clone();

    for correct in [false, true] {
        let (status, _) = app
            .send(
                "POST",
                &format!("/api/v1/quizzes/{}/completions", quiz_id),
                Some(json!({
                    "userId": Uuid::new_v4(),
                    "completedQuestions": [{ "questionId": question_id, "correct": correct }]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let stored = app.repository.find_by_id(quiz_id).await.unwrap().unwrap();
    let outcomes: Vec<bool> = stored.question_pool[0]
        .statistics
        .iter()
        .map(|outcome| outcome.answered_correctly)
        .collect();
    assert_eq!(outcomes, vec![false, true]);
}

#[tokio::test]
async fn test_completion_with_unknown_question_records_nothing() {
    let app = create_test_app();
    let created = app
        .create_quiz(json!({
            "courseId": Uuid::new_v4(),
            "questions": [exact_answer("q1", "a")]
        }))
        .await;
    let quiz_id = created["id"].as_str().unwrap();
    let known = created["questionPool"][0]["id"].clone();

    let (status, json) = app
        .send(
            "POST",
            &format!("/api/v1/quizzes/{}/completions", quiz_id),
            Some(json!({
                "userId": Uuid::new_v4(),
                "completedQuestions": [
                    { "questionId": known, "correct": true },
                    { "questionId": Uuid::new_v4(), "correct": true }
                ]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().starts_with("Question with id"));

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(app.events.content_progressed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_content_delete_event_removes_quizzes() {
    let app = create_test_app();
    let first = app
        .create_quiz(json!({ "courseId": Uuid::new_v4() }))
        .await;
    let second = app
        .create_quiz(json!({ "courseId": Uuid::new_v4() }))
        .await;
    let first_id = first["id"].as_str().unwrap();
    let second_id = second["id"].as_str().unwrap();

    let (status, json) = app
        .send(
            "POST",
            "/api/v1/content-events",
            Some(json!({ "operation": "DELETE", "contentIds": [first_id, Uuid::new_v4()] })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deleted"], 1);

    let (status, _) = app
        .send("GET", &format!("/api/v1/quizzes/{}", first_id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    app.get_quiz(second_id).await;
}

#[tokio::test]
async fn test_content_delete_waits_for_quiz_lock() {
    let app = create_test_app();
    let created = app
        .create_quiz(json!({ "courseId": Uuid::new_v4() }))
        .await;
    let quiz_id: Uuid = created["id"].as_str().unwrap().parse().unwrap();

    let guard = app.state.locks.acquire(quiz_id).await;
    let state = app.state.clone();
    let deletion = tokio::spawn(async move {
        state
            .quizzes
            .delete_quizzes_for_content(ContentChangeEvent {
                operation: Some(CrudOperation::Delete),
                content_ids: Some(vec![quiz_id, quiz_id]),
            })
            .await
    });

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(!deletion.is_finished());
    assert!(app.repository.find_by_id(quiz_id).await.unwrap().is_some());

    drop(guard);
    assert_eq!(deletion.await.unwrap().unwrap(), 1);
    assert!(app.repository.find_by_id(quiz_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_content_events_other_than_delete_are_ignored() {
    let app = create_test_app();
    let created = app
        .create_quiz(json!({ "courseId": Uuid::new_v4() }))
        .await;
    let quiz_id = created["id"].as_str().unwrap();

    let (status, json) = app
        .send(
            "POST",
            "/api/v1/content-events",
            Some(json!({ "operation": "UPDATE", "contentIds": [quiz_id] })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deleted"], 0);
    app.get_quiz(quiz_id).await;
}

#[tokio::test]
async fn test_incomplete_content_event_is_rejected() {
    let app = create_test_app();

    let (status, json) = app
        .send(
            "POST",
            "/api/v1/content-events",
            Some(json!({ "operation": "DELETE" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "incomplete event message");
}
