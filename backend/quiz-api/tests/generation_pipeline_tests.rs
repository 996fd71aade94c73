mod common;

use axum::http::StatusCode;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

use common::{create_test_app_with, eventually, ScriptedGenerationClient, StubDocuments};
use quiz_api::models::{GenerationLimits, QuestionPayload};

const SUMMARY: &str = "The capital of France is Paris.";

fn paris_output() -> String {
    json!({
        "quiz": {
            "title": "Geography",
            "questions": {
                "multiple_choice": [],
                "free_text": [
                    { "question": "What is the capital of France?", "answer": "Paris" }
                ],
                "numeric": [],
                "exact_answer": []
            }
        }
    })
    .to_string()
}

fn france_documents() -> StubDocuments {
    StubDocuments {
        summaries: HashMap::from([("doc-france".to_string(), SUMMARY.to_string())]),
    }
}

fn single_exact_limits() -> GenerationLimits {
    GenerationLimits {
        max_questions: 1,
        min_questions: 1,
        max_exact_questions: 1,
        ..GenerationLimits::default()
    }
}

#[tokio::test]
async fn test_pipeline_maps_free_text_item_to_exact_answer() {
    let app = create_test_app_with(
        ScriptedGenerationClient::replying(paris_output()),
        france_documents(),
    );

    let drafts = app
        .state
        .generation
        .generate_quiz_questions(
            "Geography of Europe",
            &["doc-france".to_string()],
            &single_exact_limits(),
        )
        .await;

    assert_eq!(drafts.len(), 1);
    assert!(drafts[0].ai_generated);
    match &drafts[0].payload {
        QuestionPayload::ExactAnswer(question) => {
            assert_eq!(question.text, "What is the capital of France?");
            assert_eq!(question.correct_answers, vec!["Paris".to_string()]);
            assert!(!question.case_sensitive);
        }
        other => panic!("expected exact answer, got {:?}", other),
    }

    let requests = app.generation.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(!request.stream);
    assert!(request.prompt.contains(SUMMARY));
    assert!(request.prompt.contains("Geography of Europe"));
    assert!(request
        .prompt
        .contains("the maximum number of questions is: 1"));

    let schema = request.format.as_ref().expect("schema is sent by default");
    let exact = schema
        .pointer("/properties/quiz/properties/questions/properties/exact_answer")
        .unwrap();
    assert_eq!(exact["maxItems"], 1);
}

#[tokio::test]
async fn test_generate_endpoint_fills_quiz_in_background() {
    let app = create_test_app_with(
        ScriptedGenerationClient::replying(paris_output()),
        france_documents(),
    );
    let created = app
        .create_quiz(json!({
            "courseId": Uuid::new_v4(),
            "questions": [common::exact_answer("Existing question", "yes")]
        }))
        .await;
    let quiz_id = created["id"].as_str().unwrap().to_string();

    let (status, accepted) = app
        .send(
            "POST",
            &format!("/api/v1/quizzes/{}/generate", quiz_id),
            Some(json!({
                "description": "Geography of Europe",
                "sourceDocumentIds": ["doc-france"],
                "limits": { "maxQuestions": 1, "minQuestions": 1, "maxExactQuestions": 1 }
            })),
        )
        .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(accepted["quizId"], quiz_id.as_str());
    assert_eq!(accepted["status"], "accepted");

    let mut quiz = serde_json::Value::Null;
    for _ in 0..100 {
        quiz = app.get_quiz(&quiz_id).await;
        if quiz["questionPool"].as_array().unwrap().len() == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    assert_eq!(common::numbers(&quiz), vec![1, 2]);
    let generated = &quiz["questionPool"][1];
    assert_eq!(generated["aiGenerated"], true);
    assert_eq!(generated["type"], "EXACT_ANSWER");
    assert_eq!(generated["correctAnswers"], json!(["Paris"]));
    assert_eq!(generated["caseSensitive"], false);
}

#[tokio::test]
async fn test_unreachable_endpoint_adds_nothing() {
    let app = create_test_app_with(ScriptedGenerationClient::unavailable(), france_documents());
    let created = app
        .create_quiz(json!({ "courseId": Uuid::new_v4() }))
        .await;
    let quiz_id = created["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(
            "POST",
            &format!("/api/v1/quizzes/{}/generate", quiz_id),
            Some(json!({ "description": "anything" })),
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    assert!(eventually(|| app.generation.requests.lock().unwrap().len() == 1).await);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let quiz = app.get_quiz(&quiz_id).await;
    assert!(quiz["questionPool"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unusable_output_adds_nothing() {
    let app = create_test_app_with(
        ScriptedGenerationClient::replying("Sorry, I can only answer in prose."),
        StubDocuments::default(),
    );
    let created = app
        .create_quiz(json!({ "courseId": Uuid::new_v4() }))
        .await;
    let quiz_id: Uuid = created["id"].as_str().unwrap().parse().unwrap();

    let request = serde_json::from_value(json!({ "description": "anything" })).unwrap();
    let added = app.state.generation.run(quiz_id, &request).await.unwrap();

    assert_eq!(added, 0);
    let quiz = app.get_quiz(&quiz_id.to_string()).await;
    assert!(quiz["questionPool"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_generated_items_are_dropped_from_batch() {
    let output = json!({
        "quiz": {
            "title": "Mixed",
            "questions": {
                "multiple_choice": [
                    {
                        "question": "No right answer here",
                        "options": [
                            { "text": "a", "is_correct": false },
                            { "text": "b", "is_correct": false }
                        ]
                    },
                    {
                        "question": "Pick the prime",
                        "options": [
                            { "text": "4", "is_correct": false },
                            { "text": "7", "is_correct": true }
                        ]
                    }
                ],
                "numeric": [
                    { "question": "Half of 9", "answer": 4.5, "max_difference": 0.01 }
                ]
            }
        }
    })
    .to_string();
    let app = create_test_app_with(
        ScriptedGenerationClient::replying(output),
        StubDocuments::default(),
    );
    let created = app
        .create_quiz(json!({ "courseId": Uuid::new_v4() }))
        .await;
    let quiz_id: Uuid = created["id"].as_str().unwrap().parse().unwrap();

    let request = serde_json::from_value(json!({ "description": "numbers" })).unwrap();
    let added = app.state.generation.run(quiz_id, &request).await.unwrap();
    assert_eq!(added, 2);

    let quiz = app.get_quiz(&quiz_id.to_string()).await;
    assert_eq!(common::numbers(&quiz), vec![1, 2]);
    assert_eq!(
        common::texts(&quiz),
        vec!["Half of 9", "Pick the prime"]
    );
    assert!(quiz["questionPool"]
        .as_array()
        .unwrap()
        .iter()
        .all(|q| q["aiGenerated"] == true));
}

#[tokio::test]
async fn test_generate_for_unknown_quiz_is_not_found() {
    let app = create_test_app_with(
        ScriptedGenerationClient::replying(paris_output()),
        StubDocuments::default(),
    );

    let (status, _) = app
        .send(
            "POST",
            &format!("/api/v1/quizzes/{}/generate", Uuid::new_v4()),
            Some(json!({ "description": "anything" })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.generation.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_template_reload_reads_file() {
    let app = create_test_app_with(
        ScriptedGenerationClient::unavailable(),
        StubDocuments::default(),
    );

    let (status, json) = app
        .send("POST", "/api/v1/quizgen/template/reload", None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["length"].as_u64().unwrap() > 0);
    assert!(json["path"]
        .as_str()
        .unwrap()
        .ends_with("quiz_generation.txt"));
}
