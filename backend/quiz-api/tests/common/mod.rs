#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use axum::body::to_bytes;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use quiz_api::{
    config::{Config, StorageBackend},
    create_router,
    error::{QuizError, QuizResult},
    models::{ContentProgressedEvent, GenerationRequest, QuizUpdatedEvent},
    services::{
        document_summary::DocumentSummaryLookup, event_publisher::QuizEventPublisher,
        generation_client::GenerationClient, quiz_repository::InMemoryQuizRepository, AppState,
    },
};

/// Keeps every published event for later assertions.
#[derive(Default)]
pub struct RecordingPublisher {
    pub quiz_updated: Mutex<Vec<QuizUpdatedEvent>>,
    pub content_progressed: Mutex<Vec<ContentProgressedEvent>>,
}

#[async_trait]
impl QuizEventPublisher for RecordingPublisher {
    async fn publish_quiz_updated(&self, event: &QuizUpdatedEvent) -> Result<()> {
        self.quiz_updated.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn publish_content_progressed(&self, event: &ContentProgressedEvent) -> Result<()> {
        self.content_progressed.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct StubDocuments {
    pub summaries: HashMap<String, String>,
}

#[async_trait]
impl DocumentSummaryLookup for StubDocuments {
    async fn summary(&self, document_id: &str) -> String {
        self.summaries.get(document_id).cloned().unwrap_or_default()
    }
}

/// Answers every call with the same scripted outcome and records requests.
pub struct ScriptedGenerationClient {
    /// `None` simulates an unreachable endpoint.
    output: Option<String>,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerationClient {
    pub fn replying(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            output: None,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl GenerationClient for ScriptedGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> QuizResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.output
            .clone()
            .ok_or_else(|| QuizError::GenerationUnavailable("connection refused".to_string()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub repository: Arc<InMemoryQuizRepository>,
    pub events: Arc<RecordingPublisher>,
    pub generation: Arc<ScriptedGenerationClient>,
}

pub fn test_config() -> Config {
    Config {
        storage: StorageBackend::Memory,
        ..Config::default()
    }
}

pub fn create_test_app_with(
    generation: ScriptedGenerationClient,
    documents: StubDocuments,
) -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let repository = Arc::new(InMemoryQuizRepository::new());
    let events = Arc::new(RecordingPublisher::default());
    let generation = Arc::new(generation);
    let state = Arc::new(AppState::from_parts(
        test_config(),
        repository.clone(),
        events.clone(),
        Arc::new(documents),
        generation.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        repository,
        events,
        generation,
    }
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(
        ScriptedGenerationClient::unavailable(),
        StubDocuments::default(),
    )
}

impl TestApp {
    /// Sends one request and returns the status with the decoded JSON body
    /// (`Value::Null` for empty or non-JSON bodies).
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_string(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn create_quiz(&self, body: Value) -> Value {
        let (status, json) = self.send("POST", "/api/v1/quizzes", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", json);
        json
    }

    pub async fn get_quiz(&self, quiz_id: &str) -> Value {
        let (status, json) = self
            .send("GET", &format!("/api/v1/quizzes/{}", quiz_id), None)
            .await;
        assert_eq!(status, StatusCode::OK, "get failed: {}", json);
        json
    }

    pub fn quiz_updated_count(&self) -> usize {
        self.events.quiz_updated.lock().unwrap().len()
    }
}

/// Polls `check` until it holds or two seconds pass.
pub async fn eventually<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

pub fn exact_answer(text: &str, answer: &str) -> Value {
    serde_json::json!({
        "type": "EXACT_ANSWER",
        "text": text,
        "correctAnswers": [answer],
        "caseSensitive": false
    })
}

pub fn numbers(quiz: &Value) -> Vec<u64> {
    quiz["questionPool"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["number"].as_u64().unwrap())
        .collect()
}

pub fn texts(quiz: &Value) -> Vec<String> {
    quiz["questionPool"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["text"].as_str().unwrap_or_default().to_string())
        .collect()
}
