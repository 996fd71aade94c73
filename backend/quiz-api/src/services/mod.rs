use std::sync::Arc;
use std::time::Duration;

use mongodb::{Client as MongoClient, Database};
use redis::aio::ConnectionManager;

use crate::config::Config;
use document_summary::{DocProcClient, DocumentSummaryLookup, NoDocuments};
use event_publisher::{NoopEventPublisher, QuizEventPublisher, RedisStreamPublisher};
use generation_client::{GenerationClient, OllamaClient};
use prompt_builder::{PromptBuilder, PromptTemplateCache};
use quiz_generation_service::{AiQuizGenerationService, GenerationSettings};
use quiz_locks::QuizLocks;
use quiz_repository::{InMemoryQuizRepository, MongoQuizRepository, QuizRepository};
use quiz_service::QuizService;

pub mod document_summary;
pub mod event_publisher;
pub mod generation_client;
pub mod prompt_builder;
pub mod question_pool;
pub mod quiz_generation_service;
pub mod quiz_locks;
pub mod quiz_repository;
pub mod quiz_service;
pub mod response_mapper;
pub mod schema_builder;
pub mod session_selector;
pub mod validation;

/// Live backend connections, checked by the health endpoint.
#[derive(Clone)]
pub struct Connections {
    pub mongo: Database,
    pub redis: ConnectionManager,
}

pub struct AppState {
    pub config: Config,
    pub quizzes: Arc<QuizService>,
    pub generation: Arc<AiQuizGenerationService>,
    pub templates: Arc<PromptTemplateCache>,
    pub locks: Arc<QuizLocks>,
    /// `None` when running on in-memory storage.
    pub connections: Option<Connections>,
}

impl AppState {
    pub async fn new(
        config: Config,
        mongo_client: MongoClient,
        redis_client: redis::Client,
    ) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);

        tracing::info!("Attempting to connect to Redis...");

        let redis = tokio::time::timeout(
            Duration::from_secs(30),
            ConnectionManager::new(redis_client),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Redis connection timeout after 30s"))??;

        tracing::info!("Redis ConnectionManager created, testing with PING...");

        let mut conn = redis.clone();
        tokio::time::timeout(
            Duration::from_secs(5),
            redis::cmd("PING").query_async::<String>(&mut conn),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Redis PING timeout after 5s"))??;

        tracing::info!("Redis connection established successfully");

        let http = reqwest::Client::new();
        let repository = Arc::new(MongoQuizRepository::new(&mongo));
        let events = Arc::new(RedisStreamPublisher::new(
            redis.clone(),
            config.events_stream.clone(),
        ));
        let documents = Arc::new(DocProcClient::new(
            http.clone(),
            config.docproc_url.clone(),
            Duration::from_secs(config.docproc_timeout_secs),
        ));
        let client = Arc::new(OllamaClient::new(http, config.ollama_url.clone()));

        let mut state = Self::from_parts(config, repository, events, documents, client);
        state.connections = Some(Connections { mongo, redis });
        Ok(state)
    }

    /// State without external storage or event stream. Generation still
    /// calls the configured endpoint.
    pub fn in_memory(config: Config) -> Self {
        tracing::warn!("Using in-memory quiz storage; data is lost on restart");
        let client = Arc::new(OllamaClient::new(
            reqwest::Client::new(),
            config.ollama_url.clone(),
        ));
        Self::from_parts(
            config,
            Arc::new(InMemoryQuizRepository::new()),
            Arc::new(NoopEventPublisher),
            Arc::new(NoDocuments),
            client,
        )
    }

    pub fn from_parts(
        config: Config,
        repository: Arc<dyn QuizRepository>,
        events: Arc<dyn QuizEventPublisher>,
        documents: Arc<dyn DocumentSummaryLookup>,
        client: Arc<dyn GenerationClient>,
    ) -> Self {
        let locks = Arc::new(QuizLocks::new());
        let templates = Arc::new(PromptTemplateCache::new(
            config.quizgen_template_path.clone(),
        ));

        let generation = Arc::new(AiQuizGenerationService::new(
            PromptBuilder::new(templates.clone(), documents),
            client,
            repository.clone(),
            locks.clone(),
            events.clone(),
            GenerationSettings {
                model: config.quizgen_model.clone(),
                use_schema: config.quizgen_use_schema,
            },
        ));
        let quizzes = Arc::new(QuizService::new(
            repository,
            locks.clone(),
            events,
            generation.clone(),
        ));

        Self {
            config,
            quizzes,
            generation,
            templates,
            locks,
            connections: None,
        }
    }
}
