use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::error::{QuizError, QuizResult};
use crate::metrics::{
    record_mutation, GENERATED_QUESTIONS_TOTAL, GENERATION_DURATION_SECONDS,
    GENERATION_RUNS_TOTAL,
};
use crate::models::{
    GenerateQuestionsRequest, GenerationLimits, GenerationRequest, QuestionDraft,
    QuizUpdatedEvent,
};
use crate::services::event_publisher::{spawn_quiz_updated, QuizEventPublisher};
use crate::services::generation_client::GenerationClient;
use crate::services::prompt_builder::PromptBuilder;
use crate::services::question_pool::add_generated_questions;
use crate::services::quiz_locks::QuizLocks;
use crate::services::quiz_repository::QuizRepository;
use crate::services::response_mapper::drafts_from_output;
use crate::services::schema_builder::{build_schema, SchemaArgs};

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    /// Send the output schema along with the prompt.
    pub use_schema: bool,
}

/// Builds prompts, calls the model and admits the resulting questions to a
/// quiz pool. Runs in the background; failures only mean nothing is added.
pub struct AiQuizGenerationService {
    prompts: PromptBuilder,
    client: Arc<dyn GenerationClient>,
    repository: Arc<dyn QuizRepository>,
    locks: Arc<QuizLocks>,
    events: Arc<dyn QuizEventPublisher>,
    settings: GenerationSettings,
}

impl AiQuizGenerationService {
    pub fn new(
        prompts: PromptBuilder,
        client: Arc<dyn GenerationClient>,
        repository: Arc<dyn QuizRepository>,
        locks: Arc<QuizLocks>,
        events: Arc<dyn QuizEventPublisher>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            prompts,
            client,
            repository,
            locks,
            events,
            settings,
        }
    }

    pub fn build_request(&self, prompt: String, limits: &GenerationLimits) -> GenerationRequest {
        GenerationRequest {
            model: self.settings.model.clone(),
            prompt,
            stream: false,
            format: self
                .settings
                .use_schema
                .then(|| build_schema(&SchemaArgs::from(limits))),
        }
    }

    /// Generates drafts without touching any quiz. Returns an empty list when
    /// the endpoint is unreachable or its output cannot be used.
    pub async fn generate_quiz_questions(
        &self,
        description: &str,
        document_ids: &[String],
        limits: &GenerationLimits,
    ) -> Vec<QuestionDraft> {
        let prompt = self
            .prompts
            .build_prompt(description, document_ids, limits)
            .await;
        let request = self.build_request(prompt, limits);

        let started = Instant::now();
        let output = self.client.generate(&request).await;
        let status = if output.is_ok() { "success" } else { "error" };
        GENERATION_DURATION_SECONDS
            .with_label_values(&[status])
            .observe(started.elapsed().as_secs_f64());

        let raw = match output {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind(), "Question generation failed");
                return Vec::new();
            }
        };

        match drafts_from_output(&raw) {
            Some(drafts) => drafts,
            None => {
                let e = QuizError::MalformedGenerationOutput(format!(
                    "no quiz object in {} bytes of output",
                    raw.len()
                ));
                tracing::warn!(error = %e, "Discarding generation output");
                Vec::new()
            }
        }
    }

    /// Adds generated drafts to the current state of the quiz. Returns the
    /// ids of the admitted questions.
    pub async fn fill_quiz(
        &self,
        quiz_id: Uuid,
        drafts: Vec<QuestionDraft>,
    ) -> QuizResult<Vec<Uuid>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let (added, quiz) = {
            let _guard = self.locks.acquire(quiz_id).await;
            let mut quiz = self
                .repository
                .find_by_id(quiz_id)
                .await?
                .ok_or_else(|| QuizError::quiz_not_found(quiz_id))?;

            let added = add_generated_questions(&mut quiz, drafts);
            if !added.is_empty() {
                self.repository.save(&quiz).await?;
            }
            (added, quiz)
        };

        if !added.is_empty() {
            GENERATED_QUESTIONS_TOTAL.inc_by(added.len() as u64);
            spawn_quiz_updated(self.events.clone(), QuizUpdatedEvent::from_quiz(&quiz));
        }
        Ok(added)
    }

    /// One full generation pass for `quiz_id`.
    pub async fn run(&self, quiz_id: Uuid, request: &GenerateQuestionsRequest) -> QuizResult<usize> {
        let drafts = self
            .generate_quiz_questions(
                &request.description,
                &request.source_document_ids,
                &request.limits,
            )
            .await;
        let generated = drafts.len();
        let added = self.fill_quiz(quiz_id, drafts).await;
        record_mutation("generate", &added);
        let added = added?.len();

        tracing::info!(
            quiz_id = %quiz_id,
            generated,
            added,
            "Question generation finished"
        );
        Ok(added)
    }

    /// Starts a background run. The caller gets no handle; results show up
    /// in the quiz pool once the run has saved them.
    pub fn spawn_generation(self: &Arc<Self>, quiz_id: Uuid, request: GenerateQuestionsRequest) {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let status = match service.run(quiz_id, &request).await {
                Ok(0) => "empty",
                Ok(_) => "completed",
                Err(e) => {
                    tracing::error!(quiz_id = %quiz_id, error = %e, "Background generation failed");
                    "failed"
                }
            };
            GENERATION_RUNS_TOTAL.with_label_values(&[status]).inc();
        });
    }
}
