//! Prompt assembly for question generation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use tokio::sync::RwLock;

use crate::models::GenerationLimits;
use crate::services::document_summary::DocumentSummaryLookup;

pub const PLACEHOLDER_DESCRIPTION: &str = "{{description}}";
pub const PLACEHOLDER_RESOURCES: &str = "{{resources}}";
pub const PLACEHOLDER_LIMITATIONS: &str = "{{limitations}}";

const BLOCK_SEPARATOR: &str = " \n";

const DEFAULT_TEMPLATE: &str = include_str!("../../prompt_templates/quiz_generation.txt");

/// Process-wide copy of the prompt template. Built once at startup and shared
/// by reference; `reload` picks up edits to the file without a restart.
pub struct PromptTemplateCache {
    path: PathBuf,
    template: RwLock<Option<String>>,
}

impl PromptTemplateCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            template: RwLock::new(None),
        }
    }

    /// Cache pre-filled with `template`; the file is only read on `reload`.
    pub fn with_template(path: impl Into<PathBuf>, template: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            template: RwLock::new(Some(template.into())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached template, loading it on first use. A missing or unreadable file
    /// falls back to the built-in template.
    pub async fn get(&self) -> String {
        if let Some(template) = self.template.read().await.as_ref() {
            return template.clone();
        }

        let mut slot = self.template.write().await;
        if let Some(template) = slot.as_ref() {
            return template.clone();
        }
        let template = match tokio::fs::read_to_string(&self.path).await {
            Ok(template) => template,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Prompt template not readable, using built-in template"
                );
                DEFAULT_TEMPLATE.to_string()
            }
        };
        *slot = Some(template.clone());
        template
    }

    /// Re-reads the template file and replaces the cached copy.
    pub async fn reload(&self) -> Result<String> {
        let template = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read prompt template {}", self.path.display()))?;
        *self.template.write().await = Some(template.clone());
        tracing::info!(path = %self.path.display(), "Prompt template reloaded");
        Ok(template)
    }
}

/// Renders generation limits as the sentences the model is given.
pub fn build_limitations(limits: &GenerationLimits) -> Vec<String> {
    vec![
        format!("the maximum number of questions is: {}", limits.max_questions),
        format!("the minimum number of questions is: {}", limits.min_questions),
        format!(
            "the maximum number of answers per question is: {}",
            limits.max_answers_per_question
        ),
        format!(
            "the maximum number of multiple choice questions is: {}",
            limits.max_multiple_choice_questions
        ),
        format!(
            "the maximum number of free text questions is: {}",
            limits.max_free_text_questions
        ),
        format!(
            "the maximum number of numeric questions is: {}",
            limits.max_numeric_questions
        ),
        format!(
            "the maximum number of exact answer questions is: {}",
            limits.max_exact_questions
        ),
        format!(
            "are multiple choice questions with multiple correct answers allowed: {}",
            limits.allow_multiple_correct_answers
        ),
    ]
}

pub fn fill_template(
    template: &str,
    description: &str,
    resources: &[String],
    limitations: &[String],
) -> String {
    template
        .replace(PLACEHOLDER_DESCRIPTION, description)
        .replace(PLACEHOLDER_RESOURCES, &resources.join(BLOCK_SEPARATOR))
        .replace(PLACEHOLDER_LIMITATIONS, &limitations.join(BLOCK_SEPARATOR))
}

pub struct PromptBuilder {
    templates: Arc<PromptTemplateCache>,
    documents: Arc<dyn DocumentSummaryLookup>,
}

impl PromptBuilder {
    pub fn new(
        templates: Arc<PromptTemplateCache>,
        documents: Arc<dyn DocumentSummaryLookup>,
    ) -> Self {
        Self {
            templates,
            documents,
        }
    }

    /// Summaries of the referenced documents, one entry per id and in order.
    pub async fn load_resources(&self, document_ids: &[String]) -> Vec<String> {
        join_all(document_ids.iter().map(|id| self.documents.summary(id))).await
    }

    pub async fn build_prompt(
        &self,
        description: &str,
        document_ids: &[String],
        limits: &GenerationLimits,
    ) -> String {
        let template = self.templates.get().await;
        let resources = self.load_resources(document_ids).await;
        fill_template(&template, description, &resources, &build_limitations(limits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FixedDocuments(HashMap<String, String>);

    #[async_trait]
    impl DocumentSummaryLookup for FixedDocuments {
        async fn summary(&self, document_id: &str) -> String {
            self.0.get(document_id).cloned().unwrap_or_default()
        }
    }

    #[test]
    fn limitations_render_every_limit() {
        let limits = GenerationLimits {
            max_questions: 3,
            allow_multiple_correct_answers: true,
            ..GenerationLimits::default()
        };
        let lines = build_limitations(&limits);

        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "the maximum number of questions is: 3");
        assert_eq!(lines[1], "the minimum number of questions is: 1");
        assert_eq!(lines[6], "the maximum number of exact answer questions is: 5");
        assert_eq!(
            lines[7],
            "are multiple choice questions with multiple correct answers allowed: true"
        );
    }

    #[test]
    fn fill_template_replaces_all_placeholders() {
        let prompt = fill_template(
            "D={{description}}|R={{resources}}|L={{limitations}}",
            "cells",
            &["a".to_string(), "b".to_string()],
            &["x".to_string()],
        );
        assert_eq!(prompt, "D=cells|R=a \nb|L=x");
    }

    #[test]
    fn bundled_template_has_all_placeholders() {
        for placeholder in [
            PLACEHOLDER_DESCRIPTION,
            PLACEHOLDER_RESOURCES,
            PLACEHOLDER_LIMITATIONS,
        ] {
            assert!(DEFAULT_TEMPLATE.contains(placeholder), "{}", placeholder);
        }
    }

    #[tokio::test]
    async fn missing_template_file_falls_back_to_builtin() {
        let cache = PromptTemplateCache::new("/nonexistent/quiz_generation.txt");
        assert_eq!(cache.get().await, DEFAULT_TEMPLATE);
        assert!(cache.reload().await.is_err());
        assert_eq!(cache.get().await, DEFAULT_TEMPLATE);
    }

    #[tokio::test]
    async fn reload_replaces_cached_template() {
        let path = std::env::temp_dir().join(format!("quiz-template-{}.txt", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, "first {{description}}").await.unwrap();

        let cache = PromptTemplateCache::new(&path);
        assert_eq!(cache.get().await, "first {{description}}");

        tokio::fs::write(&path, "second {{description}}").await.unwrap();
        assert_eq!(cache.get().await, "first {{description}}");
        cache.reload().await.unwrap();
        assert_eq!(cache.get().await, "second {{description}}");

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn prompt_contains_summaries_and_limits() {
        let templates = Arc::new(PromptTemplateCache::with_template(
            "unused",
            "{{description}}\n{{resources}}\n{{limitations}}",
        ));
        let documents = Arc::new(FixedDocuments(HashMap::from([(
            "doc-1".to_string(),
            "The capital of France is Paris.".to_string(),
        )])));
        let builder = PromptBuilder::new(templates, documents);

        let prompt = builder
            .build_prompt(
                "Geography",
                &["doc-1".to_string(), "missing".to_string()],
                &GenerationLimits::default(),
            )
            .await;

        assert!(prompt.starts_with("Geography\nThe capital of France is Paris. \n\n"));
        assert!(prompt.contains("the maximum number of questions is: 10"));
    }
}
