use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Bson},
    Collection, Database,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::Quiz;

const QUIZ_COLLECTION: &str = "quizzes";

/// Storage of whole quiz aggregates. `save` is a full upsert: questions that
/// are no longer in the pool disappear together with their statistics.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Quiz>>;

    /// Returns the stored quizzes among `ids`; missing ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Quiz>>;

    async fn save(&self, quiz: &Quiz) -> Result<()>;

    /// Returns `false` when nothing was stored under `id`.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64>;
}

/// Mongo document wrapping a quiz. The aggregate goes through its JSON form
/// so ids are stored as plain strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuizDocument {
    #[serde(rename = "_id")]
    id: String,
    course_id: String,
    quiz: Bson,
    updated_at: DateTime<Utc>,
}

impl QuizDocument {
    fn from_quiz(quiz: &Quiz) -> Result<Self> {
        let value = serde_json::to_value(quiz).context("Failed to encode quiz")?;
        Ok(Self {
            id: quiz.id.to_string(),
            course_id: quiz.course_id.to_string(),
            quiz: to_bson(&value).context("Failed to convert quiz to BSON")?,
            updated_at: Utc::now(),
        })
    }

    fn into_quiz(self) -> Result<Quiz> {
        serde_json::from_value(self.quiz.into_relaxed_extjson())
            .with_context(|| format!("Stored quiz {} is corrupt", self.id))
    }
}

pub struct MongoQuizRepository {
    collection: Collection<QuizDocument>,
}

impl MongoQuizRepository {
    pub fn new(mongo: &Database) -> Self {
        Self {
            collection: mongo.collection(QUIZ_COLLECTION),
        }
    }
}

fn id_strings(ids: &[Uuid]) -> Vec<String> {
    ids.iter().map(Uuid::to_string).collect()
}

#[async_trait]
impl QuizRepository for MongoQuizRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Quiz>> {
        let document = self
            .collection
            .find_one(doc! { "_id": id.to_string() })
            .await
            .with_context(|| format!("Failed to load quiz {}", id))?;
        document.map(QuizDocument::into_quiz).transpose()
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Quiz>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": id_strings(ids) } })
            .await
            .context("Failed to query quizzes")?;
        let documents: Vec<QuizDocument> = cursor
            .try_collect()
            .await
            .context("Failed to collect quiz documents")?;
        documents.into_iter().map(QuizDocument::into_quiz).collect()
    }

    async fn save(&self, quiz: &Quiz) -> Result<()> {
        let document = QuizDocument::from_quiz(quiz)?;
        self.collection
            .replace_one(doc! { "_id": &document.id }, &document)
            .upsert(true)
            .await
            .with_context(|| format!("Failed to save quiz {}", quiz.id))?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.to_string() })
            .await
            .with_context(|| format!("Failed to delete quiz {}", id))?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = self
            .collection
            .delete_many(doc! { "_id": { "$in": id_strings(ids) } })
            .await
            .context("Failed to delete quizzes")?;
        Ok(result.deleted_count)
    }
}

/// Process-local store used for `APP_STORAGE=memory` and in tests.
#[derive(Default)]
pub struct InMemoryQuizRepository {
    quizzes: RwLock<HashMap<Uuid, Quiz>>,
}

impl InMemoryQuizRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizRepository for InMemoryQuizRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Quiz>> {
        Ok(self.quizzes.read().await.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        Ok(ids.iter().filter_map(|id| quizzes.get(id).cloned()).collect())
    }

    async fn save(&self, quiz: &Quiz) -> Result<()> {
        self.quizzes.write().await.insert(quiz.id, quiz.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.quizzes.write().await.remove(&id).is_some())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64> {
        let mut quizzes = self.quizzes.write().await;
        Ok(ids.iter().filter(|id| quizzes.remove(*id).is_some()).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_round_trip() {
        let repo = InMemoryQuizRepository::new();
        let quiz = Quiz::new(Uuid::new_v4(), Uuid::new_v4());

        assert!(repo.find_by_id(quiz.id).await.unwrap().is_none());
        repo.save(&quiz).await.unwrap();
        assert_eq!(repo.find_by_id(quiz.id).await.unwrap(), Some(quiz.clone()));

        assert!(repo.delete(quiz.id).await.unwrap());
        assert!(!repo.delete(quiz.id).await.unwrap());
    }

    #[tokio::test]
    async fn in_memory_bulk_operations_skip_missing_ids() {
        let repo = InMemoryQuizRepository::new();
        let first = Quiz::new(Uuid::new_v4(), Uuid::new_v4());
        let second = Quiz::new(Uuid::new_v4(), Uuid::new_v4());
        repo.save(&first).await.unwrap();
        repo.save(&second).await.unwrap();

        let found = repo
            .find_by_ids(&[first.id, Uuid::new_v4(), second.id])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let deleted = repo
            .delete_many(&[first.id, Uuid::new_v4()])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(repo.find_by_id(second.id).await.unwrap().is_some());
    }
}
