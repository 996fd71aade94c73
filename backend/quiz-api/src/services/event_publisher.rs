use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use serde::Serialize;

use crate::metrics::EVENTS_PUBLISHED_TOTAL;
use crate::models::events::{
    ContentProgressedEvent, QuizUpdatedEvent, TOPIC_CONTENT_PROGRESSED, TOPIC_QUIZ_UPDATED,
};
use crate::utils::retry::{retry_async_with_config, RetryConfig};

/// Outbound notifications to the rest of the platform.
#[async_trait]
pub trait QuizEventPublisher: Send + Sync {
    async fn publish_quiz_updated(&self, event: &QuizUpdatedEvent) -> Result<()>;

    async fn publish_content_progressed(&self, event: &ContentProgressedEvent) -> Result<()>;
}

/// Appends events to a Redis stream as `topic`/`payload`/`timestamp` entries.
pub struct RedisStreamPublisher {
    redis: ConnectionManager,
    stream_name: String,
}

impl RedisStreamPublisher {
    pub fn new(redis: ConnectionManager, stream_name: impl Into<String>) -> Self {
        Self {
            redis,
            stream_name: stream_name.into(),
        }
    }

    async fn append<T: Serialize + Sync>(&self, topic: &str, event: &T) -> Result<()> {
        let payload = serde_json::to_string(event).context("Failed to encode event payload")?;
        let mut conn = self.redis.clone();
        redis::cmd("XADD")
            .arg(&self.stream_name)
            .arg("*")
            .arg("topic")
            .arg(topic)
            .arg("payload")
            .arg(payload)
            .arg("timestamp")
            .arg(Utc::now().timestamp_millis().to_string())
            .query_async::<String>(&mut conn)
            .await
            .with_context(|| format!("Failed to publish {} event", topic))?;
        Ok(())
    }
}

#[async_trait]
impl QuizEventPublisher for RedisStreamPublisher {
    async fn publish_quiz_updated(&self, event: &QuizUpdatedEvent) -> Result<()> {
        self.append(TOPIC_QUIZ_UPDATED, event).await
    }

    async fn publish_content_progressed(&self, event: &ContentProgressedEvent) -> Result<()> {
        self.append(TOPIC_CONTENT_PROGRESSED, event).await
    }
}

/// Publisher for deployments without an event bus.
pub struct NoopEventPublisher;

#[async_trait]
impl QuizEventPublisher for NoopEventPublisher {
    async fn publish_quiz_updated(&self, event: &QuizUpdatedEvent) -> Result<()> {
        tracing::debug!(quiz_id = %event.quiz_id, "Skipping quiz_updated event");
        Ok(())
    }

    async fn publish_content_progressed(&self, event: &ContentProgressedEvent) -> Result<()> {
        tracing::debug!(content_id = %event.content_id, "Skipping content_progressed event");
        Ok(())
    }
}

/// Publishes in the background with retries. Failures end up in the log and
/// in `quiz_events_published_total{status="error"}`, never at the caller.
pub fn spawn_quiz_updated(publisher: Arc<dyn QuizEventPublisher>, event: QuizUpdatedEvent) {
    tokio::spawn(async move {
        let result = retry_async_with_config(RetryConfig::default(), || {
            publisher.publish_quiz_updated(&event)
        })
        .await;
        record_publish(TOPIC_QUIZ_UPDATED, &result);
        if let Err(e) = result {
            tracing::error!(
                quiz_id = %event.quiz_id,
                "Background quiz_updated publish failed: {:#}",
                e
            );
        }
    });
}

pub fn spawn_content_progressed(
    publisher: Arc<dyn QuizEventPublisher>,
    event: ContentProgressedEvent,
) {
    tokio::spawn(async move {
        let result = retry_async_with_config(RetryConfig::default(), || {
            publisher.publish_content_progressed(&event)
        })
        .await;
        record_publish(TOPIC_CONTENT_PROGRESSED, &result);
        if let Err(e) = result {
            tracing::error!(
                content_id = %event.content_id,
                user_id = %event.user_id,
                "Background content_progressed publish failed: {:#}",
                e
            );
        }
    });
}

fn record_publish(topic: &str, result: &Result<()>) {
    let status = if result.is_ok() { "success" } else { "error" };
    EVENTS_PUBLISHED_TOTAL
        .with_label_values(&[topic, status])
        .inc();
}
