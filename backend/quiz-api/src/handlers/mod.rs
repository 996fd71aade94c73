use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::metrics;
use crate::services::{AppState, Connections};

pub mod quizgen;
pub mod quizzes;

/// Reports the service and, outside memory mode, the reachability of MongoDB
/// and Redis. Any unreachable dependency turns the answer into a 503.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (dependencies, healthy) = match &state.connections {
        None => (json!({ "storage": { "status": "memory" } }), true),
        Some(connections) => {
            let (mongodb, redis) = tokio::join!(ping_mongodb(connections), ping_redis(connections));
            let healthy = [&mongodb, &redis]
                .iter()
                .all(|dependency| dependency["status"] == "healthy");
            (json!({ "mongodb": mongodb, "redis": redis }), healthy)
        }
    };

    let (status_code, status) = if healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "quiz-api",
            "version": env!("CARGO_PKG_VERSION"),
            "dependencies": dependencies
        })),
    )
}

async fn ping_mongodb(connections: &Connections) -> Value {
    let ping = connections
        .mongo
        .run_command(mongodb::bson::doc! { "ping": 1 });
    bounded_ping("MongoDB", Duration::from_secs(1), async { ping.await.map(|_| ()) }).await
}

async fn ping_redis(connections: &Connections) -> Value {
    let mut conn = connections.redis.clone();
    bounded_ping("Redis", Duration::from_millis(500), async move {
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
    })
    .await
}

async fn bounded_ping<F, E>(dependency: &str, limit: Duration, ping: F) -> Value
where
    F: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(limit, ping).await {
        Ok(Ok(())) => json!({ "status": "healthy" }),
        Ok(Err(e)) => json!({
            "status": "unhealthy",
            "error": format!("{} error: {}", dependency, e)
        }),
        Err(_) => json!({
            "status": "unhealthy",
            "error": format!("{} timeout after {}ms", dependency, limit.as_millis())
        }),
    }
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}
