use anyhow::Context;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use quiz_api::{
    config::{Config, StorageBackend},
    create_router,
    services::AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SERVICE_NAME: &str = "quiz-api";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let tracer_provider = init_tracing()?;

    let config = Config::load().context("Failed to load configuration")?;
    tracing::info!(
        storage = ?config.storage,
        bind_addr = %config.bind_addr,
        "Starting quiz service"
    );

    let bind_addr = config.bind_addr.clone();
    let app_state = match config.storage {
        StorageBackend::Memory => AppState::in_memory(config),
        StorageBackend::Mongo => {
            let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
                .await
                .context("Failed to connect to MongoDB")?;
            let redis_client = redis::Client::open(config.redis_uri.clone())
                .context("Failed to create Redis client")?;
            AppState::new(config, mongo_client, redis_client).await?
        }
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("Server listening on {}", bind_addr);

    if let Err(e) = axum::serve(listener, create_router(Arc::new(app_state))).await {
        tracing::error!(error = %e, "Server stopped with error");
    }

    if let Err(e) = tracer_provider.shutdown() {
        eprintln!("Failed to flush traces: {}", e);
    }
    Ok(())
}

/// Installs the fmt subscriber and exports spans over OTLP/HTTP to
/// `OTEL_EXPORTER_OTLP_ENDPOINT`.
fn init_tracing() -> anyhow::Result<SdkTracerProvider> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4318".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint.clone())
        .build()
        .context("Failed to create OTLP exporter")?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            Resource::builder_empty()
                .with_service_name(SERVICE_NAME)
                .build(),
        )
        .build();
    let tracer = provider.tracer(SERVICE_NAME);
    opentelemetry::global::set_tracer_provider(provider.clone());

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quiz_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .init();

    tracing::debug!(otlp_endpoint = %endpoint, "Tracing initialized");
    Ok(provider)
}
