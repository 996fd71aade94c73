use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Mongo,
    /// Keeps quizzes in process memory and drops events. For local runs.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub redis_uri: String,
    pub events_stream: String,
    pub storage: StorageBackend,
    pub ollama_url: String,
    pub quizgen_model: String,
    pub quizgen_template_path: String,
    pub quizgen_use_schema: bool,
    pub docproc_url: String,
    pub docproc_timeout_secs: u64,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongo_uri: "mongodb://localhost:27017".to_string(),
            mongo_database: "quiz_service".to_string(),
            redis_uri: "redis://127.0.0.1:6379/0".to_string(),
            events_stream: "quiz_events".to_string(),
            storage: StorageBackend::Mongo,
            ollama_url: "http://localhost:11434".to_string(),
            quizgen_model: "mistral-nemo".to_string(),
            quizgen_template_path: "prompt_templates/quiz_generation.txt".to_string(),
            quizgen_use_schema: true,
            docproc_url: "http://localhost:4001/graphql".to_string(),
            docproc_timeout_secs: 10,
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first, then the local one
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/*.toml, then APP__* overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let defaults = Config::default();
        let string = |key: &str, var: &str, default: String| {
            settings
                .get_string(key)
                .or_else(|_| env::var(var))
                .unwrap_or(default)
        };

        let mongo_uri = string("database.mongo_uri", "MONGO_URI", defaults.mongo_uri);
        let mongo_database = string(
            "database.mongo_database",
            "MONGO_DATABASE",
            defaults.mongo_database,
        );
        let redis_uri = string("redis.uri", "REDIS_URI", defaults.redis_uri);
        let events_stream = string("events.stream_name", "EVENTS_STREAM", defaults.events_stream);

        let storage = match env::var("APP_STORAGE").ok().as_deref() {
            Some("memory") => StorageBackend::Memory,
            Some("mongo") | None => StorageBackend::Mongo,
            Some(other) => {
                return Err(config::ConfigError::Message(format!(
                    "unknown APP_STORAGE value: {}",
                    other
                )))
            }
        };

        let ollama_url = string("quizgen.url", "OLLAMA_URL", defaults.ollama_url);
        let quizgen_model = string("quizgen.model", "QUIZGEN_MODEL", defaults.quizgen_model);
        let quizgen_template_path = string(
            "quizgen.template_path",
            "QUIZGEN_TEMPLATE_PATH",
            defaults.quizgen_template_path,
        );
        let quizgen_use_schema = settings
            .get_bool("quizgen.use_schema")
            .ok()
            .or_else(|| env::var("QUIZGEN_USE_SCHEMA").ok().and_then(|v| parse_bool(&v)))
            .unwrap_or(defaults.quizgen_use_schema);

        let docproc_url = string("docproc.url", "DOCPROC_URL", defaults.docproc_url);
        let docproc_timeout_secs = settings
            .get_int("docproc.timeout_secs")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .or_else(|| {
                env::var("DOCPROC_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(defaults.docproc_timeout_secs);

        let bind_addr = string("server.bind_addr", "BIND_ADDR", defaults.bind_addr);

        Ok(Config {
            mongo_uri,
            mongo_database,
            redis_uri,
            events_stream,
            storage,
            ollama_url,
            quizgen_model,
            quizgen_template_path,
            quizgen_use_schema,
            docproc_url,
            docproc_timeout_secs,
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_services() {
        let config = Config::default();
        assert_eq!(config.mongo_database, "quiz_service");
        assert_eq!(config.events_stream, "quiz_events");
        assert_eq!(config.quizgen_model, "mistral-nemo");
        assert!(config.quizgen_use_schema);
        assert_eq!(config.storage, StorageBackend::Mongo);
    }

    #[test]
    fn bool_flags_accept_common_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
