use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Speech provider
    pub tts_provider: TtsProvider,
    pub aws_region: String,
    pub openai_api_key: Option<String>,
    pub openai_tts_model: String,
    pub tts_provider_timeout_secs: u64,
    // Generated audio
    pub audio_storage_dir: PathBuf,
    pub audio_public_base_url: String,
    // Orchestration
    pub tts_batch_concurrency: usize,
    pub tts_generation_lock_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    OpenAi,
    Polly,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let tts_provider = match var("TTS_PROVIDER", "openai").to_lowercase().as_str() {
            "polly" => TtsProvider::Polly,
            "openai" => TtsProvider::OpenAi,
            other => return Err(format!("Unknown TTS_PROVIDER '{}'", other).into()),
        };
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());
        if tts_provider == TtsProvider::OpenAi && openai_api_key.is_none() {
            return Err("OPENAI_API_KEY is required when TTS_PROVIDER is openai".into());
        }

        let config = Config {
            database_url: lookup("DATABASE_URL").ok_or("DATABASE_URL is not set")?,
            host: var("HOST", "0.0.0.0"),
            port: var("PORT", "8080").parse()?,
            environment: match var("ENVIRONMENT", "development").as_str() {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match var("LOG_FORMAT", "pretty").as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            tts_provider,
            aws_region: var("AWS_REGION", "eu-west-1"),
            openai_api_key,
            openai_tts_model: var("OPENAI_TTS_MODEL", "tts-1"),
            tts_provider_timeout_secs: var("TTS_PROVIDER_TIMEOUT_SECS", "120").parse()?,
            audio_storage_dir: PathBuf::from(var("AUDIO_STORAGE_DIR", "./audio")),
            audio_public_base_url: var("AUDIO_PUBLIC_BASE_URL", "http://localhost:8080/audio"),
            tts_batch_concurrency: var("TTS_BATCH_CONCURRENCY", "3").parse()?,
            tts_generation_lock_enabled: var("TTS_GENERATION_LOCK_ENABLED", "true")
                .to_lowercase()
                == "true",
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.tts_provider_timeout_secs)
    }
}
