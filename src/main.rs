use async_openai::{config::OpenAIConfig, Client as OpenAiClient};
use chapter_audio_backend::controllers::audio::AudioController;
use chapter_audio_backend::domain::audio::{
    AudioServiceSettings, BookAudioService, ChapterAudioService, ChapterAudioServiceApi,
    TracingEventSink,
};
use chapter_audio_backend::infrastructure::config::{Config, LogFormat, TtsProvider};
use chapter_audio_backend::infrastructure::db::{check_connection, create_pool, run_migrations};
use chapter_audio_backend::infrastructure::http::start_http_server;
use chapter_audio_backend::infrastructure::repositories::{
    AudioStorage, OpenAiSpeechProvider, PgAudioJobRepository, PgChapterRepository,
    PollySpeechProvider, SpeechProvider,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting chapter audio backend on {}:{}",
        config.host,
        config.port
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection pool created");

    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    let storage = Arc::new(AudioStorage::new(
        config.audio_storage_dir.clone(),
        config.audio_public_base_url.clone(),
    ));
    tokio::fs::create_dir_all(storage.root()).await?;
    tracing::info!(
        audio_dir = %storage.root().display(),
        public_base_url = %config.audio_public_base_url,
        "Audio storage ready"
    );

    let speech_provider = create_speech_provider(&config, storage).await?;
    tracing::info!(
        provider = speech_provider.name(),
        timeout_secs = config.tts_provider_timeout_secs,
        "Speech provider initialized"
    );

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Repositories
    tracing::info!("Instantiating repositories...");
    let chapter_repo = Arc::new(PgChapterRepository::new(pool.clone()));
    let job_repo = Arc::new(PgAudioJobRepository::new(pool.clone()));

    // 2. Services
    tracing::info!("Instantiating services...");
    let chapter_audio: Arc<dyn ChapterAudioServiceApi> = Arc::new(ChapterAudioService::new(
        chapter_repo.clone(),
        job_repo,
        speech_provider,
        Arc::new(TracingEventSink),
        AudioServiceSettings {
            provider_timeout: config.provider_timeout(),
            generation_lock_enabled: config.tts_generation_lock_enabled,
        },
    ));
    let book_audio = Arc::new(BookAudioService::new(
        chapter_repo,
        chapter_audio.clone(),
        config.tts_batch_concurrency,
    ));

    // 3. Controllers
    tracing::info!("Instantiating controllers...");
    let audio_controller = Arc::new(AudioController::new(chapter_audio, book_audio));

    start_http_server(pool, config, audio_controller).await?;

    Ok(())
}

async fn create_speech_provider(
    config: &Config,
    storage: Arc<AudioStorage>,
) -> Result<Arc<dyn SpeechProvider>, Box<dyn std::error::Error>> {
    match config.tts_provider {
        TtsProvider::Polly => {
            tracing::info!("Initializing AWS Polly client with region: {}", config.aws_region);

            let has_access_key = std::env::var("AWS_ACCESS_KEY_ID").is_ok();
            let has_secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").is_ok();
            if !has_access_key || !has_secret_key {
                tracing::warn!("AWS credentials not found in environment variables. Will attempt to use other credential providers (instance metadata, etc.)");
            }

            let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(config.aws_region.clone()))
                .load()
                .await;
            tracing::info!(region = ?aws_config.region(), "AWS configuration loaded");

            let polly_client = Arc::new(aws_sdk_polly::Client::new(&aws_config));
            Ok(Arc::new(PollySpeechProvider::new(polly_client, storage)))
        }
        TtsProvider::OpenAi => {
            let api_key = config
                .openai_api_key
                .clone()
                .ok_or("OPENAI_API_KEY is not set")?;
            let client = OpenAiClient::with_config(OpenAIConfig::new().with_api_key(api_key));
            Ok(Arc::new(OpenAiSpeechProvider::new(
                Arc::new(client),
                config.openai_tts_model.clone(),
                storage,
            )))
        }
    }
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "chapter_audio_backend=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
