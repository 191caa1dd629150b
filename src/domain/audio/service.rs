use super::dto::GenerateAudioOptions;
use super::error::AudioServiceError;
use super::events::{AudioEvent, AudioEventSink};
use super::language::{LanguageCode, LanguageDetector};
use super::lock::{GenerationKey, GenerationLocks};
use super::model::{AudioJob, AudioJobStatus, AudioOutput, NewAudioJob};
use crate::domain::chapter::Chapter;
use crate::infrastructure::repositories::{
    AudioJobStore, ChapterRepository, SpeechProvider, SpeechProviderError, SpeechRequest,
    SynthesizedAudio,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_SPEED: f32 = 1.0;
const MIN_SPEED: f32 = 0.25;
const MAX_SPEED: f32 = 4.0;

#[derive(Debug, Clone)]
pub struct AudioServiceSettings {
    /// Upper bound for a single provider call
    pub provider_timeout: Duration,
    /// Serialize generation per (chapter, language, voice) inside this process
    pub generation_lock_enabled: bool,
}

impl Default for AudioServiceSettings {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(120),
            generation_lock_enabled: true,
        }
    }
}

/// Language and voice a job will be generated with
#[derive(Debug, Clone, PartialEq)]
struct VoiceSelection {
    language: String,
    voice: String,
}

pub struct ChapterAudioService {
    chapter_repo: Arc<dyn ChapterRepository>,
    job_store: Arc<dyn AudioJobStore>,
    speech_provider: Arc<dyn SpeechProvider>,
    events: Arc<dyn AudioEventSink>,
    language_detector: LanguageDetector,
    locks: Option<GenerationLocks>,
    settings: AudioServiceSettings,
}

impl ChapterAudioService {
    pub fn new(
        chapter_repo: Arc<dyn ChapterRepository>,
        job_store: Arc<dyn AudioJobStore>,
        speech_provider: Arc<dyn SpeechProvider>,
        events: Arc<dyn AudioEventSink>,
        settings: AudioServiceSettings,
    ) -> Self {
        let locks = if settings.generation_lock_enabled {
            Some(GenerationLocks::new())
        } else {
            None
        };

        Self {
            chapter_repo,
            job_store,
            speech_provider,
            events,
            language_detector: LanguageDetector::new(),
            locks,
            settings,
        }
    }
}

#[async_trait]
pub trait ChapterAudioServiceApi: Send + Sync {
    /// Produce audio for a chapter, or return the cached completed job.
    ///
    /// A completed job with the same chapter, language and voice is reused
    /// unless `force_regenerate` is set. Otherwise a new job is created and
    /// driven through pending, processing and completed (or failed). A
    /// provider failure leaves a failed job behind and is returned as
    /// `GenerationFailed`.
    async fn generate_chapter_audio(
        &self,
        chapter_id: &str,
        options: GenerateAudioOptions,
    ) -> Result<AudioJob, AudioServiceError>;

    /// Most recent completed job for the chapter
    async fn get_chapter_audio(&self, chapter_id: &str)
        -> Result<Option<AudioJob>, AudioServiceError>;

    /// Every job of the chapter, newest first, failures included
    async fn list_chapter_audio_jobs(
        &self,
        chapter_id: &str,
    ) -> Result<Vec<AudioJob>, AudioServiceError>;

    /// Remove all jobs of the chapter and return how many were removed
    async fn delete_chapter_audio(&self, chapter_id: &str) -> Result<u64, AudioServiceError>;

    /// Count one playback of the chapter's current audio.
    /// Does nothing when the chapter has no completed audio.
    async fn increment_play_count(&self, chapter_id: &str) -> Result<(), AudioServiceError>;
}

#[async_trait]
impl ChapterAudioServiceApi for ChapterAudioService {
    async fn generate_chapter_audio(
        &self,
        chapter_id: &str,
        options: GenerateAudioOptions,
    ) -> Result<AudioJob, AudioServiceError> {
        let chapter_id = parse_id(chapter_id, "chapter")?;
        let speed = validate_speed(options.speed)?;

        tracing::info!(
            chapter_id = %chapter_id,
            force_regenerate = options.force_regenerate,
            "Chapter audio requested"
        );

        let chapter = self.load_chapter(chapter_id).await?;
        let text = chapter.full_text();
        if text.trim().is_empty() {
            tracing::warn!(chapter_id = %chapter_id, "Chapter has no text to synthesize");
            return Err(AudioServiceError::EmptyContent(chapter_id));
        }

        let selection = self.select_voice(&text, &options);
        tracing::info!(
            chapter_id = %chapter_id,
            language = %selection.language,
            voice = %selection.voice,
            "Voice selected"
        );

        let _guard = match &self.locks {
            Some(locks) => Some(
                locks
                    .acquire(GenerationKey::new(
                        chapter_id,
                        &selection.language,
                        &selection.voice,
                    ))
                    .await,
            ),
            None => None,
        };

        if !options.force_regenerate {
            if let Some(existing) = self
                .job_store
                .find_existing(chapter_id, &selection.language, &selection.voice)
                .await?
            {
                tracing::info!(
                    chapter_id = %chapter_id,
                    job_id = %existing.id(),
                    "Chapter audio cache hit"
                );
                self.events.publish(&AudioEvent::CacheHit {
                    chapter_id,
                    job_id: existing.id(),
                });
                return Ok(existing);
            }
        }

        let new_job = NewAudioJob::new(
            chapter.id,
            chapter.book_id,
            text,
            chapter.paragraph_count(),
            selection.voice,
            selection.language,
            speed,
        );
        let job = self.job_store.create(new_job).await?;
        self.events.publish(&AudioEvent::JobCreated {
            chapter_id,
            job_id: job.id(),
        });

        self.job_store
            .update_status(job.id(), AudioJobStatus::Processing, None)
            .await?;
        let job = job.to_processing(Utc::now())?;
        self.events.publish(&AudioEvent::JobProcessing {
            chapter_id,
            job_id: job.id(),
        });

        let format = options.format.unwrap_or_default();
        let request = SpeechRequest {
            voice: job.voice().to_string(),
            language: job.language().to_string(),
            speed,
            format,
        };

        let synthesized = self.synthesize(job.text(), &request).await;
        match synthesized {
            Ok(audio) => {
                let output = AudioOutput {
                    url: audio.audio_url,
                    format,
                    duration_seconds: audio.duration_seconds,
                };
                let completed = job.to_completed(output, Utc::now())?;
                let completed = self.job_store.update(&completed).await?;

                tracing::info!(
                    chapter_id = %chapter_id,
                    job_id = %completed.id(),
                    provider = self.speech_provider.name(),
                    character_count = completed.character_count(),
                    audio_duration = completed.audio_duration().unwrap_or_default(),
                    "Chapter audio completed"
                );
                self.events.publish(&AudioEvent::JobCompleted {
                    chapter_id,
                    job_id: completed.id(),
                    audio_url: completed.audio_url().unwrap_or_default().to_string(),
                });
                Ok(completed)
            }
            Err(e) => Err(self.record_failure(job, e).await?),
        }
    }

    async fn get_chapter_audio(
        &self,
        chapter_id: &str,
    ) -> Result<Option<AudioJob>, AudioServiceError> {
        let chapter_id = parse_id(chapter_id, "chapter")?;
        Ok(self.job_store.find_completed_by_chapter(chapter_id).await?)
    }

    async fn list_chapter_audio_jobs(
        &self,
        chapter_id: &str,
    ) -> Result<Vec<AudioJob>, AudioServiceError> {
        let chapter_id = parse_id(chapter_id, "chapter")?;
        Ok(self.job_store.list_by_chapter(chapter_id).await?)
    }

    async fn delete_chapter_audio(&self, chapter_id: &str) -> Result<u64, AudioServiceError> {
        let chapter_id = parse_id(chapter_id, "chapter")?;
        // TODO: remove the stored audio files once AudioStorage can delete by URL
        let jobs_removed = self.job_store.delete_by_chapter(chapter_id).await?;

        tracing::info!(
            chapter_id = %chapter_id,
            jobs_removed = jobs_removed,
            "Chapter audio deleted"
        );
        self.events.publish(&AudioEvent::AudioDeleted {
            chapter_id,
            jobs_removed,
        });
        Ok(jobs_removed)
    }

    async fn increment_play_count(&self, chapter_id: &str) -> Result<(), AudioServiceError> {
        let chapter_id = parse_id(chapter_id, "chapter")?;
        let Some(job) = self.job_store.find_completed_by_chapter(chapter_id).await? else {
            tracing::debug!(chapter_id = %chapter_id, "No completed audio to count a play for");
            return Ok(());
        };

        // The transition validates the play; storage applies it atomically
        let now = Utc::now();
        let played = job.record_play(now)?;
        let counted = self
            .job_store
            .increment_play_count(played.id(), now)
            .await?;
        tracing::debug!(
            chapter_id = %chapter_id,
            job_id = %played.id(),
            counted = counted,
            play_count_at_least = played.play_count(),
            "Playback recorded"
        );
        Ok(())
    }
}

impl ChapterAudioService {
    async fn load_chapter(&self, chapter_id: Uuid) -> Result<Chapter, AudioServiceError> {
        self.chapter_repo
            .find_by_id(chapter_id)
            .await?
            .ok_or_else(|| AudioServiceError::NotFound(format!("Chapter {}", chapter_id)))
    }

    /// Explicit options win; the detected language fills the gaps. A language
    /// without a voice gets that language's default voice.
    fn select_voice(&self, text: &str, options: &GenerateAudioOptions) -> VoiceSelection {
        let requested_language = non_blank(options.language.as_deref());
        let requested_voice = non_blank(options.voice.as_deref());

        let (language, language_voice) = match requested_language {
            Some(tag) => match LanguageCode::from_tag(tag) {
                Some(code) => (code.as_str().to_string(), code.default_voice().to_string()),
                None => (tag.to_string(), format!("{}-Standard", tag)),
            },
            None => {
                let detected = self.language_detector.detect(text);
                (detected.code.as_str().to_string(), detected.voice.to_string())
            }
        };

        VoiceSelection {
            language,
            voice: requested_voice
                .map(str::to_string)
                .unwrap_or(language_voice),
        }
    }

    async fn synthesize(
        &self,
        text: &str,
        request: &SpeechRequest,
    ) -> Result<SynthesizedAudio, SpeechProviderError> {
        let timeout = self.settings.provider_timeout;
        match tokio::time::timeout(timeout, self.speech_provider.synthesize(text, request)).await {
            Ok(result) => result,
            Err(_) => Err(SpeechProviderError::Timeout(timeout)),
        }
    }

    /// Persist the failed job and turn the provider error into the caller's error.
    /// A store failure while doing so is returned as the outer error.
    async fn record_failure(
        &self,
        job: AudioJob,
        error: SpeechProviderError,
    ) -> Result<AudioServiceError, AudioServiceError> {
        let job_id = job.id();
        let chapter_id = job.chapter_id();
        let message = error.to_string();

        tracing::error!(
            chapter_id = %chapter_id,
            job_id = %job_id,
            provider = self.speech_provider.name(),
            error = %message,
            "Chapter audio generation failed"
        );

        let failed = job.to_failed(message.clone(), Utc::now())?;
        self.job_store.update(&failed).await.map_err(|e| {
            tracing::error!(job_id = %job_id, error = %e, "Failed to persist failed audio job");
            AudioServiceError::Persistence(e.to_string())
        })?;

        self.events.publish(&AudioEvent::JobFailed {
            chapter_id,
            job_id,
            error: message.clone(),
        });

        Ok(AudioServiceError::GenerationFailed { job_id, message })
    }
}

/// Parse an identifier received from a caller
pub(crate) fn parse_id(raw: &str, kind: &str) -> Result<Uuid, AudioServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        AudioServiceError::InvalidInput(format!("{} id '{}' is not a valid identifier", kind, raw))
    })
}

fn validate_speed(speed: Option<f32>) -> Result<f32, AudioServiceError> {
    let speed = speed.unwrap_or(DEFAULT_SPEED);
    if !speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
        return Err(AudioServiceError::InvalidInput(format!(
            "speed must be between {} and {}, got {}",
            MIN_SPEED, MAX_SPEED, speed
        )));
    }
    Ok(speed)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
