use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

const DEFAULT_FAILURE_MESSAGE: &str = "speech synthesis failed";

/// Lifecycle of a chapter audio job.
///
/// `Pending` and `Processing` are transient; `Completed` and `Failed` are
/// terminal for a given job. A new request never resurrects a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AudioJobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AudioJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioJobStatus::Pending => "pending",
            AudioJobStatus::Processing => "processing",
            AudioJobStatus::Completed => "completed",
            AudioJobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AudioJobStatus::Completed | AudioJobStatus::Failed)
    }
}

impl std::fmt::Display for AudioJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Container format of generated audio
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Ogg,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Ogg => "ogg",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot move audio job from {from} to {to}")]
pub struct InvalidTransition {
    pub from: AudioJobStatus,
    pub to: AudioJobStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("audio job {id} violates its {status} invariants: {reason}")]
pub struct InvalidAudioJob {
    pub id: Uuid,
    pub status: AudioJobStatus,
    pub reason: &'static str,
}

/// Input snapshot of a job that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewAudioJob {
    chapter_id: Uuid,
    book_id: Uuid,
    text: String,
    voice: String,
    language: String,
    speed: f32,
    character_count: i32,
    paragraph_count: i32,
}

impl NewAudioJob {
    pub fn new(
        chapter_id: Uuid,
        book_id: Uuid,
        text: String,
        paragraph_count: usize,
        voice: impl Into<String>,
        language: impl Into<String>,
        speed: f32,
    ) -> Self {
        let character_count = text.chars().count() as i32;
        Self {
            chapter_id,
            book_id,
            text,
            voice: voice.into(),
            language: language.into(),
            speed,
            character_count,
            paragraph_count: paragraph_count as i32,
        }
    }

    pub fn chapter_id(&self) -> Uuid {
        self.chapter_id
    }

    pub fn book_id(&self) -> Uuid {
        self.book_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn character_count(&self) -> i32 {
        self.character_count
    }

    pub fn paragraph_count(&self) -> i32 {
        self.paragraph_count
    }

    /// Materialize the snapshot as a pending job once storage has assigned an id
    pub fn into_pending(self, id: Uuid, now: DateTime<Utc>) -> AudioJob {
        AudioJob {
            id,
            chapter_id: self.chapter_id,
            book_id: self.book_id,
            text: self.text,
            voice: self.voice,
            language: self.language,
            speed: self.speed,
            character_count: self.character_count,
            paragraph_count: self.paragraph_count,
            audio_url: None,
            audio_format: None,
            audio_duration: None,
            status: AudioJobStatus::Pending,
            error_message: None,
            play_count: 0,
            last_played_at: None,
            created_at: now,
            updated_at: now,
            processed_at: None,
        }
    }
}

/// Result of a successful synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct AudioOutput {
    pub url: String,
    pub format: AudioFormat,
    pub duration_seconds: f64,
}

/// Persisted shape of a job, as read back from storage
#[derive(Debug, Clone, FromRow)]
pub struct AudioJobRecord {
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub book_id: Uuid,
    pub text: String,
    pub voice: String,
    pub language: String,
    pub speed: f32,
    pub character_count: i32,
    pub paragraph_count: i32,
    pub audio_url: Option<String>,
    pub audio_format: Option<AudioFormat>,
    pub audio_duration: Option<f64>,
    pub status: AudioJobStatus,
    pub error_message: Option<String>,
    pub play_count: i64,
    pub last_played_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// A text-to-speech job for one chapter: the unit of work and its audit record.
///
/// The value is immutable. State changes go through the transition methods,
/// which consume the job and hand back the next state, so a completed job
/// always carries its audio and a failed job always carries its error.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioJob {
    id: Uuid,
    chapter_id: Uuid,
    book_id: Uuid,
    text: String,
    voice: String,
    language: String,
    speed: f32,
    character_count: i32,
    paragraph_count: i32,
    audio_url: Option<String>,
    audio_format: Option<AudioFormat>,
    audio_duration: Option<f64>,
    status: AudioJobStatus,
    error_message: Option<String>,
    play_count: i64,
    last_played_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl AudioJob {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn chapter_id(&self) -> Uuid {
        self.chapter_id
    }

    pub fn book_id(&self) -> Uuid {
        self.book_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn character_count(&self) -> i32 {
        self.character_count
    }

    pub fn paragraph_count(&self) -> i32 {
        self.paragraph_count
    }

    pub fn audio_url(&self) -> Option<&str> {
        self.audio_url.as_deref()
    }

    pub fn audio_format(&self) -> Option<AudioFormat> {
        self.audio_format
    }

    pub fn audio_duration(&self) -> Option<f64> {
        self.audio_duration
    }

    pub fn status(&self) -> AudioJobStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn play_count(&self) -> i64 {
        self.play_count
    }

    pub fn last_played_at(&self) -> Option<DateTime<Utc>> {
        self.last_played_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn is_completed(&self) -> bool {
        self.status == AudioJobStatus::Completed
    }

    /// pending -> processing
    pub fn to_processing(self, now: DateTime<Utc>) -> Result<Self, InvalidTransition> {
        self.guard(AudioJobStatus::Processing, &[AudioJobStatus::Pending])?;
        Ok(Self {
            status: AudioJobStatus::Processing,
            updated_at: now,
            ..self
        })
    }

    /// processing -> completed
    pub fn to_completed(
        self,
        output: AudioOutput,
        now: DateTime<Utc>,
    ) -> Result<Self, InvalidTransition> {
        self.guard(AudioJobStatus::Completed, &[AudioJobStatus::Processing])?;
        Ok(Self {
            status: AudioJobStatus::Completed,
            audio_url: Some(output.url),
            audio_format: Some(output.format),
            audio_duration: Some(output.duration_seconds),
            error_message: None,
            processed_at: Some(now),
            updated_at: now,
            ..self
        })
    }

    /// pending | processing -> failed
    pub fn to_failed(
        self,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, InvalidTransition> {
        self.guard(
            AudioJobStatus::Failed,
            &[AudioJobStatus::Pending, AudioJobStatus::Processing],
        )?;
        let mut message = message.into();
        if message.trim().is_empty() {
            message = DEFAULT_FAILURE_MESSAGE.to_string();
        }
        Ok(Self {
            status: AudioJobStatus::Failed,
            audio_url: None,
            audio_format: None,
            audio_duration: None,
            error_message: Some(message),
            processed_at: Some(now),
            updated_at: now,
            ..self
        })
    }

    /// Count one playback. Only completed audio can be played.
    pub fn record_play(self, now: DateTime<Utc>) -> Result<Self, InvalidTransition> {
        self.guard(AudioJobStatus::Completed, &[AudioJobStatus::Completed])?;
        Ok(Self {
            play_count: self.play_count + 1,
            last_played_at: Some(now),
            updated_at: now,
            ..self
        })
    }

    fn guard(
        &self,
        to: AudioJobStatus,
        allowed_from: &[AudioJobStatus],
    ) -> Result<(), InvalidTransition> {
        if allowed_from.contains(&self.status) {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self.status,
                to,
            })
        }
    }
}

impl TryFrom<AudioJobRecord> for AudioJob {
    type Error = InvalidAudioJob;

    fn try_from(record: AudioJobRecord) -> Result<Self, Self::Error> {
        let invalid = |reason| InvalidAudioJob {
            id: record.id,
            status: record.status,
            reason,
        };

        let has_output = record.audio_url.is_some() && record.audio_format.is_some();
        match record.status {
            AudioJobStatus::Completed => {
                if !has_output {
                    return Err(invalid("missing audio url or format"));
                }
                if record.error_message.is_some() {
                    return Err(invalid("carries an error message"));
                }
            }
            AudioJobStatus::Failed => {
                if record.error_message.is_none() {
                    return Err(invalid("missing error message"));
                }
                if record.audio_url.is_some() {
                    return Err(invalid("carries an audio url"));
                }
            }
            AudioJobStatus::Pending | AudioJobStatus::Processing => {
                if record.audio_url.is_some() || record.error_message.is_some() {
                    return Err(invalid("in-flight job carries a result"));
                }
            }
        }
        if record.play_count < 0 {
            return Err(invalid("negative play count"));
        }

        Ok(Self {
            id: record.id,
            chapter_id: record.chapter_id,
            book_id: record.book_id,
            text: record.text,
            voice: record.voice,
            language: record.language,
            speed: record.speed,
            character_count: record.character_count,
            paragraph_count: record.paragraph_count,
            audio_url: record.audio_url,
            audio_format: record.audio_format,
            audio_duration: record.audio_duration,
            status: record.status,
            error_message: record.error_message,
            play_count: record.play_count,
            last_played_at: record.last_played_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
            processed_at: record.processed_at,
        })
    }
}
