use super::error::AudioServiceError;
use super::model::{AudioFormat, AudioJob, AudioJobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Options for generating chapter audio.
/// Request body for POST /api/chapters/:chapterId/audio and POST /api/books/:bookId/audio
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateAudioOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<AudioFormat>,
    #[serde(default)]
    pub force_regenerate: bool,
}

impl GenerateAudioOptions {
    pub fn forced() -> Self {
        Self {
            force_regenerate: true,
            ..Self::default()
        }
    }
}

/// Response for chapter audio endpoints. Leaves out the synthesized text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioJobResponse {
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub book_id: Uuid,
    pub status: AudioJobStatus,
    pub voice: String,
    pub language: String,
    pub speed: f32,
    pub character_count: i32,
    pub paragraph_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_format: Option<AudioFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub play_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_played_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<AudioJob> for AudioJobResponse {
    fn from(job: AudioJob) -> Self {
        Self {
            id: job.id(),
            chapter_id: job.chapter_id(),
            book_id: job.book_id(),
            status: job.status(),
            voice: job.voice().to_string(),
            language: job.language().to_string(),
            speed: job.speed(),
            character_count: job.character_count(),
            paragraph_count: job.paragraph_count(),
            audio_url: job.audio_url().map(str::to_string),
            audio_format: job.audio_format(),
            audio_duration: job.audio_duration(),
            error_message: job.error_message().map(str::to_string),
            play_count: job.play_count(),
            last_played_at: job.last_played_at(),
            created_at: job.created_at(),
            updated_at: job.updated_at(),
            processed_at: job.processed_at(),
        }
    }
}

/// Outcome of generating one chapter as part of a book
#[derive(Debug)]
pub struct ChapterAudioOutcome {
    pub chapter_id: Uuid,
    pub result: Result<AudioJob, AudioServiceError>,
}

impl ChapterAudioOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChapterOutcomeResponse {
    pub chapter_id: Uuid,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<AudioJobResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ChapterAudioOutcome> for ChapterOutcomeResponse {
    fn from(outcome: ChapterAudioOutcome) -> Self {
        match outcome.result {
            Ok(job) => Self {
                chapter_id: outcome.chapter_id,
                status: OutcomeStatus::Success,
                job: Some(job.into()),
                error_kind: None,
                error: None,
            },
            Err(err) => Self {
                chapter_id: outcome.chapter_id,
                status: OutcomeStatus::Failure,
                job: None,
                error_kind: Some(err.kind().to_string()),
                error: Some(err.to_string()),
            },
        }
    }
}

/// Response for POST /api/books/:bookId/audio
#[derive(Debug, Serialize, Deserialize)]
pub struct BookAudioResponse {
    pub book_id: Uuid,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<ChapterOutcomeResponse>,
}

impl BookAudioResponse {
    pub fn new(book_id: Uuid, outcomes: Vec<ChapterAudioOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - succeeded;
        Self {
            book_id,
            succeeded,
            failed,
            outcomes: outcomes.into_iter().map(Into::into).collect(),
        }
    }
}
