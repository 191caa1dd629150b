pub mod batch;
pub mod dto;
pub mod error;
pub mod events;
pub mod language;
pub mod lock;
pub mod model;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch::{BookAudioService, DEFAULT_BATCH_CONCURRENCY, MAX_BATCH_CONCURRENCY};
pub use dto::{
    AudioJobResponse, BookAudioResponse, ChapterAudioOutcome, ChapterOutcomeResponse,
    GenerateAudioOptions, OutcomeStatus,
};
pub use error::AudioServiceError;
pub use events::{AudioEvent, AudioEventSink, NoopEventSink, TracingEventSink};
pub use language::{DetectedLanguage, LanguageCode, LanguageDetector};
pub use lock::{GenerationKey, GenerationLocks};
pub use model::{
    AudioFormat, AudioJob, AudioJobRecord, AudioJobStatus, AudioOutput, InvalidAudioJob,
    InvalidTransition, NewAudioJob,
};
pub use service::{AudioServiceSettings, ChapterAudioService, ChapterAudioServiceApi};
