pub mod audio_job_repository;
pub mod audio_storage;
pub mod chapter_repository;
pub mod openai_speech_provider;
pub mod polly_speech_provider;
pub mod speech_provider;
pub mod speech_text;

pub use audio_job_repository::{AudioJobStore, PgAudioJobRepository};
pub use audio_storage::AudioStorage;
pub use chapter_repository::{ChapterRepository, PgChapterRepository};
pub use openai_speech_provider::OpenAiSpeechProvider;
pub use polly_speech_provider::PollySpeechProvider;
pub use speech_provider::{SpeechProvider, SpeechProviderError, SpeechRequest, SynthesizedAudio};
