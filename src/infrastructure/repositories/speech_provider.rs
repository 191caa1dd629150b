use crate::domain::audio::AudioFormat;
use async_trait::async_trait;
use std::time::Duration;

/// Voice parameters of one synthesis call
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    /// Provider-neutral id (`vi-VN-Standard`) or a vendor voice name
    pub voice: String,
    /// BCP 47 language tag
    pub language: String,
    pub speed: f32,
    pub format: AudioFormat,
}

/// Where the synthesized audio ended up and how long it plays
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub audio_url: String,
    pub duration_seconds: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechProviderError {
    #[error("speech provider timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),
    #[error("language {0} is not supported by this speech provider")]
    UnsupportedLanguage(String),
    #[error("voice {0} is not available from this speech provider")]
    UnsupportedVoice(String),
    #[error("audio format {0} is not supported by this speech provider")]
    UnsupportedFormat(String),
    #[error("speech provider error: {0}")]
    Vendor(String),
    #[error("audio storage error: {0}")]
    Storage(String),
}

/// Text-to-speech backend (AWS Polly, OpenAI, ...).
///
/// Implementations are responsible for:
/// - Handling provider-specific text length limitations
/// - Splitting text into batches if needed
/// - Merging audio chunks into a single audio stream
/// - Mapping voices to the vendor's own catalogue
/// - Storing the audio where clients can fetch it
///
/// No retries happen at this layer.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Synthesize `text` and return the public location of the audio
    async fn synthesize(
        &self,
        text: &str,
        request: &SpeechRequest,
    ) -> Result<SynthesizedAudio, SpeechProviderError>;
}

/// True when `voice` is a provider-neutral id such as `vi-VN-Standard`
/// rather than a vendor voice name.
pub fn is_neutral_voice(voice: &str) -> bool {
    let voice = voice.trim();
    voice.is_empty() || voice.ends_with("-Standard")
}
