use super::audio_storage::AudioStorage;
use super::speech_provider::{
    is_neutral_voice, SpeechProvider, SpeechProviderError, SpeechRequest, SynthesizedAudio,
};
use super::speech_text::{estimate_duration_seconds, prepare_speech_text, split_into_batches};
use crate::domain::audio::{AudioFormat, LanguageCode};
use async_openai::{
    config::OpenAIConfig,
    types::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

/// OpenAI has a limit of 4096 characters per request
const MAX_BATCH_SIZE: usize = 4096;

const MIN_SPEED: f32 = 0.25;
const MAX_SPEED: f32 = 4.0;

/// OpenAI TTS implementation of the speech provider
pub struct OpenAiSpeechProvider {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    storage: Arc<AudioStorage>,
}

impl OpenAiSpeechProvider {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String, storage: Arc<AudioStorage>) -> Self {
        Self {
            client,
            model,
            storage,
        }
    }

    /// Select the OpenAI voice for a language.
    /// OpenAI voices are multilingual; the pick is about timbre only.
    fn get_voice_for_language(language: Option<LanguageCode>) -> Voice {
        match language {
            Some(LanguageCode::Vietnamese) => Voice::Nova,
            Some(LanguageCode::English) => Voice::Alloy,
            Some(LanguageCode::Spanish) => Voice::Echo,
            Some(LanguageCode::French) => Voice::Nova,
            Some(LanguageCode::German) => Voice::Onyx,
            Some(LanguageCode::Italian) => Voice::Fable,
            Some(LanguageCode::Portuguese) => Voice::Shimmer,
            None => Voice::Alloy,
        }
    }

    /// Resolve the request voice. Neutral ids map to the language's voice;
    /// any other name must be an OpenAI voice.
    fn resolve_voice(request: &SpeechRequest) -> Result<Voice, SpeechProviderError> {
        if is_neutral_voice(&request.voice) {
            return Ok(Self::get_voice_for_language(LanguageCode::from_tag(
                &request.language,
            )));
        }
        match request.voice.trim().to_lowercase().as_str() {
            "alloy" => Ok(Voice::Alloy),
            "echo" => Ok(Voice::Echo),
            "fable" => Ok(Voice::Fable),
            "onyx" => Ok(Voice::Onyx),
            "nova" => Ok(Voice::Nova),
            "shimmer" => Ok(Voice::Shimmer),
            _ => Err(SpeechProviderError::UnsupportedVoice(request.voice.clone())),
        }
    }

    fn response_format(format: AudioFormat) -> SpeechResponseFormat {
        match format {
            AudioFormat::Mp3 => SpeechResponseFormat::Mp3,
            AudioFormat::Ogg => SpeechResponseFormat::Opus,
        }
    }

    fn model(&self) -> SpeechModel {
        match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        }
    }

    /// Call OpenAI TTS API to synthesize a single text batch
    async fn call_openai(
        &self,
        text: &str,
        voice: &Voice,
        request: &SpeechRequest,
    ) -> Result<Vec<u8>, SpeechProviderError> {
        tracing::info!(
            model = %self.model,
            voice = ?voice,
            language = %request.language,
            text_length = text.len(),
            text_preview = %text.chars().take(200).collect::<String>(),
            "Calling OpenAI TTS API"
        );

        let speech_request = CreateSpeechRequest {
            model: self.model(),
            input: text.to_string(),
            voice: voice.clone(),
            response_format: Some(Self::response_format(request.format)),
            speed: Some(request.speed.clamp(MIN_SPEED, MAX_SPEED)),
        };

        let response = self
            .client
            .audio()
            .speech(speech_request)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    model = %self.model,
                    voice = ?voice,
                    text_length = text.len(),
                    "OpenAI TTS API call failed"
                );
                SpeechProviderError::Vendor(format!("OpenAI TTS error: {}", e))
            })?;

        Ok(response.bytes.to_vec())
    }

    /// Synthesize multiple text batches and merge the audio results in order
    async fn synthesize_batches(
        &self,
        batches: &[String],
        voice: &Voice,
        request: &SpeechRequest,
    ) -> Result<Vec<u8>, SpeechProviderError> {
        let mut merged_audio = Vec::new();

        for (index, batch) in batches.iter().enumerate() {
            let audio_data = self.call_openai(batch, voice, request).await?;
            merged_audio.extend(audio_data);

            tracing::debug!(
                batch_index = index,
                total_audio_size = merged_audio.len(),
                "Batch synthesized and merged"
            );
        }

        Ok(merged_audio)
    }
}

#[async_trait]
impl SpeechProvider for OpenAiSpeechProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn synthesize(
        &self,
        text: &str,
        request: &SpeechRequest,
    ) -> Result<SynthesizedAudio, SpeechProviderError> {
        let start_time = std::time::Instant::now();
        let voice = Self::resolve_voice(request)?;

        let cleaned_text = prepare_speech_text(text);
        let batches = split_into_batches(&cleaned_text, MAX_BATCH_SIZE);
        let audio_data = self.synthesize_batches(&batches, &voice, request).await?;
        let audio_url = self.storage.store(&audio_data, request.format).await?;

        let characters_count = cleaned_text.chars().count();
        let duration = start_time.elapsed();
        tracing::info!(
            provider = "openai",
            model = %self.model,
            latency_ms = duration.as_millis(),
            characters_count = characters_count,
            batch_count = batches.len(),
            audio_size_bytes = audio_data.len(),
            audio_url = %audio_url,
            "TTS synthesis completed"
        );

        Ok(SynthesizedAudio {
            audio_url,
            duration_seconds: estimate_duration_seconds(characters_count, request.speed),
        })
    }
}
