use super::audio_storage::AudioStorage;
use super::speech_provider::{
    is_neutral_voice, SpeechProvider, SpeechProviderError, SpeechRequest, SynthesizedAudio,
};
use super::speech_text::{estimate_duration_seconds, prepare_speech_text, split_into_batches};
use crate::domain::audio::{AudioFormat, LanguageCode};
use async_trait::async_trait;
use aws_sdk_polly::{
    types::{Engine, OutputFormat, TextType, VoiceId},
    Client as PollyClient,
};
use std::sync::Arc;

/// AWS Polly has a limit of 3000 characters per request
const MAX_BATCH_SIZE: usize = 3000;

/// AWS Polly implementation of the speech provider
pub struct PollySpeechProvider {
    polly_client: Arc<PollyClient>,
    storage: Arc<AudioStorage>,
}

impl PollySpeechProvider {
    pub fn new(polly_client: Arc<PollyClient>, storage: Arc<AudioStorage>) -> Self {
        Self {
            polly_client,
            storage,
        }
    }

    /// Select the Polly voice for a language. Polly has no Vietnamese voice.
    fn get_voice_for_language(language: LanguageCode) -> Option<&'static str> {
        match language {
            LanguageCode::Vietnamese => None,
            LanguageCode::English => Some("Joanna"),
            LanguageCode::Spanish => Some("Lucia"),
            LanguageCode::French => Some("Lea"),
            LanguageCode::German => Some("Vicki"),
            LanguageCode::Italian => Some("Bianca"),
            LanguageCode::Portuguese => Some("Ines"),
        }
    }

    /// Resolve the request voice to a Polly voice name. Vendor names pass
    /// through; neutral ids map to the language's Polly voice.
    fn resolve_voice(request: &SpeechRequest) -> Result<String, SpeechProviderError> {
        if !is_neutral_voice(&request.voice) {
            return Ok(request.voice.trim().to_string());
        }

        LanguageCode::from_tag(&request.language)
            .and_then(Self::get_voice_for_language)
            .map(str::to_string)
            .ok_or_else(|| SpeechProviderError::UnsupportedLanguage(request.language.clone()))
    }

    fn output_format(format: AudioFormat) -> OutputFormat {
        match format {
            AudioFormat::Mp3 => OutputFormat::Mp3,
            AudioFormat::Ogg => OutputFormat::OggVorbis,
        }
    }

    /// Wrap a batch in SSML when the speaking rate differs from normal
    fn speech_input(text: &str, speed: f32) -> (String, TextType) {
        if (speed - 1.0).abs() < f32::EPSILON {
            return (text.to_string(), TextType::Text);
        }
        let rate = (speed * 100.0).round() as i32;
        (
            format!(
                r#"<speak><prosody rate="{}%">{}</prosody></speak>"#,
                rate,
                escape_ssml(text)
            ),
            TextType::Ssml,
        )
    }

    /// Call AWS Polly to synthesize a single text batch
    async fn call_polly(
        &self,
        text: &str,
        voice_name: &str,
        request: &SpeechRequest,
    ) -> Result<Vec<u8>, SpeechProviderError> {
        let voice_id = VoiceId::from(voice_name);
        let engine = if is_voice_neural_compatible(voice_name) {
            Engine::Neural
        } else {
            Engine::Standard
        };
        let (input, text_type) = Self::speech_input(text, request.speed);

        tracing::info!(
            language = %request.language,
            voice = voice_name,
            engine = ?engine,
            output_format = %request.format,
            text_length = text.len(),
            text_preview = %text.chars().take(200).collect::<String>(),
            "Calling AWS Polly synthesize_speech"
        );

        let result = self
            .polly_client
            .synthesize_speech()
            .text(input)
            .text_type(text_type)
            .voice_id(voice_id)
            .output_format(Self::output_format(request.format))
            .engine(engine.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    error_display = %e,
                    language = %request.language,
                    voice = voice_name,
                    engine = ?engine,
                    text_length = text.len(),
                    "AWS Polly synthesize_speech failed"
                );
                SpeechProviderError::Vendor(format!("AWS Polly error: {}", e))
            })?;

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            SpeechProviderError::Vendor(format!("Failed to read audio stream: {}", e))
        })?;

        Ok(audio_stream.into_bytes().to_vec())
    }

    /// Synthesize multiple text batches and merge the audio results in order
    async fn synthesize_batches(
        &self,
        batches: &[String],
        voice_name: &str,
        request: &SpeechRequest,
    ) -> Result<Vec<u8>, SpeechProviderError> {
        let mut merged_audio = Vec::new();

        for (index, batch) in batches.iter().enumerate() {
            let audio_data = self.call_polly(batch, voice_name, request).await?;
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
impl SpeechProvider for PollySpeechProvider {
    fn name(&self) -> &'static str {
        "polly"
    }

    async fn synthesize(
        &self,
        text: &str,
        request: &SpeechRequest,
    ) -> Result<SynthesizedAudio, SpeechProviderError> {
        let start_time = std::time::Instant::now();
        let voice_name = Self::resolve_voice(request)?;

        let cleaned_text = prepare_speech_text(text);
        let batches = split_into_batches(&cleaned_text, MAX_BATCH_SIZE);
        let audio_data = self
            .synthesize_batches(&batches, &voice_name, request)
            .await?;
        let audio_url = self.storage.store(&audio_data, request.format).await?;

        let characters_count = cleaned_text.chars().count();
        let duration = start_time.elapsed();
        tracing::info!(
            provider = "polly",
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

/// Check if a voice supports neural engine
pub fn is_voice_neural_compatible(voice: &str) -> bool {
    // Based on AWS Polly documentation
    const NEURAL_VOICES: &[&str] = &[
        // English
        "Joanna", "Matthew", "Ivy", "Kendra", "Kimberly", "Salli", "Joey", "Justin", "Kevin",
        // Spanish
        "Lucia", "Lupe", "Pedro", "Sergio", // French
        "Lea", "Remi", // German
        "Vicki", "Daniel", // Italian
        "Bianca", "Adriano", // Portuguese
        "Ines", "Camila", "Vitoria", "Thiago",
    ];

    NEURAL_VOICES.contains(&voice)
}

fn escape_ssml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
