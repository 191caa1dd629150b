use super::speech_provider::SpeechProviderError;
use crate::domain::audio::AudioFormat;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Local directory holding generated audio files, served under a public base URL
pub struct AudioStorage {
    root: PathBuf,
    public_base_url: String,
}

impl AudioStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `audio` to a fresh file and return its public URL
    pub async fn store(
        &self,
        audio: &[u8],
        format: AudioFormat,
    ) -> Result<String, SpeechProviderError> {
        if audio.is_empty() {
            return Err(SpeechProviderError::Vendor(
                "provider returned no audio".to_string(),
            ));
        }

        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            SpeechProviderError::Storage(format!(
                "cannot create {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let file_name = format!("{}.{}", Uuid::new_v4(), format.extension());
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, audio).await.map_err(|e| {
            tracing::error!(error = %e, path = %path.display(), "Failed to write audio file");
            SpeechProviderError::Storage(format!("cannot write {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            path = %path.display(),
            audio_size = audio.len(),
            "Audio file stored"
        );

        Ok(format!("{}/{}", self.public_base_url, file_name))
    }
}
