//! Speech recognition
//!
//! One bounded listen: wait for the user to start speaking, record until they
//! stop, then transcribe.

use std::time::Duration;

use async_trait::async_trait;

use super::{SAMPLE_RATE, SpeechToText, record_utterance, samples_to_wav};
use crate::{Error, Result};

/// Turns spoken audio into a transcript
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Listen for one utterance
    ///
    /// # Errors
    ///
    /// Returns `Error::ListenTimeout` if nobody speaks within `timeout`,
    /// `Error::Unintelligible` if speech yields no transcript, and any other
    /// error for device or service failures
    async fn listen(&self, timeout: Duration) -> Result<String>;
}

/// Default microphone + cloud STT
pub struct MicrophoneRecognizer {
    stt: SpeechToText,
}

impl MicrophoneRecognizer {
    #[must_use]
    pub const fn new(stt: SpeechToText) -> Self {
        Self { stt }
    }
}

#[async_trait]
impl SpeechRecognizer for MicrophoneRecognizer {
    async fn listen(&self, timeout: Duration) -> Result<String> {
        // cpal streams are not Send, so capture runs entirely on a blocking thread
        let samples = tokio::task::spawn_blocking(move || record_utterance(timeout))
            .await
            .map_err(|e| Error::Audio(format!("capture task failed: {e}")))??
            .ok_or(Error::ListenTimeout)?;

        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
        let transcript = normalize_transcript(&self.stt.transcribe(wav).await?);

        if transcript.is_empty() {
            return Err(Error::Unintelligible);
        }

        Ok(transcript)
    }
}

/// Lowercase and trim a transcript for matching
#[must_use]
pub fn normalize_transcript(transcript: &str) -> String {
    transcript.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_transcript("  Switch to Tamil. "), "switch to tamil.");
        assert_eq!(normalize_transcript(" \n"), "");
    }
}
