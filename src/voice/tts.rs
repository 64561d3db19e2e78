//! Text-to-speech (TTS) processing

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// TTS provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    #[default]
    OpenAI,
    ElevenLabs,
}

/// Voice settings for one language
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// Synthesis backend
    pub provider: TtsProvider,
    /// Voice name (`OpenAI`) or voice id (`ElevenLabs`)
    pub voice: String,
    /// Model identifier
    pub model: String,
    /// Speed multiplier (`OpenAI` only, 0.25 to 4.0)
    pub speed: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            provider: TtsProvider::OpenAI,
            voice: "alloy".to_string(),
            model: "tts-1".to_string(),
            speed: 1.0,
        }
    }
}

/// Synthesizes MP3 speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    settings: VoiceSettings,
}

impl TextToSpeech {
    /// Create a TTS client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(settings: VoiceSettings, api_key: SecretString, timeout: Duration) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(format!(
                "{:?} API key required for TTS",
                settings.provider
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            settings,
        })
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct OpenAiRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        #[derive(Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let settings = &self.settings;
        let request = match settings.provider {
            TtsProvider::OpenAI => self
                .client
                .post("https://api.openai.com/v1/audio/speech")
                .bearer_auth(self.api_key.expose_secret())
                .json(&OpenAiRequest {
                    model: &settings.model,
                    input: text,
                    voice: &settings.voice,
                    speed: settings.speed,
                }),
            TtsProvider::ElevenLabs => self
                .client
                .post(format!(
                    "https://api.elevenlabs.io/v1/text-to-speech/{}",
                    settings.voice
                ))
                .header("xi-api-key", self.api_key.expose_secret())
                .json(&ElevenLabsRequest {
                    text,
                    model_id: &settings.model,
                }),
        };

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!(
                "{:?} TTS error {status}: {body}",
                settings.provider
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
