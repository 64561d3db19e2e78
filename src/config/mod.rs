//! Configuration management for Beacon Sight
//!
//! Resolution order: built-in defaults, then the TOML file, then environment
//! variables.

pub mod file;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

use self::file::SightConfigFile;
use crate::language::Language;
use crate::pipeline::NarrationSettings;
use crate::voice::{SttProvider, VoiceSettings};
use crate::{Error, Result};

/// Default detector inference server
const DEFAULT_DETECTOR_URL: &str = "http://localhost:8765";

/// Default commentary model
const DEFAULT_COMMENTARY_MODEL: &str = "gpt-3.5-turbo";

/// Beacon Sight configuration
#[derive(Debug)]
pub struct Config {
    /// Videos to narrate, in order
    pub videos: Vec<PathBuf>,

    /// Fixed starting language; `None` runs voice selection
    pub language: Option<Language>,

    /// Detector service
    pub detector: DetectorConfig,

    /// Frame loop pacing
    pub narration: NarrationSettings,

    /// Generative commentary
    pub commentary: CommentaryConfig,

    /// Voice command listener and STT
    pub listener: ListenerConfig,

    /// TTS voice per language
    pub voices: HashMap<Language, VoiceSettings>,

    /// Extra label translations per language
    pub translations: HashMap<Language, HashMap<String, String>>,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Detector service configuration
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Base URL of the inference server
    pub url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Commentary configuration
#[derive(Debug, Clone)]
pub struct CommentaryConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// How long each listen waits for speech to start
    pub listen_timeout: Duration,
    pub stt_provider: SttProvider,
    pub stt_model: String,
    /// Keyboard attempts during startup language selection
    pub manual_attempts: u32,
}

/// API keys for external services
#[derive(Debug)]
pub struct ApiKeys {
    /// `OpenAI` API key (commentary, Whisper, TTS); required
    pub openai: SecretString,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<SecretString>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<SecretString>,
}

impl Config {
    /// Load configuration from the file and the process environment
    ///
    /// With `path`, that file must exist and parse; otherwise the standard
    /// location is used if present.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file is unusable or the `OpenAI`
    /// API key is missing
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => file::load_config_file_from(path)?,
            None => file::load_config_file(),
        };

        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the `OpenAI` API key is missing
    pub fn from_sources(
        file: SightConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let openai = env("OPENAI_API_KEY")
            .or(file.api_keys.openai)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("OpenAI API key not set (OPENAI_API_KEY)".to_string())
            })?;

        let api_keys = ApiKeys {
            openai: SecretString::from(openai),
            elevenlabs: env("ELEVENLABS_API_KEY")
                .or(file.api_keys.elevenlabs)
                .map(SecretString::from),
            deepgram: env("DEEPGRAM_API_KEY")
                .or(file.api_keys.deepgram)
                .map(SecretString::from),
        };

        let detector = DetectorConfig {
            url: env("SIGHT_DETECTOR_URL")
                .or(file.detector.url)
                .unwrap_or_else(|| DEFAULT_DETECTOR_URL.to_string()),
            timeout: Duration::from_secs(file.detector.timeout_secs.unwrap_or(30)),
        };

        let defaults = NarrationSettings::default();
        let narration = NarrationSettings {
            detection_stride: file
                .narration
                .detection_stride
                .unwrap_or(defaults.detection_stride),
            fallback_fps: file
                .narration
                .fallback_fps
                .filter(|fps| *fps > 0.0)
                .unwrap_or(defaults.fallback_fps),
            object_cooldown: secs_or(file.narration.object_cooldown_secs, defaults.object_cooldown),
            commentary_cooldown: secs_or(
                file.narration.commentary_cooldown_secs,
                defaults.commentary_cooldown,
            ),
            post_speech_pause: file
                .narration
                .post_speech_pause_ms
                .map_or(defaults.post_speech_pause, Duration::from_millis),
        };

        let commentary = CommentaryConfig {
            model: env("SIGHT_COMMENTARY_MODEL")
                .or(file.commentary.model)
                .unwrap_or_else(|| DEFAULT_COMMENTARY_MODEL.to_string()),
            temperature: file.commentary.temperature.unwrap_or(0.7),
            max_tokens: file.commentary.max_tokens.unwrap_or(100),
            timeout: Duration::from_secs(file.commentary.timeout_secs.unwrap_or(20)),
        };

        let stt_provider = file.listener.stt_provider.unwrap_or_default();
        let stt_model = env("SIGHT_STT_MODEL")
            .or(file.listener.stt_model)
            .unwrap_or_else(|| match stt_provider {
                SttProvider::Whisper => "whisper-1".to_string(),
                SttProvider::Deepgram => "nova-2".to_string(),
            });
        let listener = ListenerConfig {
            listen_timeout: Duration::from_secs(file.listener.listen_timeout_secs.unwrap_or(5)),
            stt_provider,
            stt_model,
            manual_attempts: file.listener.manual_attempts.unwrap_or(5),
        };

        let mut voices = file.voices;
        for language in Language::ALL {
            voices.entry(language).or_default();
        }

        Ok(Self {
            videos: file.videos.unwrap_or_else(default_videos),
            language: file.language,
            detector,
            narration,
            commentary,
            listener,
            voices,
            translations: file.translations,
            api_keys,
        })
    }

    /// Voice settings for a language
    #[must_use]
    pub fn voice(&self, language: Language) -> VoiceSettings {
        self.voices.get(&language).cloned().unwrap_or_default()
    }
}

/// Videos narrated when none are configured
fn default_videos() -> Vec<PathBuf> {
    vec![
        PathBuf::from("videos/obs1.mp4"),
        PathBuf::from("videos/vid1.mp4"),
    ]
}

fn secs_or(secs: Option<f64>, default: Duration) -> Duration {
    secs.and_then(|s| Duration::try_from_secs_f64(s).ok())
        .unwrap_or(default)
}
