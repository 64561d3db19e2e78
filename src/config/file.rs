//! TOML configuration file loading
//!
//! Supports `~/.config/omni/sight/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;
use crate::language::Language;
use crate::voice::{SttProvider, VoiceSettings};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct SightConfigFile {
    /// Videos to narrate, in order
    #[serde(default)]
    pub videos: Option<Vec<PathBuf>>,

    /// Skip voice selection and start in this language
    #[serde(default)]
    pub language: Option<Language>,

    /// Object detector service
    #[serde(default)]
    pub detector: DetectorFileConfig,

    /// Frame loop pacing
    #[serde(default)]
    pub narration: NarrationFileConfig,

    /// Generative commentary
    #[serde(default)]
    pub commentary: CommentaryFileConfig,

    /// Voice command listener and STT
    #[serde(default)]
    pub listener: ListenerFileConfig,

    /// TTS voice per language
    #[serde(default)]
    pub voices: HashMap<Language, VoiceSettings>,

    /// Extra label translations per language
    #[serde(default)]
    pub translations: HashMap<Language, HashMap<String, String>>,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Detector service configuration
#[derive(Debug, Default, Deserialize)]
pub struct DetectorFileConfig {
    /// Base URL of the inference server
    pub url: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Frame loop configuration
#[derive(Debug, Default, Deserialize)]
pub struct NarrationFileConfig {
    pub detection_stride: Option<u64>,
    pub fallback_fps: Option<f64>,
    pub object_cooldown_secs: Option<f64>,
    pub commentary_cooldown_secs: Option<f64>,
    pub post_speech_pause_ms: Option<u64>,
}

/// Commentary configuration
#[derive(Debug, Default, Deserialize)]
pub struct CommentaryFileConfig {
    /// Chat model (e.g. "gpt-3.5-turbo")
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
}

/// Listener configuration
#[derive(Debug, Default, Deserialize)]
pub struct ListenerFileConfig {
    /// Seconds to wait for speech to start
    pub listen_timeout_secs: Option<u64>,
    pub stt_provider: Option<SttProvider>,
    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,
    /// Keyboard attempts during startup language selection
    pub manual_attempts: Option<u32>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
    pub deepgram: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `SightConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> SightConfigFile {
    let Some(path) = config_file_path() else {
        return SightConfigFile::default();
    };

    if !path.exists() {
        return SightConfigFile::default();
    }

    match load_config_file_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            SightConfigFile::default()
        }
    }
}

/// Load a specific config file
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_config_file_from(path: &Path) -> Result<SightConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/omni/sight/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("omni")
            .join("sight")
            .join("config.toml")
    })
}
