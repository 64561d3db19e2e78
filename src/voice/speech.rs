//! Spoken output
//!
//! [`SpeechOutputRouter::speak`] is synchronous from the caller's point of view:
//! it returns only after playback has finished. The frame loop relies on this
//! and deliberately pauses while narrating. Both the frame loop and the command
//! listener speak through the same router, whose audio lock keeps their
//! playback from overlapping.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{AudioPlayback, TextToSpeech};
use crate::language::Language;
use crate::session::{Session, UtteranceKind};
use crate::{Error, Result};

/// Speaks text aloud in one language
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize and play `text`, returning when playback is complete
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Cloud TTS engine played through the default output device
pub struct CloudVoice {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl CloudVoice {
    #[must_use]
    pub const fn new(tts: TextToSpeech, playback: AudioPlayback) -> Self {
        Self { tts, playback }
    }
}

#[async_trait]
impl SpeechSynthesizer for CloudVoice {
    async fn speak(&self, text: &str) -> Result<()> {
        let mp3 = self.tts.synthesize(text).await?;
        let playback = self.playback.clone();

        tokio::task::spawn_blocking(move || playback.play_mp3_blocking(&mp3))
            .await
            .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
    }
}

/// Routes text to the engine for its language and records it in the session
pub struct SpeechOutputRouter {
    engines: HashMap<Language, Arc<dyn SpeechSynthesizer>>,
    session: Session,
    audio: Mutex<()>,
}

impl SpeechOutputRouter {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            engines: HashMap::new(),
            session,
            audio: Mutex::new(()),
        }
    }

    /// Register the engine for a language
    #[must_use]
    pub fn with_engine(mut self, language: Language, engine: Arc<dyn SpeechSynthesizer>) -> Self {
        self.engines.insert(language, engine);
        self
    }

    /// The session this router records into
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Speak `text` in `language`; returns whether playback succeeded
    ///
    /// The text is recorded in the session before synthesis, so a failed
    /// utterance can still be repeated. Failures are logged, never raised.
    pub async fn speak(&self, text: &str, language: Language, kind: UtteranceKind) -> bool {
        self.session.record_utterance(kind, text);

        let Some(engine) = self.engines.get(&language) else {
            tracing::warn!(%language, "no speech engine for language");
            return false;
        };

        let _audio = self.audio.lock().await;
        tracing::debug!(%language, ?kind, text, "speaking");

        match engine.speak(text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%language, error = %e, "speech synthesis failed");
                false
            }
        }
    }

    /// Speak in whatever language the session is using right now
    pub async fn speak_in_session_language(&self, text: &str, kind: UtteranceKind) -> bool {
        let language = self.session.language();
        self.speak(text, language, kind).await
    }
}
