//! Voice commands
//!
//! A background listener runs for the whole process, hears short utterances
//! and hands them to the dispatcher, which acts on the shared session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::language::Language;
use crate::session::{Session, UtteranceKind};
use crate::voice::{SpeechOutputRouter, SpeechRecognizer};

/// Phrase that repeats the last commentary
pub const DESCRIBE_AGAIN: &str = "describe again";

/// Phrase that repeats the last object announcement
pub const REPEAT_LAST_OBJECT: &str = "repeat last object";

/// Pause after an unexpected listener error before listening again
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// A recognized command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCommand {
    /// Re-speak the cached commentary
    DescribeAgain(String),
    /// Re-speak the cached object announcement
    RepeatLastObject(String),
    /// Change the session language
    SwitchLanguage(Language),
}

impl VoiceCommand {
    /// Match an utterance against the command phrases
    ///
    /// Case-insensitive substring match. Patterns are tried in order and the
    /// first one that can act wins: a repeat request with nothing cached falls
    /// through to the next pattern.
    #[must_use]
    pub fn parse(
        utterance: &str,
        last_commentary: Option<&str>,
        last_object_announcement: Option<&str>,
    ) -> Option<Self> {
        let lower = utterance.to_lowercase();

        if lower.contains(DESCRIBE_AGAIN) {
            if let Some(text) = last_commentary {
                return Some(Self::DescribeAgain(text.to_string()));
            }
        }

        if lower.contains(REPEAT_LAST_OBJECT) {
            if let Some(text) = last_object_announcement {
                return Some(Self::RepeatLastObject(text.to_string()));
            }
        }

        Language::ALL
            .into_iter()
            .find(|lang| lower.contains(&lang.switch_phrase()))
            .map(Self::SwitchLanguage)
    }
}

/// Applies recognized utterances to the session
pub struct CommandDispatcher {
    session: Session,
    speech: Arc<SpeechOutputRouter>,
}

impl CommandDispatcher {
    #[must_use]
    pub const fn new(session: Session, speech: Arc<SpeechOutputRouter>) -> Self {
        Self { session, speech }
    }

    /// Handle one utterance; returns the command acted on, if any
    pub async fn dispatch(&self, utterance: &str) -> Option<VoiceCommand> {
        let state = self.session.snapshot();
        let command = VoiceCommand::parse(
            utterance,
            state.last_commentary.as_deref(),
            state.last_object_announcement.as_deref(),
        );

        let Some(command) = command else {
            tracing::debug!(utterance, "no command matched");
            return None;
        };

        match &command {
            VoiceCommand::DescribeAgain(text) => {
                tracing::info!("repeating commentary");
                self.speech
                    .speak_in_session_language(text, UtteranceKind::System)
                    .await;
            }
            VoiceCommand::RepeatLastObject(text) => {
                tracing::info!("repeating last object announcement");
                self.speech
                    .speak_in_session_language(text, UtteranceKind::System)
                    .await;
            }
            VoiceCommand::SwitchLanguage(language) => {
                let previous = self.session.set_language(*language);
                tracing::info!(from = %previous, to = %language, "language switched");
                self.speech
                    .speak(language.switch_confirmation(), *language, UtteranceKind::System)
                    .await;
            }
        }

        Some(command)
    }
}

/// Background task feeding the dispatcher
pub struct VoiceCommandListener {
    recognizer: Arc<dyn SpeechRecognizer>,
    dispatcher: CommandDispatcher,
    listen_timeout: Duration,
}

impl VoiceCommandListener {
    #[must_use]
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        dispatcher: CommandDispatcher,
        listen_timeout: Duration,
    ) -> Self {
        Self {
            recognizer,
            dispatcher,
            listen_timeout,
        }
    }

    /// Spawn the listener; it runs until `stop` turns true or its sender is dropped
    ///
    /// Callers may drop the handle: the task is abandoned, not joined, at exit.
    pub fn spawn(self, stop: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(stop))
    }

    /// Listen and dispatch until stopped
    ///
    /// Never returns because of an error: timeouts and unintelligible audio
    /// loop silently, anything else is logged before looping.
    pub async fn run(self, mut stop: watch::Receiver<bool>) {
        tracing::info!("voice command listener started");

        loop {
            if *stop.borrow_and_update() {
                break;
            }

            let heard = tokio::select! {
                changed = stop.changed() => {
                    // A dropped sender also means shutdown
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                heard = self.recognizer.listen(self.listen_timeout) => heard,
            };

            match heard {
                Ok(utterance) => {
                    tracing::info!(%utterance, "heard");
                    self.dispatcher.dispatch(&utterance).await;
                }
                Err(e) if e.is_recognition_miss() => {
                    tracing::debug!(error = %e, "nothing heard");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "voice command error");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            }
        }

        tracing::info!("voice command listener stopped");
    }
}
