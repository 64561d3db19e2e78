//! Startup language selection
//!
//! Runs once before narration begins: ask aloud, listen for a language name,
//! and fall back to a single-key keyboard choice. The keyboard fallback is
//! bounded; when attempts run out the default language is used.

use std::time::Duration;

use dialoguer::Input;
use tokio::runtime::RuntimeFlavor;

use crate::language::Language;
use crate::session::UtteranceKind;
use crate::voice::{SpeechOutputRouter, SpeechRecognizer};
use crate::{Error, Result};

/// Spoken prompt for voice selection (always in English)
pub const VOICE_PROMPT: &str = "Please say your language. Say English or Tamil.";

/// Spoken prompt when voice selection failed
pub const FALLBACK_PROMPT: &str = "I did not hear you. Please press T for Tamil or E for English.";

/// Keyboard prompt
pub const KEYBOARD_PROMPT: &str = "Press 'T' for Tamil or 'E' for English";

/// Source of single-character keyboard choices
///
/// Reads are blocking and happen inside the async selector, so implementations
/// that wait on a terminal should go through [`blocking_read`].
pub trait ChoiceInput: Send {
    /// Read one line of input after showing `prompt`
    ///
    /// # Errors
    ///
    /// Returns error if input is closed or unreadable
    fn read_choice(&mut self, prompt: &str) -> Result<String>;
}

/// Interactive terminal input
#[derive(Debug, Default)]
pub struct TerminalInput;

impl ChoiceInput for TerminalInput {
    fn read_choice(&mut self, prompt: &str) -> Result<String> {
        blocking_read(|| {
            Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
                .map_err(|e| Error::Input(e.to_string()))
        })
    }
}

/// Run a blocking read without stalling other tasks on this worker
///
/// On a multi-threaded runtime the worker is handed off for the duration of
/// the read. Elsewhere (no runtime, or a current-thread one) it just runs.
pub fn blocking_read<T>(read: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(read)
        }
        _ => read(),
    }
}

/// Selection progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// Ask aloud and listen once
    AttemptVoice,
    /// Keyboard choice; `attempts` made so far
    ManualFallback { attempts: u32 },
    /// Done
    Resolved(Language),
}

/// Resolves the initial session language
pub struct LanguageSelector<'a> {
    speech: &'a SpeechOutputRouter,
    recognizer: &'a dyn SpeechRecognizer,
    input: &'a mut dyn ChoiceInput,
    listen_timeout: Duration,
    max_manual_attempts: u32,
    default_language: Language,
}

impl<'a> LanguageSelector<'a> {
    #[must_use]
    pub fn new(
        speech: &'a SpeechOutputRouter,
        recognizer: &'a dyn SpeechRecognizer,
        input: &'a mut dyn ChoiceInput,
    ) -> Self {
        Self {
            speech,
            recognizer,
            input,
            listen_timeout: Duration::from_secs(5),
            max_manual_attempts: 5,
            default_language: Language::default(),
        }
    }

    /// How long to wait for the spoken answer
    #[must_use]
    pub const fn listen_timeout(mut self, timeout: Duration) -> Self {
        self.listen_timeout = timeout;
        self
    }

    /// Keyboard attempts before giving up; at least one is always made
    #[must_use]
    pub const fn max_manual_attempts(mut self, attempts: u32) -> Self {
        self.max_manual_attempts = attempts;
        self
    }

    /// Language used when the keyboard fallback is exhausted
    #[must_use]
    pub const fn default_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }

    /// Run the state machine to completion
    pub async fn resolve(mut self) -> Language {
        let mut state = SelectionState::AttemptVoice;

        loop {
            state = match state {
                SelectionState::AttemptVoice => self.attempt_voice().await,
                SelectionState::ManualFallback { attempts } => self.attempt_manual(attempts),
                SelectionState::Resolved(language) => {
                    tracing::info!(%language, "language selected");
                    return language;
                }
            };
        }
    }

    async fn attempt_voice(&self) -> SelectionState {
        self.speech
            .speak(VOICE_PROMPT, Language::English, UtteranceKind::System)
            .await;
        tracing::info!("listening for language selection");

        match self.recognizer.listen(self.listen_timeout).await {
            Ok(transcript) => {
                tracing::info!(%transcript, "heard language answer");
                Language::from_transcript(&transcript).map_or_else(
                    || {
                        tracing::info!("unrecognized language, falling back to keyboard");
                        SelectionState::ManualFallback { attempts: 0 }
                    },
                    SelectionState::Resolved,
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, "voice language selection failed");
                self.speech
                    .speak(FALLBACK_PROMPT, Language::English, UtteranceKind::System)
                    .await;
                SelectionState::ManualFallback { attempts: 0 }
            }
        }
    }

    fn attempt_manual(&mut self, attempts: u32) -> SelectionState {
        if attempts >= self.max_manual_attempts.max(1) {
            tracing::warn!(
                attempts,
                language = %self.default_language,
                "no valid keyboard choice, using default language"
            );
            return SelectionState::Resolved(self.default_language);
        }

        match self.input.read_choice(KEYBOARD_PROMPT) {
            Ok(choice) => Language::from_choice(&choice).map_or_else(
                || {
                    tracing::warn!(%choice, "invalid choice, expected T or E");
                    SelectionState::ManualFallback {
                        attempts: attempts + 1,
                    }
                },
                SelectionState::Resolved,
            ),
            Err(e) => {
                tracing::warn!(error = %e, "keyboard input failed");
                SelectionState::ManualFallback {
                    attempts: attempts + 1,
                }
            }
        }
    }
}
