//! Shared session state
//!
//! The frame loop and the voice command listener both read and write the
//! active language and the cached utterances. All access goes through
//! [`Session`], which serializes it behind one lock. The lock is never held
//! across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::language::Language;

/// What an utterance was, for caching purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceKind {
    /// Short object call-out ("I see a car ahead.")
    ObjectAnnouncement,
    /// Generated scene commentary
    Commentary,
    /// Prompts, confirmations and repeats; not cached for repeat commands
    System,
}

/// Cross-task record of language and recent utterances
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Language all spoken output uses
    pub language: Language,
    /// Last object call-out, for "repeat last object"
    pub last_object_announcement: Option<String>,
    /// Last commentary, for "describe again"
    pub last_commentary: Option<String>,
    /// Last thing spoken, of any kind
    pub last_spoken: Option<String>,
}

/// Cloneable handle to the one session of a run
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    /// Start a session in the given language
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                language,
                ..SessionState::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consistent copy of the whole state
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    /// Active language
    #[must_use]
    pub fn language(&self) -> Language {
        self.lock().language
    }

    /// Switch the active language; returns the previous one
    pub fn set_language(&self, language: Language) -> Language {
        std::mem::replace(&mut self.lock().language, language)
    }

    /// Record that `text` is being spoken
    pub fn record_utterance(&self, kind: UtteranceKind, text: &str) {
        let mut state = self.lock();
        match kind {
            UtteranceKind::ObjectAnnouncement => {
                state.last_object_announcement = Some(text.to_string());
            }
            UtteranceKind::Commentary => state.last_commentary = Some(text.to_string()),
            UtteranceKind::System => {}
        }
        state.last_spoken = Some(text.to_string());
    }

    /// Last object call-out, if any
    #[must_use]
    pub fn last_object_announcement(&self) -> Option<String> {
        self.lock().last_object_announcement.clone()
    }

    /// Last commentary, if any
    #[must_use]
    pub fn last_commentary(&self) -> Option<String> {
        self.lock().last_commentary.clone()
    }
}
