//! Announcement scheduling
//!
//! Two independent cooldown windows share the novel objects of each detected
//! frame: short object call-outs and longer generated commentary. Objects not
//! spoken in the cycle they were first seen are dropped, never queued.

use std::time::Duration;

use tokio::time::Instant;

use super::{CommentaryGenerator, CooldownWindow, NoveltyKey, TranslationTable, commentary_prompt};
use crate::language::Language;

/// Default minimum interval between object call-outs
pub const DEFAULT_OBJECT_COOLDOWN: Duration = Duration::from_secs(8);

/// Default minimum interval between commentary requests
pub const DEFAULT_COMMENTARY_COOLDOWN: Duration = Duration::from_secs(15);

/// Localized one-line descriptions of novel objects
#[must_use]
pub fn describe_objects(
    objects: &[NoveltyKey],
    language: Language,
    translations: &TranslationTable,
) -> Vec<String> {
    objects
        .iter()
        .map(|key| language.describe(translations.localize(&key.label, language), key.zone))
        .collect()
}

/// Decides per detected frame whether an object call-out and/or commentary fires
#[derive(Debug, Clone)]
pub struct AnnouncementScheduler {
    object_window: CooldownWindow,
    commentary_window: CooldownWindow,
}

impl Default for AnnouncementScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_OBJECT_COOLDOWN, DEFAULT_COMMENTARY_COOLDOWN)
    }
}

impl AnnouncementScheduler {
    /// Create a scheduler with the given cooldowns
    #[must_use]
    pub const fn new(object_cooldown: Duration, commentary_cooldown: Duration) -> Self {
        Self {
            object_window: CooldownWindow::new(object_cooldown),
            commentary_window: CooldownWindow::new(commentary_cooldown),
        }
    }

    /// Object call-out window
    #[must_use]
    pub const fn object_window(&self) -> &CooldownWindow {
        &self.object_window
    }

    /// Commentary window
    #[must_use]
    pub const fn commentary_window(&self) -> &CooldownWindow {
        &self.commentary_window
    }

    /// Compose an object announcement if there is something new and the window is open
    ///
    /// Returns the sentence to speak; the window has then fired.
    pub fn try_fire_object_announcement(
        &mut self,
        objects: &[NoveltyKey],
        language: Language,
        translations: &TranslationTable,
        now: Instant,
    ) -> Option<String> {
        if objects.is_empty() || !self.object_window.try_fire(now) {
            return None;
        }

        let descriptions = describe_objects(objects, language, translations);
        Some(language.compose_announcement(&descriptions))
    }

    /// Request commentary if there is something new and the window is open
    ///
    /// The window fires before the request is made, so a failed request still
    /// consumes it. Failures are logged and yield `None`.
    pub async fn try_fire_commentary(
        &mut self,
        objects: &[NoveltyKey],
        language: Language,
        translations: &TranslationTable,
        generator: &dyn CommentaryGenerator,
        now: Instant,
    ) -> Option<String> {
        if objects.is_empty() || !self.commentary_window.try_fire(now) {
            return None;
        }

        let descriptions = describe_objects(objects, language, translations);
        let prompt = commentary_prompt(&descriptions);
        tracing::debug!(%prompt, "requesting commentary");

        match generator.generate(&prompt).await {
            Ok(text) => {
                tracing::info!(commentary = %text, "commentary generated");
                Some(text)
            }
            Err(e) => {
                tracing::warn!(error = %e, "commentary failed");
                None
            }
        }
    }
}
