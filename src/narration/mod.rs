//! Narration core
//!
//! Decides what is worth saying and when: repeat suppression, localization,
//! and the two cooldown-gated output paths.

mod commentary;
mod cooldown;
mod novelty;
mod scheduler;
mod translation;

pub use commentary::{
    COMMENTARY_SYSTEM_PROMPT, CommentaryGenerator, OpenAiCommentary, commentary_prompt,
};
pub use cooldown::CooldownWindow;
pub use novelty::{NoveltyKey, NoveltyTracker};
pub use scheduler::{AnnouncementScheduler, describe_objects};
pub use translation::TranslationTable;
