//! Beacon Sight - Spoken scene narration for smart glasses
//!
//! This library provides the coordination layer of the narrator:
//! - Frame processing (detection stride, direction zones, novelty)
//! - Cooldown-gated object announcements and generative commentary
//! - Bilingual speech output (English and Tamil)
//! - Voice commands and startup language selection
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Adapters                        │
//! │  ffmpeg  │  Detector  │  Chat LLM  │  STT  │  TTS   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Beacon Sight                       │
//! │  Frame Loop  │  Scheduler  │  Speech Router         │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                    Session                          │
//! │  Language  │  Last announcement  │  Last commentary │
//! └─────────────────────────────────────────────────────┘
//!          ▲
//!          │ voice commands (background task)
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod language;
pub mod language_select;
pub mod narration;
pub mod pipeline;
pub mod session;
pub mod vision;
pub mod voice;

pub use commands::{CommandDispatcher, VoiceCommand, VoiceCommandListener};
pub use config::Config;
pub use error::{Error, Result};
pub use language::Language;
pub use language_select::{ChoiceInput, LanguageSelector, SelectionState, TerminalInput};
pub use pipeline::{Collaborators, FrameProcessingLoop, NarrationSettings, RunSummary};
pub use session::{Session, SessionState, UtteranceKind};
