//! Voice input and output
//!
//! Audio capture, utterance segmentation and STT on the way in; TTS, playback
//! and the per-language speech router on the way out.

mod capture;
mod playback;
mod recognizer;
mod speech;
mod stt;
mod tts;
mod utterance;

pub use capture::{AudioCapture, SAMPLE_RATE, record_utterance, samples_to_wav};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, decode_mp3};
pub use recognizer::{MicrophoneRecognizer, SpeechRecognizer, normalize_transcript};
pub use speech::{CloudVoice, SpeechOutputRouter, SpeechSynthesizer};
pub use stt::{SpeechToText, SttProvider};
pub use tts::{TextToSpeech, TtsProvider, VoiceSettings};
pub use utterance::{SegmentState, UtteranceDetector, calculate_energy};
