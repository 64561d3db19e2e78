//! Shared test utilities
//!
//! In-memory stand-ins for every external collaborator of the narrator.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use beacon_sight::language_select::ChoiceInput;
use beacon_sight::narration::CommentaryGenerator;
use beacon_sight::vision::{
    BoundingBox, Detection, Frame, FrameStream, ObjectDetector, VideoSource,
};
use beacon_sight::voice::{SpeechOutputRouter, SpeechRecognizer, SpeechSynthesizer};
use beacon_sight::{Error, Language, Result, Session};

/// Width of every fake frame; zones split at 100 and 200
pub const FRAME_WIDTH: u32 = 300;

/// A detection spanning `x1..x2`
pub fn detection(label: &str, x1: f32, x2: f32) -> Detection {
    Detection {
        label: label.to_string(),
        bbox: BoundingBox {
            x1,
            y1: 0.0,
            x2,
            y2: 50.0,
        },
        confidence: 0.9,
    }
}

pub fn left(label: &str) -> Detection {
    detection(label, 10.0, 60.0)
}

pub fn ahead(label: &str) -> Detection {
    detection(label, 120.0, 180.0)
}

pub fn right(label: &str) -> Detection {
    detection(label, 220.0, 290.0)
}

/// Video source serving a fixed number of blank frames per path
#[derive(Default)]
pub struct FakeSource {
    videos: HashMap<PathBuf, (u64, Option<f64>)>,
    frame_interval: Duration,
    pub opened: Mutex<Vec<PathBuf>>,
}

impl FakeSource {
    #[must_use]
    pub fn with_video(mut self, path: &str, frames: u64) -> Self {
        self.videos.insert(PathBuf::from(path), (frames, Some(30.0)));
        self
    }

    #[must_use]
    pub fn with_video_fps(mut self, path: &str, frames: u64, fps: Option<f64>) -> Self {
        self.videos.insert(PathBuf::from(path), (frames, fps));
        self
    }

    /// Simulated decode time per frame
    #[must_use]
    pub const fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoSource for FakeSource {
    async fn open(&self, path: &Path) -> Result<Box<dyn FrameStream>> {
        self.opened.lock().unwrap().push(path.to_path_buf());

        let (frames, fps) = self
            .videos
            .get(path)
            .copied()
            .ok_or_else(|| Error::SourceUnavailable(format!("file not found: {}", path.display())))?;

        Ok(Box::new(FakeStream {
            frames,
            fps,
            interval: self.frame_interval,
            index: 0,
        }))
    }
}

pub struct FakeStream {
    frames: u64,
    fps: Option<f64>,
    interval: Duration,
    index: u64,
}

#[async_trait]
impl FrameStream for FakeStream {
    fn fps(&self) -> Option<f64> {
        self.fps
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.index >= self.frames {
            return Ok(None);
        }
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
        self.index += 1;
        Ok(Some(Frame {
            index: self.index,
            width: FRAME_WIDTH,
            height: 100,
            pixels: Vec::new(),
        }))
    }
}

/// Detector returning scripted detections per frame index
///
/// Scripts are keyed by frame index, so the same script replays for each video.
#[derive(Default)]
pub struct FakeDetector {
    by_frame: HashMap<u64, Vec<Detection>>,
    failing: HashSet<u64>,
    pub seen: Mutex<Vec<u64>>,
}

impl FakeDetector {
    #[must_use]
    pub fn on_frame(mut self, index: u64, detections: Vec<Detection>) -> Self {
        self.by_frame.insert(index, detections);
        self
    }

    #[must_use]
    pub fn failing_on(mut self, index: u64) -> Self {
        self.failing.insert(index);
        self
    }

    pub fn seen(&self) -> Vec<u64> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectDetector for FakeDetector {
    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>> {
        self.seen.lock().unwrap().push(frame.index);

        if self.failing.contains(&frame.index) {
            return Err(Error::Detector("inference failed".to_string()));
        }
        Ok(self.by_frame.get(&frame.index).cloned().unwrap_or_default())
    }
}

/// Synthesizer that records what it was asked to say
#[derive(Default)]
pub struct RecordingSynth {
    pub spoken: Mutex<Vec<String>>,
    fail: bool,
    on_speak: Mutex<Option<Box<dyn FnMut(&str) + Send>>>,
}

impl RecordingSynth {
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Run `hook` with each text as it is spoken
    #[must_use]
    pub fn on_speak(self, hook: impl FnMut(&str) + Send + 'static) -> Self {
        *self.on_speak.lock().unwrap() = Some(Box::new(hook));
        self
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynth {
    async fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        if let Some(hook) = self.on_speak.lock().unwrap().as_mut() {
            hook(text);
        }

        if self.fail {
            Err(Error::Tts("engine unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Commentary generator replaying scripted results; repeats the last when exhausted
pub struct FakeCommentary {
    script: Mutex<VecDeque<Result<String>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeCommentary {
    #[must_use]
    pub fn replying(text: &str) -> Self {
        Self::scripted(vec![Ok(text.to_string())])
    }

    #[must_use]
    pub fn failing() -> Self {
        Self::scripted(vec![Err(Error::Commentary("service unavailable".to_string()))])
    }

    #[must_use]
    pub fn scripted(script: Vec<Result<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommentaryGenerator for FakeCommentary {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let mut script = self.script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().map(|r| match r {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(Error::Commentary(e.to_string())),
            })
        };
        next.unwrap_or_else(|| Err(Error::Commentary("no reply scripted".to_string())))
    }
}

/// Recognizer replaying scripted results
///
/// Once the script is exhausted every listen waits out its timeout and
/// reports `ListenTimeout`.
#[derive(Default)]
pub struct FakeRecognizer {
    script: Mutex<VecDeque<Result<String>>>,
    pub listens: Mutex<usize>,
}

impl FakeRecognizer {
    #[must_use]
    pub fn scripted(script: Vec<Result<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            listens: Mutex::new(0),
        }
    }

    pub fn listens(&self) -> usize {
        *self.listens.lock().unwrap()
    }
}

#[async_trait]
impl SpeechRecognizer for FakeRecognizer {
    async fn listen(&self, timeout: Duration) -> Result<String> {
        *self.listens.lock().unwrap() += 1;

        let next = self.script.lock().unwrap().pop_front();
        if let Some(result) = next {
            return result;
        }

        tokio::time::sleep(timeout).await;
        Err(Error::ListenTimeout)
    }
}

/// Keyboard input replaying scripted lines; errors when exhausted
#[derive(Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    pub reads: usize,
}

impl ScriptedInput {
    #[must_use]
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| (*l).to_string()).collect(),
            reads: 0,
        }
    }
}

impl ChoiceInput for ScriptedInput {
    fn read_choice(&mut self, _prompt: &str) -> Result<String> {
        self.reads += 1;
        self.lines
            .pop_front()
            .ok_or_else(|| Error::Input("input closed".to_string()))
    }
}

/// Router with one recording engine per language
pub fn recording_router(
    session: &Session,
) -> (Arc<SpeechOutputRouter>, Arc<RecordingSynth>, Arc<RecordingSynth>) {
    let english = Arc::new(RecordingSynth::default());
    let tamil = Arc::new(RecordingSynth::default());
    let router = SpeechOutputRouter::new(session.clone())
        .with_engine(Language::English, english.clone())
        .with_engine(Language::Tamil, tamil.clone());
    (Arc::new(router), english, tamil)
}
