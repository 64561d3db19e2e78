//! Frame processing loop
//!
//! Plays each configured video in order. Every Nth frame goes through
//! detection; new (label, direction) pairs are offered to both announcement
//! paths. Speaking is awaited inline, so frame processing pauses while the
//! narrator talks. Nothing that happens to a single frame or video stops the
//! run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::narration::{
    AnnouncementScheduler, CommentaryGenerator, NoveltyKey, NoveltyTracker, TranslationTable,
};
use crate::session::UtteranceKind;
use crate::vision::{Frame, FrameDisplay, FrameStream, ObjectDetector, VideoSource, classify};
use crate::voice::SpeechOutputRouter;

/// Tunables for the loop
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationSettings {
    /// Only every `detection_stride`-th frame is sent to the detector
    pub detection_stride: u64,
    /// Frame rate assumed when a video does not report one
    pub fallback_fps: f64,
    /// Minimum interval between object call-outs
    pub object_cooldown: Duration,
    /// Minimum interval between commentary requests
    pub commentary_cooldown: Duration,
    /// Pause after each narration output
    pub post_speech_pause: Duration,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            detection_stride: 5,
            fallback_fps: 30.0,
            object_cooldown: Duration::from_secs(8),
            commentary_cooldown: Duration::from_secs(15),
            post_speech_pause: Duration::from_millis(1500),
        }
    }
}

/// How one video ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOutcome {
    /// Played to end of stream
    Completed,
    /// Could not be opened
    Skipped,
    /// The user asked to quit
    Quit,
}

/// Totals for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Videos played to end of stream
    pub videos_completed: usize,
    /// Videos that could not be opened
    pub videos_skipped: usize,
    /// Whether the run ended on a quit request
    pub quit: bool,
    /// Frames decoded across all videos
    pub frames_read: u64,
    /// Frames sent to the detector
    pub frames_detected: u64,
    /// Object announcements spoken (or attempted)
    pub object_announcements: u64,
    /// Commentaries received and spoken
    pub commentaries: u64,
}

/// External collaborators of the loop
pub struct Collaborators {
    /// Opens each video in turn
    pub source: Arc<dyn VideoSource>,
    /// Runs object detection on sampled frames
    pub detector: Arc<dyn ObjectDetector>,
    /// Produces scene commentary
    pub commentary: Arc<dyn CommentaryGenerator>,
    /// Shared spoken output, also used by the command listener
    pub speech: Arc<SpeechOutputRouter>,
    /// Shows annotated frames
    pub display: Box<dyn FrameDisplay>,
}

/// The foreground narration loop
pub struct FrameProcessingLoop {
    source: Arc<dyn VideoSource>,
    detector: Arc<dyn ObjectDetector>,
    commentary: Arc<dyn CommentaryGenerator>,
    speech: Arc<SpeechOutputRouter>,
    display: Box<dyn FrameDisplay>,
    translations: TranslationTable,
    settings: NarrationSettings,
    scheduler: AnnouncementScheduler,
    novelty: NoveltyTracker,
    summary: RunSummary,
}

impl FrameProcessingLoop {
    #[must_use]
    pub fn new(
        collaborators: Collaborators,
        translations: TranslationTable,
        settings: NarrationSettings,
    ) -> Self {
        let scheduler =
            AnnouncementScheduler::new(settings.object_cooldown, settings.commentary_cooldown);

        Self {
            source: collaborators.source,
            detector: collaborators.detector,
            commentary: collaborators.commentary,
            speech: collaborators.speech,
            display: collaborators.display,
            translations,
            settings,
            scheduler,
            novelty: NoveltyTracker::new(),
            summary: RunSummary::default(),
        }
    }

    /// Narrate every video in order, stopping early once `quit` turns true
    pub async fn run(mut self, videos: &[PathBuf], quit: &watch::Receiver<bool>) -> RunSummary {
        for path in videos {
            tracing::info!(path = %path.display(), "opening video");

            match self.process_video(path, quit).await {
                VideoOutcome::Completed => {
                    self.summary.videos_completed += 1;
                    tracing::info!(path = %path.display(), "video finished");
                }
                VideoOutcome::Skipped => self.summary.videos_skipped += 1,
                VideoOutcome::Quit => {
                    tracing::info!("quit requested");
                    self.summary.quit = true;
                    break;
                }
            }
        }

        tracing::info!(summary = ?self.summary, "all videos processed");
        self.summary
    }

    /// Open a video, retrying once with its absolute path
    async fn open(&self, path: &Path) -> Option<Box<dyn FrameStream>> {
        let error = match self.source.open(path).await {
            Ok(stream) => return Some(stream),
            Err(e) => e,
        };

        if path.is_relative() {
            if let Ok(absolute) = std::path::absolute(path) {
                tracing::info!(path = %absolute.display(), "retrying with absolute path");
                match self.source.open(&absolute).await {
                    Ok(stream) => return Some(stream),
                    Err(e) => {
                        tracing::warn!(path = %absolute.display(), error = %e, "failed to open video, skipping");
                        return None;
                    }
                }
            }
        }

        tracing::warn!(path = %path.display(), error = %error, "failed to open video, skipping");
        None
    }

    async fn process_video(&mut self, path: &Path, quit: &watch::Receiver<bool>) -> VideoOutcome {
        let Some(mut stream) = self.open(path).await else {
            return VideoOutcome::Skipped;
        };

        let fps = stream.fps().unwrap_or_else(|| {
            tracing::warn!(fallback = self.settings.fallback_fps, "invalid frame rate, using fallback");
            self.settings.fallback_fps
        });
        tracing::info!(path = %path.display(), fps, "video opened");

        self.novelty.reset();
        let stride = self.settings.detection_stride.max(1);

        loop {
            if *quit.borrow() {
                return VideoOutcome::Quit;
            }

            let frame = match stream.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "frame read failed, ending video");
                    break;
                }
            };
            self.summary.frames_read += 1;

            if frame.index % stride == 0 {
                self.process_frame(&frame).await;
            } else {
                self.display.show_raw(&frame);
            }
        }

        VideoOutcome::Completed
    }

    /// Detect, dedup, schedule and speak for one frame
    async fn process_frame(&mut self, frame: &Frame) {
        let detections = match self.detector.detect(frame).await {
            Ok(detections) => detections,
            Err(e) => {
                tracing::warn!(frame = frame.index, error = %e, "detection failed, skipping frame");
                self.display.show_raw(frame);
                return;
            }
        };
        self.summary.frames_detected += 1;

        #[allow(clippy::cast_precision_loss)]
        let width = frame.width as f32;
        let novel: Vec<NoveltyKey> = detections
            .iter()
            .map(|d| NoveltyKey::new(d.label.clone(), classify(d.bbox.x1, d.bbox.x2, width)))
            .filter(|key| self.novelty.observe(key.clone()))
            .collect();

        if !novel.is_empty() {
            tracing::debug!(frame = frame.index, novel = novel.len(), "new objects");
        }

        let now = Instant::now();
        let session = self.speech.session().clone();

        let language = session.language();
        if let Some(sentence) =
            self.scheduler
                .try_fire_object_announcement(&novel, language, &self.translations, now)
        {
            tracing::info!(%sentence, "announcing objects");
            self.speech
                .speak(&sentence, language, UtteranceKind::ObjectAnnouncement)
                .await;
            self.summary.object_announcements += 1;
            tokio::time::sleep(self.settings.post_speech_pause).await;
        }

        // Re-read: a voice command may have switched language while we spoke
        let language = session.language();
        let fired_before = self.scheduler.commentary_window().last_fired();
        let commentary = self
            .scheduler
            .try_fire_commentary(
                &novel,
                language,
                &self.translations,
                self.commentary.as_ref(),
                now,
            )
            .await;

        if let Some(text) = commentary {
            self.speech
                .speak(&text, session.language(), UtteranceKind::Commentary)
                .await;
            self.summary.commentaries += 1;
            tokio::time::sleep(self.settings.post_speech_pause).await;
        } else if self.scheduler.commentary_window().last_fired() != fired_before {
            // Failed request still paces the loop like a spoken one
            tokio::time::sleep(self.settings.post_speech_pause).await;
        }

        self.display.show_annotated(frame, &detections);
    }
}
