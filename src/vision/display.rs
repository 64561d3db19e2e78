//! Frame display
//!
//! Display is observational only; nothing in the narration contract depends on it.

use super::{Detection, Frame};

/// Receives every frame the loop handles
pub trait FrameDisplay: Send {
    /// Show a frame that was not sent through detection
    fn show_raw(&mut self, frame: &Frame);

    /// Show a detected frame with its detections
    fn show_annotated(&mut self, frame: &Frame, detections: &[Detection]);
}

/// Headless display that logs annotations
#[derive(Debug, Default)]
pub struct TracingDisplay;

impl FrameDisplay for TracingDisplay {
    fn show_raw(&mut self, frame: &Frame) {
        tracing::trace!(frame = frame.index, "frame");
    }

    fn show_annotated(&mut self, frame: &Frame, detections: &[Detection]) {
        for detection in detections {
            tracing::debug!(
                frame = frame.index,
                label = %detection.label,
                confidence = detection.confidence,
                x1 = detection.bbox.x1,
                y1 = detection.bbox.y1,
                x2 = detection.bbox.x2,
                y2 = detection.bbox.y2,
                "detection"
            );
        }
    }
}
