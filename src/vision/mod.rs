//! Vision side of the narrator
//!
//! Frame acquisition, object detection, direction classification and
//! (observational) frame display. Detection itself is an external service.

mod detector;
mod direction;
mod display;
mod source;

pub use detector::{BoundingBox, Detection, HttpDetector, ObjectDetector};
pub use direction::{DirectionZone, classify};
pub use display::{FrameDisplay, TracingDisplay};
pub use source::{FfmpegSource, Frame, FrameStream, VideoSource};
