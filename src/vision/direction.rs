//! Coarse horizontal position of a detection

use std::fmt;

/// Where an object sits across the frame, from the wearer's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionZone {
    /// Left third of the frame
    Left,
    /// Middle third, boundaries included
    Ahead,
    /// Right third of the frame
    Right,
}

impl fmt::Display for DirectionZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Ahead => "ahead",
            Self::Right => "right",
        })
    }
}

/// Classify a bounding box by its horizontal center
///
/// Centers exactly on a third boundary count as `Ahead`.
#[must_use]
pub fn classify(x1: f32, x2: f32, frame_width: f32) -> DirectionZone {
    let center = f32::midpoint(x1, x2);

    if center < frame_width / 3.0 {
        DirectionZone::Left
    } else if center > 2.0 * frame_width / 3.0 {
        DirectionZone::Right
    } else {
        DirectionZone::Ahead
    }
}
