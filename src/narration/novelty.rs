//! Per-video repeat suppression

use std::collections::HashSet;

use crate::vision::DirectionZone;

/// Identity of an announced object: what it is and where it was
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoveltyKey {
    /// Detector class label, untranslated
    pub label: String,
    /// Horizontal zone the object was in
    pub zone: DirectionZone,
}

impl NoveltyKey {
    /// Key for `label` seen in `zone`
    #[must_use]
    pub fn new(label: impl Into<String>, zone: DirectionZone) -> Self {
        Self {
            label: label.into(),
            zone,
        }
    }
}

/// Remembers which (label, zone) pairs were already announced in the current video
///
/// A key, once recorded, stays recorded until [`NoveltyTracker::reset`], which the
/// frame loop calls exactly once at the start of each video.
#[derive(Debug, Default)]
pub struct NoveltyTracker {
    seen: HashSet<NoveltyKey>,
}

impl NoveltyTracker {
    /// Empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the key has not been recorded in this video
    #[must_use]
    pub fn is_novel(&self, key: &NoveltyKey) -> bool {
        !self.seen.contains(key)
    }

    /// Record a key as announced
    pub fn record(&mut self, key: NoveltyKey) {
        self.seen.insert(key);
    }

    /// Check and record in one step; true if the key was novel
    pub fn observe(&mut self, key: NoveltyKey) -> bool {
        self.seen.insert(key)
    }

    /// Forget everything (start of a new video)
    pub fn reset(&mut self) {
        self.seen = HashSet::new();
    }

    /// Number of keys recorded in this video
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// True if nothing was recorded in this video
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
