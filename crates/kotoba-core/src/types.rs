//! Shared types for the kotoba segmentation engine.
//!
//! These types cross the boundary between kotoba-core, kotoba-lib, and the
//! embedding conversation server. Everything here is serde-serializable so
//! segments can go straight onto a WebSocket or into a log line.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::boundary::{segment_by_language, segment_by_regex};

// ─── Tag types ─────────────────────────────────────────────────────────────

/// Where a tag marker sits relative to its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagState {
    /// `<tag>` — opens a region.
    Start,
    /// Text between a start and its matching end.
    Inside,
    /// `</tag>` — closes a region.
    End,
    /// `<tag/>` — marker with no region.
    SelfClosing,
    /// Sentinel: no tag at all.
    None,
}

/// A recognized tag and its state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    pub name: String,
    pub state: TagState,
}

impl TagInfo {
    pub fn new(name: impl Into<String>, state: TagState) -> Self {
        Self {
            name: name.into(),
            state,
        }
    }

    /// The "no open tags" sentinel used in [`Segment::tags`].
    pub fn none() -> Self {
        Self {
            name: String::new(),
            state: TagState::None,
        }
    }
}

impl fmt::Display for TagInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state {
            TagState::None => write!(f, "none"),
            TagState::Start => write!(f, "{}:start", self.name),
            TagState::Inside => write!(f, "{}:inside", self.name),
            TagState::End => write!(f, "{}:end", self.name),
            TagState::SelfClosing => write!(f, "{}:self", self.name),
        }
    }
}

// ─── Segment ───────────────────────────────────────────────────────────────

/// One emitted unit of output: text plus the tags enclosing it.
///
/// `tags` is ordered outermost-first. A marker-only segment (the `<tag>`
/// itself) carries exactly one entry with the marker's state; a plain text
/// segment with no open tags carries the single [`TagInfo::none`] sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub tags: Vec<TagInfo>,
}

impl Segment {
    pub fn new(text: impl Into<String>, tags: Vec<TagInfo>) -> Self {
        Self {
            text: text.into(),
            tags,
        }
    }
}

// ─── Configuration ─────────────────────────────────────────────────────────

/// Boundary classifier strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStrategy {
    /// Punctuation scan. Language-agnostic, always available.
    Regex,
    /// Locale-aware splitting via lingua language detection.
    /// Falls back to [`SegmentStrategy::Regex`] when detection fails.
    #[default]
    Linguistic,
}

impl SegmentStrategy {
    /// Split `text` into complete sentences plus a trailing remainder.
    pub fn segment(&self, text: &str) -> (Vec<String>, String) {
        match self {
            SegmentStrategy::Regex => segment_by_regex(text),
            SegmentStrategy::Linguistic => segment_by_language(text),
        }
    }
}

/// Configuration for a [`crate::divider::SentenceDivider`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DividerConfig {
    /// Split the first sentence at the first comma so TTS can start sooner.
    pub fast_first_response: bool,
    pub strategy: SegmentStrategy,
    /// Tag names recognized as markers. Anything else in angle brackets is
    /// literal text.
    pub valid_tags: Vec<String>,
}

impl Default for DividerConfig {
    fn default() -> Self {
        Self {
            fast_first_response: true,
            strategy: SegmentStrategy::default(),
            valid_tags: vec!["think".into()],
        }
    }
}
