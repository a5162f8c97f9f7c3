//! kotoba-core — Streaming text segmentation.
//!
//! The parsing core of the kotoba voice backend: incremental sentence
//! dividing, inline tag tracking, and JSON payload detection over a live
//! token stream. No async runtime, no I/O — the async layer lives in
//! kotoba-lib.

pub mod boundary;
pub mod divider;
pub mod json_detect;
pub mod tags;
pub mod types;

pub use divider::SentenceDivider;
pub use json_detect::StreamJsonDetector;
pub use tags::TagTracker;
pub use types::{DividerConfig, Segment, SegmentStrategy, TagInfo, TagState};
