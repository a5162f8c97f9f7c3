//! kotoba-lib — Async streaming layer.
//!
//! Turns a live fragment stream (LLM tokens plus structured events) into a
//! segment stream ready for TTS dispatch. Depends on kotoba-core for the
//! parsing machinery.

pub mod stream;

pub use stream::{Fragment, FragmentStreamExt, SegmentStream, StreamOutput};

// Re-export kotoba-core for convenience
pub use kotoba_core;
