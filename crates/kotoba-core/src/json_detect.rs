//! Incremental detection of JSON objects inside a streamed text buffer.
//!
//! Tool-call status payloads arrive inline with prose, split arbitrarily
//! across fragments. The detector accumulates text, remembers every `{` as a
//! potential object start, and parses a candidate as soon as its braces
//! balance. Parsed spans are recorded so `{` characters inside them are
//! never re-detected.
//!
//! Braces are counted without string-literal awareness, so an object whose
//! string values contain `{` or `}` mis-delimits and is discarded when the
//! parse fails. Acceptable for the payloads this sees in practice.

use serde_json::Value;
use tracing::warn;

/// Incremental JSON object detector for one streamed response.
#[derive(Default)]
pub struct StreamJsonDetector {
    buffer: String,
    potential_starts: Vec<usize>,
    processed: Vec<(usize, usize)>,
    completed: Vec<Value>,
}

enum Extraction {
    /// Balanced and parsed; holds the value and the inclusive end offset.
    Complete(Value, usize),
    /// Braces not yet balanced — wait for more text.
    Incomplete,
    /// Balanced but not valid JSON — a false positive.
    Invalid,
}

impl StreamJsonDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every object completed by it. An empty
    /// chunk is a no-op.
    pub fn process_chunk(&mut self, chunk: &str) -> Vec<Value> {
        let old_len = self.buffer.len();
        self.buffer.push_str(chunk);
        self.find_potential_starts(old_len);
        self.try_parse()
    }

    /// All objects parsed so far on this stream.
    pub fn all_objects(&self) -> &[Value] {
        &self.completed
    }

    /// Clear everything for a new stream.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.potential_starts.clear();
        self.processed.clear();
        self.completed.clear();
    }

    /// Scan only the newly appended region for `{` outside processed spans.
    fn find_potential_starts(&mut self, start_from: usize) {
        for (i, b) in self.buffer.bytes().enumerate().skip(start_from) {
            if b == b'{' && !self.in_processed_range(i) {
                self.potential_starts.push(i);
            }
        }
    }

    fn in_processed_range(&self, pos: usize) -> bool {
        self.processed
            .iter()
            .any(|&(start, end)| start <= pos && pos <= end)
    }

    fn try_parse(&mut self) -> Vec<Value> {
        let mut found = Vec::new();
        let mut retained = Vec::new();

        // Ascending offset order: an outer object parses first and its span
        // then swallows the nested starts.
        let mut starts = std::mem::take(&mut self.potential_starts);
        starts.sort_unstable();

        for start in starts {
            if self.in_processed_range(start) {
                continue;
            }
            match self.extract(start) {
                Extraction::Complete(value, end) => {
                    self.processed.push((start, end));
                    self.completed.push(value.clone());
                    found.push(value);
                }
                Extraction::Incomplete => retained.push(start),
                // False positive — forget the offset rather than retrying.
                Extraction::Invalid => {}
            }
        }

        self.potential_starts = retained;
        found
    }

    /// Walk brace depth forward from `start`; parse once it returns to zero.
    fn extract(&self, start: usize) -> Extraction {
        let bytes = self.buffer.as_bytes();
        let mut depth = 1usize;
        let mut i = start + 1;

        while i < bytes.len() && depth > 0 {
            match bytes[i] {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {}
            }
            i += 1;
        }

        if depth != 0 {
            return Extraction::Incomplete;
        }

        let candidate = &self.buffer[start..i];
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => Extraction::Complete(value, i - 1),
            Err(err) => {
                let snippet: String = candidate.chars().take(50).collect();
                warn!(%err, "balanced braces but not valid JSON, discarding: {snippet}");
                Extraction::Invalid
            }
        }
    }
}
