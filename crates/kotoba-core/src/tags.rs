//! Stack-based tag tracking for inline regions like `<think>…</think>`.
//!
//! Only configured tag names are recognized; any other `<...>` sequence is
//! literal text. Tags nest arbitrarily deep. An end tag that does not match
//! the top of the stack is logged and otherwise ignored — the stack is left
//! as-is rather than guessing which entry to pop.

use regex::Regex;
use tracing::warn;

use crate::types::{TagInfo, TagState};

/// Compiled marker patterns for one tag name.
struct TagPatterns {
    name: String,
    self_closing: Regex,
    start: Regex,
    end: Regex,
}

impl TagPatterns {
    fn compile(name: &str) -> Self {
        let escaped = regex::escape(name);
        // Literal patterns; compilation only fails on invalid syntax, which
        // escaping rules out.
        Self {
            name: name.to_string(),
            self_closing: Regex::new(&format!("<{escaped}/>")).unwrap(),
            start: Regex::new(&format!("<{escaped}>")).unwrap(),
            end: Regex::new(&format!("</{escaped}>")).unwrap(),
        }
    }
}

/// Recognizes markers for a configured tag set and tracks nesting.
pub struct TagTracker {
    patterns: Vec<TagPatterns>,
    stack: Vec<String>,
}

impl TagTracker {
    pub fn new(valid_tags: &[String]) -> Self {
        Self {
            patterns: valid_tags.iter().map(|t| TagPatterns::compile(t)).collect(),
            stack: Vec::new(),
        }
    }

    /// Byte offset of the earliest marker in `text`, if any. Does not touch
    /// the stack.
    pub fn next_marker_pos(&self, text: &str) -> Option<usize> {
        let mut earliest: Option<usize> = None;
        for p in &self.patterns {
            for re in [&p.self_closing, &p.start, &p.end] {
                if let Some(m) = re.find(text) {
                    if earliest.is_none_or(|e| m.start() < e) {
                        earliest = Some(m.start());
                    }
                }
            }
        }
        earliest
    }

    /// Extract the earliest marker in `text`, updating the stack, and return
    /// it together with the text remaining after the marker (left-trimmed).
    ///
    /// When several forms match at the same offset the check order decides:
    /// self-closing, then start, then end.
    pub fn extract_next(&mut self, text: &str) -> (Option<TagInfo>, String) {
        let mut found: Option<(usize, usize, String, TagState)> = None;

        let mut consider = |m: regex::Match<'_>, name: &str, state: TagState| {
            if found.as_ref().is_none_or(|(pos, ..)| m.start() < *pos) {
                found = Some((m.start(), m.end(), name.to_string(), state));
            }
        };

        for p in &self.patterns {
            if let Some(m) = p.self_closing.find(text) {
                consider(m, &p.name, TagState::SelfClosing);
            }
        }
        for p in &self.patterns {
            if let Some(m) = p.start.find(text) {
                consider(m, &p.name, TagState::Start);
            }
        }
        for p in &self.patterns {
            if let Some(m) = p.end.find(text) {
                consider(m, &p.name, TagState::End);
            }
        }

        let Some((_, end, name, state)) = found else {
            return (None, text.to_string());
        };

        match state {
            TagState::Start => self.stack.push(name.clone()),
            TagState::End => {
                if self.stack.last().is_some_and(|top| *top == name) {
                    self.stack.pop();
                } else {
                    warn!(tag = %name, "unmatched end tag, leaving stack unchanged");
                }
            }
            _ => {}
        }

        (
            Some(TagInfo::new(name, state)),
            text[end..].trim_start().to_string(),
        )
    }

    /// Currently open tags, outermost first, state `Inside`.
    pub fn current_tags(&self) -> Vec<TagInfo> {
        self.stack
            .iter()
            .map(|name| TagInfo::new(name.clone(), TagState::Inside))
            .collect()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn reset(&mut self) {
        self.stack.clear();
    }
}
