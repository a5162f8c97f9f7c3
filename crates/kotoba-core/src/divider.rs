//! Sentence divider — incremental buffer draining for a live token stream.
//!
//! The divider owns a growing text buffer. Fragments are appended with
//! [`SentenceDivider::push`]; [`SentenceDivider::drain`] then repeatedly
//! carves off whatever is resolvable right now: tag markers at the front,
//! classifier-complete sentences, and (for the very first unit) a comma
//! prefix so TTS can start before the first full stop arrives. Consumed
//! spans leave the buffer permanently — nothing is re-scanned, nothing is
//! emitted twice.
//!
//! Draining never errors. Tag mismatches and classifier oddities degrade to
//! passthrough text; the only forced emission of an incomplete sentence is
//! [`SentenceDivider::flush`] at end of stream.

use crate::boundary::{comma_split, contains_comma, contains_end_punctuation};
use crate::tags::TagTracker;
use crate::types::{DividerConfig, Segment, SegmentStrategy, TagInfo};

/// Incremental sentence divider for one streamed response.
pub struct SentenceDivider {
    fast_first_response: bool,
    strategy: SegmentStrategy,
    tracker: TagTracker,
    buffer: String,
    first_sentence: bool,
    response: Vec<String>,
}

impl SentenceDivider {
    pub fn new(config: DividerConfig) -> Self {
        Self {
            fast_first_response: config.fast_first_response,
            strategy: config.strategy,
            tracker: TagTracker::new(&config.valid_tags),
            buffer: String::new(),
            first_sentence: true,
            response: Vec::new(),
        }
    }

    /// Append a plain-text fragment to the buffer.
    pub fn push(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
    }

    /// Carve all currently resolvable segments off the front of the buffer.
    pub fn drain(&mut self) -> Vec<Segment> {
        let mut out = Vec::new();

        loop {
            if self.buffer.trim().is_empty() {
                break;
            }

            match self.tracker.next_marker_pos(&self.buffer) {
                Some(0) => {
                    if !self.take_marker(&mut out) {
                        break;
                    }
                }
                Some(pos) => {
                    let before = &self.buffer[..pos];
                    if contains_end_punctuation(before) {
                        // Classify the text ahead of the marker. A classifier
                        // remainder is emitted too: the marker right behind it
                        // is the boundary, and dropping it would lose text.
                        let tags = self.enclosing_tags();
                        let (sentences, remainder) = self.strategy.segment(before);
                        for sentence in sentences {
                            self.emit(&mut out, &sentence, tags.clone());
                        }
                        if !remainder.trim().is_empty() {
                            self.emit(&mut out, remainder.trim(), tags);
                        }
                        self.buffer.drain(..pos);
                    } else if !before.trim().is_empty() {
                        // No sentence end, but the upcoming marker provides
                        // the boundary. This can split a clause mid-thought
                        // when the model emits a tag right after it.
                        let text = before.trim().to_string();
                        let tags = self.enclosing_tags();
                        self.emit(&mut out, &text, tags);
                        self.buffer.drain(..pos);
                    } else {
                        // Only whitespace ahead of the marker.
                        if !self.take_marker(&mut out) {
                            break;
                        }
                    }
                }
                None => {
                    if self.first_sentence
                        && self.fast_first_response
                        && contains_comma(&self.buffer)
                    {
                        let (head, rest) = comma_split(&self.buffer);
                        if !head.trim().is_empty() {
                            let tags = self.enclosing_tags();
                            self.emit(&mut out, &head, tags);
                            self.buffer = rest;
                            self.first_sentence = false;
                            continue;
                        }
                    }

                    if contains_end_punctuation(&self.buffer) {
                        let (sentences, remainder) = self.strategy.segment(&self.buffer);
                        if !sentences.is_empty() {
                            let tags = self.enclosing_tags();
                            self.buffer = remainder;
                            self.first_sentence = false;
                            for sentence in sentences {
                                self.emit(&mut out, &sentence, tags.clone());
                            }
                            continue;
                        }
                    }

                    // Nothing resolvable — wait for more input.
                    break;
                }
            }
        }

        out
    }

    /// End-of-stream: drain, then emit any leftover text verbatim. An
    /// unterminated trailing fragment is never discarded.
    pub fn flush(&mut self) -> Vec<Segment> {
        let mut out = self.drain();
        if !self.buffer.trim().is_empty() {
            let text = self.buffer.trim().to_string();
            let tags = self.enclosing_tags();
            self.emit(&mut out, &text, tags);
        }
        self.buffer.clear();
        out
    }

    /// Everything emitted so far, concatenated in order.
    pub fn complete_response(&self) -> String {
        self.response.concat()
    }

    /// Currently open tags, outermost first.
    pub fn open_tags(&self) -> Vec<TagInfo> {
        self.tracker.current_tags()
    }

    /// Clear all state for reuse across independent conversations.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.first_sentence = true;
        self.tracker.reset();
        self.response.clear();
    }

    /// Extract the marker at (or just past leading whitespace of) the buffer
    /// front and emit it as a marker-only segment. Returns false when no
    /// marker was actually extractable.
    fn take_marker(&mut self, out: &mut Vec<Segment>) -> bool {
        let (tag, remaining) = self.tracker.extract_next(&self.buffer);
        let Some(tag) = tag else {
            return false;
        };
        let consumed = self.buffer[..self.buffer.len() - remaining.len()]
            .trim()
            .to_string();
        self.emit(out, &consumed, vec![tag]);
        self.buffer = remaining;
        true
    }

    fn enclosing_tags(&self) -> Vec<TagInfo> {
        let tags = self.tracker.current_tags();
        if tags.is_empty() {
            vec![TagInfo::none()]
        } else {
            tags
        }
    }

    fn emit(&mut self, out: &mut Vec<Segment>, text: &str, tags: Vec<TagInfo>) {
        self.response.push(text.to_string());
        out.push(Segment::new(text, tags));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagState;

    fn divider() -> SentenceDivider {
        SentenceDivider::new(DividerConfig {
            fast_first_response: false,
            strategy: SegmentStrategy::Regex,
            valid_tags: vec!["think".into()],
        })
    }

    fn fast_divider() -> SentenceDivider {
        SentenceDivider::new(DividerConfig {
            fast_first_response: true,
            strategy: SegmentStrategy::Regex,
            valid_tags: vec!["think".into()],
        })
    }

    fn texts(segments: &[Segment]) -> Vec<&str> {
        segments.iter().map(|s| s.text.as_str()).collect()
    }

    // ── basic draining ─────────────────────────────────────────────

    #[test]
    fn waits_for_terminal_punctuation() {
        let mut d = divider();
        d.push("Hello wor");
        assert!(d.drain().is_empty());
        d.push("ld. And");
        assert_eq!(texts(&d.drain()), vec!["Hello world."]);
    }

    #[test]
    fn splits_multiple_sentences_in_one_fragment() {
        let mut d = divider();
        d.push("One. Two! Three? tail");
        assert_eq!(texts(&d.drain()), vec!["One.", "Two!", "Three?"]);
        let flushed = d.flush();
        assert_eq!(texts(&flushed), vec!["tail"]);
    }

    #[test]
    fn untagged_segments_carry_none_sentinel() {
        let mut d = divider();
        d.push("Hello there.");
        let segs = d.drain();
        assert_eq!(segs[0].tags, vec![TagInfo::none()]);
    }

    #[test]
    fn flush_emits_unterminated_fragment_verbatim() {
        let mut d = divider();
        d.push("incomplete frag");
        assert!(d.drain().is_empty());
        assert_eq!(texts(&d.flush()), vec!["incomplete frag"]);
    }

    #[test]
    fn flush_on_empty_buffer_is_empty() {
        let mut d = divider();
        assert!(d.flush().is_empty());
        d.push("   ");
        assert!(d.flush().is_empty());
    }

    // ── fast first response ────────────────────────────────────────

    #[test]
    fn fast_first_response_splits_at_comma() {
        let mut d = fast_divider();
        d.push("Hello, world. Next.");
        let segs = d.drain();
        assert_eq!(texts(&segs), vec!["Hello,", "world.", "Next."]);
    }

    #[test]
    fn comma_split_applies_only_to_first_sentence() {
        let mut d = fast_divider();
        d.push("Hi, there. Then, more text follows");
        // The comma in "Then, more" must not trigger another fast split; that
        // tail has no terminal punctuation, so it waits for the flush.
        assert_eq!(texts(&d.drain()), vec!["Hi,", "there."]);
        assert_eq!(texts(&d.flush()), vec!["Then, more text follows"]);
    }

    #[test]
    fn comma_split_not_applied_after_first_sentence() {
        let mut d = fast_divider();
        d.push("Hi, there.");
        assert_eq!(texts(&d.drain()), vec!["Hi,", "there."]);
        d.push(" And now, a pause");
        assert!(d.drain().is_empty());
        assert_eq!(texts(&d.flush()), vec!["And now, a pause"]);
    }

    // ── tags ───────────────────────────────────────────────────────

    #[test]
    fn marker_at_front_is_emitted_alone() {
        let mut d = divider();
        d.push("<think>planning");
        let segs = d.drain();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].text, "<think>");
        assert_eq!(segs[0].tags, vec![TagInfo::new("think", TagState::Start)]);
        assert_eq!(d.open_tags().len(), 1);
    }

    #[test]
    fn text_inside_tag_is_attributed() {
        let mut d = divider();
        d.push("<think>deep thought.</think>done.");
        let segs = d.drain();
        assert_eq!(
            texts(&segs),
            vec!["<think>", "deep thought.", "</think>", "done."]
        );
        assert_eq!(segs[1].tags, vec![TagInfo::new("think", TagState::Inside)]);
        assert_eq!(segs[3].tags, vec![TagInfo::none()]);
        assert!(d.open_tags().is_empty());
    }

    #[test]
    fn nested_tags_attribute_by_depth() {
        let mut d = divider();
        d.push("<think>outer <think>inner</think> tail</think>");
        let segs = d.flush();
        assert_eq!(
            texts(&segs),
            vec![
                "<think>", "outer", "<think>", "inner", "</think>", "tail", "</think>"
            ]
        );
        // "outer" sits one level deep, "inner" two levels.
        assert_eq!(segs[1].tags.len(), 1);
        assert_eq!(segs[3].tags.len(), 2);
        assert_eq!(segs[3].tags[0].state, TagState::Inside);
        assert_eq!(segs[5].tags.len(), 1);
        assert!(d.open_tags().is_empty());
    }

    #[test]
    fn marker_split_across_fragments() {
        let mut d = divider();
        d.push("before <thi");
        // "<thi" is not yet a marker; "before" has no punctuation either, so
        // nothing moves until the marker completes.
        assert!(d.drain().is_empty());
        d.push("nk>inside.</think>");
        let segs = d.drain();
        assert_eq!(
            texts(&segs),
            vec!["before", "<think>", "inside.", "</think>"]
        );
    }

    #[test]
    fn unpunctuated_text_before_marker_is_emitted_whole() {
        let mut d = divider();
        d.push("a quick aside<think>hidden</think>");
        let segs = d.drain();
        assert_eq!(segs[0].text, "a quick aside");
        assert_eq!(segs[0].tags, vec![TagInfo::none()]);
    }

    #[test]
    fn punctuated_text_before_marker_keeps_classifier_remainder() {
        let mut d = divider();
        d.push("Done. leftover<think>x</think>");
        let segs = d.drain();
        // "leftover" has no terminal punctuation but precedes the marker; it
        // must come out rather than vanish.
        assert_eq!(
            texts(&segs),
            vec!["Done.", "leftover", "<think>", "x", "</think>"]
        );
    }

    #[test]
    fn self_closing_marker_between_sentences() {
        let mut d = SentenceDivider::new(DividerConfig {
            fast_first_response: false,
            strategy: SegmentStrategy::Regex,
            valid_tags: vec!["pause".into()],
        });
        d.push("First. <pause/> Second.");
        let segs = d.drain();
        assert_eq!(texts(&segs), vec!["First.", "<pause/>", "Second."]);
        assert_eq!(segs[1].tags, vec![TagInfo::new("pause", TagState::SelfClosing)]);
        assert!(d.open_tags().is_empty());
    }

    #[test]
    fn unmatched_end_tag_does_not_stop_draining() {
        let mut d = divider();
        d.push("</think>still talking.");
        let segs = d.drain();
        assert_eq!(texts(&segs), vec!["</think>", "still talking."]);
        assert!(d.open_tags().is_empty());
    }

    // ── invariants ─────────────────────────────────────────────────

    #[test]
    fn no_loss_no_duplication_across_fragmentations() {
        let input = "Hello, world. This is a test! Another one? trailing bit";
        // Feed the same input in several different fragmentations; the
        // concatenated output must always reconstruct the input's words.
        for chunk_size in [1, 3, 7, 16, input.len()] {
            let mut d = divider();
            let mut segs = Vec::new();
            let bytes = input.as_bytes();
            let mut i = 0;
            while i < bytes.len() {
                let end = (i + chunk_size).min(bytes.len());
                // Chunk on char boundaries only.
                let mut e = end;
                while !input.is_char_boundary(e) {
                    e += 1;
                }
                d.push(&input[i..e]);
                segs.extend(d.drain());
                i = e;
            }
            segs.extend(d.flush());
            let rejoined: Vec<String> = segs.iter().map(|s| s.text.clone()).collect();
            assert_eq!(
                rejoined.join(" ").split_whitespace().collect::<Vec<_>>(),
                input.split_whitespace().collect::<Vec<_>>(),
                "chunk_size {chunk_size}"
            );
        }
    }

    #[test]
    fn reset_then_replay_is_identical() {
        let fragments = ["<think>hm.</think>", "Okay, so. ", "here is the plan"];
        let run = |d: &mut SentenceDivider| -> Vec<Segment> {
            let mut segs = Vec::new();
            for f in &fragments {
                d.push(f);
                segs.extend(d.drain());
            }
            segs.extend(d.flush());
            segs
        };
        let mut d = fast_divider();
        let first = run(&mut d);
        d.reset();
        let second = run(&mut d);
        assert_eq!(first, second);
    }

    #[test]
    fn complete_response_accumulates_emitted_text() {
        let mut d = divider();
        d.push("One. Two.");
        d.drain();
        d.flush();
        assert_eq!(d.complete_response(), "One.Two.");
    }

    #[test]
    fn reset_clears_response_and_tags() {
        let mut d = divider();
        d.push("<think>abc.");
        d.drain();
        assert_eq!(d.open_tags().len(), 1);
        d.reset();
        assert!(d.open_tags().is_empty());
        assert_eq!(d.complete_response(), "");
        assert!(d.flush().is_empty());
    }

    #[test]
    fn multibyte_text_with_cjk_punctuation() {
        let mut d = divider();
        d.push("今日はいい天気ですね。散歩に");
        let segs = d.drain();
        assert_eq!(texts(&segs), vec!["今日はいい天気ですね。"]);
        d.push("行きましょう");
        assert_eq!(texts(&d.flush()), vec!["散歩に行きましょう"]);
    }
}
