//! Pull-based segment stream over a live fragment source.
//!
//! Wraps a `Stream` of fragments (text pieces interleaved with pre-decoded
//! structured events) and yields segments in strict arrival order. The inner
//! stream is only polled when the pending queue is empty, so backpressure is
//! the consumer's pull. One `SegmentStream` per streamed response; if the
//! producer stops mid-stream, everything already yielded stands — there is
//! no rollback.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use serde_json::Value;
use tracing::debug;

use kotoba_core::{DividerConfig, Segment, SentenceDivider};

/// One item of the incoming fragment stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// A plain text piece from the token stream — buffered and segmented.
    Text(String),
    /// An already-decoded structured event — passed through untouched.
    Event(Value),
}

/// One item of the outgoing stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutput {
    Segment(Segment),
    Event(Value),
}

/// A `Stream` of [`StreamOutput`] driven by an inner fragment stream.
pub struct SegmentStream<S> {
    inner: S,
    divider: SentenceDivider,
    pending: VecDeque<StreamOutput>,
    done: bool,
}

impl<S> SegmentStream<S> {
    pub fn new(config: DividerConfig, inner: S) -> Self {
        Self {
            inner,
            divider: SentenceDivider::new(config),
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// The divider, e.g. for [`SentenceDivider::complete_response`] once the
    /// stream is exhausted.
    pub fn divider(&self) -> &SentenceDivider {
        &self.divider
    }

    fn queue_segments(&mut self, segments: Vec<Segment>) {
        for seg in segments {
            self.pending.push_back(StreamOutput::Segment(seg));
        }
    }
}

impl<S> Stream for SegmentStream<S>
where
    S: Stream<Item = Fragment> + Unpin,
{
    type Item = StreamOutput;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamOutput>> {
        let this = self.get_mut();

        loop {
            if let Some(out) = this.pending.pop_front() {
                return Poll::Ready(Some(out));
            }
            if this.done {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Fragment::Text(text))) => {
                    this.divider.push(&text);
                    let segs = this.divider.drain();
                    this.queue_segments(segs);
                }
                Poll::Ready(Some(Fragment::Event(event))) => {
                    // Hard flush boundary: resolve what the buffer holds,
                    // then let the event through. The event itself never
                    // enters the buffer.
                    let segs = this.divider.drain();
                    this.queue_segments(segs);
                    this.pending.push_back(StreamOutput::Event(event));
                }
                Poll::Ready(None) => {
                    this.done = true;
                    let segs = this.divider.flush();
                    debug!(flushed = segs.len(), "fragment stream ended");
                    this.queue_segments(segs);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Ergonomic constructor: `fragments.segments(config)`.
pub trait FragmentStreamExt: Stream<Item = Fragment> + Sized {
    fn segments(self, config: DividerConfig) -> SegmentStream<Self> {
        SegmentStream::new(config, self)
    }
}

impl<S: Stream<Item = Fragment>> FragmentStreamExt for S {}
