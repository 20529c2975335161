//! Cold streams: output that starts suspended and resumes one turn later.
//!
//! ```text
//!   Suspended ──schedule_resume──▶ ScheduledResume ──first poll──▶ Active
//!       │                               │
//!       └──────────pause────────────────┴──────────▶ Held ──resume──▶ Active
//! ```
//!
//! A freshly created builtin result (and the session output channel) is
//! built in `ScheduledResume`: the first poll yields once and then flows,
//! unless something calls [`FlowControl::pause`] before that poll, in which
//! case the stream stays held until [`FlowControl::resume`].

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};

use futures::Stream;

/// Position of a [`ColdStream`] in its flow state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Created, no resume scheduled.
    Suspended,
    /// Will start flowing on the next poll turn.
    ScheduledResume,
    /// Items are passed through.
    Active,
    /// Explicitly paused; only `resume` releases it.
    Held,
}

#[derive(Debug)]
struct Flow {
    state: FlowState,
    waker: Option<Waker>,
}

/// Cloneable pause/resume handle for a [`ColdStream`].
#[derive(Debug, Clone)]
pub struct FlowControl {
    inner: Arc<Mutex<Flow>>,
}

impl FlowControl {
    fn new(state: FlowState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Flow { state, waker: None })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Flow> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> FlowState {
        self.lock().state
    }

    /// Hold the stream. Takes precedence over a pending scheduled resume.
    pub fn pause(&self) {
        self.lock().state = FlowState::Held;
    }

    /// Let items flow immediately.
    pub fn resume(&self) {
        let mut flow = self.lock();
        flow.state = FlowState::Active;
        if let Some(waker) = flow.waker.take() {
            waker.wake();
        }
    }

    /// Arm the one-shot resume. No effect unless the stream is `Suspended`.
    pub fn schedule_resume(&self) {
        let mut flow = self.lock();
        if flow.state == FlowState::Suspended {
            flow.state = FlowState::ScheduledResume;
            if let Some(waker) = flow.waker.take() {
                waker.wake();
            }
        }
    }
}

/// A stream wrapper gated by a [`FlowControl`].
pub struct ColdStream<S> {
    inner: S,
    flow: FlowControl,
}

impl<S> ColdStream<S> {
    /// Wrap `inner` with no resume scheduled.
    pub fn suspended(inner: S) -> Self {
        Self {
            inner,
            flow: FlowControl::new(FlowState::Suspended),
        }
    }

    /// Wrap `inner` and schedule it to resume on the next turn.
    pub fn resume_next(inner: S) -> Self {
        let stream = Self::suspended(inner);
        stream.flow.schedule_resume();
        stream
    }

    pub fn control(&self) -> FlowControl {
        self.flow.clone()
    }
}

impl<S: Stream + Unpin> Stream for ColdStream<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S::Item>> {
        let this = self.get_mut();
        {
            let mut flow = this.flow.lock();
            match flow.state {
                FlowState::Active => {}
                FlowState::ScheduledResume => {
                    flow.state = FlowState::Active;
                    cx.waker().wake_by_ref();
                    return Poll::Pending;
                }
                FlowState::Suspended | FlowState::Held => {
                    flow.waker = Some(cx.waker().clone());
                    return Poll::Pending;
                }
            }
        }
        Pin::new(&mut this.inner).poll_next(cx)
    }
}
