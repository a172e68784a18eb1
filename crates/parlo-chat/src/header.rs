// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Header display: the emotion art above the conversation and the typing
//! indicator.
//!
//! A reply emotion stays up for a fixed time, then a single revert timer
//! puts the header back to neutral. Arming a timer always cancels the
//! previous one first.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use parlo_config::model::HeaderConfig;
use parlo_core::Emotion;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderState {
    pub emotion: Emotion,
    /// True while at least one delivery is in flight.
    pub is_typing: bool,
}

pub struct HeaderDisplay {
    state: watch::Sender<HeaderState>,
    in_flight: AtomicUsize,
    revert: ArcSwap<CancellationToken>,
    display_for: Duration,
    timers: TaskTracker,
}

impl HeaderDisplay {
    pub fn new(display_for: Duration) -> Self {
        let (state, _) = watch::channel(HeaderState::default());
        Self {
            state,
            in_flight: AtomicUsize::new(0),
            revert: ArcSwap::from_pointee(CancellationToken::new()),
            display_for,
            timers: TaskTracker::new(),
        }
    }

    pub fn from_config(config: &HeaderConfig) -> Self {
        Self::new(config.emotion_display())
    }

    pub fn current(&self) -> HeaderState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<HeaderState> {
        self.state.subscribe()
    }

    /// A delivery started: show `processing` and the typing indicator.
    pub fn processing(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.cancel_revert();
        self.state.send_modify(|s| {
            s.emotion = Emotion::Processing;
            s.is_typing = true;
        });
    }

    /// A delivery ended, successfully or not.
    pub fn delivery_finished(&self) {
        let remaining = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
            .map(|previous| previous.saturating_sub(1))
            .unwrap_or(0);
        self.state.send_modify(|s| s.is_typing = remaining > 0);
    }

    /// Shows `emotion`, reverting to neutral after the display time.
    pub fn show(self: &Arc<Self>, emotion: Emotion) {
        let token = CancellationToken::new();
        self.revert.swap(Arc::new(token.clone())).cancel();
        self.state.send_modify(|s| s.emotion = emotion);
        debug!(%emotion, "header emotion shown");

        if emotion == Emotion::Neutral {
            return;
        }
        let this = Arc::clone(self);
        self.timers.spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(this.display_for) => {
                    // Checked under the state lock: a newer emotion cancels
                    // this token before writing its own state.
                    let reverted = this.state.send_if_modified(|s| {
                        if token.is_cancelled() {
                            return false;
                        }
                        s.emotion = Emotion::Neutral;
                        true
                    });
                    if reverted {
                        debug!("header emotion reverted to neutral");
                    }
                }
            }
        });
    }

    fn cancel_revert(&self) {
        self.revert
            .swap(Arc::new(CancellationToken::new()))
            .cancel();
    }

    /// Cancels the pending revert timer and waits for timer tasks to end.
    pub async fn shutdown(&self) {
        self.cancel_revert();
        self.timers.close();
        self.timers.wait().await;
    }
}
