// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialized speech playback with word highlighting.
//!
//! [`PlaybackQueue::enqueue`] never blocks: items go onto an unbounded
//! channel drained by a single worker task, so at most one item plays at a
//! time and items play in enqueue order. Muting bumps an epoch (stale queued
//! items are discarded by the worker) and cancels the in-progress item.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use parlo_core::traits::{AudioSink, SpeechSynthesizer, SynthesizedAudio, WordTiming};
use parlo_core::{HighlightState, MessageId, ParloError, ResourceKind, ResourceRegistry};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::sanitize::{SanitizedText, sanitize};
use crate::words::split_words;

/// Why an item produced no audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing speakable left after sanitizing.
    EmptyText,
    /// The synthesizer reported the capability as absent.
    Unavailable,
    /// Enqueued while muted.
    Muted,
}

/// Observable playback progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started {
        owner: MessageId,
    },
    /// A word began; `char_offset` points into the original message text.
    Word {
        owner: MessageId,
        char_offset: usize,
    },
    Finished {
        owner: MessageId,
    },
    Failed {
        owner: MessageId,
        error: String,
    },
    Skipped {
        owner: MessageId,
        reason: SkipReason,
    },
    /// Mute discarded the queue and stopped the current item.
    Cleared,
}

#[derive(Debug, Clone)]
pub struct PlaybackOptions {
    /// Pause before each item starts speaking.
    pub start_delay: Duration,
    pub event_capacity: usize,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_millis(50),
            event_capacity: 256,
        }
    }
}

#[derive(Debug)]
struct QueueItem {
    text: String,
    owner: MessageId,
    epoch: u64,
}

struct Shared {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
    registry: ResourceRegistry,
    start_delay: Duration,
    muted: AtomicBool,
    epoch: AtomicU64,
    /// Cancels the item currently playing; replaced on every mute.
    current: ArcSwap<CancellationToken>,
    highlight: watch::Sender<HighlightState>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl Shared {
    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn set_highlight(&self, state: HighlightState) {
        self.highlight.send_replace(state);
    }
}

/// The speech playback queue. Dropping it stops the worker.
pub struct PlaybackQueue {
    tx: mpsc::UnboundedSender<QueueItem>,
    shared: Arc<Shared>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl PlaybackQueue {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        sink: Arc<dyn AudioSink>,
        registry: ResourceRegistry,
        options: PlaybackOptions,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        let (highlight, _) = watch::channel(HighlightState::cleared());

        let shared = Arc::new(Shared {
            synthesizer,
            sink,
            registry,
            start_delay: options.start_delay,
            muted: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            current: ArcSwap::from_pointee(CancellationToken::new()),
            highlight,
            events,
        });

        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();
        tracker.spawn(run_worker(rx, Arc::clone(&shared), shutdown.clone()));
        tracker.close();

        Self {
            tx,
            shared,
            shutdown,
            tracker,
        }
    }

    /// Queues `text` for speaking on behalf of bot message `owner`.
    ///
    /// Returns false when the item was dropped (muted or shut down).
    pub fn enqueue(&self, text: impl Into<String>, owner: MessageId) -> bool {
        if self.shared.muted.load(Ordering::SeqCst) {
            debug!(message_id = %owner, "muted, dropping speech item");
            self.shared.emit(PlaybackEvent::Skipped {
                owner,
                reason: SkipReason::Muted,
            });
            return false;
        }
        let item = QueueItem {
            text: text.into(),
            owner,
            epoch: self.shared.epoch.load(Ordering::SeqCst),
        };
        self.tx.send(item).is_ok()
    }

    /// Discards queued items, stops current playback, clears the highlight.
    pub fn mute(&self) {
        self.shared.muted.store(true, Ordering::SeqCst);
        self.clear();
        info!("speech muted");
    }

    /// Accepts new items again. Nothing discarded by `mute` comes back.
    pub fn unmute(&self) {
        self.shared.muted.store(false, Ordering::SeqCst);
        info!("speech unmuted");
    }

    pub fn is_muted(&self) -> bool {
        self.shared.muted.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        // Epoch first: a worker that already holds the old token sees it
        // cancelled, one that loads the new token sees the new epoch.
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        self.shared
            .current
            .swap(Arc::new(CancellationToken::new()))
            .cancel();
        self.shared.set_highlight(HighlightState::cleared());
        self.shared.emit(PlaybackEvent::Cleared);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.shared.events.subscribe()
    }

    /// Word currently being spoken.
    pub fn highlight(&self) -> HighlightState {
        self.shared.highlight.borrow().clone()
    }

    pub fn watch_highlight(&self) -> watch::Receiver<HighlightState> {
        self.shared.highlight.subscribe()
    }

    /// Stops the worker and waits for it to exit.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.shared.current.load().cancel();
        self.tracker.wait().await;
        self.shared.set_highlight(HighlightState::cleared());
        debug!("playback worker stopped");
    }
}

impl Drop for PlaybackQueue {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.shared.current.load().cancel();
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<QueueItem>,
    shared: Arc<Shared>,
    shutdown: CancellationToken,
) {
    loop {
        let item = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            item = rx.recv() => match item {
                Some(item) => item,
                None => break,
            },
        };

        let token = shared.current.load_full();
        if item.epoch != shared.epoch.load(Ordering::SeqCst) {
            debug!(message_id = %item.owner, "discarding item queued before mute");
            continue;
        }

        play_item(&shared, item, &token).await;
        shared.set_highlight(HighlightState::cleared());
    }
}

async fn play_item(shared: &Shared, item: QueueItem, cancel: &CancellationToken) {
    let QueueItem { text, owner, .. } = item;

    let clean = sanitize(&text);
    if clean.is_empty() {
        debug!(message_id = %owner, "nothing speakable after sanitizing");
        shared.emit(PlaybackEvent::Skipped {
            owner,
            reason: SkipReason::EmptyText,
        });
        return;
    }

    if !shared.start_delay.is_zero() {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(shared.start_delay) => {}
        }
    }

    let synthesized = tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        r = shared.synthesizer.synthesize(clean.as_str()) => r,
    };
    let audio = match synthesized {
        Ok(Some(audio)) => audio,
        Ok(None) => {
            shared.emit(PlaybackEvent::Skipped {
                owner,
                reason: SkipReason::Unavailable,
            });
            return;
        }
        Err(e) => {
            warn!(message_id = %owner, error = %e, "speech synthesis failed");
            shared.emit(PlaybackEvent::Failed {
                owner,
                error: e.to_string(),
            });
            return;
        }
    };

    // Released on every exit path below.
    let source = shared
        .registry
        .allocate(ResourceKind::AudioSource, owner.as_str());
    debug!(message_id = %owner, url = source.url(), "playing");
    shared.emit(PlaybackEvent::Started {
        owner: owner.clone(),
    });

    let result = speak(shared, &audio, &clean, &owner, cancel).await;
    source.release();
    shared.set_highlight(HighlightState::cleared());

    match result {
        Some(Ok(())) => shared.emit(PlaybackEvent::Finished { owner }),
        Some(Err(e)) => {
            warn!(message_id = %owner, error = %e, "playback failed");
            shared.emit(PlaybackEvent::Failed {
                owner,
                error: e.to_string(),
            });
        }
        None => debug!(message_id = %owner, "playback interrupted"),
    }
}

/// Drives one playback, forwarding word highlights. `None` when cancelled.
async fn speak(
    shared: &Shared,
    audio: &SynthesizedAudio,
    clean: &SanitizedText,
    owner: &MessageId,
    cancel: &CancellationToken,
) -> Option<Result<(), ParloError>> {
    let (boundary_tx, mut boundary_rx) = mpsc::unbounded_channel();

    let schedule: Vec<usize> = match shared.synthesizer.word_timing() {
        WordTiming::BoundaryEvents => Vec::new(),
        WordTiming::Estimated { .. } => split_words(clean.as_str())
            .into_iter()
            .map(|w| w.start)
            .collect(),
    };
    let per_word = match shared.synthesizer.word_timing() {
        WordTiming::Estimated { per_word } => per_word,
        WordTiming::BoundaryEvents => Duration::ZERO,
    };
    let started = Instant::now();
    let mut next_word = 0usize;

    let highlight = |offset: usize| {
        if let Some(original) = clean.original_offset(offset) {
            shared.set_highlight(HighlightState::word(owner.clone(), original));
            shared.emit(PlaybackEvent::Word {
                owner: owner.clone(),
                char_offset: original,
            });
        }
    };

    let play = shared.sink.play(audio, boundary_tx);
    tokio::pin!(play);

    loop {
        let deadline = started + per_word * next_word as u32;
        tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            Some(offset) = boundary_rx.recv() => highlight(offset),
            () = tokio::time::sleep_until(deadline), if next_word < schedule.len() => {
                highlight(schedule[next_word]);
                next_word += 1;
            }
            result = &mut play => return Some(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlo_test_utils::{MockSynthesizer, RecordingSink, SinkEvent};

    fn queue_with(
        synth: MockSynthesizer,
        sink: Arc<RecordingSink>,
        registry: ResourceRegistry,
    ) -> PlaybackQueue {
        PlaybackQueue::spawn(
            Arc::new(synth),
            sink,
            registry,
            PlaybackOptions {
                start_delay: Duration::from_millis(50),
                event_capacity: 64,
            },
        )
    }

    async fn wait_for(
        events: &mut broadcast::Receiver<PlaybackEvent>,
        pred: impl Fn(&PlaybackEvent) -> bool,
    ) -> Vec<PlaybackEvent> {
        let mut seen = Vec::new();
        loop {
            let event = events.recv().await.expect("event stream open");
            let done = pred(&event);
            seen.push(event);
            if done {
                return seen;
            }
        }
    }

    fn id(s: &str) -> MessageId {
        MessageId(s.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn items_play_strictly_in_order() {
        let sink = Arc::new(RecordingSink::new(Duration::from_millis(100)));
        let queue = queue_with(MockSynthesizer::native(), Arc::clone(&sink), ResourceRegistry::new());
        let mut events = queue.subscribe();

        assert!(queue.enqueue("primero uno dos", id("a")));
        assert!(queue.enqueue("segundo", id("b")));
        wait_for(&mut events, |e| matches!(e, PlaybackEvent::Finished { owner } if owner.as_str() == "b")).await;

        assert_eq!(
            sink.events(),
            vec![
                SinkEvent::Started("primero uno dos".into()),
                SinkEvent::Finished("primero uno dos".into()),
                SinkEvent::Started("segundo".into()),
                SinkEvent::Finished("segundo".into()),
            ]
        );
        assert!(queue.highlight().is_cleared());
    }

    #[tokio::test(start_paused = true)]
    async fn boundary_offsets_map_to_original_text() {
        let sink = Arc::new(RecordingSink::new(Duration::from_millis(100)));
        let queue = queue_with(MockSynthesizer::native(), sink, ResourceRegistry::new());
        let mut events = queue.subscribe();

        queue.enqueue("😊 **Hola** mundo", id("m"));
        let seen = wait_for(&mut events, |e| matches!(e, PlaybackEvent::Finished { .. })).await;

        let offsets: Vec<usize> = seen
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Word { char_offset, .. } => Some(*char_offset),
                _ => None,
            })
            .collect();
        // Sanitized "Hola mundo": "Hola" at original 4, "mundo" at original 11.
        assert_eq!(offsets, vec![4, 11]);
    }

    #[tokio::test(start_paused = true)]
    async fn estimated_timing_emits_one_word_per_interval() {
        let sink = Arc::new(RecordingSink::new(Duration::from_millis(100)));
        let queue = queue_with(
            MockSynthesizer::clips(Duration::from_millis(100)),
            sink,
            ResourceRegistry::new(),
        );
        let mut events = queue.subscribe();

        queue.enqueue("uno dos tres", id("c"));
        let seen = wait_for(&mut events, |e| matches!(e, PlaybackEvent::Finished { .. })).await;

        let words = seen
            .iter()
            .filter(|e| matches!(e, PlaybackEvent::Word { .. }))
            .count();
        assert_eq!(words, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn mute_mid_playback_clears_queue_and_highlight() {
        let sink = Arc::new(RecordingSink::new(Duration::from_millis(500)));
        let registry = ResourceRegistry::new();
        let queue = queue_with(MockSynthesizer::native(), Arc::clone(&sink), registry.clone());
        let mut events = queue.subscribe();

        queue.enqueue("una frase bastante larga", id("a"));
        queue.enqueue("segunda", id("b"));
        queue.enqueue("tercera", id("c"));
        wait_for(&mut events, |e| matches!(e, PlaybackEvent::Word { .. })).await;
        assert!(!queue.highlight().is_cleared());

        queue.mute();
        assert!(queue.highlight().is_cleared());
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(
            sink.events(),
            vec![
                SinkEvent::Started("una frase bastante larga".into()),
                SinkEvent::Interrupted("una frase bastante larga".into()),
            ]
        );
        assert!(queue.highlight().is_cleared());
        assert_eq!(registry.live_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn muted_queue_drops_new_items_until_unmuted() {
        let sink = Arc::new(RecordingSink::new(Duration::from_millis(10)));
        let queue = queue_with(MockSynthesizer::native(), Arc::clone(&sink), ResourceRegistry::new());
        let mut events = queue.subscribe();

        queue.mute();
        assert!(queue.is_muted());
        assert!(!queue.enqueue("silencio", id("a")));

        queue.unmute();
        assert!(queue.enqueue("de nuevo", id("b")));
        wait_for(&mut events, |e| matches!(e, PlaybackEvent::Finished { .. })).await;

        assert_eq!(sink.started(), vec!["de nuevo".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn emoji_only_item_is_skipped() {
        let sink = Arc::new(RecordingSink::new(Duration::from_millis(10)));
        let synth = MockSynthesizer::native();
        let queue = queue_with(synth, Arc::clone(&sink), ResourceRegistry::new());
        let mut events = queue.subscribe();

        queue.enqueue("😂👍", id("e"));
        let seen = wait_for(&mut events, |e| matches!(e, PlaybackEvent::Skipped { .. })).await;

        assert_eq!(
            seen.last(),
            Some(&PlaybackEvent::Skipped {
                owner: id("e"),
                reason: SkipReason::EmptyText
            })
        );
        assert!(sink.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_synthesizer_skips_without_playing() {
        let sink = Arc::new(RecordingSink::new(Duration::from_millis(10)));
        let queue = queue_with(MockSynthesizer::unavailable(), Arc::clone(&sink), ResourceRegistry::new());
        let mut events = queue.subscribe();

        queue.enqueue("hola", id("u"));
        let seen = wait_for(&mut events, |e| matches!(e, PlaybackEvent::Skipped { .. })).await;

        assert!(matches!(
            seen.last(),
            Some(PlaybackEvent::Skipped {
                reason: SkipReason::Unavailable,
                ..
            })
        ));
        assert!(sink.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_advances_to_next_item() {
        let sink = Arc::new(RecordingSink::new(Duration::from_millis(10)).failing_on("roto"));
        let registry = ResourceRegistry::new();
        let queue = queue_with(MockSynthesizer::native(), Arc::clone(&sink), registry.clone());
        let mut events = queue.subscribe();

        queue.enqueue("audio roto", id("a"));
        queue.enqueue("audio sano", id("b"));
        let seen = wait_for(&mut events, |e| matches!(e, PlaybackEvent::Finished { .. })).await;

        assert!(
            seen.iter()
                .any(|e| matches!(e, PlaybackEvent::Failed { owner, .. } if owner.as_str() == "a"))
        );
        assert_eq!(sink.started(), vec!["audio roto".to_string(), "audio sano".to_string()]);
        assert_eq!(registry.live_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn synthesis_error_is_reported_as_failure() {
        let sink = Arc::new(RecordingSink::new(Duration::from_millis(10)));
        let queue = queue_with(
            MockSynthesizer::native().failing_on("malo"),
            Arc::clone(&sink),
            ResourceRegistry::new(),
        );
        let mut events = queue.subscribe();

        queue.enqueue("texto malo", id("x"));
        let seen = wait_for(&mut events, |e| matches!(e, PlaybackEvent::Failed { .. })).await;

        assert_eq!(seen.len(), 1);
        assert!(sink.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_worker() {
        let sink = Arc::new(RecordingSink::new(Duration::from_secs(1)));
        let queue = queue_with(MockSynthesizer::native(), Arc::clone(&sink), ResourceRegistry::new());

        queue.enqueue("uno dos tres cuatro", id("a"));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        queue.shutdown().await;

        assert!(!queue.enqueue("después", id("b")));
        assert!(matches!(sink.events().last(), Some(SinkEvent::Interrupted(_))));
    }
}
