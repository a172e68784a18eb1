// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat session: wires delivery, interpretation, conversation state, header
//! display, and speech playback together.
//!
//! Each submission runs as its own tracked task. Replies are appended in
//! completion order. `shutdown` cancels in-flight deliveries, stops speech,
//! and releases every retained resource.

use std::sync::Arc;

use parlo_config::ParloConfig;
use parlo_config::model::EndpointMode;
use parlo_core::traits::{AudioSink, SpeechSynthesizer, WebhookTransport};
use parlo_core::{
    AdapterType, DeliveryFailure, DeliveryStatus, Emotion, HealthStatus, Message, MessageId,
    ParloError, PluginAdapter, ResourceHandle, ResourceRegistry,
};
use parlo_delivery::{DeliveryClient, FileUpload, OutboundPayload};
use parlo_resilience::HealthTracker;
use parlo_speech::{PlaybackOptions, PlaybackQueue};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::attachments::{PendingAttachments, StagedFile};
use crate::conversation::ConversationStore;
use crate::header::HeaderDisplay;
use crate::interpreter::interpret;
use crate::preferences::{MUTED_KEY, PreferenceStore};

/// Bot message appended when a delivery fails.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't get a reply right now. Please try again.";

/// External collaborators a session needs.
pub struct SessionParts {
    pub transport: Arc<dyn WebhookTransport>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub sink: Arc<dyn AudioSink>,
    pub preferences: Arc<dyn PreferenceStore>,
}

/// Health of one external collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterReport {
    pub name: String,
    pub adapter_type: AdapterType,
    pub status: HealthStatus,
}

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Reply received; ids of the appended bot messages in order.
    Delivered { replies: Vec<MessageId> },
    /// Delivery failed; the fallback bot message was appended.
    Failed {
        reason: DeliveryFailure,
        fallback: MessageId,
    },
    /// Cancelled before a reply arrived. Nothing was appended.
    Cancelled,
}

pub struct ChatSession {
    transport: Arc<dyn WebhookTransport>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
    conversation: ConversationStore,
    header: Arc<HeaderDisplay>,
    playback: PlaybackQueue,
    delivery: DeliveryClient,
    registry: ResourceRegistry,
    preferences: Arc<dyn PreferenceStore>,
    tracker: TaskTracker,
    cancel: CancellationToken,
    /// Previews of messages whose delivery failed, kept until teardown.
    retained: Mutex<Vec<ResourceHandle>>,
}

impl ChatSession {
    /// Builds a session and restores the persisted mute preference.
    pub async fn start(config: &ParloConfig, parts: SessionParts) -> Result<Arc<Self>, ParloError> {
        let registry = ResourceRegistry::new();
        let health = HealthTracker::from_config(&config.health).shared();
        let delivery = DeliveryClient::new(
            Arc::clone(&parts.transport),
            config.endpoints.clone(),
            &config.delivery,
            health,
        );
        let playback = PlaybackQueue::spawn(
            Arc::clone(&parts.synthesizer),
            Arc::clone(&parts.sink),
            registry.clone(),
            PlaybackOptions::from_config(&config.speech),
        );

        let muted = match parts.preferences.get_bool(MUTED_KEY).await {
            Ok(value) => value.unwrap_or(false),
            Err(e) => {
                warn!(error = %e, "could not read mute preference, assuming unmuted");
                false
            }
        };
        if muted {
            playback.mute();
        }

        info!(
            endpoint = %delivery.current_url(),
            muted,
            "chat session started"
        );

        Ok(Arc::new(Self {
            transport: parts.transport,
            synthesizer: parts.synthesizer,
            sink: parts.sink,
            conversation: ConversationStore::new(),
            header: Arc::new(HeaderDisplay::from_config(&config.header)),
            playback,
            delivery,
            registry,
            preferences: parts.preferences,
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
            retained: Mutex::new(Vec::new()),
        }))
    }

    pub fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }

    pub fn header(&self) -> &HeaderDisplay {
        &self.header
    }

    pub fn playback(&self) -> &PlaybackQueue {
        &self.playback
    }

    pub fn delivery(&self) -> &DeliveryClient {
        &self.delivery
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// An empty attachment set whose previews are tracked by this session.
    pub fn new_attachments(&self) -> PendingAttachments {
        PendingAttachments::new(self.registry.clone())
    }

    /// Submits a message and returns immediately with its id. The reply (or
    /// fallback) is appended by a background task.
    pub async fn submit(
        self: &Arc<Self>,
        text: &str,
        attachments: Vec<StagedFile>,
    ) -> Result<MessageId, ParloError> {
        let (id, payload, previews) = self.begin(text, attachments).await?;
        let this = Arc::clone(self);
        let task_id = id.clone();
        self.tracker.spawn(async move {
            if let Err(e) = this.deliver(task_id, payload, previews).await {
                warn!(error = %e, "delivery task failed");
            }
        });
        Ok(id)
    }

    /// Submits a message and waits for the outcome.
    pub async fn send(
        &self,
        text: &str,
        attachments: Vec<StagedFile>,
    ) -> Result<DeliveryOutcome, ParloError> {
        let (id, payload, previews) = self.begin(text, attachments).await?;
        self.deliver(id, payload, previews).await
    }

    /// Appends the `sending` user message and flips the header to processing.
    async fn begin(
        &self,
        text: &str,
        attachments: Vec<StagedFile>,
    ) -> Result<(MessageId, OutboundPayload, Vec<ResourceHandle>), ParloError> {
        let text = text.trim();
        if text.is_empty() && attachments.is_empty() {
            return Err(ParloError::InvalidInput(
                "message text is empty and nothing is attached".into(),
            ));
        }
        if self.cancel.is_cancelled() {
            return Err(ParloError::InvalidInput("session is shut down".into()));
        }

        let metadata = attachments.iter().map(StagedFile::attachment).collect();
        let (uploads, previews): (Vec<FileUpload>, Vec<ResourceHandle>) = attachments
            .into_iter()
            .map(|staged| (staged.upload, staged.preview))
            .unzip();

        let message = Message::user(text, metadata);
        let id = message.id.clone();
        self.conversation.append(message).await;
        self.header.processing();

        Ok((id, OutboundPayload::new(text, &uploads), previews))
    }

    async fn deliver(
        &self,
        id: MessageId,
        payload: OutboundPayload,
        previews: Vec<ResourceHandle>,
    ) -> Result<DeliveryOutcome, ParloError> {
        let token = self.cancel.child_token();
        let result = self.delivery.send(&payload, &token).await;
        self.header.delivery_finished();

        let interpreted = result.map(|reply| interpret(&reply));
        match interpreted {
            Ok(interpretation) => {
                self.conversation
                    .set_status(&id, DeliveryStatus::Delivered)
                    .await?;
                drop(previews);

                let mut replies = Vec::with_capacity(interpretation.messages.len());
                for reply in interpretation.messages {
                    let message = Message::bot(reply.text, reply.emotion);
                    let bot_id = message.id.clone();
                    let text = message.text.clone();
                    self.conversation.append(message).await;
                    if !self.playback.is_muted() {
                        self.playback.enqueue(text, bot_id.clone());
                    }
                    replies.push(bot_id);
                }
                self.header.show(interpretation.header_emotion);
                debug!(message_id = %id, replies = replies.len(), "delivery complete");
                Ok(DeliveryOutcome::Delivered { replies })
            }
            Err(e) if e.is_cancelled() => {
                self.conversation
                    .set_status(&id, DeliveryStatus::Error)
                    .await?;
                drop(previews);
                debug!(message_id = %id, "delivery cancelled");
                Ok(DeliveryOutcome::Cancelled)
            }
            Err(e) => {
                warn!(message_id = %id, error = %e, "delivery failed");
                self.conversation
                    .set_status(&id, DeliveryStatus::Error)
                    .await?;
                self.retained.lock().await.extend(previews);

                let fallback = Message::bot(FALLBACK_REPLY, Emotion::Disappointed);
                let fallback_id = fallback.id.clone();
                self.conversation.append(fallback).await;
                self.header.show(Emotion::Disappointed);
                Ok(DeliveryOutcome::Failed {
                    reason: failure_reason(&e),
                    fallback: fallback_id,
                })
            }
        }
    }

    /// Flips the mute state and persists it. Returns the new state.
    pub async fn toggle_mute(&self) -> Result<bool, ParloError> {
        let muted = !self.playback.is_muted();
        self.set_muted(muted).await?;
        Ok(muted)
    }

    pub async fn set_muted(&self, muted: bool) -> Result<(), ParloError> {
        if muted {
            self.playback.mute();
        } else {
            self.playback.unmute();
        }
        self.preferences.set_bool(MUTED_KEY, muted).await
    }

    pub fn is_muted(&self) -> bool {
        self.playback.is_muted()
    }

    pub fn set_endpoint_mode(&self, mode: EndpointMode) {
        self.delivery.set_mode(mode);
    }

    /// Runs every adapter's health check. A failing check is reported as
    /// unhealthy rather than returned.
    pub async fn health_report(&self) -> Vec<AdapterReport> {
        vec![
            check(self.transport.as_ref()).await,
            check(self.synthesizer.as_ref()).await,
            check(self.sink.as_ref()).await,
        ]
    }

    /// Cancels in-flight deliveries, stops playback, and releases resources.
    pub async fn shutdown(&self) {
        info!("chat session shutting down");
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        self.playback.shutdown().await;
        self.header.shutdown().await;
        self.retained.lock().await.clear();
        stop(self.transport.as_ref()).await;
        stop(self.synthesizer.as_ref()).await;
        stop(self.sink.as_ref()).await;
        debug!(live = self.registry.live_count(), "session resources released");
    }
}

async fn check<A: PluginAdapter + ?Sized>(adapter: &A) -> AdapterReport {
    let status = adapter
        .health_check()
        .await
        .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
    AdapterReport {
        name: adapter.name().to_string(),
        adapter_type: adapter.adapter_type(),
        status,
    }
}

async fn stop<A: PluginAdapter + ?Sized>(adapter: &A) {
    if let Err(e) = adapter.shutdown().await {
        warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
    }
}

fn failure_reason(error: &ParloError) -> DeliveryFailure {
    match error {
        ParloError::Delivery { reason, .. } => *reason,
        e if e.is_format() => DeliveryFailure::InvalidFormat,
        _ => DeliveryFailure::Exhausted { attempts: 0 },
    }
}
