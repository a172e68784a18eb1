// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat orchestration for Parlo.
//!
//! - [`ConversationStore`]: ordered message list with forward-only statuses.
//! - [`interpret`]: webhook reply to bot messages plus header emotion.
//! - [`HeaderDisplay`]: header emotion with timed revert, typing indicator.
//! - [`PreferenceStore`]: persisted mute flag.
//! - [`ChatSession`]: the pipeline from submission to spoken reply.

pub mod attachments;
pub mod conversation;
pub mod header;
pub mod interpreter;
pub mod preferences;
pub mod session;

pub use attachments::{PendingAttachments, StagedFile};
pub use conversation::{ConversationEvent, ConversationStore};
pub use header::{HeaderDisplay, HeaderState};
pub use interpreter::{BotReply, Interpretation, interpret, interpret_value};
pub use preferences::{FilePreferenceStore, MUTED_KEY, MemoryPreferenceStore, PreferenceStore};
pub use session::{AdapterReport, ChatSession, DeliveryOutcome, FALLBACK_REPLY, SessionParts};
