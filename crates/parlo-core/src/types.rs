// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the delivery, speech, and chat crates.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a chat message.
///
/// Generated as `<unix-millis>-<random suffix>`, which keeps ids roughly
/// ordered by creation time within one process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generates a fresh id from the current time plus 8 random alphanumerics.
    pub fn generate() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        Self(format!("{}-{suffix}", Utc::now().timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Transport,
    Synthesizer,
    AudioSink,
}

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// Delivery status of a user message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sending,
    Delivered,
    Error,
}

impl DeliveryStatus {
    /// Whether moving from `self` to `next` is a forward transition.
    pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
        matches!(
            (self, next),
            (DeliveryStatus::Sending, DeliveryStatus::Delivered)
                | (DeliveryStatus::Sending, DeliveryStatus::Error)
        )
    }
}

/// Why a delivery ended without a usable reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum DeliveryFailure {
    /// Every allowed attempt failed with a transient error.
    Exhausted { attempts: u32 },
    /// The reply body did not match the expected shape.
    InvalidFormat,
    /// The endpoint refused the request with a non-retryable status.
    Rejected { status: u16 },
    /// The caller cancelled the delivery.
    Cancelled,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryFailure::Exhausted { attempts } => {
                write!(f, "exhausted after {attempts} attempts")
            }
            DeliveryFailure::InvalidFormat => write!(f, "invalid format"),
            DeliveryFailure::Rejected { status } => write!(f, "rejected with status {status}"),
            DeliveryFailure::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Emotion tag selecting the header art shown above the conversation.
///
/// The webhook sends either the emoji itself or the emotion name.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    #[default]
    Neutral,
    Processing,
    Laughing,
    Happy,
    Sad,
    Thinking,
    Approving,
    Loving,
    Surprised,
    Disappointed,
}

const NOTO_EMOJI_BASE: &str = "https://fonts.gstatic.com/s/e/notoemoji/latest";

impl Emotion {
    pub const ALL: [Emotion; 10] = [
        Emotion::Neutral,
        Emotion::Processing,
        Emotion::Laughing,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Thinking,
        Emotion::Approving,
        Emotion::Loving,
        Emotion::Surprised,
        Emotion::Disappointed,
    ];

    /// Maps a webhook tag (emoji or name) onto the vocabulary.
    ///
    /// Unknown and empty tags become [`Emotion::Neutral`].
    pub fn from_tag(tag: &str) -> Self {
        let cleaned: String = tag
            .trim()
            .chars()
            .filter(|c| *c != '\u{FE0F}')
            .collect();
        if cleaned.is_empty() {
            return Emotion::Neutral;
        }
        if let Some(found) = Emotion::ALL
            .iter()
            .copied()
            .filter(|e| !matches!(e, Emotion::Neutral | Emotion::Processing))
            .find(|e| e.emoji().trim_end_matches('\u{FE0F}') == cleaned)
        {
            return found;
        }
        if cleaned.eq_ignore_ascii_case("default") {
            return Emotion::Neutral;
        }
        Emotion::from_str(&cleaned).unwrap_or_default()
    }

    /// The emoji representing this emotion in text output.
    pub fn emoji(self) -> &'static str {
        match self {
            Emotion::Neutral => "🙂",
            Emotion::Processing => "🤖",
            Emotion::Laughing => "😂",
            Emotion::Happy => "😊",
            Emotion::Sad => "😢",
            Emotion::Thinking => "🤔",
            Emotion::Approving => "👍",
            Emotion::Loving => "❤\u{FE0F}",
            Emotion::Surprised => "😮",
            Emotion::Disappointed => "😞",
        }
    }

    /// URL of the animated header image for this emotion.
    pub fn gif_url(self) -> String {
        let code = match self {
            Emotion::Neutral | Emotion::Happy => "1f60a",
            Emotion::Processing => "1f916",
            Emotion::Laughing => "1f602",
            Emotion::Sad => "1f622",
            Emotion::Thinking => "1f914",
            Emotion::Approving => "1f44d",
            Emotion::Loving => "2764_fe0f",
            Emotion::Surprised => "1f62e",
            Emotion::Disappointed => "1f61e",
        };
        format!("{NOTO_EMOJI_BASE}/{code}/512.gif")
    }
}

/// Metadata of a file attached to a user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    /// URL of the local preview resource.
    pub display_url: String,
}

/// One chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub timestamp: DateTime<Utc>,
    /// Present on user messages only.
    pub status: Option<DeliveryStatus>,
    /// Present on bot messages only.
    pub emotion: Option<Emotion>,
}

impl Message {
    /// A new user message in the `sending` state.
    pub fn user(text: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            id: MessageId::generate(),
            sender: Sender::User,
            text: text.into(),
            attachments,
            timestamp: Utc::now(),
            status: Some(DeliveryStatus::Sending),
            emotion: None,
        }
    }

    /// A new bot message carrying an emotion tag.
    pub fn bot(text: impl Into<String>, emotion: Emotion) -> Self {
        Self {
            id: MessageId::generate(),
            sender: Sender::Bot,
            text: text.into(),
            attachments: Vec::new(),
            timestamp: Utc::now(),
            status: None,
            emotion: Some(emotion),
        }
    }

    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }
}

/// Which word of which bot message is currently being spoken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightState {
    pub message_id: Option<MessageId>,
    /// Character offset into the original message text.
    pub char_offset: Option<usize>,
}

impl HighlightState {
    /// No message highlighted.
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn word(message_id: MessageId, char_offset: usize) -> Self {
        Self {
            message_id: Some(message_id),
            char_offset: Some(char_offset),
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.message_id.is_none()
    }
}

/// Language and voice used for synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSelector {
    pub language_code: String,
    pub voice_name: Option<String>,
}

impl Default for VoiceSelector {
    fn default() -> Self {
        Self {
            language_code: "es-ES".to_string(),
            voice_name: None,
        }
    }
}
