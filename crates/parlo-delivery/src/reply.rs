// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook reply validation.
//!
//! A valid reply is either an object with a string `message`, or a non-empty
//! array in which at least one element has a non-empty string `message`.
//! Elements without one are kept as empty items so the interpreter can drop
//! them.
//! The emotion tag may arrive as `emoji` or `emotion`.

use parlo_core::ParloError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One element of a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyItem {
    pub message: Option<String>,
    pub emotion: Option<String>,
}

impl ReplyItem {
    pub fn new(message: impl Into<String>, emotion: Option<&str>) -> Self {
        Self {
            message: Some(message.into()),
            emotion: emotion.map(str::to_string),
        }
    }

    /// True when the item carries a non-empty message.
    pub fn has_text(&self) -> bool {
        self.message.as_deref().is_some_and(|m| !m.is_empty())
    }

    fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self {
                message: None,
                emotion: None,
            };
        };
        let message = object
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        let emotion = object
            .get("emoji")
            .or_else(|| object.get("emotion"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Self { message, emotion }
    }
}

/// Result of classifying a parsed reply body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyShape {
    Single(ReplyItem),
    Sequence(Vec<ReplyItem>),
    Invalid(String),
}

/// A reply that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerReply {
    Single(ReplyItem),
    Sequence(Vec<ReplyItem>),
}

impl ServerReply {
    /// Validates an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self, ParloError> {
        match classify(value) {
            ReplyShape::Single(item) => Ok(ServerReply::Single(item)),
            ReplyShape::Sequence(items) => Ok(ServerReply::Sequence(items)),
            ReplyShape::Invalid(reason) => Err(ParloError::Format(reason)),
        }
    }

    /// Items in reply order.
    pub fn items(&self) -> &[ReplyItem] {
        match self {
            ServerReply::Single(item) => std::slice::from_ref(item),
            ServerReply::Sequence(items) => items,
        }
    }
}

/// Classifies a parsed body into the reply shapes.
pub fn classify(value: &Value) -> ReplyShape {
    match value {
        Value::Object(_) => {
            let item = ReplyItem::from_value(value);
            if item.message.is_some() {
                ReplyShape::Single(item)
            } else {
                ReplyShape::Invalid("reply object has no string `message` field".into())
            }
        }
        Value::Array(elements) if elements.is_empty() => {
            ReplyShape::Invalid("reply array is empty".into())
        }
        Value::Array(elements) => {
            let items: Vec<ReplyItem> = elements.iter().map(ReplyItem::from_value).collect();
            if items.iter().any(ReplyItem::has_text) {
                ReplyShape::Sequence(items)
            } else {
                ReplyShape::Invalid("no reply element has a non-empty `message` field".into())
            }
        }
        other => ReplyShape::Invalid(format!("expected object or array, got {}", kind(other))),
    }
}

/// Parses and validates a raw reply body.
pub fn parse_reply(body: &str) -> Result<ServerReply, ParloError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ParloError::Format(format!("reply is not valid JSON: {e}")))?;
    ServerReply::from_value(&value)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
