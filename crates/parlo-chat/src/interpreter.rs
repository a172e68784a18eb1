// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a validated webhook reply into bot messages and a header emotion.
//!
//! Pure functions: the same reply always yields the same interpretation.

use parlo_core::{Emotion, ParloError};
use parlo_delivery::{ReplyItem, ServerReply};
use serde_json::Value;

/// One bot message to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    pub text: String,
    pub emotion: Emotion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub messages: Vec<BotReply>,
    /// Emotion shown in the header after this reply.
    pub header_emotion: Emotion,
}

fn emotion_of(item: &ReplyItem) -> Emotion {
    item.emotion
        .as_deref()
        .map(Emotion::from_tag)
        .unwrap_or_default()
}

/// Interprets a validated reply.
///
/// A single object always yields exactly one message. In a sequence, elements
/// without a non-empty `message` are dropped and the header takes the first
/// element's emotion.
pub fn interpret(reply: &ServerReply) -> Interpretation {
    match reply {
        ServerReply::Single(item) => {
            let emotion = emotion_of(item);
            Interpretation {
                messages: vec![BotReply {
                    text: item.message.clone().unwrap_or_default(),
                    emotion,
                }],
                header_emotion: emotion,
            }
        }
        ServerReply::Sequence(items) => {
            let messages = items
                .iter()
                .filter(|item| item.has_text())
                .map(|item| BotReply {
                    text: item.message.clone().unwrap_or_default(),
                    emotion: emotion_of(item),
                })
                .collect();
            let header_emotion = items.first().map(emotion_of).unwrap_or_default();
            Interpretation {
                messages,
                header_emotion,
            }
        }
    }
}

/// Validates and interprets a raw JSON reply.
pub fn interpret_value(value: &Value) -> Result<Interpretation, ParloError> {
    Ok(interpret(&ServerReply::from_value(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn single_object_yields_one_message() {
        let out = interpret_value(&json!({"message": "¡Hola!", "emoji": "😊"})).unwrap();
        assert_eq!(
            out.messages,
            vec![BotReply {
                text: "¡Hola!".into(),
                emotion: Emotion::Happy
            }]
        );
        assert_eq!(out.header_emotion, Emotion::Happy);
    }

    #[test]
    fn sequence_drops_elements_without_message() {
        let out = interpret_value(&json!([
            {"message": "Pensando...", "emoji": "🤔"},
            {"emoji": "😊"},
            {"message": ""},
            42,
            {"message": "Listo", "emotion": "approving"}
        ]))
        .unwrap();

        let texts: Vec<_> = out.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Pensando...", "Listo"]);
        assert_eq!(out.messages[1].emotion, Emotion::Approving);
        assert_eq!(out.header_emotion, Emotion::Thinking);
    }

    #[test]
    fn header_uses_first_element_even_when_dropped() {
        let out = interpret_value(&json!([
            {"emoji": "😢"},
            {"message": "ok", "emoji": "👍"}
        ]))
        .unwrap();
        assert_eq!(out.header_emotion, Emotion::Sad);
        assert_eq!(out.messages.len(), 1);
    }

    #[test]
    fn interpreting_a_validated_reply_cannot_fail() {
        let reply = ServerReply::Sequence(vec![
            ReplyItem::new("", Some("😮")),
            ReplyItem::new("¡Vaya!", None),
        ]);
        let out = interpret(&reply);
        assert_eq!(out.header_emotion, Emotion::Surprised);
        assert_eq!(out.messages.len(), 1);
        assert_eq!(out.messages[0].text, "¡Vaya!");
        assert_eq!(out, interpret(&reply));
    }

    #[test]
    fn missing_tag_defaults_to_neutral() {
        let out = interpret_value(&json!([{"message": "hola"}])).unwrap();
        assert_eq!(out.header_emotion, Emotion::Neutral);
        assert_eq!(out.messages[0].emotion, Emotion::Neutral);
    }

    #[test]
    fn unusable_replies_are_format_errors() {
        for value in [
            json!([]),
            json!("texto"),
            json!(7),
            json!(null),
            json!({"text": "sin message"}),
            json!([{"message": ""}]),
            json!([1, 2, 3]),
        ] {
            let err = interpret_value(&value).unwrap_err();
            assert!(err.is_format(), "{value} should be a format error, got {err}");
        }
    }

    fn arb_item() -> impl Strategy<Value = Value> {
        prop_oneof![
            ("[a-zé ]{0,12}", proptest::option::of("😂|😊|😢|🤔|👍|❤️|😮|sad|zzz"))
                .prop_map(|(m, e)| json!({"message": m, "emoji": e})),
            proptest::option::of("😂|😊").prop_map(|e| json!({"emoji": e})),
            any::<i32>().prop_map(|n| json!(n)),
        ]
    }

    proptest! {
        #[test]
        fn interpretation_is_idempotent(items in proptest::collection::vec(arb_item(), 0..6)) {
            let value = Value::Array(items);
            let first = interpret_value(&value);
            let second = interpret_value(&value);
            match (first, second) {
                (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
                _ => prop_assert!(false, "outcomes differ"),
            }
        }

        #[test]
        fn every_kept_message_is_non_empty(items in proptest::collection::vec(arb_item(), 1..6)) {
            if let Ok(out) = interpret_value(&Value::Array(items)) {
                prop_assert!(!out.messages.is_empty());
                prop_assert!(out.messages.iter().all(|m| !m.text.is_empty()));
            }
        }
    }
}
