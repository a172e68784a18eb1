// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline bot endpoint.
//!
//! Answers from a small table of canned Spanish replies, picked by keywords
//! in the user's message, so the client can be used without a live webhook.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::json;

use parlo_core::ParloError;
use parlo_core::traits::{PluginAdapter, TransportResponse, WebhookTransport};
use parlo_core::types::AdapterType;
use tracing::debug;

const REPLIES: [(&str, &str); 8] = [
    ("¡Ja ja ja! Eso fue muy gracioso.\nMe encanta tu sentido del humor. 😂", "😂"),
    ("Entiendo perfectamente lo que dices.\n¿En qué más puedo ayudarte hoy? 😊", "😊"),
    ("Lamento mucho escuchar eso.\nSi necesitas hablar o ayuda, estoy aquí para ti. 😢", "😢"),
    ("Vaya, esa es una pregunta muy interesante.\nDéjame pensarlo un momento... 🤔", "🤔"),
    ("¡Totalmente de acuerdo contigo!\nEsa es una excelente perspectiva. 👍", "👍"),
    ("¡Eso es maravilloso!\nMe alegra mucho escucharlo. ❤️", "❤️"),
    ("¡Vaya!\nNo me esperaba esa respuesta. 😮", "😮"),
    ("Gracias por compartir eso conmigo.\n¿Hay algo más en lo que pueda ayudarte hoy? 😊", "😊"),
];

/// Keyword groups, checked in order. The first group with a match wins.
const KEYWORDS: [(&[&str], usize); 7] = [
    (&["jaja", "risa", "divertido", "😂"], 0),
    (&["triste", "mal", "tristeza", "deprimido", "😢"], 2),
    (&["?", "por qué", "cómo", "cuándo", "🤔"], 3),
    (&["gracias", "agradecimiento", "agradezco", "❤️"], 5),
    (&["sorpresa", "increíble", "wow", "😮"], 6),
    (&["hola", "buenos días", "buenas tardes", "😊"], 1),
    (&["ok", "vale", "entiendo", "👍"], 4),
];

/// Returns the index of the keyword-matched reply, if any.
pub fn match_reply(message: &str) -> Option<usize> {
    let lowered = message.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| lowered.contains(w)))
        .map(|(_, index)| *index)
}

/// Reply delay used by the CLI's offline mode.
pub const DEFAULT_SIMULATED_LATENCY: Duration = Duration::from_millis(500);

/// Webhook stand-in returning `{"message", "emoji"}` objects.
#[derive(Debug, Clone, Default)]
pub struct SimulatedWebhook {
    latency: Duration,
}

impl SimulatedWebhook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply by `latency`.
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }

    fn reply_for(&self, message: &str) -> serde_json::Value {
        let index =
            match_reply(message).unwrap_or_else(|| rand::thread_rng().gen_range(0..REPLIES.len()));
        let (text, emoji) = REPLIES[index];
        json!({ "message": text, "emoji": emoji })
    }
}

#[async_trait]
impl PluginAdapter for SimulatedWebhook {
    fn name(&self) -> &str {
        "simulated-webhook"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }
}

#[async_trait]
impl WebhookTransport for SimulatedWebhook {
    async fn post_json(
        &self,
        _url: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, ParloError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        debug!(latency_ms = self.latency.as_millis() as u64, "simulated webhook reply");
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or_default();
        Ok(TransportResponse::ok(self.reply_for(message).to_string()))
    }
}
