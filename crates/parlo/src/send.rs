// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parlo send` command implementation.

use std::path::PathBuf;

use colored::Colorize;
use parlo_chat::{ChatSession, DeliveryOutcome};
use parlo_config::model::ParloConfig;
use parlo_core::{DeliveryFailure, Message, ParloError};

use crate::{EndpointArgs, build_session};

/// Sends a single message, prints the reply, and exits.
pub async fn run_send(
    config: ParloConfig,
    endpoint: EndpointArgs,
    text: &str,
    files: &[PathBuf],
) -> Result<(), ParloError> {
    let session = build_session(&config, endpoint).await?;

    let mut pending = session.new_attachments();
    for path in files {
        pending.add_path(path).await?;
    }

    let outcome = session.send(text, pending.take()).await;
    let printed = match outcome {
        Ok(outcome) => print_outcome(&session, &outcome).await,
        Err(e) => Err(e),
    };
    session.shutdown().await;
    printed
}

async fn print_outcome(session: &ChatSession, outcome: &DeliveryOutcome) -> Result<(), ParloError> {
    match outcome {
        DeliveryOutcome::Delivered { replies } => {
            for id in replies {
                if let Some(message) = session.conversation().get(id).await {
                    println!("{}", render_bot(&message));
                }
            }
            Ok(())
        }
        DeliveryOutcome::Failed { reason, fallback } => {
            if let Some(message) = session.conversation().get(fallback).await {
                println!("{}", render_bot(&message).yellow());
            }
            Err(ParloError::Delivery {
                reason: *reason,
                message: describe_failure(reason),
            })
        }
        DeliveryOutcome::Cancelled => Err(ParloError::cancelled()),
    }
}

/// One bot message as printed in the terminal.
pub(crate) fn render_bot(message: &Message) -> String {
    let emoji = message.emotion.unwrap_or_default().emoji();
    format!("{emoji} {}", message.text)
}

pub(crate) fn describe_failure(reason: &DeliveryFailure) -> String {
    match reason {
        DeliveryFailure::Exhausted { attempts } => {
            format!("no reply after {attempts} attempts")
        }
        DeliveryFailure::InvalidFormat => "the server reply was not understood".to_string(),
        DeliveryFailure::Rejected { status } => format!("the server rejected the message ({status})"),
        DeliveryFailure::Cancelled => "delivery cancelled".to_string(),
    }
}
