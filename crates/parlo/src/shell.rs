// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parlo chat` command implementation.
//!
//! Launches an interactive REPL with readline history. Messages are submitted
//! in the background, so replies print as they arrive and the prompt never
//! waits on the webhook. Spoken words are echoed dimmed while speech is on.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use parlo_chat::{ChatSession, ConversationEvent, PendingAttachments};
use parlo_config::EndpointMode;
use parlo_config::model::ParloConfig;
use parlo_core::{DeliveryStatus, HealthStatus, MessageId, ParloError};
use parlo_speech::PlaybackEvent;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::{EndpointArgs, build_session};
use crate::send::render_bot;

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Attach(&'a str),
    Detach(usize),
    Files,
    Mute,
    Unmute,
    Mode(EndpointMode),
    Status,
    Help,
    Unknown(&'a str),
    Message(&'a str),
}

fn parse_input(line: &str) -> Option<Input<'_>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return Some(Input::Message(trimmed));
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    Some(match name {
        "quit" | "exit" => Input::Quit,
        "attach" if !arg.is_empty() => Input::Attach(arg),
        "detach" => match arg.parse::<usize>() {
            Ok(n) if n > 0 => Input::Detach(n - 1),
            _ => Input::Unknown(trimmed),
        },
        "files" => Input::Files,
        "mute" => Input::Mute,
        "unmute" => Input::Unmute,
        "test" => Input::Mode(EndpointMode::Test),
        "prod" => Input::Mode(EndpointMode::Production),
        "status" => Input::Status,
        "help" => Input::Help,
        _ => Input::Unknown(trimmed),
    })
}

/// Runs the `parlo chat` interactive REPL.
pub async fn run_shell(config: ParloConfig, endpoint: EndpointArgs) -> Result<(), ParloError> {
    let session = build_session(&config, endpoint).await?;
    let printer = tokio::spawn(print_events(Arc::clone(&session)));

    let mut rl = DefaultEditor::new()
        .map_err(|e| ParloError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "parlo chat".bold().green());
    println!(
        "endpoint: {}  speech: {}",
        session.delivery().current_url().cyan(),
        if session.is_muted() { "muted".yellow() } else { "on".green() }
    );
    println!("Type {} for commands, {} to exit.\n", "/help".yellow(), "/quit".yellow());

    let mut pending = session.new_attachments();
    let prompt = format!("{}> ", "parlo".green());
    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            // Ctrl+C / Ctrl+D
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };
        let Some(input) = parse_input(&line) else {
            continue;
        };
        let _ = rl.add_history_entry(line.as_str());

        if input == Input::Quit {
            break;
        }
        if let Err(e) = handle_input(&session, &mut pending, input).await {
            eprintln!("{}: {e}", "error".red());
        }
    }

    session.shutdown().await;
    printer.abort();
    println!("{}", "goodbye".dimmed());
    Ok(())
}

async fn handle_input(
    session: &Arc<ChatSession>,
    pending: &mut PendingAttachments,
    input: Input<'_>,
) -> Result<(), ParloError> {
    match input {
        Input::Message(text) => {
            session.submit(text, pending.take()).await?;
        }
        Input::Attach(path) => {
            let attachment = pending.add_path(Path::new(path)).await?;
            println!(
                "{}",
                format!("attached {} ({})", attachment.filename, attachment.mime_type).dimmed()
            );
        }
        Input::Detach(index) => {
            let upload = pending.remove(index)?;
            println!("{}", format!("removed {}", upload.filename).dimmed());
        }
        Input::Files => {
            if pending.is_empty() {
                println!("{}", "no files attached".dimmed());
            }
            for (i, attachment) in pending.attachments().iter().enumerate() {
                println!("  {}. {} ({})", i + 1, attachment.filename, attachment.mime_type);
            }
        }
        Input::Mute => {
            session.set_muted(true).await?;
            println!("{}", "speech muted".dimmed());
        }
        Input::Unmute => {
            session.set_muted(false).await?;
            println!("{}", "speech on".dimmed());
        }
        Input::Mode(mode) => {
            session.set_endpoint_mode(mode);
            println!("{}", format!("endpoint: {}", session.delivery().current_url()).dimmed());
        }
        Input::Status => print_status(session).await,
        Input::Help => print_help(),
        Input::Unknown(text) => {
            println!("{} {text}; try /help", "unknown command:".yellow());
        }
        Input::Quit => {}
    }
    Ok(())
}

fn print_help() {
    println!("  /attach <path>   stage a file for the next message");
    println!("  /detach <n>      unstage file number n");
    println!("  /files           list staged files");
    println!("  /mute, /unmute   turn speech off or on");
    println!("  /test, /prod     switch webhook endpoint");
    println!("  /status          server and adapter health");
    println!("  /quit            exit");
}

async fn print_status(session: &ChatSession) {
    let (healthy, failures) = {
        let health = session.delivery().health().lock().await;
        (health.is_healthy(), health.consecutive_failures())
    };
    let server = if healthy { "healthy".green() } else { "unhealthy".red() };
    println!("  server    {server} ({failures} consecutive failures)");
    println!("  endpoint  {}", session.delivery().current_url());
    for report in session.health_report().await {
        let status = match &report.status {
            HealthStatus::Healthy => "healthy".green(),
            HealthStatus::Degraded(why) => format!("degraded: {why}").yellow(),
            HealthStatus::Unhealthy(why) => format!("unhealthy: {why}").red(),
        };
        println!("  {:<9} {} {status}", report.adapter_type.to_string(), report.name);
    }
}

/// Prints bot replies, delivery failures, and spoken words as they happen.
async fn print_events(session: Arc<ChatSession>) {
    let mut conversation = session.conversation().subscribe();
    let mut playback = session.playback().subscribe();
    // Text of messages currently being spoken, by owner.
    let mut speaking: HashMap<MessageId, String> = HashMap::new();

    loop {
        tokio::select! {
            event = conversation.recv() => match event {
                Ok(ConversationEvent::Appended(message)) if message.is_bot() => {
                    println!("\n{}", render_bot(&message));
                }
                Ok(ConversationEvent::StatusChanged { status: DeliveryStatus::Error, .. }) => {
                    println!("{}", "(message not delivered)".red().dimmed());
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => debug!(skipped = n, "conversation printer lagged"),
                Err(RecvError::Closed) => break,
            },
            event = playback.recv() => match event {
                Ok(PlaybackEvent::Started { owner }) => {
                    if let Some(message) = session.conversation().get(&owner).await {
                        speaking.insert(owner, message.text);
                    }
                }
                Ok(PlaybackEvent::Word { owner, char_offset }) => {
                    if let Some(word) = speaking.get(&owner).and_then(|t| word_at(t, char_offset)) {
                        print!("{} ", word.dimmed());
                        flush_stdout();
                    }
                }
                Ok(PlaybackEvent::Finished { owner } | PlaybackEvent::Failed { owner, .. }) => {
                    if speaking.remove(&owner).is_some() {
                        println!();
                    }
                }
                Ok(PlaybackEvent::Cleared) => {
                    if !speaking.is_empty() {
                        println!();
                    }
                    speaking.clear();
                }
                Ok(PlaybackEvent::Skipped { .. }) => {}
                Err(RecvError::Lagged(n)) => debug!(skipped = n, "playback printer lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }
}

/// The word starting at `char_offset`, up to the next whitespace.
fn word_at(text: &str, char_offset: usize) -> Option<&str> {
    let start = text.char_indices().nth(char_offset).map(|(i, _)| i)?;
    let rest = &text[start..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    Some(&rest[..end]).filter(|w| !w.is_empty())
}

fn flush_stdout() {
    use std::io::Write;
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(parse_input("  hola qué tal "), Some(Input::Message("hola qué tal")));
        assert_eq!(parse_input("   "), None);
    }

    #[test]
    fn commands_are_parsed() {
        assert_eq!(parse_input("/quit"), Some(Input::Quit));
        assert_eq!(parse_input("/attach ./foto.png"), Some(Input::Attach("./foto.png")));
        assert_eq!(parse_input("/detach 2"), Some(Input::Detach(1)));
        assert_eq!(parse_input("/detach 0"), Some(Input::Unknown("/detach 0")));
        assert_eq!(parse_input("/test"), Some(Input::Mode(EndpointMode::Test)));
        assert_eq!(parse_input("/prod"), Some(Input::Mode(EndpointMode::Production)));
        assert_eq!(parse_input("/status"), Some(Input::Status));
        assert_eq!(parse_input("/attach"), Some(Input::Unknown("/attach")));
        assert_eq!(parse_input("/bogus"), Some(Input::Unknown("/bogus")));
    }

    #[test]
    fn word_at_uses_char_offsets() {
        let text = "¿Qué tal? bien";
        assert_eq!(word_at(text, 0), Some("¿Qué"));
        assert_eq!(word_at(text, 5), Some("tal?"));
        assert_eq!(word_at(text, 10), Some("bien"));
        assert_eq!(word_at(text, 4), None);
        assert_eq!(word_at(text, 99), None);
    }
}
