// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parlo - a voice-enabled chat client for webhook-driven bots.
//!
//! This is the binary entry point.

mod send;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use parlo_chat::{ChatSession, FilePreferenceStore, SessionParts};
use parlo_config::model::ParloConfig;
use parlo_config::EndpointMode;
use parlo_core::{ParloError, WebhookTransport};
use parlo_delivery::{DEFAULT_SIMULATED_LATENCY, HttpTransport, SimulatedWebhook};
use parlo_speech::{SilentSink, synthesizer_from_config};

/// Parlo - talk to a webhook bot from the terminal.
#[derive(Parser, Debug)]
#[command(name = "parlo", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch an interactive chat session.
    Chat {
        #[command(flatten)]
        endpoint: EndpointArgs,
    },
    /// Send one message and print the reply.
    Send {
        /// Message text.
        text: String,
        /// Files to attach. Repeatable.
        #[arg(long = "file", short = 'f')]
        files: Vec<PathBuf>,
        #[command(flatten)]
        endpoint: EndpointArgs,
    },
    /// Print the effective configuration.
    Config,
}

/// Which bot the session talks to.
#[derive(Args, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct EndpointArgs {
    /// Send to the test endpoint instead of production.
    #[arg(long)]
    test: bool,
    /// Answer offline with canned replies instead of calling the webhook.
    #[arg(long, conflicts_with = "test")]
    simulate: bool,
}

impl EndpointArgs {
    /// Endpoint override for the session, if any.
    fn mode(&self) -> Option<EndpointMode> {
        self.test.then_some(EndpointMode::Test)
    }

    fn transport(&self) -> Result<Arc<dyn WebhookTransport>, ParloError> {
        if self.simulate {
            Ok(Arc::new(SimulatedWebhook::with_latency(DEFAULT_SIMULATED_LATENCY)))
        } else {
            Ok(Arc::new(HttpTransport::new()?))
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match parlo_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            parlo_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.app.log_level);

    let result = match cli.command {
        Some(Commands::Chat { endpoint }) => shell::run_shell(config, endpoint).await,
        Some(Commands::Send {
            text,
            files,
            endpoint,
        }) => send::run_send(config, endpoint, &text, &files).await,
        Some(Commands::Config) => print_config(&config),
        None => shell::run_shell(config, EndpointArgs::default()).await,
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

/// Builds a session wired to the webhook (or the offline simulator), the
/// configured speech backend, and the on-disk preference file.
pub(crate) async fn build_session(
    config: &ParloConfig,
    endpoint: EndpointArgs,
) -> Result<Arc<ChatSession>, ParloError> {
    let parts = SessionParts {
        transport: endpoint.transport()?,
        synthesizer: synthesizer_from_config(&config.speech)?,
        sink: Arc::new(SilentSink::new(config.speech.word_duration())),
        preferences: Arc::new(FilePreferenceStore::new(&config.preferences.path)),
    };
    let session = ChatSession::start(config, parts).await?;
    if let Some(mode) = endpoint.mode() {
        session.set_endpoint_mode(mode);
    }
    Ok(session)
}

fn print_config(config: &ParloConfig) -> Result<(), ParloError> {
    let mut shown = config.clone();
    if shown.speech.api_key.is_some() {
        shown.speech.api_key = Some("********".to_string());
    }
    let rendered = toml::to_string_pretty(&shown)
        .map_err(|e| ParloError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// Initialize the tracing subscriber with the configured log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parlo={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlo_core::PluginAdapter;

    #[test]
    fn cli_parses_send_with_files() {
        let cli = Cli::try_parse_from([
            "parlo", "send", "hola", "--file", "a.png", "-f", "b.txt", "--test",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Send {
                text,
                files,
                endpoint,
            }) => {
                assert_eq!(text, "hola");
                assert_eq!(files, vec![PathBuf::from("a.png"), PathBuf::from("b.txt")]);
                assert_eq!(endpoint.mode(), Some(EndpointMode::Test));
                assert!(!endpoint.simulate);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn chat_defaults_to_configured_endpoint() {
        let cli = Cli::try_parse_from(["parlo", "chat"]).unwrap();
        match cli.command {
            Some(Commands::Chat { endpoint }) => {
                assert_eq!(endpoint, EndpointArgs::default());
                assert_eq!(endpoint.mode(), None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn simulate_flag_selects_offline_transport() {
        let cli = Cli::try_parse_from(["parlo", "send", "hola", "--simulate"]).unwrap();
        let Some(Commands::Send { endpoint, .. }) = cli.command else {
            panic!("expected send");
        };
        assert!(endpoint.simulate);
        assert_eq!(endpoint.mode(), None);
        assert_eq!(endpoint.transport().unwrap().name(), "simulated-webhook");

        let http = EndpointArgs::default().transport().unwrap();
        assert_ne!(http.name(), "simulated-webhook");
    }

    #[test]
    fn simulate_conflicts_with_test_endpoint() {
        assert!(Cli::try_parse_from(["parlo", "chat", "--simulate", "--test"]).is_err());
    }

    #[tokio::test]
    async fn simulated_session_answers_without_network() {
        let mut config = ParloConfig::default();
        let dir = tempfile::tempdir().unwrap();
        config.preferences.path = dir.path().join("prefs.json").to_string_lossy().into_owned();
        let endpoint = EndpointArgs {
            test: false,
            simulate: true,
        };
        let session = build_session(&config, endpoint).await.unwrap();
        let outcome = session.send("hola", Vec::new()).await.unwrap();
        assert!(matches!(outcome, parlo_chat::DeliveryOutcome::Delivered { .. }));
        session.shutdown().await;
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = parlo_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.delivery.max_retries, 5);
    }

    #[test]
    fn printed_config_masks_api_key() {
        let mut config = ParloConfig::default();
        config.speech.api_key = Some("secret".into());
        let mut shown = config.clone();
        shown.speech.api_key = Some("********".into());
        let rendered = toml::to_string_pretty(&shown).unwrap();
        assert!(!rendered.contains("secret"));
        assert!(print_config(&config).is_ok());
    }
}
