mod commands;
mod renderer;

use anyhow::Context;
use chat_core::{Config, ParameterError, SessionParameters};
use chat_transport::WsTransport;
use clap::Parser;
use colored::Colorize;
use session_manager::{
    ChatSession, PendingQuestion, Renderer, SessionError, SessionUpdate, SubmitOutcome,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::{parse_input, Command, Input, HELP};
use crate::renderer::TerminalRenderer;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(about = "Interactive client for a streaming chat service")]
#[command(version)]
struct Cli {
    /// WebSocket endpoint, e.g. ws://localhost:8000/chat
    #[arg(long)]
    url: Option<String>,

    /// Model identifier sent with each question
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature on a 0-100 scale
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    temperature: Option<u8>,

    /// System message sent with each question
    #[arg(long)]
    system: Option<String>,

    /// Credential passed to the server during the handshake
    #[arg(long, env = "DOCCHAT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,
}

impl Cli {
    fn apply_to(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.endpoint_url = Some(url.clone());
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(system) = &self.system {
            config.system_message = system.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = Some(api_key.clone());
        }
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_file(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut config = Config::load();
    cli.apply_to(&mut config);
    let params = config
        .session_parameters()
        .context("Invalid session configuration (set --url or DOCCHAT_WS_URL)")?;

    tracing::info!("Starting session against {}", params.endpoint_url());

    let mut session = ChatSession::with_websocket(TerminalRenderer::stdout(), params);
    session.connect();
    run_interactive_chat(&mut session).await
}

async fn run_interactive_chat<R: Renderer>(
    session: &mut ChatSession<WsTransport, R>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = PendingQuestion::default();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_input(&line) {
                    Input::Question(text) => {
                        pending.set(text);
                        submit(session, &mut pending);
                    }
                    Input::Command(Command::Quit) => break,
                    Input::Command(command) => run_command(session, command),
                    Input::Invalid(message) => eprintln!("{}", message.red()),
                }
            }
            update = session.next_update() => {
                match update {
                    Some(SessionUpdate::Disconnected { reason }) => {
                        eprintln!();
                        eprintln!("{}", format!("❌ Disconnected: {}", reason).red());
                        eprintln!("{}", "Type /reconnect to try again.".dimmed());
                    }
                    Some(_) => {}
                    None => break,
                }
            }
        }
    }

    session.disconnect();
    Ok(())
}

fn submit<R: Renderer>(
    session: &mut ChatSession<WsTransport, R>,
    pending: &mut PendingQuestion,
) {
    match session.submit(pending) {
        Ok(SubmitOutcome::Sent) => println!(),
        Ok(SubmitOutcome::SkippedEmpty) => {}
        Err(SessionError::ConnectionUnavailable(status)) => {
            eprintln!("{}", format!("⏳ Not connected ({}), question kept.", status).yellow());
        }
        Err(e) => eprintln!("{}", format!("❌ {}", e).red()),
    }
}

fn run_command<R: Renderer>(
    session: &mut ChatSession<WsTransport, R>,
    command: Command,
) {
    let current = session.parameters().clone();
    let updated: Result<SessionParameters, ParameterError> = match command {
        Command::Help => {
            println!("{}", HELP.dimmed());
            return;
        }
        Command::Status => {
            match serde_json::to_string_pretty(&session.snapshot()) {
                Ok(json) => println!("{}", json.dimmed()),
                Err(e) => eprintln!("{}", format!("❌ {}", e).red()),
            }
            return;
        }
        Command::Reconnect => {
            session.connect();
            return;
        }
        Command::Pause => {
            session.on_scroll_position_observed(false);
            return;
        }
        Command::Follow => {
            session.on_scroll_position_observed(true);
            session.renderer_mut().scroll_to_bottom();
            return;
        }
        Command::Url(url) => current.with_endpoint_url(&url),
        Command::Model(model) => Ok(current.with_model(model)),
        Command::Temperature(value) => current.with_temperature(value),
        Command::System(text) => Ok(current.with_system_message(text)),
        Command::Quit => return,
    };

    match updated {
        Ok(params) => {
            if session.update_parameters(params).is_none() {
                println!("{}", "✅ Applies to the next question.".green());
            }
        }
        Err(e) => eprintln!("{}", format!("❌ {}", e).red()),
    }
}
