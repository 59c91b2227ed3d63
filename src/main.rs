//! CLI entry point for agentroom.

mod cli;

use agentroom::api::ApiClient;
use agentroom::codec::SignalContext;
use agentroom::config::{load_config, Config};
use agentroom::editing::{load_agent_draft, AgentEditingSession};
use agentroom::error::SessionError;
use agentroom::render::TranscriptRenderer;
use agentroom::session::{ConnectionSession, SessionView};
use agentroom::transport::WsRoomTransport;
use agentroom::types::Agent;
use clap::Parser;
use cli::{parse_chat_input, ChatInput, Command};
use std::error::Error;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() {
    init_logging();
    let args = cli::Args::parse();

    let mut config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    if args.no_color {
        config.display.color = false;
    }

    let renderer = TranscriptRenderer::new(config.display.color);
    let draft = match load_draft(&args) {
        Ok(draft) => draft,
        Err(e) => {
            let _ = renderer.error(&e.to_string());
            std::process::exit(1);
        }
    };

    let api = Arc::new(ApiClient::new(
        &config.api,
        &config.identity,
        config.network.api_timeout(),
    ));
    let mut editor = AgentEditingSession::new(draft);

    let result = match args.command() {
        Command::Chat => chat(&config, api, &editor).await,
        Command::Save => save(&mut editor, api.as_ref()).await,
        Command::Describe { save: and_save } => {
            describe(&mut editor, api.as_ref(), and_save).await
        }
    };
    if let Err(e) = result {
        let _ = renderer.error(&e.to_string());
        std::process::exit(1);
    }
}

/// Logs go to stderr; `AGENTROOM_LOG` wins over `RUST_LOG`, default `warn`.
fn init_logging() {
    let filter = std::env::var("AGENTROOM_LOG")
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_draft(args: &cli::Args) -> Result<Agent, BoxError> {
    let mut draft = match args.agent.as_deref() {
        Some(path) => load_agent_draft(Path::new(path))?,
        None => Agent::default(),
    };
    if let Some(id) = &args.agent_id {
        draft.ai_agent_id = id.clone();
    }
    Ok(draft)
}

async fn save(editor: &mut AgentEditingSession, api: &ApiClient) -> Result<(), BoxError> {
    let saved = editor.save(api).await?;
    println!("saved agent {}", saved.ai_agent_id);
    Ok(())
}

async fn describe(
    editor: &mut AgentEditingSession,
    api: &ApiClient,
    and_save: bool,
) -> Result<(), BoxError> {
    let description = editor.generate_description(api).await?;
    println!("{description}");
    if and_save {
        save(editor, api).await?;
    }
    Ok(())
}

async fn chat(
    config: &Config,
    api: Arc<ApiClient>,
    editor: &AgentEditingSession,
) -> Result<(), BoxError> {
    let mut renderer = TranscriptRenderer::new(config.display.color);
    let transport = WsRoomTransport::new(config.network.connect_timeout());
    let ctx = SignalContext {
        team_id: config.identity.team_id.clone(),
        user_id: config.identity.user_id.clone(),
    };
    let (mut session, mut frames) = ConnectionSession::new(api, transport, ctx);
    let mut view = session.subscribe();
    let agent_id = editor.agent_id().to_string();

    session.start(&agent_id, editor.run_config()).await?;
    renderer.notice("type a message; /stop cancels, /restart starts over, /quit leaves")?;
    show(&mut renderer, &mut view)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            frame = frames.recv() => {
                let Some(frame) = frame else { break };
                session.on_inbound(frame).await;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let outcome = match parse_chat_input(&line) {
                    ChatInput::Turn(text) => session.send_turn(&text).await.map(|_| ()),
                    ChatInput::Stop => session.cancel().await,
                    ChatInput::Restart => {
                        session.start_or_restart(&agent_id, editor.run_config()).await
                    }
                    ChatInput::Quit => break,
                    ChatInput::Empty => Ok(()),
                    ChatInput::Unknown(cmd) => {
                        let hint = format!("unknown command {cmd}; try /stop, /restart, /quit");
                        renderer.notice(&hint)?;
                        Ok(())
                    }
                };
                report(&renderer, outcome)?;
            }
        }
        show(&mut renderer, &mut view)?;
    }

    session.leave().await;
    Ok(())
}

fn report(renderer: &TranscriptRenderer, outcome: Result<(), SessionError>) -> io::Result<()> {
    match outcome {
        Ok(()) => Ok(()),
        Err(SessionError::AwaitingResponse) => {
            renderer.notice("still receiving; wait for the reply or /stop it")
        }
        Err(e) => renderer.error(&e.to_string()),
    }
}

fn show(renderer: &mut TranscriptRenderer, view: &mut watch::Receiver<SessionView>) -> io::Result<()> {
    if !view.has_changed().unwrap_or(false) {
        return Ok(());
    }
    let snapshot = view.borrow_and_update().clone();
    if let Some(note) = renderer.status_change(&snapshot) {
        renderer.notice(&note)?;
    }
    renderer.render(&mut io::stdout(), &snapshot)
}
