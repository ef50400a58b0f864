use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tasklink::config::{ConfigError, LoginMode, MessagePolicy};
use tasklink::crypto::{CryptoError, KeyPair};
use tasklink::format;
use tasklink::net::types::{SubmissionReceipt, Task};
use tasklink::poller::{PollEvent, SessionPollers};
use tasklink::services::messages::MessageAction;
use tasklink::services::{auth, dashboard, messages, tasks};
use tasklink::{ApiClient, ClientConfig, ClientError, ErrorCode, Session, SessionStore};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{code}: {0}", code = .0.error_code())]
    Client(#[from] ClientError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("key file: {0}")]
    Crypto(#[from] CryptoError),
    #[error("io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "tasklink", about = "Client for the distributed task backend")]
struct Cli {
    #[arg(long, env = "TASKLINK_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "TASKLINK_SESSION_FILE", help = "Session store [default: <tmp>/tasklink-session.json]")]
    session_file: Option<PathBuf>,

    #[arg(long, value_parser = parse_login_mode, help = "digest or legacy [env: TASKLINK_LOGIN_MODE]")]
    login_mode: Option<LoginMode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register with a fresh key pair.
    Register {
        username: String,
        #[arg(long, env = "TASKLINK_PASSWORD")]
        password: String,
        #[arg(long, help = "Also write the private key PEM to this file")]
        save_key: Option<PathBuf>,
    },
    /// Log in and store the session.
    Login {
        username: String,
        #[arg(long, env = "TASKLINK_PASSWORD")]
        password: String,
        #[arg(long, help = "Private key PEM saved at registration (legacy mode)")]
        private_key: Option<PathBuf>,
    },
    Logout,
    Whoami,
    /// Fetch the current task.
    Task,
    /// Fetch the current task, solve it and submit the answer.
    Solve,
    /// Submit an answer for a task id.
    Answer { task_id: u64, value: f64 },
    /// Submit a legacy sum.
    Sum { value: i64 },
    /// Ask the server to evaluate a calculation.
    Calc { expression: String },
    /// Check the inbox once.
    Message {
        #[arg(long)]
        interpret: bool,
    },
    /// Send a message to another user.
    Send {
        to_user: String,
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,
    },
    Sessions,
    Users,
    /// Broadcast a random task to every client.
    Broadcast,
    /// Broadcast task history with submission counts.
    History,
    /// Poll for tasks and messages until interrupted.
    Watch {
        #[arg(long)]
        auto_solve: bool,
        #[arg(long)]
        interpret: bool,
    },
}

struct CliContext {
    config: ClientConfig,
    api: Arc<ApiClient>,
    store: SessionStore,
}

impl CliContext {
    fn load_session(&self) -> Result<Session, CliError> {
        Ok(Session::from_stored(&self.store.load()?)?)
    }

    fn save_session(&self, session: &Session) -> Result<(), CliError> {
        self.store.save(&session.to_stored()?)?;
        Ok(())
    }
}

fn parse_login_mode(raw: &str) -> Result<LoginMode, ConfigError> {
    LoginMode::parse(raw)
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(mode) = cli.login_mode {
        config.login_mode = mode;
    }
    let ctx = CliContext {
        api: Arc::new(ApiClient::new(&config)?),
        store: SessionStore::new(cli.session_file.unwrap_or_else(SessionStore::default_path)),
        config,
    };

    match cli.command {
        Command::Register { username, password, save_key } => run_register(&ctx, &username, &password, save_key).await,
        Command::Login { username, password, private_key } => {
            run_login(&ctx, &username, &password, private_key).await
        }
        Command::Logout => {
            let mut session = ctx.load_session()?;
            auth::logout(&mut session, &ctx.store, None).await?;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            let session = ctx.load_session()?;
            match session.username() {
                Some(name) if session.is_authenticated() => println!("{name} (logged in)"),
                Some(name) => println!("{name} (registered, not logged in)"),
                None => println!("nobody"),
            }
            Ok(())
        }
        Command::Task => match tasks::fetch(&ctx.api, &ctx.load_session()?).await? {
            Some(task) => print_json(&serde_json::to_value(&task)?),
            None => {
                println!("no task yet");
                Ok(())
            }
        },
        Command::Solve => {
            let session = ctx.load_session()?;
            match tasks::fetch(&ctx.api, &session).await? {
                Some(task) => solve_and_report(&ctx.api, &session, &task).await,
                None => {
                    println!("no task yet");
                    Ok(())
                }
            }
        }
        Command::Answer { task_id, value } => {
            let receipt = tasks::submit_for_id(&ctx.api, &ctx.load_session()?, task_id, value).await?;
            println!("{}", verdict(&receipt));
            Ok(())
        }
        Command::Sum { value } => {
            let receipt = tasks::submit_sum(&ctx.api, &ctx.load_session()?, value).await?;
            println!("{}", verdict(&receipt));
            Ok(())
        }
        Command::Calc { expression } => {
            let result = tasks::calculate(&ctx.api, &ctx.load_session()?, &expression).await?;
            print_json(&result)
        }
        Command::Message { interpret } => {
            let session = ctx.load_session()?;
            match messages::receive_and_act(&ctx.api, &session, policy(&ctx.config, interpret)).await? {
                Some(action) => print_action(&action),
                None => println!("no messages"),
            }
            Ok(())
        }
        Command::Send { to_user, content } => {
            let reply = dashboard::send_message(&ctx.api, &ctx.load_session()?, &to_user, &content.join(" ")).await?;
            println!("sent: {}", reply.status.as_deref().unwrap_or("OK"));
            Ok(())
        }
        Command::Sessions => run_sessions(&ctx).await,
        Command::Users => {
            for user in dashboard::list_users(&ctx.api).await? {
                match user.id {
                    Some(id) => println!("{id}\t{}", user.username),
                    None => println!("-\t{}", user.username),
                }
            }
            Ok(())
        }
        Command::Broadcast => {
            let receipt = dashboard::broadcast_task(&ctx.api, &ctx.load_session()?).await?;
            let content = receipt.content.as_deref().unwrap_or("");
            println!("task broadcast: #{} {content}", receipt.task_id);
            Ok(())
        }
        Command::History => run_history(&ctx).await,
        Command::Watch { auto_solve, interpret } => run_watch(&ctx, auto_solve, interpret).await,
    }
}

async fn run_register(
    ctx: &CliContext,
    username: &str,
    password: &str,
    save_key: Option<PathBuf>,
) -> Result<(), CliError> {
    let mut session = ctx.load_session()?;
    let registration = auth::register(&ctx.api, &mut session, ctx.config.login_mode, username, password).await?;
    ctx.save_session(&session)?;

    println!("{}", registration.status.as_deref().unwrap_or("registered"));
    if let Some(path) = save_key {
        std::fs::write(&path, registration.key.private_key_pem()?)?;
        println!("private key written to {}", path.display());
    }
    println!("keep the private key safe: it cannot be recovered");
    Ok(())
}

async fn run_login(
    ctx: &CliContext,
    username: &str,
    password: &str,
    private_key: Option<PathBuf>,
) -> Result<(), CliError> {
    let key = match private_key {
        Some(path) => Some(KeyPair::from_private_pem(&std::fs::read_to_string(path)?)?),
        None => None,
    };
    let mut session = ctx.load_session()?;
    auth::login(&ctx.api, &mut session, ctx.config.login_mode, username, password, key).await?;
    ctx.save_session(&session)?;
    println!("logged in as {username}");
    Ok(())
}

async fn run_sessions(ctx: &CliContext) -> Result<(), CliError> {
    let sessions = dashboard::list_sessions(&ctx.api).await?;
    if sessions.is_empty() {
        println!("no active sessions");
    }
    for record in sessions {
        let seen = record.timestamp.as_deref().map(|t| format::format_timestamp(t).unwrap_or_else(|| t.to_owned()));
        println!(
            "{} @ {} - {}",
            record.username,
            record.ip.as_deref().unwrap_or("?"),
            seen.as_deref().unwrap_or("?")
        );
    }
    Ok(())
}

async fn run_history(ctx: &CliContext) -> Result<(), CliError> {
    let rows = dashboard::broadcast_history(&ctx.api, &ctx.load_session()?).await?;
    if rows.is_empty() {
        println!("no broadcast history");
        return Ok(());
    }
    println!("id\tcontent\top\tcreated\tsubmissions\tcorrect\trate");
    for row in rows {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}%",
            row.id,
            row.content,
            row.operation,
            row.created_display(),
            row.total_submissions,
            row.correct_count,
            row.success_rate()
        );
    }
    Ok(())
}

async fn run_watch(ctx: &CliContext, auto_solve: bool, interpret: bool) -> Result<(), CliError> {
    let session = Arc::new(ctx.load_session()?);
    session.bearer()?;
    let mut config = ctx.config.clone();
    config.message_policy = policy(&ctx.config, interpret);

    let (tx, mut rx) = mpsc::channel(32);
    let pollers = SessionPollers::start(ctx.api.clone(), session.clone(), &config, tx);
    eprintln!("watching for tasks and messages, Ctrl-C to stop");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            event = rx.recv() => match event {
                Some(PollEvent::Task(task)) => {
                    println!("task {}", task.describe());
                    if auto_solve {
                        if let Err(e) = solve_and_report(&ctx.api, &session, &task).await {
                            tracing::warn!(task = %task.describe(), error = %e, "auto-solve failed");
                        }
                    }
                }
                Some(PollEvent::Message(action)) => print_action(&action),
                None => break,
            },
        }
    }

    tracing::debug!("stopping pollers");
    pollers.stop().await;
    Ok(())
}

async fn solve_and_report(api: &ApiClient, session: &Session, task: &Task) -> Result<(), CliError> {
    let (answer, receipt) = tasks::solve_and_submit(api, session, task).await?;
    println!("{} = {answer}: {}", task.describe(), verdict(&receipt));
    Ok(())
}

fn policy(config: &ClientConfig, interpret: bool) -> MessagePolicy {
    if interpret { MessagePolicy::Interpret } else { config.message_policy }
}

fn verdict(receipt: &SubmissionReceipt) -> String {
    match receipt.correct() {
        Some(true) => "correct".to_owned(),
        Some(false) => match receipt.expected {
            Some(expected) => format!("incorrect (expected {expected})"),
            None => "incorrect".to_owned(),
        },
        None => receipt.status.clone().unwrap_or_else(|| "submitted".to_owned()),
    }
}

fn print_action(action: &MessageAction) {
    match action {
        MessageAction::Display(message) => println!("message: {message}"),
        MessageAction::Interpreted { outputs, .. } => {
            for output in outputs {
                println!("> {output}");
            }
        }
        MessageAction::Rejected { error, .. } => eprintln!("message rejected: {error}"),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
