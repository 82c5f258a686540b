use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use irc_notify::config::NotifyConfig;
use irc_notify::irc::session;
use irc_notify::notice;

/// Send a one-shot, best-effort notification to IRC channels and users.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to the notifier config file.
    #[arg(short, long, default_value = "irc-notify.toml")]
    config: PathBuf,

    /// Label shown in brackets before the message, e.g. the host that
    /// produced the event.
    #[arg(short, long, default_value = "notice")]
    label: String,

    /// Link appended in parentheses after the message.
    #[arg(long)]
    link: Option<String>,

    /// Override the configured server.
    #[arg(long)]
    server: Option<String>,

    /// Override the configured port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the configured nick.
    #[arg(long)]
    nick: Option<String>,

    /// Override the configured room list (comma-separated).
    #[arg(long)]
    room: Option<String>,

    /// Override the configured user list (comma-separated).
    #[arg(long)]
    user: Option<String>,

    /// Override the session deadline, in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// The message to deliver.
    message: String,
}

impl Cli {
    fn apply_overrides(&self, config: &mut NotifyConfig) {
        if let Some(server) = &self.server {
            config.server = server.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(nick) = &self.nick {
            config.nick = nick.clone();
        }
        if let Some(room) = &self.room {
            config.room = room.clone();
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    // Configuration problems fail fast, before any connection is attempted.
    let mut config = NotifyConfig::load(&cli.config)?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let targets = config.targets();
    let notice = notice::format_notice(
        &cli.label,
        &cli.message,
        cli.link.as_deref().unwrap_or(""),
    );

    info!(
        server = %config.server,
        targets = targets.len(),
        "dispatching notification"
    );
    session::dispatch(&config.session_params(), &targets, &notice).await;

    Ok(())
}
