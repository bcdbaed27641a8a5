//! koala - emit semantic analytics events from the command line
//!
//! Commands:
//! - `defaults`: show the device/app properties attached to every event
//! - `status`: show the endpoint configuration
//! - `track <event>`: emit one event, to the configured endpoint or stdout
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/koala/config.toml (~/.config/koala/config.toml)
//! - Logs: $XDG_STATE_HOME/koala/ (~/.local/state/koala/)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use koala_core::{
    Config, DefaultProperties, EventTracker, KoalaClient, RecordingBackend, SystemHost,
    TrackedEvent,
};

#[derive(Parser)]
#[command(name = "koala")]
#[command(about = "Emit semantic analytics events")]
#[command(version)]
struct Args {
    /// Write logs to the state directory
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print events as JSON instead of sending them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the default properties attached to every event
    Defaults,

    /// Show endpoint configuration
    Status,

    /// Emit a single event
    Track {
        #[command(subcommand)]
        event: EventCommand,
    },
}

#[derive(Subcommand)]
enum EventCommand {
    AppOpen,
    AppClose,
    DiscoveryView,
    LoginTout {
        /// Where the login prompt was triggered from
        #[arg(long)]
        intent: String,
    },
    LoginSuccess,
    LoginError,
    ResetPasswordView,
    ResetPasswordSuccess,
    ResetPasswordError,
    SignupSuccess,
    SignupNewsletterToggle {
        #[arg(long, action = clap::ArgAction::Set)]
        send_newsletters: bool,
    },
    FacebookConfirmation,
    TwoFactorAuthView,
    TwoFactorAuthResendCode,
    ProjectSearchView,
    SearchResults {
        #[arg(long)]
        query: String,
        /// Page number, starting at 1
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        page_count: u32,
    },
}

impl From<EventCommand> for TrackedEvent {
    fn from(cmd: EventCommand) -> Self {
        match cmd {
            EventCommand::AppOpen => TrackedEvent::AppOpen,
            EventCommand::AppClose => TrackedEvent::AppClose,
            EventCommand::DiscoveryView => TrackedEvent::DiscoveryView,
            EventCommand::LoginTout { intent } => TrackedEvent::LoginTout { intent },
            EventCommand::LoginSuccess => TrackedEvent::LoginSuccess,
            EventCommand::LoginError => TrackedEvent::LoginError,
            EventCommand::ResetPasswordView => TrackedEvent::ResetPasswordView,
            EventCommand::ResetPasswordSuccess => TrackedEvent::ResetPasswordSuccess,
            EventCommand::ResetPasswordError => TrackedEvent::ResetPasswordError,
            EventCommand::SignupSuccess => TrackedEvent::SignupSuccess,
            EventCommand::SignupNewsletterToggle { send_newsletters } => {
                TrackedEvent::SignupNewsletterToggle { send_newsletters }
            }
            EventCommand::FacebookConfirmation => TrackedEvent::FacebookConfirmation,
            EventCommand::TwoFactorAuthView => TrackedEvent::TwoFactorAuthView,
            EventCommand::TwoFactorAuthResendCode => TrackedEvent::TwoFactorAuthResendCode,
            EventCommand::ProjectSearchView => TrackedEvent::ProjectSearchView,
            EventCommand::SearchResults { query, page_count } => {
                TrackedEvent::SearchResults { query, page_count }
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard = if args.verbose {
        Some(koala_core::logging::init(&config.logging).context("failed to initialize logging")?)
    } else {
        None
    };

    match args.command {
        Command::Defaults => cmd_defaults(&config),
        Command::Status => cmd_status(&config),
        Command::Track { event } => cmd_track(&config, event.into(), args.dry_run),
    }
}

fn cmd_defaults(config: &Config) -> Result<()> {
    let host = SystemHost::new(config.device.clone());
    let defaults = DefaultProperties::collect(&host);
    println!("{}", serde_json::to_string_pretty(&defaults)?);
    Ok(())
}

fn cmd_status(config: &Config) -> Result<()> {
    println!("Koala Client Configuration");
    println!("==========================");
    println!();

    let client = &config.client;

    println!("Log Dir:         {}", Config::state_dir().display());
    println!("Enabled:         {}", client.enabled);

    if !client.enabled {
        println!();
        println!("Client is disabled. Enable it in config.toml:");
        println!();
        println!("  [client]");
        println!("  enabled = true");
        println!("  endpoint = \"https://your-koala-server.com\"");
        println!("  api_key = \"xxxxxxxxxxxx\"");
        return Ok(());
    }

    println!(
        "Endpoint:        {}",
        client.endpoint.as_deref().unwrap_or("<not set>")
    );
    println!(
        "API Key:         {}",
        if client.api_key.is_some() {
            "<set>"
        } else {
            "<not set>"
        }
    );
    println!("Timeout:         {}s", client.timeout_secs);

    println!();
    match client.validate() {
        Ok(()) if client.is_ready() => println!("Status: Ready to send"),
        Ok(()) => println!("Status: Not ready (missing required configuration)"),
        Err(e) => println!("Status: Invalid ({})", e),
    }

    Ok(())
}

fn cmd_track(config: &Config, event: TrackedEvent, dry_run: bool) -> Result<()> {
    let recorder = RecordingBackend::new();
    let tracker = EventTracker::with_host(&recorder, SystemHost::new(config.device.clone()));
    tracker.emit(&event);

    let send = !dry_run && config.client.is_ready();
    if !dry_run && !send {
        eprintln!("Client is not configured; printing event instead. Run 'status' for details.");
    }

    let client = if send {
        Some(KoalaClient::new(&config.client).context("failed to create client")?)
    } else {
        None
    };

    for recorded in recorder.take() {
        match &client {
            Some(client) => {
                client
                    .send(&recorded)
                    .with_context(|| format!("failed to send {:?}", recorded.name))?;
                tracing::info!(event = %recorded.name, "Sent event");
                println!("Sent {:?} to {}", recorded.name, client.track_url());
            }
            None => println!("{}", serde_json::to_string_pretty(&recorded)?),
        }
    }

    Ok(())
}
