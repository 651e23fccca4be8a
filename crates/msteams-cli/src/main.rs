//! CLI for the Microsoft Teams transport.
//!
//! Lets an operator validate transport settings, print the settings schema,
//! send a self-test and deliver single alerts by hand.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use msteams_core::{AlertEvent, AlertState, ConfigSchema, ConnectionMethod, TransportConfig};
use msteams_delivery::{HttpClient, HttpRequest, TeamsTransport, Transport};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing_subscriber::EnvFilter;

const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    transport: TransportArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TransportArgs {
    /// Transport settings file (JSON, settings-store keys)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Teams webhook or workflow URL - overrides the settings file
    #[arg(long, env = "MSTEAMS_WEBHOOK_URL", global = true)]
    url: Option<String>,

    /// Connection method (Webhook or Workflow) - overrides the settings file
    #[arg(long, global = true)]
    method: Option<ConnectionMethodArg>,

    /// Treat the alert message as a pre-formatted JSON card
    #[arg(long, global = true)]
    use_json: bool,

    /// Send the markdown card even if the settings file enables JSON
    #[arg(long, global = true, conflicts_with = "use_json")]
    no_use_json: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "10", global = true)]
    timeout_secs: u64,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ConnectionMethodArg {
    Webhook,
    Workflow,
}

impl From<ConnectionMethodArg> for ConnectionMethod {
    fn from(arg: ConnectionMethodArg) -> Self {
        match arg {
            ConnectionMethodArg::Webhook => ConnectionMethod::Webhook,
            ConnectionMethodArg::Workflow => ConnectionMethod::Workflow,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Deliver a single alert
    Send {
        /// Alert title
        #[arg(long)]
        title: String,

        /// Alert body
        #[arg(long, conflicts_with = "message_file")]
        message: Option<String>,

        /// Read the alert body from a file ("-" for stdin)
        #[arg(long)]
        message_file: Option<PathBuf>,

        /// Alert state, name or numeric code
        #[arg(long, default_value = "active")]
        state: String,

        /// Alert uid
        #[arg(long, default_value = "1")]
        uid: String,

        /// Print the request instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Send the built-in test card
    Test {
        /// Print the request instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate the transport settings
    Validate,
    /// Print the settings schema
    Schema,
}

#[derive(Serialize)]
struct DeliveryRecord<'a> {
    ts: String,
    transport: &'a str,
    uid: &'a str,
    outcome: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestPreview<'a> {
    url: &'a str,
    content_type: &'a str,
    body: Value,
    summary: &'a msteams_core::MessageCard,
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}

fn load_config(path: &Path) -> Result<TransportConfig> {
    let file =
        File::open(path).with_context(|| format!("Failed to open settings file {path:?}"))?;
    let config = serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse settings file {path:?}"))?;
    Ok(config)
}

fn resolve_config(args: &TransportArgs) -> Result<TransportConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => TransportConfig::new(String::new(), ConnectionMethod::default(), false),
    };

    if let Some(url) = &args.url {
        config.webhook_url = url.clone();
    }
    if let Some(method) = args.method {
        config.connection_method = method.into();
    }
    if args.use_json {
        config.use_json = true;
    } else if args.no_use_json {
        config.use_json = false;
    }

    ConfigSchema::validate(&config).context("Invalid transport settings")?;
    Ok(config)
}

fn read_message(message: Option<String>, message_file: Option<&Path>) -> Result<String> {
    match (message, message_file) {
        (Some(message), _) => Ok(message),
        (None, Some(path)) if path == Path::new("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read message from stdin")?;
            Ok(buf)
        }
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read message file {path:?}")),
        (None, None) => anyhow::bail!("Either --message or --message-file is required"),
    }
}

fn preview_json(request: &HttpRequest) -> Result<String> {
    let body = serde_json::from_str(&request.body)
        .unwrap_or_else(|_| Value::String(request.body.clone()));
    let preview = RequestPreview {
        url: &request.url,
        content_type: request.content_type,
        body,
        summary: &request.summary,
    };
    Ok(serde_json::to_string_pretty(&preview)?)
}

fn deliver(
    args: &TransportArgs,
    config: &TransportConfig,
    alert: &AlertEvent,
    dry_run: bool,
) -> Result<()> {
    let client = HttpClient::new(Duration::from_secs(args.timeout_secs))?;
    let transport = TeamsTransport::new(client);

    if dry_run {
        let request = transport.preview(alert, config)?;
        println!("{}", preview_json(&request)?);
        return Ok(());
    }

    let result = transport.deliver(alert, config);
    let record = DeliveryRecord {
        ts: now_rfc3339(),
        transport: transport.name(),
        uid: &alert.uid,
        outcome: if result.is_ok() { "ok" } else { "failed" },
        status: result
            .as_ref()
            .err()
            .and_then(|e| e.failure())
            .and_then(|f| f.status),
        error: result.as_ref().err().map(ToString::to_string),
    };
    println!("{}", serde_json::to_string(&record)?);

    result.context("Delivery failed")
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&ConfigSchema::template())?);
        }
        Commands::Validate => {
            let config = resolve_config(&cli.transport)?;
            println!(
                "OK: {} via {}{}",
                config.webhook_url,
                config.connection_method,
                if config.use_json { " (JSON)" } else { "" }
            );
        }
        Commands::Test { dry_run } => {
            let config = resolve_config(&cli.transport)?;
            deliver(&cli.transport, &config, &AlertEvent::self_test(), dry_run)?;
        }
        Commands::Send {
            title,
            message,
            message_file,
            state,
            uid,
            dry_run,
        } => {
            let config = resolve_config(&cli.transport)?;
            let state = AlertState::from_name(&state)
                .with_context(|| format!("Unknown alert state: {state}"))?;
            let alert = AlertEvent {
                title,
                message: read_message(message, message_file.as_deref())?,
                state,
                uid,
            };
            deliver(&cli.transport, &config, &alert, dry_run)?;
        }
    }

    Ok(())
}
