//! dnsvigil - offline inspector for the passive DNS monitor.
//!
//! Feeds captured payloads through the same interpreter the live monitor
//! embeds and prints the resulting event stream. Useful for debugging
//! capture pipelines and for poking at suspicious payloads by hand.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dnsvigil_analyzer::{CollectingSink, Connection, DnsSession, Transport};
use dnsvigil_config::MonitorConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

/// dnsvigil - passive DNS monitor, offline inspector
#[derive(Parser, Debug)]
#[command(name = "dnsvigil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Emit events as JSON instead of text
    #[arg(short, long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a single DNS message (UDP semantics)
    Message {
        /// File with the raw message bytes
        #[arg(value_name = "FILE", required_unless_present = "hex")]
        input: Option<PathBuf>,

        /// Message as a hex string instead of a file
        #[arg(short = 'x', long, value_name = "HEX")]
        hex: Option<String>,

        /// Treat the payload as responder-side
        #[arg(short, long)]
        response: bool,

        /// Originator endpoint of the synthetic connection
        #[arg(long, default_value = "10.0.0.1:40000")]
        orig: SocketAddr,

        /// Responder endpoint of the synthetic connection
        #[arg(long, default_value = "192.0.2.53:53")]
        resp: SocketAddr,
    },

    /// Parse a captured TCP stream of length-prefixed messages
    Stream {
        /// File with the raw stream bytes
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Treat the stream as responder-side
        #[arg(short, long)]
        response: bool,

        /// Originator endpoint of the synthetic connection
        #[arg(long, default_value = "10.0.0.1:40000")]
        orig: SocketAddr,

        /// Responder endpoint of the synthetic connection
        #[arg(long, default_value = "192.0.2.53:53")]
        resp: SocketAddr,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file to check
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn init_logging(config: &MonitorConfig, cli_level: Option<&str>) {
    let level = cli_level
        .map(parse_log_level)
        .unwrap_or_else(|| parse_log_level(&config.logging.level));

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<MonitorConfig> {
    match path {
        Some(path) => MonitorConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(MonitorConfig::default()),
    }
}

/// Reads payload bytes from a file or a hex string.
fn read_payload(input: Option<&PathBuf>, hex: Option<&str>) -> Result<Vec<u8>> {
    if let Some(hex) = hex {
        let compact: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
        return data_encoding::HEXLOWER_PERMISSIVE
            .decode(compact.as_bytes())
            .context("decoding hex payload");
    }

    let path = input.expect("clap enforces file-or-hex");
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn print_events(sink: &CollectingSink, json: bool) -> Result<()> {
    if json {
        let out = serde_json::json!({
            "events": sink.events(),
            "weirds": sink.weirds(),
            "confirmations": sink.confirmations(),
            "violations": sink.violations(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for event in sink.events() {
        println!(
            "{:<20} {}",
            event.kind().name(),
            serde_json::to_string(event)?
        );
    }
    for weird in sink.weirds() {
        println!("weird: {weird}");
    }

    Ok(())
}

fn run_message(
    config: MonitorConfig,
    payload: &[u8],
    response: bool,
    orig: SocketAddr,
    resp: SocketAddr,
    json: bool,
) -> Result<()> {
    let mut session = DnsSession::new(
        Arc::new(config),
        Connection::new(orig, resp),
        Transport::Udp,
    );
    let mut sink = CollectingSink::new();

    debug!(len = payload.len(), "parsing single message");
    session.deliver_packet(!response, payload, 0.0, &mut sink);
    session.done(&mut sink);

    let failed = sink
        .events()
        .iter()
        .any(|e| e.kind() == dnsvigil_analyzer::EventKind::NonDnsRequest);

    print_events(&sink, json)?;

    if failed {
        bail!("payload did not parse as DNS");
    }
    Ok(())
}

fn run_stream(
    config: MonitorConfig,
    stream: &[u8],
    response: bool,
    orig: SocketAddr,
    resp: SocketAddr,
    json: bool,
) -> Result<()> {
    let mut session = DnsSession::new(
        Arc::new(config),
        Connection::new(orig, resp),
        Transport::Tcp,
    );
    let mut sink = CollectingSink::new();

    debug!(len = stream.len(), "parsing TCP stream");
    session.deliver_stream(!response, stream, 0.0, &mut sink);
    session.connection_closed(&mut sink);
    session.done(&mut sink);

    print_events(&sink, json)
}

fn run_validate(file: &PathBuf) -> Result<()> {
    let config = MonitorConfig::from_file(file)
        .with_context(|| format!("validating {}", file.display()))?;

    println!("{} is valid", file.display());
    println!(
        "  max_queries: {}  session_timeout: {}s",
        config.max_queries, config.session_timeout
    );
    println!(
        "  skip_auth: {} addrs  skip_addl: {} addrs",
        config.skip_auth.len(),
        config.skip_addl.len()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    init_logging(&config, cli.log_level.as_deref());

    match cli.command {
        Commands::Message {
            input,
            hex,
            response,
            orig,
            resp,
        } => {
            let payload = read_payload(input.as_ref(), hex.as_deref())?;
            run_message(config, &payload, response, orig, resp, cli.json)
        }
        Commands::Stream {
            input,
            response,
            orig,
            resp,
        } => {
            let stream =
                std::fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
            run_stream(config, &stream, response, orig, resp, cli.json)
        }
        Commands::Validate { file } => run_validate(&file),
    }
}
