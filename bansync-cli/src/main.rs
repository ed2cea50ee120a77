use anyhow::{bail, Context, Result};
use bansync_core::config::BotConfig;
use bansync_core::logging::init_logging_with_config;
use bansync_core::registry::{JsonFileStore, LinkRegistry};
use bansync_core::telemetry;
use bansync_core::transport::RecordingTransport;
use bansync_core::{BanSyncBot, BotEvent, LinkOutcome, LogLevel, RoomId};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "bansync")]
#[command(author, version, about = "Keep bans in sync across linked chat rooms", long_about = None)]
struct Args {
    /// Override the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// TOML configuration file; BANSYNC_* environment variables are used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Link store path, overriding the configuration
    #[arg(short, long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every link group
    Links,

    /// Show the rooms linked to a room
    Linked { room: String },

    /// Link two rooms
    Link { room_a: String, room_b: String },

    /// Remove a room from its link group
    Unlink { room: String },

    /// Feed JSON-lines bot events through the bot and print the resulting
    /// transport calls as JSON lines
    Replay {
        /// Event file, `-` for stdin
        input: PathBuf,

        /// Alias resolution entries, `#name:server=!roomid`
        #[arg(long = "alias", value_name = "ALIAS=ROOM")]
        aliases: Vec<String>,
    },
}

fn load_config(args: &Args) -> Result<BotConfig> {
    let mut config = match &args.config {
        Some(path) => BotConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => BotConfig::from_env().context("loading configuration from environment")?,
    };

    if let Some(store) = &args.store {
        config.store_path = store.clone();
    }
    if let Some(level) = &args.log_level {
        let level: LogLevel = level.parse()?;
        config.logging.level = level.to_string();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    Ok(config)
}

fn open_registry(config: &BotConfig) -> Result<LinkRegistry<JsonFileStore>> {
    let mut registry = LinkRegistry::open(&config.store_path);
    registry
        .load()
        .with_context(|| format!("loading link store {}", config.store_path.display()))?;
    Ok(registry)
}

fn parse_alias(entry: &str) -> Result<(String, RoomId)> {
    match entry.split_once('=') {
        Some((alias, room)) if !alias.is_empty() && !room.is_empty() => {
            Ok((alias.to_string(), RoomId::from(room)))
        }
        _ => bail!("invalid alias entry '{}', expected #name:server=!roomid", entry),
    }
}

fn read_events(input: &Path) -> Result<Vec<BotEvent>> {
    let reader: Box<dyn BufRead> = if input.as_os_str() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file =
            File::open(input).with_context(|| format!("opening {}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line)
            .with_context(|| format!("parsing event on line {}", index + 1))?;
        events.push(event);
    }
    Ok(events)
}

async fn replay(config: &BotConfig, input: &Path, aliases: &[String]) -> Result<()> {
    let mut transport = RecordingTransport::new();
    for entry in aliases {
        let (alias, room) = parse_alias(entry)?;
        transport = transport.with_alias(alias, room);
    }
    let transport = Arc::new(transport);

    let events = read_events(input)?;
    debug!(events = events.len(), "Replaying events");

    let mut bot = BanSyncBot::from_config(config, open_registry(config)?, Arc::clone(&transport));
    for event in events {
        bot.handle_event(event).await?;
    }

    let mut stdout = io::stdout().lock();
    for call in transport.calls() {
        writeln!(stdout, "{}", serde_json::to_string(&call)?)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging_with_config(config.log_config())?;
    telemetry::init_metrics();
    debug!(store = %config.store_path.display(), "bansync started");

    match &args.command {
        Command::Links => {
            let registry = open_registry(&config)?;
            for (index, group) in registry.groups().iter().enumerate() {
                let rooms: Vec<&str> = group.channels().iter().map(RoomId::as_str).collect();
                println!("{}: {}", index, rooms.join(", "));
            }
        }
        Command::Linked { room } => {
            let registry = open_registry(&config)?;
            for linked in registry.get_linked_channels(&RoomId::from(room.as_str())) {
                println!("{}", linked);
            }
        }
        Command::Link { room_a, room_b } => {
            let mut registry = open_registry(&config)?;
            let outcome = registry
                .link_channels(&RoomId::from(room_a.as_str()), &RoomId::from(room_b.as_str()))?;
            match outcome {
                LinkOutcome::AlreadyLinked => println!("already linked"),
                _ => println!("linked"),
            }
        }
        Command::Unlink { room } => {
            let mut registry = open_registry(&config)?;
            if registry.unlink_channels(&RoomId::from(room.as_str()))? {
                println!("unlinked");
            } else {
                println!("not linked");
            }
        }
        Command::Replay { input, aliases } => {
            replay(&config, input, aliases).await?;
        }
    }

    info!("bansync finished");
    Ok(())
}
