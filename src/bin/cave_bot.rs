use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use cave_bot::config::{self, BotConfig};
use cave_bot::mapgen;
use cave_bot::{CaveBot, ConsoleTransport, InboundEvent, Transport};

#[derive(Parser)]
#[command(name = "cave-bot")]
#[command(about = "Treasure-hunt cave minigame bot")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run rounds, reading events as JSON lines on stdin and writing
    /// outbound messages as JSON lines on stdout
    Run {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        world_id: Option<String>,

        #[arg(long)]
        admin: Option<String>,
    },
    /// Generate one world and print a summary
    Generate {
        #[arg(long, default_value = "1000")]
        seed: u32,

        #[arg(long, default_value = "400")]
        width: usize,

        #[arg(long, default_value = "200")]
        height: usize,
    },
}

#[derive(Serialize)]
struct WorldSummary {
    seed: u32,
    width: usize,
    height: usize,
    spawn_x: i32,
    spawn_y: i32,
    surface_min: Option<i32>,
    surface_max: Option<i32>,
    foreground: BTreeMap<String, usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match Args::parse().command {
        Command::Run { config, world_id, admin } => run(config, world_id, admin).await?,
        Command::Generate { seed, width, height } => generate(seed, width, height)?,
    }
    Ok(())
}

async fn run(
    config_path: Option<PathBuf>,
    world_id: Option<String>,
    admin: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path.unwrap_or_else(config::config_path);
    let mut config = BotConfig::load(&path)?;
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(world_id) = world_id {
        config.world_id = world_id;
    }
    if let Some(admin) = admin {
        config.admin_username = admin;
    }
    config.validate()?;

    let transport = Arc::new(ConsoleTransport::stdout(config.chat_prefix.clone()));
    transport.connect(&config.world_id)?;
    info!(world_id = %config.world_id, admin = %config.admin_username, "connected");

    let bot = CaveBot::new(config, transport);
    bot.setup()?;
    bot.start().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match InboundEvent::from_json_line(&line) {
                    Ok(event) => {
                        if let Err(e) = bot.dispatch(&event).await {
                            warn!("event handling failed: {}", e);
                        }
                    }
                    Err(e) => warn!("{}", e),
                }
            }
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
        }
    }

    bot.stop().await;
    Ok(())
}

fn generate(seed: u32, width: usize, height: usize) -> Result<(), Box<dyn std::error::Error>> {
    let world = mapgen::generate(seed, width, height);

    let mut foreground = BTreeMap::new();
    for (_, _, tile) in world.map.foreground.iter() {
        *foreground.entry(format!("{:?}", tile)).or_insert(0) += 1;
    }

    let summary = WorldSummary {
        seed,
        width,
        height,
        spawn_x: world.spawn_x,
        spawn_y: world.spawn_y,
        surface_min: world.terrain.heights().iter().min().copied(),
        surface_max: world.terrain.heights().iter().max().copied(),
        foreground,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
