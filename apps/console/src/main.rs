pub mod commands;
pub mod config;
pub mod dashboard;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::io::{stdout, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use zone_engine::{RegulationEvent, ZoneId, ZoneSeed, ZoneStore};

use crate::commands::{Command, HELP};

#[derive(Parser, Debug)]
#[command(name = "zone-console", about = "Terminal dashboard for simulated thermal zones")]
struct Args {
    /// TOML file with [regulation] settings and [[zones]]
    #[arg(long, env = "ZONES_CONFIG")]
    config: Option<PathBuf>,

    /// Reprint the dashboard every N milliseconds (0 = only on `list`)
    #[arg(long, default_value_t = 0)]
    refresh_ms: u64,
}

fn reseed(store: &ZoneStore, seeds: Option<&Vec<ZoneSeed>>) -> Result<()> {
    match seeds {
        Some(seeds) => store
            .seed_with(seeds.clone())
            .context("configured zones rejected"),
        None => {
            store.seed();
            Ok(())
        }
    }
}

fn execute(store: &ZoneStore, seeds: Option<&Vec<ZoneSeed>>, command: Command) -> Result<()> {
    let mut out = stdout();
    match command {
        Command::List => writeln!(out, "{}", dashboard::render(&store.snapshot(), Local::now()))?,
        Command::Toggle(id) => {
            if store.toggle(id) {
                print_zone(store, id)?;
            } else {
                writeln!(out, "no zone {}", id)?;
            }
        }
        Command::Setpoint(id, value) => {
            if store.set_setpoint(id, value) {
                print_zone(store, id)?;
            } else {
                writeln!(out, "no zone {}", id)?;
            }
        }
        Command::Mode(id, mode) => {
            if store.set_mode(id, mode) {
                print_zone(store, id)?;
            } else {
                writeln!(out, "no zone {}", id)?;
            }
        }
        Command::All(on) => {
            let changed = store.switch_all(on);
            writeln!(out, "{} zones switched {}", changed, if on { "on" } else { "off" })?;
        }
        Command::Details(id) => match store.zone(id) {
            Some(zone) => writeln!(out, "{}", dashboard::details(&zone))?,
            None => writeln!(out, "no zone {}", id)?,
        },
        Command::Json => {
            let json = serde_json::to_string_pretty(&store.snapshot())?;
            writeln!(out, "{}", json)?;
        }
        Command::Reseed => {
            reseed(store, seeds)?;
            writeln!(out, "zones reloaded")?;
        }
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Quit => {}
    }
    out.flush()?;
    Ok(())
}

fn print_zone(store: &ZoneStore, id: ZoneId) -> Result<()> {
    if let Some(zone) = store.zone(id) {
        println!("{}", dashboard::zone_line(&zone));
    }
    Ok(())
}

async fn watch_events(mut events: Receiver<RegulationEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(line) = dashboard::describe_event(&event) {
                    println!("{} {}", Local::now().format("%H:%M:%S"), line);
                }
            }
            Err(RecvError::Lagged(missed)) => warn!(missed, "event printer fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn refresh(store: ZoneStore, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        println!("{}", dashboard::render(&store.snapshot(), Local::now()));
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref()).await?;
    let store = ZoneStore::new(cfg.regulation.to_config()?)?;
    let seeds = cfg.zones.as_ref();
    reseed(&store, seeds)?;

    tokio::spawn(watch_events(store.subscribe()));
    if args.refresh_ms > 0 {
        tokio::spawn(refresh(store.clone(), Duration::from_millis(args.refresh_ms)));
    } else {
        println!("{}", dashboard::render(&store.snapshot(), Local::now()));
    }
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => {
                if let Err(e) = execute(&store, seeds, command) {
                    println!("ERROR: {:#}", e);
                }
            }
            Err(e) => println!("ERROR: {}", e),
        }
    }

    store.engine().stop_all();
    Ok(())
}
