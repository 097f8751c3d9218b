//! iso-world-sim binary
//!
//! Runs the isometric world headless: loads rooms from a data directory,
//! replays an optional intent script (one JSON `TickIntent` per line) and
//! prints every outbound event as a JSON line on stdout.
//!
//! ## Configuration (env / TOML via `config` crate)
//!
//! Tuning constants (`SimConfig` keys) come from the optional `--config` TOML
//! file, overridden by `ISO_WORLD_<KEY>` environment variables
//! (e.g. `ISO_WORLD_WALK_SPEED=2`).
//!
//! | Flag / env                 | Default   | Description                        |
//! |----------------------------|-----------|------------------------------------|
//! | `ISO_WORLD_DATA_DIR`       | `data`    | Directory holding `roomNNN.json`   |
//! | `ISO_WORLD_ROOM`           | `1`       | Starting room                      |
//! | `ISO_WORLD_X/Y/Z`          | `0`       | Spawn position in tiles            |
//! | `ISO_WORLD_TICK_RATE_HZ`   | `60`      | Tick rate                          |
//! | `ISO_WORLD_TICKS`          | unlimited | Stop after this many ticks         |
//! | `ISO_WORLD_INTENTS`        | none      | Intent script (JSON lines)         |

use anyhow::{Context, Result};
use clap::Parser;
use iso_world::{
    protocol::TickIntent,
    room::DirectoryLoader,
    runner::{RunnerConfig, SimRunner},
    session::GameSession,
    types::{SimConfig, Vec3},
    warp::RoomId,
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "iso-world-sim", about = "Headless isometric world simulator", version)]
struct Args {
    /// TOML file with simulation constants
    #[arg(long, env = "ISO_WORLD_CONFIG")]
    config: Option<PathBuf>,

    /// Room data directory
    #[arg(long, env = "ISO_WORLD_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Starting room id
    #[arg(long, env = "ISO_WORLD_ROOM", default_value_t = 1)]
    room: u16,

    /// Spawn X in tiles
    #[arg(short = 'x', long, env = "ISO_WORLD_X", default_value_t = 0.0)]
    x: f32,

    /// Spawn Y in tiles
    #[arg(short = 'y', long, env = "ISO_WORLD_Y", default_value_t = 0.0)]
    y: f32,

    /// Spawn Z in tiles
    #[arg(short = 'z', long, env = "ISO_WORLD_Z", default_value_t = 0.0)]
    z: f32,

    /// Start with the debug display enabled
    #[arg(long, env = "ISO_WORLD_DEBUG")]
    debug: bool,

    /// Emit a frame snapshot every tick
    #[arg(long, env = "ISO_WORLD_FRAMES")]
    frames: bool,

    /// Session name stamped on events
    #[arg(long, env = "ISO_WORLD_SESSION", default_value = "default")]
    session: String,

    /// Tick rate (Hz)
    #[arg(long, env = "ISO_WORLD_TICK_RATE_HZ", default_value_t = 60.0)]
    tick_rate_hz: f32,

    /// Stop after this many ticks
    #[arg(long, env = "ISO_WORLD_TICKS")]
    ticks: Option<u64>,

    /// Intent script, one JSON object per line
    #[arg(long, env = "ISO_WORLD_INTENTS")]
    intents: Option<PathBuf>,
}

fn read_intents(path: &Path) -> Result<Vec<TickIntent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading intent script {}", path.display()))?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid intent", path.display(), n + 1))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("iso_world=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let sim_config =
        SimConfig::load(args.config.as_deref()).context("reading simulation constants")?;

    tracing::info!(
        "Starting iso-world-sim (data='{}', room={}, tile_size={})",
        args.data_dir.display(),
        args.room,
        sim_config.tile_size,
    );

    let t = sim_config.tile_size;
    let spawn = Vec3::new(args.x * t, args.y * t, args.z * t);
    let loader = Arc::new(DirectoryLoader::new(&args.data_dir));
    let mut session = GameSession::start(sim_config, loader, RoomId(args.room), spawn)
        .with_context(|| format!("loading starting room {}", RoomId(args.room)))?;
    session.set_debug(args.debug);
    let session = Arc::new(Mutex::new(session));

    // Intent feed: replay the script, or idle until a stop condition.
    let (intent_tx, intent_rx) = mpsc::channel(256);
    let scripted = args.intents.is_some();
    let mut idle_feed = None;
    if let Some(path) = &args.intents {
        let script = read_intents(path)?;
        tracing::info!("Replaying {} intents from {}", script.len(), path.display());
        tokio::spawn(async move {
            for intent in script {
                if intent_tx.send(intent).await.is_err() {
                    break;
                }
            }
        });
    } else {
        // Held open so the runner never sees the channel as drained.
        idle_feed = Some(intent_tx);
    }

    let (out_tx, mut out_rx) = mpsc::channel::<String>(1024);
    let printer = tokio::spawn(async move {
        while let Some(line) = out_rx.recv().await {
            println!("{line}");
        }
    });

    let runner_config = RunnerConfig {
        session: args.session,
        tick_rate_hz: args.tick_rate_hz,
        max_ticks: args.ticks,
        stop_when_drained: scripted,
        emit_frames: args.frames,
    };
    let ticks = SimRunner::new(runner_config, session.clone())
        .run(intent_rx, out_tx)
        .await?;
    drop(idle_feed);
    printer.await.context("output task panicked")?;

    let stats = session.lock().stats();
    tracing::info!(
        "Stopped after {} ticks in room {} ({} warps, {} room loads)",
        ticks,
        RoomId(stats.room),
        stats.warps_taken,
        stats.room_loads,
    );
    Ok(())
}
