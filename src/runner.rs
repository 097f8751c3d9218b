//! Headless runner – drives a [`GameSession`] at a fixed tick rate.
//!
//! ## Event contract (inbound)
//!
//! One [`TickIntent`] is taken from the intent channel per tick; an empty
//! channel means an idle tick.
//!
//! ## Event contract (outbound)
//!
//! Every message is a JSON-encoded [`FrameEvent`]:
//!
//! | Channel            | Payload type        |
//! |--------------------|---------------------|
//! | `room.loaded`      | `RoomLoaded`        |
//! | `room.load_failed` | `RoomLoadFailed`    |
//! | `warp.taken`       | `WarpTaken`         |
//! | `entity.carry`     | `CarryEvent`        |
//! | `entity.touching`  | `Vec<usize>`        |
//! | `frame`            | `FrameSnapshot`     |

use crate::protocol::{channels, FrameEvent, TickIntent};
use crate::session::{GameSession, TickEvents};
use anyhow::Result;
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Name stamped on every outbound event.
    pub session: String,
    /// Tick rate in Hz.
    pub tick_rate_hz: f32,
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// Stop once the intent channel is closed and empty.
    pub stop_when_drained: bool,
    /// Publish a `frame` snapshot every tick.
    pub emit_frames: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            session: "default".into(),
            tick_rate_hz: 60.0,
            max_ticks: None,
            stop_when_drained: true,
            emit_frames: false,
        }
    }
}

// ---------------------------------------------------------------------------
// SimRunner
// ---------------------------------------------------------------------------

pub struct SimRunner {
    config: RunnerConfig,
    session: Arc<Mutex<GameSession>>,
}

impl SimRunner {
    pub fn new(config: RunnerConfig, session: Arc<Mutex<GameSession>>) -> Self {
        Self { config, session }
    }

    /// Run the tick loop until a stop condition or Ctrl-C. Returns the number
    /// of ticks simulated.
    pub async fn run(
        self,
        mut intents: mpsc::Receiver<TickIntent>,
        out: mpsc::Sender<String>,
    ) -> Result<u64> {
        let session_name = self.config.session.as_str();
        info!(
            "SimRunner '{}' ticking at {:.0}Hz",
            session_name, self.config.tick_rate_hz
        );

        let loaded = self.session.lock().room_loaded_event();
        publish(&out, FrameEvent::new(session_name, 0, channels::ROOM_LOADED, loaded)).await;

        let interval = Duration::from_secs_f32(1.0 / self.config.tick_rate_hz.max(1.0));
        let mut timer = tokio::time::interval(interval);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let mut ticks = 0u64;
        loop {
            if self.config.max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }

            tokio::select! {
                _ = timer.tick() => {}
                _ = &mut ctrl_c => {
                    info!("SimRunner shutting down (SIGINT)");
                    break;
                }
            }

            let intent = match intents.try_recv() {
                Ok(intent) => intent,
                Err(TryRecvError::Empty) => TickIntent::idle(),
                Err(TryRecvError::Disconnected) if self.config.stop_when_drained => break,
                Err(TryRecvError::Disconnected) => TickIntent::idle(),
            };

            // Hold the lock only long enough to tick, then release before publishing.
            let (events, snapshot) = {
                let mut session = self.session.lock();
                let events = session.tick(&intent);
                let snapshot = self.config.emit_frames.then(|| session.snapshot());
                (events, snapshot)
            };
            ticks += 1;

            if !publish_tick(&out, session_name, &events).await {
                break;
            }
            if let Some(snapshot) = snapshot {
                let frame = FrameEvent::new(session_name, events.tick, channels::FRAME, snapshot);
                if !publish(&out, frame).await {
                    break;
                }
            }
        }

        Ok(ticks)
    }
}

// ---------------------------------------------------------------------------
// Publish helpers
// ---------------------------------------------------------------------------

async fn publish_tick(out: &mpsc::Sender<String>, session: &str, events: &TickEvents) -> bool {
    let frame = events.tick;
    let mut ok = true;
    if let Some(loaded) = &events.room_loaded {
        ok &= publish(out, FrameEvent::new(session, frame, channels::ROOM_LOADED, loaded)).await;
    }
    if let Some(failed) = &events.room_load_failed {
        ok &= publish(out, FrameEvent::new(session, frame, channels::ROOM_LOAD_FAILED, failed)).await;
    }
    if let Some(warp) = &events.warp {
        ok &= publish(out, FrameEvent::new(session, frame, channels::WARP_TAKEN, warp)).await;
    }
    for carry in &events.carry {
        ok &= publish(out, FrameEvent::new(session, frame, channels::CARRY, carry)).await;
    }
    if !events.touching.is_empty() {
        let ids: Vec<usize> = events.touching.iter().map(|id| id.0).collect();
        ok &= publish(out, FrameEvent::new(session, frame, channels::TOUCHING, ids)).await;
    }
    ok
}

/// Serialise `event` and send it. Returns `false` once the receiver is gone.
///
/// Serialisation errors are logged and the event is skipped.
async fn publish<T: serde::Serialize>(out: &mpsc::Sender<String>, event: FrameEvent<T>) -> bool {
    match serde_json::to_string(&event) {
        Ok(line) => out.send(line).await.is_ok(),
        Err(e) => {
            warn!("Failed to serialise event for {}: {}", event.channel, e);
            true
        }
    }
}
