//! Standalone Sideband server entry point.
//!
//! Wires the pieces together: configuration, logging, the in-memory
//! bot session, the default snapshot registry, the broadcast hub, the
//! observer server, and (by default) the simulated feed.
//!
//! # Startup sequence
//!
//! 1. Load `sideband.yaml` (first CLI argument overrides the path;
//!    missing file means defaults)
//! 2. Initialize structured logging (tracing)
//! 3. Build the session, the dispatch table, and the hub
//! 4. Start the broadcast loop
//! 5. Spawn the simulated feed (if enabled)
//! 6. Spawn the observer server and watch both long-lived tasks
//!
//! The process exits non-zero if either the observer server or the
//! broadcast loop terminates: a stalled broadcast loop would be
//! indistinguishable from "no updates" for every connected overlay, so
//! it is treated as fatal rather than hidden.

mod config;
mod feed;
mod registry;
mod session;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sideband_hub::Hub;
use sideband_observer::{spawn_observer, AppState, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::SidebandConfig;
use crate::session::{BotSession, EmulatorContext, GameInfo, ProfileInfo};

/// Default configuration path when no CLI argument is given.
const DEFAULT_CONFIG_PATH: &str = "sideband.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if initialization fails or either long-lived task
/// (observer server, broadcast loop) terminates.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from(DEFAULT_CONFIG_PATH));
    let config = SidebandConfig::load_or_default(Path::new(&config_path))
        .with_context(|| format!("loading {config_path}"))?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(config_path, "sideband starting");

    // 3. Build the session, registry, and hub.
    let session = Arc::new(BotSession::new());
    session.attach_emulator(demo_emulator());

    let table = registry::build_dispatch_table(&session).context("building snapshot registry")?;
    info!(snapshots = table.len(), "snapshot registry built");

    let hub = Arc::new(Hub::new(table));

    // 4. Start the broadcast loop.
    let broadcast_period = Duration::from_millis(config.broadcast.interval_ms.max(1));
    let mut loop_handle = hub.start(broadcast_period);
    info!(period_ms = config.broadcast.interval_ms, "broadcast loop started");

    // 5. Spawn the simulated feed.
    let _feed_handle = config.feed.enabled.then(|| {
        feed::spawn_feed(Arc::clone(&hub), Arc::clone(&session), config.feed.clone())
    });

    // 6. Spawn the observer server and watch both tasks.
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let state = Arc::new(AppState::new(Arc::clone(&hub)));
    let mut server_handle = spawn_observer(&server_config, state)
        .await
        .context("starting observer server")?;

    tokio::select! {
        joined = &mut server_handle => {
            loop_handle.abort();
            match joined {
                Ok(Ok(())) => anyhow::bail!("observer server exited unexpectedly"),
                Ok(Err(e)) => Err(e).context("observer server failed"),
                Err(e) => Err(e).context("observer server task panicked"),
            }
        }
        joined = &mut loop_handle => {
            server_handle.abort();
            error!("broadcast loop terminated; exiting");
            match joined {
                Ok(Ok(())) => anyhow::bail!("broadcast loop exited unexpectedly"),
                Ok(Err(e)) => Err(e).context("broadcast loop failed"),
                Err(e) => Err(e).context("broadcast loop task panicked"),
            }
        }
    }
}

/// The demo emulator context attached on startup.
///
/// A real bot process would attach its own context (and keep it
/// updated); the standalone server fakes one so the `emulator` and
/// `fps` snapshots have data.
fn demo_emulator() -> EmulatorContext {
    EmulatorContext {
        emulation_speed: 1.0,
        video_enabled: true,
        audio_enabled: false,
        bot_mode: String::from("Spin"),
        current_message: String::from("Starting up"),
        frame_count: 0,
        current_fps: 60,
        profile: ProfileInfo {
            name: String::from("emerald-demo"),
        },
        game: GameInfo {
            title: String::from("POKEMON EMER"),
            name: String::from("Pokémon Emerald"),
            language: String::from("English"),
            revision: 0,
        },
    }
}
