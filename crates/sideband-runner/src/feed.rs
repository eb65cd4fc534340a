//! Simulated bot feed for standalone runs.
//!
//! A real deployment embeds the hub in the bot process, whose memory
//! hooks call `Hub::invalidate` as the game changes. This feed stands
//! in for those hooks: it mutates the [`BotSession`] on a fixed period
//! and invalidates the affected snapshots through the exact same call
//! path, so overlays can be developed against a live-looking server
//! without an emulator.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use sideband_hub::Hub;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::FeedSection;
use crate::session::{BotSession, PartyMember};

/// Species pool for simulated encounters.
const SPECIES: &[&str] = &[
    "Poochyena",
    "Zigzagoon",
    "Wurmple",
    "Ralts",
    "Seedot",
    "Taillow",
];

/// Event flags the feed may flip on over time.
const FLAGS: &[&str] = &["BADGE01_GET", "BADGE02_GET", "SYS_GAME_CLEAR"];

/// Demo-inflated shiny odds.
const SHINY_CHANCE: f64 = 1.0 / 64.0;

/// Spawn the simulated feed task.
pub fn spawn_feed(hub: Arc<Hub>, session: Arc<BotSession>, config: FeedSection) -> JoinHandle<()> {
    info!(
        interval_ms = config.interval_ms,
        seed = config.seed,
        "simulated feed starting"
    );

    tokio::spawn(async move {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut ticker =
            tokio::time::interval(Duration::from_millis(config.interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            step(&hub, &session, &mut rng, config.interval_ms);
        }
    })
}

/// Run one feed step: advance the emulator, maybe roll an encounter,
/// maybe flip a flag, and invalidate whatever changed.
fn step(hub: &Hub, session: &BotSession, rng: &mut StdRng, interval_ms: u64) {
    // Advance roughly real-time at ~60 fps.
    let frames = interval_ms.saturating_mul(60) / 1000;
    let fps = rng.random_range(57..=61);
    session.advance_frames(frames, fps);
    hub.invalidate("emulator");
    hub.invalidate("fps");

    if rng.random_bool(0.6) {
        let species = SPECIES.choose(rng).copied().unwrap_or("Zigzagoon");
        let level = rng.random_range(2..=5);
        let shiny = rng.random_bool(SHINY_CHANCE);

        session.set_game_state("BATTLE");
        session.set_message(&format!("Encountered a wild {species}"));
        session.record_encounter(species, level, shiny);

        hub.invalidate("trainer");
        hub.invalidate("encounter_log");
        hub.invalidate("encounter_rate");
        hub.invalidate("stats");
        if shiny {
            debug!(species, "simulated shiny encounter");
            session.add_party_member(PartyMember {
                species: species.to_owned(),
                nickname: None,
                level,
                current_hp: 20,
                max_hp: 20,
                is_shiny: true,
            });
            hub.invalidate("shiny_log");
            hub.invalidate("party");
        }
    } else {
        session.set_game_state("OVERWORLD");
        session.set_message("Spinning...");
        hub.invalidate("trainer");
    }

    if rng.random_bool(0.02) {
        if let Some(flag) = FLAGS.choose(rng) {
            session.set_event_flag(flag, true);
            hub.invalidate("event_flags");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::build_dispatch_table;
    use crate::session::{EmulatorContext, GameInfo, ProfileInfo};

    fn demo_emulator() -> EmulatorContext {
        EmulatorContext {
            emulation_speed: 1.0,
            video_enabled: true,
            audio_enabled: false,
            bot_mode: String::from("Spin"),
            current_message: String::new(),
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

    #[test]
    fn step_invalidates_emulator_and_fps_every_time() {
        let session = Arc::new(BotSession::new());
        session.attach_emulator(demo_emulator());
        let table = build_dispatch_table(&session).unwrap();
        let hub = Hub::new(table);
        let mut rng = StdRng::seed_from_u64(7);

        step(&hub, &session, &mut rng, 2000);

        let kinds: Vec<String> = hub
            .queue()
            .drain_all()
            .into_iter()
            .map(|m| m.kind)
            .collect();
        assert!(kinds.contains(&String::from("emulator")));
        assert!(kinds.contains(&String::from("fps")));
        assert!(kinds.contains(&String::from("trainer")));
    }

    #[test]
    fn stepping_advances_the_frame_counter() {
        let session = Arc::new(BotSession::new());
        session.attach_emulator(demo_emulator());
        let table = build_dispatch_table(&session).unwrap();
        let hub = Hub::new(table);
        let mut rng = StdRng::seed_from_u64(7);

        step(&hub, &session, &mut rng, 2000);
        step(&hub, &session, &mut rng, 2000);

        let emulator = session.emulator_snapshot().unwrap().unwrap();
        assert_eq!(emulator["frame_count"], 240);
    }
}
