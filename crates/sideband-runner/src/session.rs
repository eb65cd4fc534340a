//! In-memory bot session state backing the default snapshot registry.
//!
//! [`BotSession`] is the stand-in for the bot process context: it holds
//! the trainer record, the party, the item bag, the emulator context,
//! run statistics, encounter logs, and event flags. Producers read it
//! through `Arc<BotSession>`; the feed (or a real bot) mutates it and
//! invalidates the affected snapshots on the hub.
//!
//! All methods take `&self`; the state sits behind an internal
//! read-write lock so synchronous producers can read it from any task.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sideband_types::ProducerError;

/// Number of fps samples kept for the `fps` snapshot.
const FPS_HISTORY_LEN: usize = 60;

/// Number of records kept in the encounter log.
const ENCOUNTER_LOG_LEN: usize = 10;

/// Number of records kept in the shiny log.
const SHINY_LOG_LEN: usize = 10;

/// The trainer identity record.
#[derive(Debug, Clone, Serialize)]
pub struct TrainerInfo {
    /// Trainer name as shown in-game.
    pub name: String,
    /// Public trainer id.
    pub trainer_id: u32,
    /// Number of badges earned.
    pub badges: u8,
    /// Money on hand.
    pub money: u32,
}

/// One member of the current party.
#[derive(Debug, Clone, Serialize)]
pub struct PartyMember {
    /// Species name.
    pub species: String,
    /// Nickname, if one was given.
    pub nickname: Option<String>,
    /// Current level.
    pub level: u8,
    /// Current hit points.
    pub current_hp: u16,
    /// Maximum hit points.
    pub max_hp: u16,
    /// Whether this member is shiny.
    pub is_shiny: bool,
}

/// One stack of items in the bag.
#[derive(Debug, Clone, Serialize)]
pub struct ItemSlot {
    /// Item name.
    pub name: String,
    /// Stack size.
    pub quantity: u16,
}

/// Metadata about the loaded game.
#[derive(Debug, Clone, Serialize)]
pub struct GameInfo {
    /// Cartridge title.
    pub title: String,
    /// Human-readable game name.
    pub name: String,
    /// Game language.
    pub language: String,
    /// Cartridge revision.
    pub revision: u8,
}

/// Metadata about the loaded profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileInfo {
    /// Profile name.
    pub name: String,
}

/// The emulator context exposed by the `emulator` snapshot.
///
/// Absent entirely when no emulator session is attached; the snapshot
/// then serializes as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct EmulatorContext {
    /// Speed factor; `0` means unthrottled.
    pub emulation_speed: f32,
    /// Whether video output is enabled.
    pub video_enabled: bool,
    /// Whether audio output is enabled.
    pub audio_enabled: bool,
    /// Current bot mode (e.g. `Manual`, `Spin`).
    pub bot_mode: String,
    /// Last status message from the bot.
    pub current_message: String,
    /// Frames emulated since start.
    pub frame_count: u64,
    /// Most recent fps sample.
    pub current_fps: u32,
    /// The loaded profile.
    pub profile: ProfileInfo,
    /// The loaded game.
    pub game: GameInfo,
}

/// One wild encounter, as recorded in the encounter and shiny logs.
#[derive(Debug, Clone, Serialize)]
pub struct EncounterRecord {
    /// Species encountered.
    pub species: String,
    /// Encounter level.
    pub level: u8,
    /// Whether the encounter was shiny.
    pub shiny: bool,
    /// Wall-clock time of the encounter.
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct RunTotals {
    total_encounters: u64,
    shiny_encounters: u64,
}

#[derive(Debug)]
struct Inner {
    trainer: TrainerInfo,
    game_state: String,
    party: Vec<PartyMember>,
    bag: BTreeMap<String, Vec<ItemSlot>>,
    emulator: Option<EmulatorContext>,
    fps_history: VecDeque<u32>,
    started_at: DateTime<Utc>,
    totals: RunTotals,
    encounter_log: VecDeque<EncounterRecord>,
    shiny_log: VecDeque<EncounterRecord>,
    event_flags: BTreeMap<String, bool>,
}

/// Thread-safe in-memory session state.
#[derive(Debug)]
pub struct BotSession {
    inner: RwLock<Inner>,
}

impl BotSession {
    /// Create a session with a small starting state and no emulator
    /// attached.
    #[must_use]
    pub fn new() -> Self {
        let mut bag = BTreeMap::new();
        bag.insert(
            String::from("items"),
            vec![
                ItemSlot {
                    name: String::from("Potion"),
                    quantity: 5,
                },
                ItemSlot {
                    name: String::from("Repel"),
                    quantity: 3,
                },
            ],
        );
        bag.insert(
            String::from("poke_balls"),
            vec![ItemSlot {
                name: String::from("Poke Ball"),
                quantity: 10,
            }],
        );

        let mut event_flags = BTreeMap::new();
        for flag in ["BADGE01_GET", "BADGE02_GET", "HAS_POKEDEX", "SYS_GAME_CLEAR"] {
            event_flags.insert(String::from(flag), false);
        }
        event_flags.insert(String::from("HAS_POKEDEX"), true);

        Self {
            inner: RwLock::new(Inner {
                trainer: TrainerInfo {
                    name: String::from("MAY"),
                    trainer_id: 21_856,
                    badges: 0,
                    money: 3000,
                },
                game_state: String::from("OVERWORLD"),
                party: vec![PartyMember {
                    species: String::from("Treecko"),
                    nickname: None,
                    level: 5,
                    current_hp: 20,
                    max_hp: 20,
                    is_shiny: false,
                }],
                bag,
                emulator: None,
                fps_history: VecDeque::new(),
                started_at: Utc::now(),
                totals: RunTotals::default(),
                encounter_log: VecDeque::new(),
                shiny_log: VecDeque::new(),
                event_flags,
            }),
        }
    }

    // -----------------------------------------------------------------
    // Mutators (called by the feed or a real bot process)
    // -----------------------------------------------------------------

    /// Attach an emulator context, making the `emulator` and `fps`
    /// snapshots available.
    pub fn attach_emulator(&self, context: EmulatorContext) {
        self.write().emulator = Some(context);
    }

    /// Advance the frame counter and record an fps sample.
    ///
    /// No-op while no emulator is attached.
    pub fn advance_frames(&self, frames: u64, fps: u32) {
        let mut inner = self.write();
        if let Some(emulator) = inner.emulator.as_mut() {
            emulator.frame_count = emulator.frame_count.saturating_add(frames);
            emulator.current_fps = fps;
        } else {
            return;
        }
        if inner.fps_history.len() >= FPS_HISTORY_LEN {
            inner.fps_history.pop_front();
        }
        inner.fps_history.push_back(fps);
    }

    /// Update the bot status message shown in the emulator snapshot.
    ///
    /// No-op while no emulator is attached.
    pub fn set_message(&self, message: &str) {
        if let Some(emulator) = self.write().emulator.as_mut() {
            emulator.current_message = message.to_owned();
        }
    }

    /// Set the current high-level game state (e.g. `OVERWORLD`, `BATTLE`).
    pub fn set_game_state(&self, state: &str) {
        self.write().game_state = state.to_owned();
    }

    /// Add a member to the party (capped at the usual six slots).
    pub fn add_party_member(&self, member: PartyMember) {
        let mut inner = self.write();
        if inner.party.len() < 6 {
            inner.party.push(member);
        }
    }

    /// Record a wild encounter, updating totals and the capped logs.
    pub fn record_encounter(&self, species: &str, level: u8, shiny: bool) {
        let record = EncounterRecord {
            species: species.to_owned(),
            level,
            shiny,
            at: Utc::now(),
        };

        let mut inner = self.write();
        inner.totals.total_encounters = inner.totals.total_encounters.saturating_add(1);
        if inner.encounter_log.len() >= ENCOUNTER_LOG_LEN {
            inner.encounter_log.pop_front();
        }
        inner.encounter_log.push_back(record.clone());

        if shiny {
            inner.totals.shiny_encounters = inner.totals.shiny_encounters.saturating_add(1);
            if inner.shiny_log.len() >= SHINY_LOG_LEN {
                inner.shiny_log.pop_front();
            }
            inner.shiny_log.push_back(record);
        }
    }

    /// Set (or create) an event flag.
    pub fn set_event_flag(&self, name: &str, value: bool) {
        self.write().event_flags.insert(name.to_owned(), value);
    }

    // -----------------------------------------------------------------
    // Snapshot readers (wired into the dispatch table)
    // -----------------------------------------------------------------

    /// The `trainer` snapshot: trainer record plus the current game state.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn trainer_snapshot(&self) -> Result<Option<Value>, ProducerError> {
        let inner = self.read();
        let mut data = serde_json::to_value(&inner.trainer)?;
        if let Value::Object(map) = &mut data {
            map.insert(
                String::from("game_state"),
                Value::String(inner.game_state.clone()),
            );
        }
        Ok(Some(data))
    }

    /// The `party` snapshot.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn party_snapshot(&self) -> Result<Option<Value>, ProducerError> {
        Ok(Some(serde_json::to_value(&self.read().party)?))
    }

    /// The `items` snapshot: bag contents grouped by pocket.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn items_snapshot(&self) -> Result<Option<Value>, ProducerError> {
        Ok(Some(serde_json::to_value(&self.read().bag)?))
    }

    /// The `emulator` snapshot, or `None` while no emulator is attached.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn emulator_snapshot(&self) -> Result<Option<Value>, ProducerError> {
        match &self.read().emulator {
            Some(context) => Ok(Some(serde_json::to_value(context)?)),
            None => Ok(None),
        }
    }

    /// The `fps` snapshot: recent samples newest-first, or `None` while
    /// no emulator is attached.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn fps_snapshot(&self) -> Result<Option<Value>, ProducerError> {
        let inner = self.read();
        if inner.emulator.is_none() {
            return Ok(None);
        }
        let newest_first: Vec<u32> = inner.fps_history.iter().rev().copied().collect();
        Ok(Some(serde_json::to_value(newest_first)?))
    }

    /// The `stats` snapshot: cumulative run statistics.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn stats_snapshot(&self) -> Result<Option<Value>, ProducerError> {
        let inner = self.read();
        Ok(Some(serde_json::json!({
            "total_encounters": inner.totals.total_encounters,
            "shiny_encounters": inner.totals.shiny_encounters,
            "started_at": inner.started_at,
            "encounters_per_hour": Self::rate_per_hour(&inner),
        })))
    }

    /// The `encounter_rate` snapshot.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn encounter_rate_snapshot(&self) -> Result<Option<Value>, ProducerError> {
        let inner = self.read();
        Ok(Some(serde_json::json!({
            "encounter_rate": Self::rate_per_hour(&inner),
        })))
    }

    /// The `encounter_log` snapshot: recent encounters, oldest first.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn encounter_log_snapshot(&self) -> Result<Option<Value>, ProducerError> {
        Ok(Some(serde_json::to_value(&self.read().encounter_log)?))
    }

    /// The `shiny_log` snapshot: recent shiny encounters, oldest first.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn shiny_log_snapshot(&self) -> Result<Option<Value>, ProducerError> {
        Ok(Some(serde_json::to_value(&self.read().shiny_log)?))
    }

    /// The `event_flags` snapshot: the full flag map.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn event_flags_snapshot(&self) -> Result<Option<Value>, ProducerError> {
        Ok(Some(serde_json::to_value(&self.read().event_flags)?))
    }

    /// Look up a single event flag by exact name.
    pub fn event_flag(&self, name: &str) -> Option<bool> {
        self.read().event_flags.get(name).copied()
    }

    /// Encounters per hour since session start, rounded to one decimal.
    fn rate_per_hour(inner: &Inner) -> f64 {
        let elapsed_secs = Utc::now()
            .signed_duration_since(inner.started_at)
            .num_seconds()
            .max(1);
        #[allow(clippy::cast_precision_loss)]
        let rate = (inner.totals.total_encounters as f64 * 3600.0) / elapsed_secs as f64;
        (rate * 10.0).round() / 10.0
    }

    /// Acquire the read lock, ignoring poisoning: readers only
    /// serialize, so a panicked writer cannot leave torn state that
    /// matters more than the panic itself.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BotSession {
    fn default() -> Self {
        Self::new()
    }
}
