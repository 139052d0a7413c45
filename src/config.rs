//! Archetype, building, class, and match settings.
//!
//! Loaded once from JSON at startup and never mutated afterwards. Every field
//! has a default, so a settings file only needs the values it overrides.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::de::Error as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::snapshot::PlayerClass;

// === Constants ===

/// Server ticks per second; intervals in this file are measured in ticks.
pub const TICK_RATE: u64 = 66;

/// Upper bound on pooled bots.
pub const DEFAULT_MAX_BOTS: usize = 60;

// === Errors ===

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

// === Bot archetypes ===

/// Behavioral profile of a lane bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BotArchetype {
    Melee,
    Ranged,
}

impl BotArchetype {
    pub const ALL: &[Self] = &[Self::Melee, Self::Ranged];

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::Ranged => "ranged",
        }
    }
}

/// Stats and presentation for one bot archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotProfile {
    pub move_speed: f32,
    /// Enemies farther than this are ignored.
    pub aggro_range: f32,
    /// Bots stop and attack inside this planar distance.
    pub attack_range: f32,
    /// Bots back away while attacking inside this planar distance. Zero
    /// disables backing away.
    pub attack_range_min: f32,
    pub damage: f32,
    pub health: i32,
    /// Ammo topped up every tick. Zero disables refilling.
    pub ammo: u32,
    pub model: String,
    pub model_scale: f32,
    pub model_skin_blu: u32,
    pub model_skin_red: u32,
    pub model_anim_move: String,
    pub weapon: String,
}

impl BotProfile {
    #[must_use]
    pub fn melee() -> Self {
        Self {
            move_speed: 230.0,
            aggro_range: 600.0,
            attack_range: 72.0,
            attack_range_min: 28.0,
            damage: 12.0,
            health: 175,
            ammo: 0,
            model: "models/bots/skeleton_sniper/skeleton_sniper.mdl".into(),
            model_scale: 1.0,
            model_skin_blu: 1,
            model_skin_red: 0,
            model_anim_move: "run_melee".into(),
            weapon: "tf_weapon_club".into(),
        }
    }

    #[must_use]
    pub fn ranged() -> Self {
        Self {
            move_speed: 200.0,
            aggro_range: 800.0,
            attack_range: 500.0,
            attack_range_min: 0.0,
            damage: 8.0,
            health: 125,
            ammo: 200,
            model: "models/bots/skeleton_sniper/skeleton_sniper.mdl".into(),
            model_scale: 0.9,
            model_skin_blu: 1,
            model_skin_red: 0,
            model_anim_move: "run_secondary".into(),
            weapon: "tf_weapon_smg".into(),
        }
    }
}

impl Default for BotProfile {
    fn default() -> Self {
        Self::melee()
    }
}

/// Profiles for both archetypes. A partial entry in a settings file fills
/// the rest from that archetype's own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    #[serde(deserialize_with = "melee_overrides")]
    pub melee: BotProfile,
    #[serde(deserialize_with = "ranged_overrides")]
    pub ranged: BotProfile,
}

fn melee_overrides<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BotProfile, D::Error> {
    overlay_profile(BotProfile::melee(), deserializer)
}

fn ranged_overrides<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BotProfile, D::Error> {
    overlay_profile(BotProfile::ranged(), deserializer)
}

/// Apply the fields present in the document on top of `base`.
fn overlay_profile<'de, D: Deserializer<'de>>(base: BotProfile, deserializer: D) -> Result<BotProfile, D::Error> {
    let overrides = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
    overlay_fields(base, overrides).map_err(D::Error::custom)
}

fn overlay_fields<T: Serialize + DeserializeOwned>(
    base: T,
    overrides: serde_json::Map<String, serde_json::Value>,
) -> Result<T, serde_json::Error> {
    let mut merged = match serde_json::to_value(base)? {
        serde_json::Value::Object(fields) => fields,
        _ => serde_json::Map::new(),
    };
    merged.extend(overrides);
    serde_json::from_value(serde_json::Value::Object(merged))
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            melee: BotProfile::melee(),
            ranged: BotProfile::ranged(),
        }
    }
}

impl BotSettings {
    #[must_use]
    pub const fn profile(&self, archetype: BotArchetype) -> &BotProfile {
        match archetype {
            BotArchetype::Melee => &self.melee,
            BotArchetype::Ranged => &self.ranged,
        }
    }
}

// === Buildings ===

/// Stats for one sentry tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentryTierProfile {
    pub health: i32,
    pub range: f32,
    pub damage: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentrySettings {
    /// Indexed by tier, lowest first.
    pub tiers: Vec<SentryTierProfile>,
}

impl Default for SentrySettings {
    fn default() -> Self {
        Self {
            tiers: vec![
                SentryTierProfile {
                    health: 400,
                    range: 700.0,
                    damage: 10.0,
                },
                SentryTierProfile {
                    health: 600,
                    range: 800.0,
                    damage: 14.0,
                },
                SentryTierProfile {
                    health: 900,
                    range: 900.0,
                    damage: 18.0,
                },
            ],
        }
    }
}

impl SentrySettings {
    #[must_use]
    pub fn tier(&self, tier: u8) -> Option<&SentryTierProfile> {
        self.tiers.get(usize::from(tier))
    }
}

// === Player classes ===

/// Health, regeneration, and damage scaling for one player class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassProfile {
    pub health: i32,
    /// Health restored per regeneration pulse.
    pub regen: i32,
    /// Ticks between regeneration pulses. Zero disables regeneration.
    pub regen_interval: u64,
    pub damage_multiplier: f32,
}

impl Default for ClassProfile {
    fn default() -> Self {
        Self {
            health: 150,
            regen: 2,
            regen_interval: TICK_RATE,
            damage_multiplier: 1.0,
        }
    }
}

fn default_classes() -> HashMap<PlayerClass, ClassProfile> {
    [
        (PlayerClass::Scout, 150),
        (PlayerClass::Sniper, 150),
        (PlayerClass::Soldier, 250),
        (PlayerClass::Demoman, 225),
        (PlayerClass::Medic, 200),
        (PlayerClass::Heavy, 400),
        (PlayerClass::Pyro, 225),
        (PlayerClass::Spy, 150),
        (PlayerClass::Engineer, 175),
    ]
    .into_iter()
    .map(|(class, health)| {
        (
            class,
            ClassProfile {
                health,
                ..ClassProfile::default()
            },
        )
    })
    .collect()
}

/// Start from the shipped class table and apply each listed class's fields
/// on top of that class's own profile.
fn class_overrides<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<HashMap<PlayerClass, ClassProfile>, D::Error> {
    let overrides =
        HashMap::<PlayerClass, serde_json::Map<String, serde_json::Value>>::deserialize(deserializer)?;
    let mut classes = default_classes();
    for (class, fields) in overrides {
        let base = classes.get(&class).copied().unwrap_or_default();
        let profile = overlay_fields(base, fields).map_err(D::Error::custom)?;
        classes.insert(class, profile);
    }
    Ok(classes)
}

// === Match ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Ticks between bot waves.
    pub bot_wave_interval: u64,
    pub max_bots: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            bot_wave_interval: 30 * TICK_RATE,
            max_bots: DEFAULT_MAX_BOTS,
        }
    }
}

// === Root ===

/// All settings, inserted as a resource by [`crate::LaneBotsPlugin`].
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneBotsConfig {
    pub bots: BotSettings,
    pub sentry: SentrySettings,
    #[serde(deserialize_with = "class_overrides")]
    pub classes: HashMap<PlayerClass, ClassProfile>,
    pub game: GameSettings,
}

impl Default for LaneBotsConfig {
    fn default() -> Self {
        Self {
            bots: BotSettings::default(),
            sentry: SentrySettings::default(),
            classes: default_classes(),
            game: GameSettings::default(),
        }
    }
}

impl LaneBotsConfig {
    /// Parse and validate settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for &archetype in BotArchetype::ALL {
            let profile = self.bots.profile(archetype);
            let name = archetype.display_name();
            if profile.move_speed <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} move_speed must be positive")));
            }
            if profile.attack_range <= 0.0 || profile.aggro_range <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} ranges must be positive")));
            }
            if profile.attack_range_min < 0.0 || profile.attack_range_min >= profile.attack_range {
                return Err(ConfigError::Invalid(format!(
                    "{name} attack_range_min must be in [0, attack_range)"
                )));
            }
        }
        if self.sentry.tiers.is_empty() {
            return Err(ConfigError::Invalid("at least one sentry tier is required".into()));
        }
        if self.game.bot_wave_interval == 0 {
            return Err(ConfigError::Invalid("bot_wave_interval must be positive".into()));
        }
        if self.game.max_bots == 0 {
            return Err(ConfigError::Invalid("max_bots must be positive".into()));
        }
        Ok(())
    }

    /// Class profile, falling back to the default profile for classes missing
    /// from the settings file.
    #[must_use]
    pub fn class_profile(&self, class: PlayerClass) -> ClassProfile {
        self.classes.get(&class).copied().unwrap_or_default()
    }
}
