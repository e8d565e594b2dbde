//! Game configuration and balance rules.
//!
//! Every balance constant lives in [`Rules`] so it can be tuned from TOML
//! without a rebuild. Defaults reproduce the classic twelve-country game.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{CountryId, MAX_LEVEL, ResourceDelta};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the store's generator. `None` seeds from the OS.
    pub seed: Option<u64>,
    pub scheduler: SchedulerConfig,
    pub storage: StorageConfig,
    pub rules: Rules,
}

impl GameConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.tick_interval_secs == 0 {
            return Err(ConfigError::Invalid("scheduler.tick_interval_secs must be > 0".into()));
        }
        if self.scheduler.op_timeout_ms == 0 {
            return Err(ConfigError::Invalid("scheduler.op_timeout_ms must be > 0".into()));
        }
        self.rules.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between AI ticks.
    pub tick_interval_secs: u64,
    /// Longest any single operation may wait for the store.
    pub op_timeout_ms: u64,
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 180,
            op_timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Postgres URL. Without one the world lives in memory only.
    pub database_url: Option<String>,
    /// Directory for JSONL snapshots written on shutdown.
    pub snapshot_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub economy: EconomyRules,
    pub military: MilitaryRules,
    pub combat: CombatRules,
    pub ai: AiRules,
    pub advisor: AdvisorRules,
    pub start: StartingState,
    pub roster: Vec<CountryTemplate>,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            economy: EconomyRules::default(),
            military: MilitaryRules::default(),
            combat: CombatRules::default(),
            ai: AiRules::default(),
            advisor: AdvisorRules::default(),
            start: StartingState::default(),
            roster: default_roster(),
        }
    }
}

impl Rules {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.economy;
        for (name, span) in [
            ("economy.gold", e.gold),
            ("economy.iron", e.iron),
            ("economy.stone", e.stone),
            ("economy.food", e.food),
        ] {
            check_span(name, span)?;
        }

        self.military.validate()?;

        let c = &self.combat;
        for (name, span) in [
            ("combat.multiplier", c.multiplier),
            ("combat.winner_loss", c.winner_loss),
            ("combat.loser_loss", c.loser_loss),
            ("combat.loot_fraction", c.loot_fraction),
        ] {
            check_fraction_span(name, span, name == "combat.multiplier")?;
        }
        if c.winner_loss.1 > c.loser_loss.0 {
            return Err(ConfigError::Invalid(
                "combat.winner_loss must not overlap combat.loser_loss".into(),
            ));
        }

        let a = &self.ai;
        let (lo, hi) = a.actions_per_tick;
        if lo == 0 || lo > hi || hi > AI_ACTION_COUNT {
            return Err(ConfigError::Invalid(format!(
                "ai.actions_per_tick must be within 1..={AI_ACTION_COUNT}, got [{lo}, {hi}]"
            )));
        }
        for (name, p) in [
            ("ai.collect_chance", a.collect_chance),
            ("ai.train_chance", a.train_chance),
            ("ai.attack_chance", a.attack_chance),
            ("ai.alliance_chance", a.alliance_chance),
            ("ai.betray_chance", a.betray_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!("{name} must be in [0, 1], got {p}")));
            }
        }
        if a.attack_margin <= 0.0 {
            return Err(ConfigError::Invalid("ai.attack_margin must be > 0".into()));
        }

        if !(1..=MAX_LEVEL).contains(&self.start.level) {
            return Err(ConfigError::Invalid(format!(
                "start.level must be within 1..={MAX_LEVEL}"
            )));
        }

        let mut seen = BTreeSet::new();
        for t in &self.roster {
            if t.id.as_str().is_empty() {
                return Err(ConfigError::Invalid("roster entry with empty id".into()));
            }
            if !seen.insert(t.id.clone()) {
                return Err(ConfigError::Invalid(format!("duplicate roster id {}", t.id)));
            }
        }
        Ok(())
    }
}

/// Number of distinct AI actions a tick can sample from.
pub const AI_ACTION_COUNT: usize = 5;

fn check_span(name: &str, (lo, hi): (u64, u64)) -> Result<(), ConfigError> {
    if lo > hi {
        return Err(ConfigError::Invalid(format!("{name}: min {lo} exceeds max {hi}")));
    }
    Ok(())
}

fn check_fraction_span(name: &str, (lo, hi): (f64, f64), allow_above_one: bool) -> Result<(), ConfigError> {
    if !(lo >= 0.0 && lo <= hi) || (!allow_above_one && hi > 1.0) {
        return Err(ConfigError::Invalid(format!("{name}: bad range [{lo}, {hi}]")));
    }
    Ok(())
}

/// Inclusive `[min, max]` accrual per resource each collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyRules {
    pub gold: (u64, u64),
    pub iron: (u64, u64),
    pub stone: (u64, u64),
    pub food: (u64, u64),
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            gold: (10, 60),
            iron: (5, 35),
            stone: (5, 35),
            food: (20, 120),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    /// Gold to reach this level from the one below. Unused for level 1.
    pub cost: u64,
    /// Army power at this level with the starting force.
    pub power: u64,
    pub defense: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilitaryRules {
    /// One row per level, level 1 first.
    pub levels: Vec<LevelStats>,
    /// Cost of one recruited infantry soldier.
    pub recruit_cost: ResourceDelta,
}

impl Default for MilitaryRules {
    fn default() -> Self {
        let row = |cost, power, defense| LevelStats {
            cost,
            power,
            defense,
        };
        Self {
            levels: vec![
                row(100, 1_000, 5),
                row(200, 2_000, 10),
                row(350, 3_500, 18),
                row(550, 5_500, 30),
                row(800, 8_000, 45),
            ],
            recruit_cost: ResourceDelta {
                gold: 2,
                food: 3,
                ..ResourceDelta::default()
            },
        }
    }
}

impl MilitaryRules {
    pub fn level(&self, level: u8) -> Option<&LevelStats> {
        usize::from(level)
            .checked_sub(1)
            .and_then(|i| self.levels.get(i))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.len() != usize::from(MAX_LEVEL) {
            return Err(ConfigError::Invalid(format!(
                "military.levels needs exactly {MAX_LEVEL} rows, got {}",
                self.levels.len()
            )));
        }
        for (i, pair) in self.levels.windows(2).enumerate() {
            let (lower, upper) = (pair[0], pair[1]);
            if upper.cost <= lower.cost || upper.power <= lower.power || upper.defense <= lower.defense {
                return Err(ConfigError::Invalid(format!(
                    "military.levels must strictly increase (level {} -> {})",
                    i + 1,
                    i + 2
                )));
            }
        }
        if self.levels[0].power == 0 {
            return Err(ConfigError::Invalid("military.levels power must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Luck multiplier applied to each side's power score.
    pub multiplier: (f64, f64),
    /// Fraction of infantry the winner loses.
    pub winner_loss: (f64, f64),
    /// Fraction of infantry the loser loses.
    pub loser_loss: (f64, f64),
    /// Floor on losses, capped by the infantry actually present.
    pub min_loss: u32,
    /// Fraction of the loser's gold and food taken as loot.
    pub loot_fraction: (f64, f64),
    pub loot_gold_cap: u64,
    pub loot_food_cap: u64,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            multiplier: (0.8, 1.2),
            winner_loss: (0.15, 0.2),
            loser_loss: (0.3, 0.4),
            min_loss: 5,
            loot_fraction: (0.05, 0.15),
            loot_gold_cap: 500,
            loot_food_cap: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiRules {
    /// How many distinct actions each AI country samples per tick.
    pub actions_per_tick: (usize, usize),
    pub collect_chance: f64,
    pub train_chance: f64,
    /// Training is only considered above this much gold.
    pub train_gold_threshold: u64,
    /// Soldiers recruited when training cannot upgrade.
    pub recruit_batch: u32,
    pub attack_chance: f64,
    /// Targets must have power score below the AI's score times this.
    pub attack_margin: f64,
    pub alliance_chance: f64,
    /// Alliances are only sought above this much gold.
    pub alliance_treasury_floor: u64,
    pub betray_chance: f64,
}

impl Default for AiRules {
    fn default() -> Self {
        Self {
            actions_per_tick: (1, 2),
            collect_chance: 0.6,
            train_chance: 0.3,
            train_gold_threshold: 500,
            recruit_batch: 20,
            attack_chance: 0.25,
            attack_margin: 1.2,
            alliance_chance: 0.15,
            alliance_treasury_floor: 300,
            betray_chance: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorRules {
    pub food_floor: u64,
    pub gold_floor: u64,
    pub iron_floor: u64,
    /// Armies below this level count as weak.
    pub min_level: u8,
    pub min_infantry: u32,
    /// A human country below this fraction of our power score is an opportunity.
    pub opportunity_ratio: f64,
}

impl Default for AdvisorRules {
    fn default() -> Self {
        Self {
            food_floor: 300,
            gold_floor: 200,
            iron_floor: 100,
            min_level: 3,
            min_infantry: 150,
            opportunity_ratio: 0.7,
        }
    }
}

/// Figures every country starts with, and returns to on an economy reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingState {
    pub resources: ResourceDelta,
    pub level: u8,
    pub infantry: u32,
    pub cavalry: u32,
    pub siege: u32,
}

impl Default for StartingState {
    fn default() -> Self {
        Self {
            resources: ResourceDelta {
                gold: 1_000,
                iron: 500,
                stone: 500,
                food: 1_000,
            },
            level: 1,
            infantry: 100,
            cavalry: 20,
            siege: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryTemplate {
    pub id: CountryId,
    pub name: String,
    pub specialty: String,
}

fn default_roster() -> Vec<CountryTemplate> {
    [
        ("persia", "Persian Empire", "fast cavalry"),
        ("rome", "Roman Empire", "fortress defense"),
        ("egypt", "Pharaohs of Egypt", "farming and resources"),
        ("china", "Chinese Empire", "massed infantry"),
        ("greece", "Ancient Greece", "phalanx"),
        ("babylon", "Babylon", "diplomacy and learning"),
        ("assyr", "Assyria", "swift assault"),
        ("carthage", "Carthage", "navy"),
        ("india", "Indian Empire", "war elephants"),
        ("macedonia", "Macedonia", "drilled army"),
        ("hittite", "Hittites", "iron weapons"),
        ("phoenicia", "Phoenicia", "trade and wealth"),
    ]
    .into_iter()
    .map(|(id, name, specialty)| CountryTemplate {
        id: CountryId::from(id),
        name: name.to_string(),
        specialty: specialty.to_string(),
    })
    .collect()
}
