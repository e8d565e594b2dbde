use serde::{Deserialize, Serialize};

/// Highest army level; the level table has one row per level.
pub const MAX_LEVEL: u8 = 5;

/// Troops and derived strength figures of a country.
///
/// `power` and `power_score` are recomputed by the engines after every
/// change; nothing else writes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Army {
    pub level: u8,
    pub infantry: u32,
    pub cavalry: u32,
    pub siege: u32,
    pub defense: u32,
    /// Military power, the level table value for `level`.
    pub power: u64,
    /// Composite ranking score of army power and treasury.
    pub power_score: u64,
}

impl Army {
    pub fn at_max_level(&self) -> bool {
        self.level >= MAX_LEVEL
    }
}
