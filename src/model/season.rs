use serde::{Deserialize, Serialize};

use super::country::{CountryId, PlayerId};
use super::timestamp::Timestamp;

/// A bounded game round. Only the winner fields and `ended_at`/`active` are
/// written after creation, once, when the season closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: u64,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub active: bool,
    pub winner_country: Option<CountryId>,
    pub winner_player: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub country: CountryId,
    pub player: PlayerId,
    pub power_score: u64,
}

/// What the season manager reports back for a start or end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season: u64,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub winner: Option<Winner>,
}
