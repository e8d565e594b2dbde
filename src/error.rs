use std::path::PathBuf;

use thiserror::Error;

use crate::model::{CountryId, PlayerId, RelationKind, ResourceKind};

/// Every way a core operation can refuse or fail.
///
/// Domain rejections are final for the command that caused them; only
/// [`GameError::is_transient`] failures are worth retrying as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("country {0} is inactive")]
    Inactive(CountryId),

    #[error("{country} needs {needed} {resource} but has {available}")]
    InsufficientResources {
        country: CountryId,
        resource: ResourceKind,
        needed: u64,
        available: u64,
    },

    #[error("army of {country} is already at maximum level {level}")]
    MaxLevelReached { country: CountryId, level: u8 },

    #[error("country {country} is already assigned to player {owner}")]
    AlreadyAssigned { country: CountryId, owner: PlayerId },

    #[error("{a} and {b} already have an active {existing} relation")]
    DuplicateRelation {
        a: CountryId,
        b: CountryId,
        existing: RelationKind,
    },

    #[error("{a} and {b} are not allied")]
    NoAlliance { a: CountryId, b: CountryId },

    #[error("{a} and {b} are not at war")]
    NotAtWar { a: CountryId, b: CountryId },

    #[error("{attacker} cannot attack its ally {defender}")]
    AlliedTarget {
        attacker: CountryId,
        defender: CountryId,
    },

    #[error("{0} cannot target itself")]
    SelfTarget(CountryId),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("no season is active")]
    NoActiveSeason,

    #[error("season {season} is already active")]
    SeasonAlreadyActive { season: u64 },

    #[error("state store busy: gave up after {waited_ms}ms")]
    Busy { waited_ms: u64 },

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl GameError {
    pub fn country_not_found(id: &CountryId) -> Self {
        GameError::NotFound {
            entity: "country",
            key: id.to_string(),
        }
    }

    /// True for failures of the store itself rather than domain rejections.
    pub fn is_transient(&self) -> bool {
        matches!(self, GameError::Busy { .. } | GameError::Persistence(_))
    }
}

impl From<sqlx::Error> for GameError {
    fn from(e: sqlx::Error) -> Self {
        GameError::Persistence(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_store_failures_are_transient() {
        assert!(GameError::Busy { waited_ms: 10 }.is_transient());
        assert!(GameError::Persistence("down".into()).is_transient());
        assert!(!GameError::NoActiveSeason.is_transient());
        assert!(!GameError::country_not_found(&CountryId::from("rome")).is_transient());
    }

    #[test]
    fn messages_name_the_country() {
        let err = GameError::InsufficientResources {
            country: CountryId::from("egypt"),
            resource: ResourceKind::Gold,
            needed: 350,
            available: 100,
        };
        assert_eq!(err.to_string(), "egypt needs 350 gold but has 100");

        let err = GameError::Inactive(CountryId::from("rome"));
        assert_eq!(err.to_string(), "country rome is inactive");
    }
}
