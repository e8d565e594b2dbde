use serde::{Deserialize, Serialize};

use super::country::CountryId;
use super::timestamp::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EventKind {
    CountryAssigned,
    CountryReleased,
    CountryDeactivated,
    ResourcesCollected,
    ArmyUpgraded,
    TroopsRecruited,
    AllianceFormed,
    AllianceBetrayed,
    PeaceMade,
    Battle,
    SeasonStarted,
    SeasonEnded,
    EconomyReset,
    Custom(String),
}

string_enum_open!(EventKind {
    CountryAssigned => "country_assigned",
    CountryReleased => "country_released",
    CountryDeactivated => "country_deactivated",
    ResourcesCollected => "resources_collected",
    ArmyUpgraded => "army_upgraded",
    TroopsRecruited => "troops_recruited",
    AllianceFormed => "alliance_formed",
    AllianceBetrayed => "alliance_betrayed",
    PeaceMade => "peace_made",
    Battle => "battle",
    SeasonStarted => "season_started",
    SeasonEnded => "season_ended",
    EconomyReset => "economy_reset",
});

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub kind: EventKind,
    /// Country that acted; `None` for world-level events such as season rollover.
    pub actor: Option<CountryId>,
    pub target: Option<CountryId>,
    /// Structured details of what happened.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
    pub occurred_at: Timestamp,
    /// Season active when the event happened.
    pub season_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_expected_shape() {
        let event = Event {
            id: 10,
            kind: EventKind::Battle,
            actor: Some(CountryId::from("assyr")),
            target: Some(CountryId::from("egypt")),
            payload: serde_json::json!({"winner": "assyr"}),
            occurred_at: Timestamp::from_secs(100),
            season_id: Some(2),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["id"], 10);
        assert_eq!(json["kind"], "battle");
        assert_eq!(json["actor"], "assyr");
        assert_eq!(json["target"], "egypt");
        assert_eq!(json["payload"]["winner"], "assyr");
        assert_eq!(json["occurred_at"], 100_000);
        assert_eq!(json["season_id"], 2);
    }

    #[test]
    fn null_payload_is_omitted() {
        let event = Event {
            id: 1,
            kind: EventKind::SeasonStarted,
            actor: None,
            target: None,
            payload: serde_json::Value::Null,
            occurred_at: Timestamp::EPOCH,
            season_id: Some(1),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("payload").is_none());
        assert!(json["actor"].is_null());
    }

    #[test]
    fn unknown_kind_becomes_custom() {
        let kind: EventKind = serde_json::from_str("\"tribute_paid\"").unwrap();
        assert_eq!(kind, EventKind::Custom("tribute_paid".to_string()));
        assert!(serde_json::from_str::<EventKind>("\"\"").is_err());
    }

    #[test]
    fn core_kinds_round_trip() {
        for kind in [
            EventKind::CountryAssigned,
            EventKind::ArmyUpgraded,
            EventKind::AllianceBetrayed,
            EventKind::SeasonEnded,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            let back: EventKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }
}
