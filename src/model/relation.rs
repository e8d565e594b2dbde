use serde::{Deserialize, Serialize};

use super::country::CountryId;
use super::timestamp::Timestamp;

pub const DEFAULT_STRENGTH: u8 = 50;
pub const MAX_STRENGTH: u8 = 100;

/// Declaration order is the listing order: alliances first, then wars, then
/// neutral edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RelationKind {
    Alliance,
    War,
    Neutral,
}

string_enum!(RelationKind {
    Alliance => "ALLIANCE",
    War => "WAR",
    Neutral => "NEUTRAL",
});

/// Unordered country pair in canonical order (`low < high`).
///
/// The only way to build one is [`RelationKey::new`], so two keys for the same
/// pair are always equal and the relation table cannot hold duplicates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationKey {
    low: CountryId,
    high: CountryId,
}

impl RelationKey {
    /// `None` when both sides are the same country.
    pub fn new(a: &CountryId, b: &CountryId) -> Option<Self> {
        match a.cmp(b) {
            std::cmp::Ordering::Less => Some(Self {
                low: a.clone(),
                high: b.clone(),
            }),
            std::cmp::Ordering::Greater => Some(Self {
                low: b.clone(),
                high: a.clone(),
            }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn low(&self) -> &CountryId {
        &self.low
    }

    pub fn high(&self) -> &CountryId {
        &self.high
    }

    pub fn involves(&self, id: &CountryId) -> bool {
        &self.low == id || &self.high == id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(flatten)]
    pub key: RelationKey,
    pub kind: RelationKind,
    /// 0-100.
    pub strength: u8,
    pub since: Timestamp,
    pub updated_at: Timestamp,
}

impl Relation {
    pub fn new(key: RelationKey, kind: RelationKind, now: Timestamp) -> Self {
        Self {
            key,
            kind,
            strength: DEFAULT_STRENGTH,
            since: now,
            updated_at: now,
        }
    }

    /// The other side of the edge, if `id` is one side.
    pub fn counterpart(&self, id: &CountryId) -> Option<&CountryId> {
        if self.key.low() == id {
            Some(self.key.high())
        } else if self.key.high() == id {
            Some(self.key.low())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> CountryId {
        CountryId::from(s)
    }

    #[test]
    fn key_is_canonical_regardless_of_argument_order() {
        let ab = RelationKey::new(&id("rome"), &id("egypt")).unwrap();
        let ba = RelationKey::new(&id("egypt"), &id("rome")).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.low(), &id("egypt"));
        assert_eq!(ab.high(), &id("rome"));
    }

    #[test]
    fn key_rejects_self_pair() {
        assert!(RelationKey::new(&id("rome"), &id("rome")).is_none());
    }

    #[test]
    fn counterpart_finds_other_side() {
        let key = RelationKey::new(&id("persia"), &id("greece")).unwrap();
        let rel = Relation::new(key, RelationKind::Alliance, Timestamp::EPOCH);
        assert_eq!(rel.counterpart(&id("persia")), Some(&id("greece")));
        assert_eq!(rel.counterpart(&id("greece")), Some(&id("persia")));
        assert_eq!(rel.counterpart(&id("india")), None);
        assert_eq!(rel.strength, DEFAULT_STRENGTH);
    }

    #[test]
    fn serializes_expected_shape() {
        let key = RelationKey::new(&id("rome"), &id("carthage")).unwrap();
        let rel = Relation::new(key, RelationKind::War, Timestamp::from_secs(3));
        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json["low"], "carthage");
        assert_eq!(json["high"], "rome");
        assert_eq!(json["kind"], "WAR");
        assert_eq!(json["strength"], 50);
        assert_eq!(json["since"], 3000);
    }

    #[test]
    fn kinds_sort_alliance_war_neutral() {
        let mut kinds = vec![RelationKind::Neutral, RelationKind::War, RelationKind::Alliance];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![RelationKind::Alliance, RelationKind::War, RelationKind::Neutral]
        );
    }
}
