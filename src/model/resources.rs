use serde::{Deserialize, Serialize};

use super::timestamp::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ResourceKind {
    Gold,
    Iron,
    Stone,
    Food,
}

string_enum!(ResourceKind {
    Gold => "gold",
    Iron => "iron",
    Stone => "stone",
    Food => "food",
});

/// Amounts per resource type. Used for accrual deltas, costs and loot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceDelta {
    pub gold: u64,
    pub iron: u64,
    pub stone: u64,
    pub food: u64,
}

impl ResourceDelta {
    pub fn gold(gold: u64) -> Self {
        Self {
            gold,
            ..Self::default()
        }
    }

    pub fn get(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Gold => self.gold,
            ResourceKind::Iron => self.iron,
            ResourceKind::Stone => self.stone,
            ResourceKind::Food => self.food,
        }
    }

    pub fn is_zero(&self) -> bool {
        ResourceKind::ALL.iter().all(|&k| self.get(k) == 0)
    }
}

/// The first resource a debit could not cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub resource: ResourceKind,
    pub needed: u64,
    pub available: u64,
}

/// Stockpile of a country. Unsigned, so a negative balance is unrepresentable;
/// debits that would underflow are rejected whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub gold: u64,
    pub iron: u64,
    pub stone: u64,
    pub food: u64,
    pub updated_at: Timestamp,
}

impl Resources {
    pub fn get(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Gold => self.gold,
            ResourceKind::Iron => self.iron,
            ResourceKind::Stone => self.stone,
            ResourceKind::Food => self.food,
        }
    }

    fn slot(&mut self, kind: ResourceKind) -> &mut u64 {
        match kind {
            ResourceKind::Gold => &mut self.gold,
            ResourceKind::Iron => &mut self.iron,
            ResourceKind::Stone => &mut self.stone,
            ResourceKind::Food => &mut self.food,
        }
    }

    pub fn shortfall(&self, cost: &ResourceDelta) -> Option<Shortfall> {
        ResourceKind::ALL.iter().find_map(|&kind| {
            let needed = cost.get(kind);
            let available = self.get(kind);
            (available < needed).then_some(Shortfall {
                resource: kind,
                needed,
                available,
            })
        })
    }

    /// Subtract `cost` from every resource, or change nothing.
    pub fn debit(&mut self, cost: &ResourceDelta, now: Timestamp) -> Result<(), Shortfall> {
        if let Some(short) = self.shortfall(cost) {
            return Err(short);
        }
        for &kind in ResourceKind::ALL {
            *self.slot(kind) -= cost.get(kind);
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn credit(&mut self, delta: &ResourceDelta, now: Timestamp) {
        for &kind in ResourceKind::ALL {
            let slot = self.slot(kind);
            *slot = slot.saturating_add(delta.get(kind));
        }
        self.updated_at = now;
    }
}
