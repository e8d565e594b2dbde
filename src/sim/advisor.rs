use rand::RngCore;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::diplomacy::{allies_of, are_allied, enemies_of};
use crate::config::AdvisorRules;
use crate::model::{CountryId, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdviceCode {
    InsufficientData,
    FoodShortage,
    GoldShortage,
    IronShortage,
    UpgradeArmy,
    RecruitInfantry,
    SeekAlliance,
    ThreatDetected,
    OpportunityDetected,
    UseSpecialty,
    PlanLongTerm,
    ActDecisively,
    RuleWisely,
    FortifyDefenses,
}

const STRATEGY: [AdviceCode; 5] = [
    AdviceCode::UseSpecialty,
    AdviceCode::PlanLongTerm,
    AdviceCode::ActDecisively,
    AdviceCode::RuleWisely,
    AdviceCode::FortifyDefenses,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub code: AdviceCode,
    pub priority: Priority,
    /// The country a threat or opportunity concerns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<CountryId>,
}

impl Recommendation {
    fn normal(code: AdviceCode) -> Self {
        Self {
            code,
            priority: Priority::Normal,
            subject: None,
        }
    }

    fn high(code: AdviceCode, subject: CountryId) -> Self {
        Self {
            code,
            priority: Priority::High,
            subject: Some(subject),
        }
    }

    pub fn insufficient_data() -> Self {
        Self::normal(AdviceCode::InsufficientData)
    }
}

/// Pick the advice for a country from its current rows.
///
/// Rules are grouped into tiers checked in order: resource shortage, weak
/// military, no alliances, threat, opportunity, general strategy. The first
/// tier with any applicable rule wins and one of its rules is picked at
/// random. Never fails; unknown or inactive countries get `InsufficientData`.
pub fn advise(
    world: &World,
    rules: &AdvisorRules,
    id: &CountryId,
    rng: &mut dyn RngCore,
) -> Recommendation {
    let active = world.country(id).is_some_and(|c| c.active);
    let (Some(res), Some(army)) = (world.resources(id), world.army(id)) else {
        return Recommendation::insufficient_data();
    };
    if !active {
        return Recommendation::insufficient_data();
    }

    let shortages: Vec<Recommendation> = [
        (res.food < rules.food_floor, AdviceCode::FoodShortage),
        (res.gold < rules.gold_floor, AdviceCode::GoldShortage),
        (res.iron < rules.iron_floor, AdviceCode::IronShortage),
    ]
    .into_iter()
    .filter(|(fires, _)| *fires)
    .map(|(_, code)| Recommendation::normal(code))
    .collect();

    let weak_military: Vec<Recommendation> = [
        (army.level < rules.min_level, AdviceCode::UpgradeArmy),
        (army.infantry < rules.min_infantry, AdviceCode::RecruitInfantry),
    ]
    .into_iter()
    .filter(|(fires, _)| *fires)
    .map(|(_, code)| Recommendation::normal(code))
    .collect();

    let lonely: Vec<Recommendation> = if allies_of(world, id).is_empty() {
        vec![Recommendation::normal(AdviceCode::SeekAlliance)]
    } else {
        Vec::new()
    };

    let own = army.power_score;
    let threat: Vec<Recommendation> = strongest_threat(world, id, own)
        .map(|enemy| Recommendation::high(AdviceCode::ThreatDetected, enemy))
        .into_iter()
        .collect();

    let ceiling = own as f64 * rules.opportunity_ratio;
    let opportunity: Vec<Recommendation> = weakest_human_below(world, id, ceiling)
        .map(|target| Recommendation::high(AdviceCode::OpportunityDetected, target))
        .into_iter()
        .collect();

    let strategy: Vec<Recommendation> = STRATEGY.iter().map(|&c| Recommendation::normal(c)).collect();

    [shortages, weak_military, lonely, threat, opportunity, strategy]
        .into_iter()
        .find(|tier| !tier.is_empty())
        .and_then(|tier| tier.choose(rng).cloned())
        .unwrap_or_else(Recommendation::insufficient_data)
}

/// The strongest country at war with `id` that outscores it.
fn strongest_threat(world: &World, id: &CountryId, own: u64) -> Option<CountryId> {
    enemies_of(world, id)
        .into_iter()
        .filter(|e| world.country(e).is_some_and(|c| c.active))
        .filter_map(|e| world.army(&e).map(|a| (a.power_score, e)))
        .filter(|(score, _)| *score > own)
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)))
        .map(|(_, e)| e)
}

/// The weakest other human country scoring below `ceiling`, allies excluded.
fn weakest_human_below(world: &World, id: &CountryId, ceiling: f64) -> Option<CountryId> {
    world
        .countries()
        .filter(|c| c.active && c.is_human() && &c.id != id)
        .filter(|c| !are_allied(world, id, &c.id))
        .filter_map(|c| world.army(&c.id).map(|a| (a.power_score, c.id.clone())))
        .filter(|(score, _)| (*score as f64) < ceiling)
        .min()
        .map(|(_, c)| c)
}
