use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::context::SimContext;
use crate::error::GameError;
use crate::model::{Controller, CountryId, EventKind, ResourceDelta, Resources, World};

/// `army_power/10 + gold/100 + iron/50 + stone/50`, truncated once at the end.
pub fn power_score(army_power: u64, res: &Resources) -> u64 {
    army_power
        .saturating_mul(10)
        .saturating_add(res.gold)
        .saturating_add(res.iron.saturating_mul(2))
        .saturating_add(res.stone.saturating_mul(2))
        / 100
}

/// Recompute and store the power score of one country from its current rows.
pub fn recompute_power_score(world: &mut World, id: &CountryId) -> Result<u64, GameError> {
    let (res, army) = world.economy_mut(id)?;
    army.power_score = power_score(army.power, res);
    Ok(army.power_score)
}

/// Add a random amount of every resource to a country.
pub fn accrue_resources(ctx: &mut SimContext, id: &CountryId) -> Result<ResourceDelta, GameError> {
    ctx.world.require_active(id)?;

    let e = &ctx.rules.economy;
    let delta = ResourceDelta {
        gold: ctx.rng.random_range(e.gold.0..=e.gold.1),
        iron: ctx.rng.random_range(e.iron.0..=e.iron.1),
        stone: ctx.rng.random_range(e.stone.0..=e.stone.1),
        food: ctx.rng.random_range(e.food.0..=e.food.1),
    };

    ctx.world.resources_mut(id)?.credit(&delta, ctx.now);
    let score = recompute_power_score(ctx.world, id)?;

    ctx.world.record_event(
        EventKind::ResourcesCollected,
        Some(id),
        None,
        serde_json::json!({ "delta": delta, "power_score": score }),
        ctx.now,
    );
    debug!(country = %id, gold = delta.gold, food = delta.food, score, "resources accrued");
    Ok(delta)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub country: CountryId,
    pub name: String,
    pub controller: Controller,
    pub power_score: u64,
}

/// Active countries by power score, strongest first; ties by id.
pub fn ranking(world: &World, limit: usize) -> Vec<RankEntry> {
    let mut entries: Vec<RankEntry> = world
        .countries()
        .filter(|c| c.active)
        .filter_map(|c| {
            world.army(&c.id).map(|army| RankEntry {
                country: c.id.clone(),
                name: c.name.clone(),
                controller: c.controller,
                power_score: army.power_score,
            })
        })
        .collect();
    entries.sort_by(|a, b| {
        b.power_score
            .cmp(&a.power_score)
            .then_with(|| a.country.cmp(&b.country))
    });
    entries.truncate(limit);
    entries
}
