use tracing::debug;

use super::context::SimContext;
use super::economy::{power_score, recompute_power_score};
use crate::config::Rules;
use crate::error::GameError;
use crate::model::{Army, CountryId, EventKind, ResourceDelta, Resources, Shortfall};

/// Army power at `level`, straight from the level table. Troop counts do not
/// enter it, so repeated upgrades cannot drift.
pub fn army_power(rules: &Rules, level: u8) -> u64 {
    rules.military.level(level).map_or(0, |stats| stats.power)
}

/// Reset an army's power to its level's table value and recompute its score.
pub fn refresh_army(rules: &Rules, res: &Resources, army: &mut Army) {
    army.power = army_power(rules, army.level);
    army.power_score = power_score(army.power, res);
}

pub(crate) fn insufficient(country: &CountryId, short: Shortfall) -> GameError {
    GameError::InsufficientResources {
        country: country.clone(),
        resource: short.resource,
        needed: short.needed,
        available: short.available,
    }
}

/// Reject a cost before any row is touched, so a refusal leaves nothing dirty.
fn check_affordable(ctx: &SimContext, id: &CountryId, cost: &ResourceDelta) -> Result<(), GameError> {
    let res = ctx
        .world
        .resources(id)
        .ok_or_else(|| GameError::country_not_found(id))?;
    match res.shortfall(cost) {
        Some(short) => Err(insufficient(id, short)),
        None => Ok(()),
    }
}

/// Raise the army one level, paying the target level's gold cost.
///
/// Cost debit, level bump and power refresh happen together; on any error
/// nothing has been written.
pub fn upgrade(ctx: &mut SimContext, id: &CountryId) -> Result<u8, GameError> {
    ctx.world.require_active(id)?;
    let army = ctx
        .world
        .army(id)
        .ok_or_else(|| GameError::country_not_found(id))?;
    let current = army.level;
    let target = current + 1;
    let Some(stats) = ctx.rules.military.level(target).copied() else {
        return Err(GameError::MaxLevelReached {
            country: id.clone(),
            level: current,
        });
    };
    if army.at_max_level() {
        return Err(GameError::MaxLevelReached {
            country: id.clone(),
            level: current,
        });
    }

    let cost = ResourceDelta::gold(stats.cost);
    check_affordable(ctx, id, &cost)?;
    let rules = ctx.rules;
    let now = ctx.now;
    let (res, army) = ctx.world.economy_mut(id)?;
    res.debit(&cost, now).map_err(|short| insufficient(id, short))?;
    army.level = target;
    army.defense = stats.defense;
    refresh_army(rules, res, army);
    let (power, score) = (army.power, army.power_score);

    ctx.world.record_event(
        EventKind::ArmyUpgraded,
        Some(id),
        None,
        serde_json::json!({ "level": target, "cost": stats.cost, "power": power }),
        now,
    );
    debug!(country = %id, level = target, cost = stats.cost, power, score, "army upgraded");
    Ok(target)
}

/// Train `count` infantry at the configured per-soldier cost. Returns the new
/// infantry total.
pub fn recruit(ctx: &mut SimContext, id: &CountryId, count: u32) -> Result<u32, GameError> {
    if count == 0 {
        return Err(GameError::InvalidAmount("recruit count must be positive".into()));
    }
    ctx.world.require_active(id)?;

    let unit = ctx.rules.military.recruit_cost;
    let n = u64::from(count);
    let cost = ResourceDelta {
        gold: unit.gold.saturating_mul(n),
        iron: unit.iron.saturating_mul(n),
        stone: unit.stone.saturating_mul(n),
        food: unit.food.saturating_mul(n),
    };
    check_affordable(ctx, id, &cost)?;

    let now = ctx.now;
    let (res, army) = ctx.world.economy_mut(id)?;
    res.debit(&cost, now).map_err(|short| insufficient(id, short))?;
    army.infantry = army.infantry.saturating_add(count);
    let infantry = army.infantry;
    recompute_power_score(ctx.world, id)?;

    ctx.world.record_event(
        EventKind::TroopsRecruited,
        Some(id),
        None,
        serde_json::json!({ "count": count, "cost": cost, "infantry": infantry }),
        now,
    );
    debug!(country = %id, count, infantry, "troops recruited");
    Ok(infantry)
}
