//! Battle resolution.
//!
//! A battle is planned first from a read-only view of the world and then
//! applied, so every draw happens before any row changes. Given the same
//! world and seed the outcome is identical.

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::context::SimContext;
use super::diplomacy::are_allied;
use super::economy::recompute_power_score;
use super::military::insufficient;
use crate::config::CombatRules;
use crate::error::GameError;
use crate::model::{CountryId, EventKind, ResourceDelta, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Attacker,
    Defender,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleOutcome {
    pub attacker: CountryId,
    pub defender: CountryId,
    pub seed: u64,
    pub attacker_multiplier: f64,
    pub defender_multiplier: f64,
    /// Power scores going into the battle.
    pub attacker_score: u64,
    pub defender_score: u64,
    /// Scores after the luck multipliers.
    pub attacker_strength: f64,
    pub defender_strength: f64,
    pub winner: Side,
    pub attacker_losses: u32,
    pub defender_losses: u32,
    /// Taken from the loser, given to the winner.
    pub loot: ResourceDelta,
    pub event_id: u64,
}

impl BattleOutcome {
    pub fn winner_id(&self) -> &CountryId {
        match self.winner {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    pub fn loser_id(&self) -> &CountryId {
        match self.winner {
            Side::Attacker => &self.defender,
            Side::Defender => &self.attacker,
        }
    }
}

/// Fraction of `infantry` lost, at least `min_loss` and never more than the
/// troops present.
fn losses(infantry: u32, fraction: f64, min_loss: u32) -> u32 {
    let raw = (f64::from(infantry) * fraction) as u32;
    raw.max(min_loss).min(infantry)
}

fn draw(rng: &mut dyn RngCore, (lo, hi): (f64, f64)) -> f64 {
    rng.random_range(lo..=hi)
}

fn loot_amount(balance: u64, fraction: f64, cap: u64) -> u64 {
    ((balance as f64 * fraction) as u64).min(cap).min(balance)
}

/// Validate the pair and draw every random figure of a battle.
///
/// Draw order: attacker multiplier, defender multiplier, winner loss
/// fraction, loser loss fraction, loot fraction. Ties go to the defender.
pub fn plan_battle(
    world: &World,
    rules: &CombatRules,
    attacker: &CountryId,
    defender: &CountryId,
    seed: u64,
    rng: &mut dyn RngCore,
) -> Result<BattleOutcome, GameError> {
    if attacker == defender {
        return Err(GameError::SelfTarget(attacker.clone()));
    }
    world.require_active(attacker)?;
    world.require_active(defender)?;
    if are_allied(world, attacker, defender) {
        return Err(GameError::AlliedTarget {
            attacker: attacker.clone(),
            defender: defender.clone(),
        });
    }
    let (Some(a_army), Some(d_army)) = (world.army(attacker), world.army(defender)) else {
        return Err(GameError::country_not_found(attacker));
    };

    let attacker_multiplier = draw(rng, rules.multiplier);
    let defender_multiplier = draw(rng, rules.multiplier);
    let attacker_strength = a_army.power_score as f64 * attacker_multiplier;
    let defender_strength = d_army.power_score as f64 * defender_multiplier;
    let winner = if attacker_strength > defender_strength {
        Side::Attacker
    } else {
        Side::Defender
    };

    let winner_fraction = draw(rng, rules.winner_loss);
    let loser_fraction = draw(rng, rules.loser_loss);
    let (attacker_fraction, defender_fraction) = match winner {
        Side::Attacker => (winner_fraction, loser_fraction),
        Side::Defender => (loser_fraction, winner_fraction),
    };
    let attacker_losses = losses(a_army.infantry, attacker_fraction, rules.min_loss);
    let defender_losses = losses(d_army.infantry, defender_fraction, rules.min_loss);

    let loser = match winner {
        Side::Attacker => defender,
        Side::Defender => attacker,
    };
    let loot_fraction = draw(rng, rules.loot_fraction);
    let loot = match world.resources(loser) {
        Some(res) => ResourceDelta {
            gold: loot_amount(res.gold, loot_fraction, rules.loot_gold_cap),
            food: loot_amount(res.food, loot_fraction, rules.loot_food_cap),
            ..ResourceDelta::default()
        },
        None => ResourceDelta::default(),
    };

    Ok(BattleOutcome {
        attacker: attacker.clone(),
        defender: defender.clone(),
        seed,
        attacker_multiplier,
        defender_multiplier,
        attacker_score: a_army.power_score,
        defender_score: d_army.power_score,
        attacker_strength,
        defender_strength,
        winner,
        attacker_losses,
        defender_losses,
        loot,
        event_id: 0,
    })
}

/// Resolve a battle with a generator seeded from `seed`.
pub fn resolve_battle(
    ctx: &mut SimContext,
    attacker: &CountryId,
    defender: &CountryId,
    seed: u64,
) -> Result<BattleOutcome, GameError> {
    let mut rng = SmallRng::seed_from_u64(seed);
    resolve_battle_with(ctx, attacker, defender, seed, &mut rng)
}

/// Resolve a battle drawing from `rng`; `seed` is only recorded.
pub fn resolve_battle_with(
    ctx: &mut SimContext,
    attacker: &CountryId,
    defender: &CountryId,
    seed: u64,
    rng: &mut dyn RngCore,
) -> Result<BattleOutcome, GameError> {
    let mut outcome = plan_battle(ctx.world, &ctx.rules.combat, attacker, defender, seed, rng)?;
    apply(ctx, &outcome)?;

    outcome.event_id = ctx.world.next_event_id();
    let payload = serde_json::to_value(&outcome).unwrap_or(serde_json::Value::Null);
    ctx.world.record_event(
        EventKind::Battle,
        Some(attacker),
        Some(defender),
        payload,
        ctx.now,
    );
    info!(
        attacker = %attacker,
        defender = %defender,
        winner = %outcome.winner_id(),
        attacker_losses = outcome.attacker_losses,
        defender_losses = outcome.defender_losses,
        loot_gold = outcome.loot.gold,
        seed,
        "battle resolved"
    );
    Ok(outcome)
}

/// Losses change troop counts only; army power stays at its level's value.
fn apply(ctx: &mut SimContext, outcome: &BattleOutcome) -> Result<(), GameError> {
    let now = ctx.now;
    let (winner_losses, loser_losses) = match outcome.winner {
        Side::Attacker => (outcome.attacker_losses, outcome.defender_losses),
        Side::Defender => (outcome.defender_losses, outcome.attacker_losses),
    };

    let loser = outcome.loser_id();
    let (res, army) = ctx.world.economy_mut(loser)?;
    res.debit(&outcome.loot, now)
        .map_err(|short| insufficient(loser, short))?;
    army.infantry = army.infantry.saturating_sub(loser_losses);
    recompute_power_score(ctx.world, loser)?;

    let winner = outcome.winner_id();
    let (res, army) = ctx.world.economy_mut(winner)?;
    res.credit(&outcome.loot, now);
    army.infantry = army.infantry.saturating_sub(winner_losses);
    recompute_power_score(ctx.world, winner)?;
    Ok(())
}
