//! Autonomous play for AI-controlled countries.
//!
//! Each tick an AI country samples a few distinct actions and rolls each one
//! against its own trigger chance. Every action runs against a checkpoint so a
//! failure undoes only that action and the rest of the turn carries on.

use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::{IndexedRandom, index};
use rand::{Rng, RngCore};
use serde::Serialize;
use tracing::{debug, warn};

use super::combat::{BattleOutcome, resolve_battle};
use super::context::SimContext;
use super::diplomacy::{allies_of, are_allied, betray_alliance, propose_alliance};
use super::economy::accrue_resources;
use super::military::{recruit, upgrade};
use crate::config::AI_ACTION_COUNT;
use crate::error::GameError;
use crate::model::{CountryId, ResourceDelta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AiAction {
    CollectResources,
    TrainArmy,
    AttackDecision,
    FormAlliance,
    BetrayAlliance,
}

impl AiAction {
    pub const ALL: [AiAction; AI_ACTION_COUNT] = [
        AiAction::CollectResources,
        AiAction::TrainArmy,
        AiAction::AttackDecision,
        AiAction::FormAlliance,
        AiAction::BetrayAlliance,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ActionEffect {
    Collected { delta: ResourceDelta },
    Upgraded { level: u8 },
    Recruited { count: u32, infantry: u32 },
    Attacked { outcome: Box<BattleOutcome> },
    AllianceProposed { with: CountryId },
    Betrayed { ally: CountryId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Performed(ActionEffect),
    Skipped { reason: &'static str },
    Failed(GameError),
}

impl ActionOutcome {
    pub fn is_performed(&self) -> bool {
        matches!(self, ActionOutcome::Performed(_))
    }
}

/// What one AI country did in one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct AiTurn {
    pub country: CountryId,
    pub actions: Vec<(AiAction, ActionOutcome)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub turns: Vec<AiTurn>,
    /// Countries whose turn could not run at all, e.g. the store was busy.
    pub failed_turns: Vec<(CountryId, GameError)>,
}

impl TickReport {
    pub fn performed(&self) -> usize {
        self.turns
            .iter()
            .flat_map(|t| &t.actions)
            .filter(|(_, o)| o.is_performed())
            .count()
    }
}

fn skipped(reason: &'static str) -> Result<ActionOutcome, GameError> {
    Ok(ActionOutcome::Skipped { reason })
}

/// Play one turn for an AI country.
///
/// Fails only when the country is unknown or inactive. A human-controlled
/// country gets an empty turn. Errors of single actions are rolled back and
/// reported in the turn, never returned.
pub fn take_turn(ctx: &mut SimContext, id: &CountryId) -> Result<AiTurn, GameError> {
    let is_ai = ctx.world.require_active(id)?.is_ai();
    let mut turn = AiTurn {
        country: id.clone(),
        actions: Vec::new(),
    };
    if !is_ai {
        return Ok(turn);
    }

    let (lo, hi) = ctx.rules.ai.actions_per_tick;
    let count = ctx.rng.random_range(lo..=hi).min(AI_ACTION_COUNT);
    let picks = index::sample(&mut *ctx.rng, AI_ACTION_COUNT, count);

    for i in picks.iter() {
        let action = AiAction::ALL[i];
        let checkpoint = ctx.world.checkpoint();
        let outcome = match run_action(ctx, id, action) {
            Ok(outcome) => outcome,
            Err(e) => {
                ctx.world.restore(checkpoint);
                warn!(country = %id, ?action, error = %e, "ai action failed");
                ActionOutcome::Failed(e)
            }
        };
        debug!(country = %id, ?action, ?outcome, "ai action");
        turn.actions.push((action, outcome));
    }
    Ok(turn)
}

fn run_action(
    ctx: &mut SimContext,
    id: &CountryId,
    action: AiAction,
) -> Result<ActionOutcome, GameError> {
    match action {
        AiAction::CollectResources => collect(ctx, id),
        AiAction::TrainArmy => train(ctx, id),
        AiAction::AttackDecision => attack(ctx, id),
        AiAction::FormAlliance => seek_alliance(ctx, id),
        AiAction::BetrayAlliance => betray(ctx, id),
    }
}

fn gold_of(ctx: &SimContext, id: &CountryId) -> u64 {
    ctx.world.resources(id).map_or(0, |r| r.gold)
}

fn collect(ctx: &mut SimContext, id: &CountryId) -> Result<ActionOutcome, GameError> {
    if !ctx.rng.random_bool(ctx.rules.ai.collect_chance) {
        return skipped("roll failed");
    }
    let delta = accrue_resources(ctx, id)?;
    Ok(ActionOutcome::Performed(ActionEffect::Collected { delta }))
}

/// Upgrade when affordable; at the ceiling or short of gold, recruit instead.
fn train(ctx: &mut SimContext, id: &CountryId) -> Result<ActionOutcome, GameError> {
    if gold_of(ctx, id) <= ctx.rules.ai.train_gold_threshold {
        return skipped("treasury below training threshold");
    }
    if !ctx.rng.random_bool(ctx.rules.ai.train_chance) {
        return skipped("roll failed");
    }
    match upgrade(ctx, id) {
        Ok(level) => Ok(ActionOutcome::Performed(ActionEffect::Upgraded { level })),
        Err(GameError::MaxLevelReached { .. } | GameError::InsufficientResources { .. }) => {
            let count = ctx.rules.ai.recruit_batch;
            let infantry = recruit(ctx, id, count)?;
            Ok(ActionOutcome::Performed(ActionEffect::Recruited { count, infantry }))
        }
        Err(e) => Err(e),
    }
}

/// Human countries this AI could attack, weakest first.
pub fn attack_candidates(ctx: &SimContext, id: &CountryId) -> Vec<(CountryId, u64)> {
    let own = ctx.world.army(id).map_or(0, |a| a.power_score);
    let ceiling = own as f64 * ctx.rules.ai.attack_margin;
    let mut candidates: Vec<(CountryId, u64)> = ctx
        .world
        .countries()
        .filter(|c| c.active && c.is_human() && &c.id != id)
        .filter(|c| !are_allied(ctx.world, id, &c.id))
        .filter_map(|c| ctx.world.army(&c.id).map(|a| (c.id.clone(), a.power_score)))
        .filter(|(_, score)| (*score as f64) < ceiling)
        .collect();
    candidates.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    candidates
}

/// Pick from candidates sorted weakest first, with weight 1/rank.
pub fn pick_weighted_by_rank<'c>(
    candidates: &'c [(CountryId, u64)],
    rng: &mut dyn RngCore,
) -> Option<&'c CountryId> {
    let weights = (1..=candidates.len()).map(|rank| 1.0 / rank as f64);
    let dist = WeightedIndex::new(weights).ok()?;
    candidates.get(dist.sample(rng)).map(|(id, _)| id)
}

fn attack(ctx: &mut SimContext, id: &CountryId) -> Result<ActionOutcome, GameError> {
    if !ctx.rng.random_bool(ctx.rules.ai.attack_chance) {
        return skipped("roll failed");
    }
    let candidates = attack_candidates(ctx, id);
    let Some(target) = pick_weighted_by_rank(&candidates, &mut *ctx.rng).cloned() else {
        return skipped("no weaker human target");
    };
    let seed = ctx.rng.next_u64();
    let outcome = resolve_battle(ctx, id, &target, seed)?;
    Ok(ActionOutcome::Performed(ActionEffect::Attacked {
        outcome: Box::new(outcome),
    }))
}

fn seek_alliance(ctx: &mut SimContext, id: &CountryId) -> Result<ActionOutcome, GameError> {
    if gold_of(ctx, id) <= ctx.rules.ai.alliance_treasury_floor {
        return skipped("treasury below alliance floor");
    }
    if !ctx.rng.random_bool(ctx.rules.ai.alliance_chance) {
        return skipped("roll failed");
    }
    let candidates: Vec<CountryId> = ctx
        .world
        .countries()
        .filter(|c| c.active && &c.id != id)
        .filter(|c| ctx.world.relation(id, &c.id).is_none())
        .map(|c| c.id.clone())
        .collect();
    let Some(partner) = candidates.choose(&mut *ctx.rng).cloned() else {
        return skipped("no country without a relation");
    };
    propose_alliance(ctx, id, &partner)?;
    Ok(ActionOutcome::Performed(ActionEffect::AllianceProposed { with: partner }))
}

fn betray(ctx: &mut SimContext, id: &CountryId) -> Result<ActionOutcome, GameError> {
    let allies = allies_of(ctx.world, id);
    if allies.is_empty() {
        return skipped("no alliance to betray");
    }
    if !ctx.rng.random_bool(ctx.rules.ai.betray_chance) {
        return skipped("roll failed");
    }
    let Some(ally) = allies.choose(&mut *ctx.rng).cloned() else {
        return skipped("no alliance to betray");
    };
    betray_alliance(ctx, id, &ally)?;
    Ok(ActionOutcome::Performed(ActionEffect::Betrayed { ally }))
}
