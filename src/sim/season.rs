use std::cmp::Ordering;

use tracing::info;

use super::context::SimContext;
use super::military::refresh_army;
use crate::config::Rules;
use crate::error::GameError;
use crate::model::{
    Army, Country, CountryId, EventKind, Resources, SeasonSummary, Timestamp, Winner, World,
};

/// Stockpile every country starts a game with.
pub fn starting_resources(rules: &Rules, now: Timestamp) -> Resources {
    let r = &rules.start.resources;
    Resources {
        gold: r.gold,
        iron: r.iron,
        stone: r.stone,
        food: r.food,
        updated_at: now,
    }
}

/// Army every country starts a game with, power and score filled in.
pub fn starting_army(rules: &Rules, resources: &Resources) -> Army {
    let start = &rules.start;
    let mut army = Army {
        level: start.level,
        infantry: start.infantry,
        cavalry: start.cavalry,
        siege: start.siege,
        defense: rules.military.level(start.level).map_or(0, |l| l.defense),
        power: 0,
        power_score: 0,
    };
    refresh_army(rules, resources, &mut army);
    army
}

/// A fresh world holding the configured roster, all AI-controlled.
pub fn seed_world(rules: &Rules, now: Timestamp) -> World {
    let mut world = World::new();
    for t in &rules.roster {
        let res = starting_resources(rules, now);
        let army = starting_army(rules, &res);
        world.insert_country(Country::new(t.id.clone(), &t.name, &t.specialty), res, army);
    }
    world
}

pub fn start_season(ctx: &mut SimContext) -> Result<SeasonSummary, GameError> {
    let id = ctx.world.open_season(ctx.now)?;
    ctx.world.record_event(
        EventKind::SeasonStarted,
        None,
        None,
        serde_json::json!({ "season": id }),
        ctx.now,
    );
    info!(season = id, "season started");
    Ok(SeasonSummary {
        season: id,
        started_at: ctx.now,
        ended_at: None,
        winner: None,
    })
}

/// Earlier join wins a tie; a missing join time sorts last.
fn joined_earlier(a: Option<Timestamp>, b: Option<Timestamp>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The human-controlled country with the highest power score.
pub fn pick_winner(world: &World) -> Option<Winner> {
    let mut best: Option<(&Country, u64)> = None;
    for c in world.countries().filter(|c| c.active && c.is_human() && c.owner.is_some()) {
        let Some(score) = world.army(&c.id).map(|a| a.power_score) else {
            continue;
        };
        let better = match best {
            None => true,
            Some((b, best_score)) => score
                .cmp(&best_score)
                .reverse()
                .then_with(|| joined_earlier(c.joined_at, b.joined_at))
                .then_with(|| c.id.cmp(&b.id))
                .is_lt(),
        };
        if better {
            best = Some((c, score));
        }
    }
    best.and_then(|(c, power_score)| {
        c.owner.map(|player| Winner {
            country: c.id.clone(),
            player,
            power_score,
        })
    })
}

pub fn end_season(ctx: &mut SimContext) -> Result<SeasonSummary, GameError> {
    let active = ctx.world.active_season().ok_or(GameError::NoActiveSeason)?;
    let (id, started_at) = (active.id, active.started_at);
    let winner = pick_winner(ctx.world);

    ctx.world.record_event(
        EventKind::SeasonEnded,
        winner.as_ref().map(|w| &w.country),
        None,
        serde_json::json!({ "season": id, "winner": winner }),
        ctx.now,
    );
    ctx.world.close_season(
        ctx.now,
        winner.as_ref().map(|w| (w.country.clone(), w.player)),
    )?;
    match &winner {
        Some(w) => info!(season = id, winner = %w.country, player = w.player, "season ended"),
        None => info!(season = id, "season ended without a winner"),
    }
    Ok(SeasonSummary {
        season: id,
        started_at,
        ended_at: Some(ctx.now),
        winner,
    })
}

/// Put every country's stockpile and army back to the starting figures.
/// Ownership and diplomacy are left alone. Returns the number of countries reset.
pub fn reset_economy(ctx: &mut SimContext) -> Result<usize, GameError> {
    let ids: Vec<CountryId> = ctx.world.countries().map(|c| c.id.clone()).collect();
    for id in &ids {
        let fresh = starting_resources(ctx.rules, ctx.now);
        let army = starting_army(ctx.rules, &fresh);
        let (res, current) = ctx.world.economy_mut(id)?;
        *res = fresh;
        *current = army;
    }
    ctx.world.record_event(
        EventKind::EconomyReset,
        None,
        None,
        serde_json::json!({ "countries": ids.len() }),
        ctx.now,
    );
    info!(countries = ids.len(), "economy reset");
    Ok(ids.len())
}
