//! The operations a front end calls: every command takes a country id (and
//! perhaps a player or second country) and returns a structured result.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::GameConfig;
use crate::error::GameError;
use crate::flush::flush_to_jsonl;
use crate::model::{
    Army, Clock, Controller, Country, CountryId, Event, EventKind, PlayerId, RelationKind,
    ResourceDelta, Resources, SeasonSummary,
};
use crate::sim::advisor::{Recommendation, advise};
use crate::sim::ai::{TickReport, take_turn};
use crate::sim::combat::{BattleOutcome, resolve_battle};
use crate::sim::diplomacy::{RelationView, list_relations, make_peace, propose_alliance};
use crate::sim::economy::{RankEntry, accrue_resources, ranking};
use crate::sim::military::{recruit, upgrade};
use crate::sim::{SimContext, season};
use crate::store::StateStore;

/// Everything a player sees about one country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySnapshot {
    pub country: Country,
    pub resources: Resources,
    pub army: Army,
    pub relations: Vec<RelationView>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GameStats {
    pub human_players: usize,
    pub ai_countries: usize,
    pub alliances: usize,
    pub wars: usize,
    /// Id of the running season, if any.
    pub active_season: Option<u64>,
}

pub struct Game {
    store: StateStore,
}

impl Game {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    pub async fn open(config: &GameConfig, clock: Arc<dyn Clock>) -> Result<Self, GameError> {
        Ok(Self::new(StateStore::open(config, clock).await?))
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    // -- Countries --

    pub async fn get_country_by_player(
        &self,
        player: PlayerId,
    ) -> Result<Option<Country>, GameError> {
        self.store
            .read(|w| w.country_by_player(player).cloned())
            .await
    }

    pub async fn get_country_snapshot(&self, id: &CountryId) -> Result<CountrySnapshot, GameError> {
        self.store
            .read(|w| {
                let country = w.require_country(id)?.clone();
                let (Some(resources), Some(army)) = (w.resources(id), w.army(id)) else {
                    return Err(GameError::country_not_found(id));
                };
                Ok(CountrySnapshot {
                    country,
                    resources: resources.clone(),
                    army: army.clone(),
                    relations: list_relations(w, id),
                })
            })
            .await?
    }

    pub async fn assign_country(&self, id: &CountryId, player: PlayerId) -> Result<(), GameError> {
        self.store.write(|ctx| assign(ctx, id, player)).await
    }

    pub async fn release_country(&self, id: &CountryId) -> Result<(), GameError> {
        self.store.write(|ctx| release(ctx, id)).await
    }

    pub async fn deactivate_country(&self, id: &CountryId) -> Result<(), GameError> {
        self.store.write(|ctx| deactivate(ctx, id)).await
    }

    // -- Economy and military --

    pub async fn collect_resources(&self, id: &CountryId) -> Result<ResourceDelta, GameError> {
        self.store.write(|ctx| accrue_resources(ctx, id)).await
    }

    pub async fn upgrade_army(&self, id: &CountryId) -> Result<u8, GameError> {
        self.store.write(|ctx| upgrade(ctx, id)).await
    }

    pub async fn recruit(&self, id: &CountryId, count: u32) -> Result<u32, GameError> {
        self.store.write(|ctx| recruit(ctx, id, count)).await
    }

    // -- Diplomacy and combat --

    pub async fn propose_alliance(&self, from: &CountryId, to: &CountryId) -> Result<(), GameError> {
        self.store.write(|ctx| propose_alliance(ctx, from, to)).await
    }

    pub async fn make_peace(&self, from: &CountryId, to: &CountryId) -> Result<(), GameError> {
        self.store.write(|ctx| make_peace(ctx, from, to)).await
    }

    pub async fn list_relations(&self, id: &CountryId) -> Result<Vec<RelationView>, GameError> {
        self.store
            .read(|w| {
                w.require_country(id)?;
                Ok(list_relations(w, id))
            })
            .await?
    }

    /// Attack with a battle seed drawn from the store's generator; the seed is
    /// part of the outcome so the battle can be replayed.
    pub async fn attack(
        &self,
        attacker: &CountryId,
        defender: &CountryId,
    ) -> Result<BattleOutcome, GameError> {
        self.store
            .write(|ctx| {
                let seed = ctx.rng.next_u64();
                resolve_battle(ctx, attacker, defender, seed)
            })
            .await
    }

    pub async fn attack_with_seed(
        &self,
        attacker: &CountryId,
        defender: &CountryId,
        seed: u64,
    ) -> Result<BattleOutcome, GameError> {
        self.store
            .write(|ctx| resolve_battle(ctx, attacker, defender, seed))
            .await
    }

    /// Never fails: when the store cannot be read the advice is neutral.
    pub async fn get_advice(&self, id: &CountryId) -> Recommendation {
        let rules = &self.store.rules().advisor;
        match self
            .store
            .read_with_rng(|w, rng| advise(w, rules, id, rng))
            .await
        {
            Ok(rec) => rec,
            Err(e) => {
                warn!(country = %id, error = %e, "advice degraded");
                Recommendation::insufficient_data()
            }
        }
    }

    // -- Seasons --

    pub async fn start_season(&self) -> Result<SeasonSummary, GameError> {
        self.store.write(season::start_season).await
    }

    pub async fn end_season(&self) -> Result<SeasonSummary, GameError> {
        self.store.write(season::end_season).await
    }

    pub async fn reset_economy(&self) -> Result<usize, GameError> {
        self.store.write(season::reset_economy).await
    }

    // -- Queries --

    /// Never fails: when the store cannot be read the ranking is empty.
    pub async fn list_ranking(&self, limit: usize) -> Vec<RankEntry> {
        match self.store.read(|w| ranking(w, limit)).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "ranking degraded");
                Vec::new()
            }
        }
    }

    /// The latest events, newest first.
    pub async fn recent_events(&self, limit: usize) -> Result<Vec<Event>, GameError> {
        self.store
            .read(|w| w.events().iter().rev().take(limit).cloned().collect())
            .await
    }

    pub async fn stats(&self) -> Result<GameStats, GameError> {
        self.store
            .read(|w| {
                let active: Vec<&Country> = w.countries().filter(|c| c.active).collect();
                let count_kind =
                    |kind: RelationKind| w.relations().filter(|r| r.kind == kind).count();
                GameStats {
                    human_players: active.iter().filter(|c| c.is_human()).count(),
                    ai_countries: active.iter().filter(|c| c.is_ai()).count(),
                    alliances: count_kind(RelationKind::Alliance),
                    wars: count_kind(RelationKind::War),
                    active_season: w.active_season().map(|s| s.id),
                }
            })
            .await
    }

    // -- AI and maintenance --

    /// Play one turn for every active AI country, each under its own write.
    /// A country whose turn cannot run is reported and the tick moves on.
    pub async fn run_ai_tick(&self) -> TickReport {
        let ids = match self
            .store
            .read(|w| {
                w.countries()
                    .filter(|c| c.active && c.is_ai())
                    .map(|c| c.id.clone())
                    .collect::<Vec<_>>()
            })
            .await
        {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "ai tick skipped");
                return TickReport::default();
            }
        };
        self.run_ai_turns(&ids).await
    }

    /// Play one turn for each listed country, in order.
    pub async fn run_ai_turns(&self, ids: &[CountryId]) -> TickReport {
        let mut report = TickReport::default();
        for id in ids {
            match self.store.write(|ctx| take_turn(ctx, id)).await {
                Ok(turn) => report.turns.push(turn),
                Err(e) => report.failed_turns.push((id.clone(), e)),
            }
        }
        report
    }

    /// Write a JSONL snapshot of the whole world into `dir`.
    pub async fn export_snapshot(&self, dir: &Path) -> Result<(), GameError> {
        self.store
            .read(|w| flush_to_jsonl(w, dir))
            .await?
            .map_err(|e| GameError::Persistence(format!("snapshot to {}: {e}", dir.display())))
    }
}

/// Hand a country to a player. One owner per country, one active country
/// per player.
fn assign(ctx: &mut SimContext, id: &CountryId, player: PlayerId) -> Result<(), GameError> {
    let country = ctx.world.require_active(id)?;
    if let Some(owner) = country.owner {
        return Err(GameError::AlreadyAssigned {
            country: id.clone(),
            owner,
        });
    }
    if let Some(held) = ctx.world.country_by_player(player) {
        return Err(GameError::AlreadyAssigned {
            country: held.id.clone(),
            owner: player,
        });
    }

    let now = ctx.now;
    let country = ctx.world.country_mut(id)?;
    country.controller = Controller::Human;
    country.owner = Some(player);
    country.joined_at = Some(now);
    ctx.world.record_event(
        EventKind::CountryAssigned,
        Some(id),
        None,
        serde_json::json!({ "player": player }),
        now,
    );
    info!(country = %id, player, "country assigned");
    Ok(())
}

/// Return a country to AI control.
fn release(ctx: &mut SimContext, id: &CountryId) -> Result<(), GameError> {
    let Some(player) = ctx.world.require_country(id)?.owner else {
        return Err(GameError::NotFound {
            entity: "owner",
            key: id.to_string(),
        });
    };
    let country = ctx.world.country_mut(id)?;
    country.controller = Controller::Ai;
    country.owner = None;
    country.joined_at = None;
    ctx.world.record_event(
        EventKind::CountryReleased,
        Some(id),
        None,
        serde_json::json!({ "player": player }),
        ctx.now,
    );
    info!(country = %id, player, "country released");
    Ok(())
}

/// Take a country out of play. It keeps its rows and history.
fn deactivate(ctx: &mut SimContext, id: &CountryId) -> Result<(), GameError> {
    ctx.world.require_active(id)?;
    ctx.world.country_mut(id)?.active = false;
    ctx.world.record_event(
        EventKind::CountryDeactivated,
        Some(id),
        None,
        serde_json::Value::Null,
        ctx.now,
    );
    info!(country = %id, "country deactivated");
    Ok(())
}
