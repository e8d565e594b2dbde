use std::collections::{BTreeMap, BTreeSet};

use super::army::Army;
use super::country::{Country, CountryId, PlayerId};
use super::event::{Event, EventKind};
use super::relation::{Relation, RelationKey};
use super::resources::Resources;
use super::season::Season;
use super::timestamp::Timestamp;
use crate::error::GameError;
use crate::id::Sequence;

/// Rows touched since the last [`World::take_changes`]; what a durable store
/// has to write back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    /// Countries whose country, resources or army row changed.
    pub countries: BTreeSet<CountryId>,
    pub relations: BTreeSet<RelationKey>,
    pub seasons: BTreeSet<u64>,
    /// Index into `World::events()` of the first unsaved event.
    pub first_new_event: usize,
    pub new_event_count: usize,
}

impl Changeset {
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
            && self.relations.is_empty()
            && self.seasons.is_empty()
            && self.new_event_count == 0
    }
}

/// Saved copy of the mutable tables, taken before an operation so it can be
/// undone if the operation or its write-back fails.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    countries: BTreeMap<CountryId, Country>,
    resources: BTreeMap<CountryId, Resources>,
    armies: BTreeMap<CountryId, Army>,
    relations: BTreeMap<RelationKey, Relation>,
    seasons: BTreeMap<u64, Season>,
    event_len: usize,
    event_ids: Sequence,
    season_ids: Sequence,
    dirty: Changeset,
}

/// The six relations of the game, held in memory.
///
/// Countries are never removed. Resources and armies are 1:1 with countries.
/// Relations are keyed by canonical pair so the table cannot hold two rows for
/// one pair. Events are append-only.
#[derive(Debug, Clone, Default)]
pub struct World {
    countries: BTreeMap<CountryId, Country>,
    resources: BTreeMap<CountryId, Resources>,
    armies: BTreeMap<CountryId, Army>,
    relations: BTreeMap<RelationKey, Relation>,
    seasons: BTreeMap<u64, Season>,
    events: Vec<Event>,
    event_ids: Sequence,
    season_ids: Sequence,
    dirty: Changeset,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Countries --

    /// Add a country with its resource and army rows.
    ///
    /// # Panics
    /// Panics if a country with the same id already exists.
    pub fn insert_country(&mut self, country: Country, resources: Resources, army: Army) {
        let id = country.id.clone();
        assert!(
            !self.countries.contains_key(&id),
            "insert_country: duplicate country {id}"
        );
        self.countries.insert(id.clone(), country);
        self.resources.insert(id.clone(), resources);
        self.armies.insert(id.clone(), army);
        self.dirty.countries.insert(id);
    }

    pub fn country(&self, id: &CountryId) -> Option<&Country> {
        self.countries.get(id)
    }

    pub fn countries(&self) -> impl Iterator<Item = &Country> {
        self.countries.values()
    }

    pub fn require_country(&self, id: &CountryId) -> Result<&Country, GameError> {
        self.countries
            .get(id)
            .ok_or_else(|| GameError::country_not_found(id))
    }

    /// Like [`World::require_country`] but also rejects deactivated countries.
    pub fn require_active(&self, id: &CountryId) -> Result<&Country, GameError> {
        let country = self.require_country(id)?;
        if !country.active {
            return Err(GameError::Inactive(id.clone()));
        }
        Ok(country)
    }

    pub fn country_mut(&mut self, id: &CountryId) -> Result<&mut Country, GameError> {
        let country = self
            .countries
            .get_mut(id)
            .ok_or_else(|| GameError::country_not_found(id))?;
        self.dirty.countries.insert(id.clone());
        Ok(country)
    }

    pub fn country_by_player(&self, player: PlayerId) -> Option<&Country> {
        self.countries
            .values()
            .find(|c| c.active && c.owner == Some(player))
    }

    pub fn resources(&self, id: &CountryId) -> Option<&Resources> {
        self.resources.get(id)
    }

    pub fn resources_mut(&mut self, id: &CountryId) -> Result<&mut Resources, GameError> {
        let res = self
            .resources
            .get_mut(id)
            .ok_or_else(|| GameError::country_not_found(id))?;
        self.dirty.countries.insert(id.clone());
        Ok(res)
    }

    pub fn army(&self, id: &CountryId) -> Option<&Army> {
        self.armies.get(id)
    }

    pub fn army_mut(&mut self, id: &CountryId) -> Result<&mut Army, GameError> {
        let army = self
            .armies
            .get_mut(id)
            .ok_or_else(|| GameError::country_not_found(id))?;
        self.dirty.countries.insert(id.clone());
        Ok(army)
    }

    /// Both mutable rows of one country at once.
    pub fn economy_mut(
        &mut self,
        id: &CountryId,
    ) -> Result<(&mut Resources, &mut Army), GameError> {
        let (Some(res), Some(army)) = (self.resources.get_mut(id), self.armies.get_mut(id)) else {
            return Err(GameError::country_not_found(id));
        };
        self.dirty.countries.insert(id.clone());
        Ok((res, army))
    }

    // -- Relations --

    pub fn relation(&self, a: &CountryId, b: &CountryId) -> Option<&Relation> {
        RelationKey::new(a, b).and_then(|key| self.relations.get(&key))
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    /// Every edge touching `id`, in key order.
    pub fn relations_of<'a>(&'a self, id: &'a CountryId) -> impl Iterator<Item = &'a Relation> {
        self.relations.values().filter(move |r| r.key.involves(id))
    }

    /// Insert a new edge. Fails if the pair already has one.
    pub fn insert_relation(&mut self, relation: Relation) -> Result<(), GameError> {
        if let Some(existing) = self.relations.get(&relation.key) {
            return Err(GameError::DuplicateRelation {
                a: relation.key.low().clone(),
                b: relation.key.high().clone(),
                existing: existing.kind,
            });
        }
        self.dirty.relations.insert(relation.key.clone());
        self.relations.insert(relation.key.clone(), relation);
        Ok(())
    }

    pub fn relation_mut(&mut self, a: &CountryId, b: &CountryId) -> Option<&mut Relation> {
        let key = RelationKey::new(a, b)?;
        let rel = self.relations.get_mut(&key)?;
        self.dirty.relations.insert(key);
        Some(rel)
    }

    // -- Seasons --

    pub fn seasons(&self) -> impl Iterator<Item = &Season> {
        self.seasons.values()
    }

    pub fn season(&self, id: u64) -> Option<&Season> {
        self.seasons.get(&id)
    }

    pub fn active_season(&self) -> Option<&Season> {
        self.seasons.values().find(|s| s.active)
    }

    /// Open a new season. Fails if one is already active.
    pub fn open_season(&mut self, now: Timestamp) -> Result<u64, GameError> {
        if let Some(active) = self.active_season() {
            return Err(GameError::SeasonAlreadyActive { season: active.id });
        }
        let id = self.season_ids.next_id();
        self.seasons.insert(
            id,
            Season {
                id,
                started_at: now,
                ended_at: None,
                active: true,
                winner_country: None,
                winner_player: None,
            },
        );
        self.dirty.seasons.insert(id);
        Ok(id)
    }

    /// Close the active season, writing its terminal fields. Returns the
    /// closed season.
    pub fn close_season(
        &mut self,
        now: Timestamp,
        winner: Option<(CountryId, PlayerId)>,
    ) -> Result<&Season, GameError> {
        let id = self.active_season().ok_or(GameError::NoActiveSeason)?.id;
        let season = self
            .seasons
            .get_mut(&id)
            .ok_or(GameError::NoActiveSeason)?;
        season.active = false;
        season.ended_at = Some(now);
        if let Some((country, player)) = winner {
            season.winner_country = Some(country);
            season.winner_player = Some(player);
        }
        self.dirty.seasons.insert(id);
        Ok(season)
    }

    // -- Events --

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Id the next recorded event will get.
    pub fn next_event_id(&self) -> u64 {
        self.event_ids.peek()
    }

    /// Append an event tagged with the active season. Returns its id.
    pub fn record_event(
        &mut self,
        kind: EventKind,
        actor: Option<&CountryId>,
        target: Option<&CountryId>,
        payload: serde_json::Value,
        now: Timestamp,
    ) -> u64 {
        let id = self.event_ids.next_id();
        let season_id = self.active_season().map(|s| s.id);
        self.events.push(Event {
            id,
            kind,
            actor: actor.cloned(),
            target: target.cloned(),
            payload,
            occurred_at: now,
            season_id,
        });
        self.dirty.new_event_count += 1;
        id
    }

    // -- Change tracking --

    pub fn has_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Hand over the rows touched since the last call and start a new set.
    pub fn take_changes(&mut self) -> Changeset {
        let next = Changeset {
            first_new_event: self.events.len(),
            ..Changeset::default()
        };
        std::mem::replace(&mut self.dirty, next)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            countries: self.countries.clone(),
            resources: self.resources.clone(),
            armies: self.armies.clone(),
            relations: self.relations.clone(),
            seasons: self.seasons.clone(),
            event_len: self.events.len(),
            event_ids: self.event_ids.clone(),
            season_ids: self.season_ids.clone(),
            dirty: self.dirty.clone(),
        }
    }

    pub fn restore(&mut self, cp: Checkpoint) {
        self.countries = cp.countries;
        self.resources = cp.resources;
        self.armies = cp.armies;
        self.relations = cp.relations;
        self.seasons = cp.seasons;
        self.events.truncate(cp.event_len);
        self.event_ids = cp.event_ids;
        self.season_ids = cp.season_ids;
        self.dirty = cp.dirty;
    }

    // -- Loading --

    /// Rebuild a world from persisted rows. Sequences resume after the highest
    /// loaded ids and nothing is marked as changed.
    pub fn from_rows(
        rows: Vec<(Country, Resources, Army)>,
        relations: Vec<Relation>,
        seasons: Vec<Season>,
        mut events: Vec<Event>,
    ) -> Self {
        let mut world = World::new();
        for (country, res, army) in rows {
            let id = country.id.clone();
            world.countries.insert(id.clone(), country);
            world.resources.insert(id.clone(), res);
            world.armies.insert(id, army);
        }
        for rel in relations {
            world.relations.insert(rel.key.clone(), rel);
        }
        for season in seasons {
            world.season_ids.resume_after(season.id);
            world.seasons.insert(season.id, season);
        }
        events.sort_by_key(|e| e.id);
        if let Some(last) = events.last() {
            world.event_ids.resume_after(last.id);
        }
        world.events = events;
        world.dirty = Changeset {
            first_new_event: world.events.len(),
            ..Changeset::default()
        };
        world
    }

    /// Structural invariants; `Err` names the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        for id in self.countries.keys() {
            if !self.resources.contains_key(id) || !self.armies.contains_key(id) {
                return Err(format!("country {id} is missing its resource or army row"));
            }
        }
        for (key, rel) in &self.relations {
            if key != &rel.key || key.low() >= key.high() {
                return Err(format!("relation {key:?} is not in canonical order"));
            }
            if !self.countries.contains_key(key.low()) || !self.countries.contains_key(key.high()) {
                return Err(format!("relation {key:?} references an unknown country"));
            }
            if rel.strength > super::relation::MAX_STRENGTH {
                return Err(format!("relation {key:?} strength {} out of range", rel.strength));
            }
        }
        let active = self.seasons.values().filter(|s| s.active).count();
        if active > 1 {
            return Err(format!("{active} seasons are active"));
        }
        Ok(())
    }
}
