use tracing::info;

use super::context::SimContext;
use crate::error::GameError;
use crate::model::{CountryId, EventKind, Relation, RelationKey, RelationKind, World};
use crate::model::relation::DEFAULT_STRENGTH;

fn pair_key(a: &CountryId, b: &CountryId) -> Result<RelationKey, GameError> {
    RelationKey::new(a, b).ok_or_else(|| GameError::SelfTarget(a.clone()))
}

/// Open an alliance between two countries.
///
/// A pair with no edge gets a new alliance; a neutral edge (left by a peace
/// treaty) turns back into one. An alliance or war already on the pair is a
/// duplicate.
pub fn propose_alliance(
    ctx: &mut SimContext,
    from: &CountryId,
    to: &CountryId,
) -> Result<(), GameError> {
    let key = pair_key(from, to)?;
    ctx.world.require_active(from)?;
    ctx.world.require_active(to)?;

    let now = ctx.now;
    match ctx.world.relation(from, to).map(|r| r.kind) {
        Some(RelationKind::Neutral) => {
            if let Some(rel) = ctx.world.relation_mut(from, to) {
                rel.kind = RelationKind::Alliance;
                rel.strength = DEFAULT_STRENGTH;
                rel.since = now;
                rel.updated_at = now;
            }
        }
        Some(existing) => {
            return Err(GameError::DuplicateRelation {
                a: key.low().clone(),
                b: key.high().clone(),
                existing,
            });
        }
        None => ctx
            .world
            .insert_relation(Relation::new(key, RelationKind::Alliance, now))?,
    }

    ctx.world.record_event(
        EventKind::AllianceFormed,
        Some(from),
        Some(to),
        serde_json::Value::Null,
        now,
    );
    info!(from = %from, to = %to, "alliance formed");
    Ok(())
}

/// Turn an alliance into a war, in place.
pub fn betray_alliance(
    ctx: &mut SimContext,
    from: &CountryId,
    to: &CountryId,
) -> Result<(), GameError> {
    pair_key(from, to)?;
    ctx.world.require_active(from)?;
    transition(ctx, from, to, RelationKind::Alliance, RelationKind::War)?;
    ctx.world.record_event(
        EventKind::AllianceBetrayed,
        Some(from),
        Some(to),
        serde_json::Value::Null,
        ctx.now,
    );
    info!(from = %from, to = %to, "alliance betrayed");
    Ok(())
}

/// End a war; the edge stays behind as neutral.
pub fn make_peace(ctx: &mut SimContext, from: &CountryId, to: &CountryId) -> Result<(), GameError> {
    pair_key(from, to)?;
    ctx.world.require_active(from)?;
    transition(ctx, from, to, RelationKind::War, RelationKind::Neutral)?;
    ctx.world.record_event(
        EventKind::PeaceMade,
        Some(from),
        Some(to),
        serde_json::Value::Null,
        ctx.now,
    );
    info!(from = %from, to = %to, "peace made");
    Ok(())
}

fn transition(
    ctx: &mut SimContext,
    a: &CountryId,
    b: &CountryId,
    expected: RelationKind,
    next: RelationKind,
) -> Result<(), GameError> {
    let current = ctx.world.relation(a, b).map(|r| r.kind);
    if current != Some(expected) {
        return Err(match expected {
            RelationKind::War => GameError::NotAtWar {
                a: a.clone(),
                b: b.clone(),
            },
            _ => GameError::NoAlliance {
                a: a.clone(),
                b: b.clone(),
            },
        });
    }
    if let Some(rel) = ctx.world.relation_mut(a, b) {
        rel.kind = next;
        rel.updated_at = ctx.now;
    }
    Ok(())
}

/// A relation as seen from one side.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RelationView {
    pub counterpart: CountryId,
    pub kind: RelationKind,
    pub strength: u8,
    pub since: crate::model::Timestamp,
}

/// Every relation of `id`: alliances first, then wars, then neutral edges;
/// within a kind, strongest first, then by counterpart.
pub fn list_relations(world: &World, id: &CountryId) -> Vec<RelationView> {
    let mut views: Vec<RelationView> = world
        .relations_of(id)
        .filter_map(|r| {
            r.counterpart(id).map(|other| RelationView {
                counterpart: other.clone(),
                kind: r.kind,
                strength: r.strength,
                since: r.since,
            })
        })
        .collect();
    views.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| b.strength.cmp(&a.strength))
            .then_with(|| a.counterpart.cmp(&b.counterpart))
    });
    views
}

pub fn allies_of(world: &World, id: &CountryId) -> Vec<CountryId> {
    countries_with(world, id, RelationKind::Alliance)
}

pub fn enemies_of(world: &World, id: &CountryId) -> Vec<CountryId> {
    countries_with(world, id, RelationKind::War)
}

fn countries_with(world: &World, id: &CountryId, kind: RelationKind) -> Vec<CountryId> {
    world
        .relations_of(id)
        .filter(|r| r.kind == kind)
        .filter_map(|r| r.counterpart(id).cloned())
        .collect()
}

pub fn are_allied(world: &World, a: &CountryId, b: &CountryId) -> bool {
    world
        .relation(a, b)
        .is_some_and(|r| r.kind == RelationKind::Alliance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::testutil::{id, test_world, with_ctx};

    #[test]
    fn proposal_creates_one_canonical_edge() {
        let rules = Rules::default();
        let mut world = test_world(&rules);
        let (rome, egypt) = (id("rome"), id("egypt"));

        with_ctx(&mut world, &rules, 1, |ctx| propose_alliance(ctx, &rome, &egypt)).unwrap();

        let rel = world.relation(&egypt, &rome).unwrap();
        assert_eq!(rel.kind, RelationKind::Alliance);
        assert_eq!(rel.strength, DEFAULT_STRENGTH);
        assert_eq!(rel.key.low(), &egypt);
        assert_eq!(world.relations().count(), 1);
        assert!(are_allied(&world, &rome, &egypt));
    }

    #[test]
    fn duplicate_proposal_is_rejected_in_either_direction() {
        let rules = Rules::default();
        let mut world = test_world(&rules);
        let (rome, egypt) = (id("rome"), id("egypt"));

        with_ctx(&mut world, &rules, 1, |ctx| propose_alliance(ctx, &rome, &egypt)).unwrap();
        let err = with_ctx(&mut world, &rules, 1, |ctx| propose_alliance(ctx, &egypt, &rome))
            .unwrap_err();
        assert_eq!(
            err,
            GameError::DuplicateRelation {
                a: egypt.clone(),
                b: rome.clone(),
                existing: RelationKind::Alliance
            }
        );
        assert_eq!(world.relations().count(), 1);
    }

    #[test]
    fn self_and_unknown_targets_are_rejected() {
        let rules = Rules::default();
        let mut world = test_world(&rules);
        let rome = id("rome");

        let err = with_ctx(&mut world, &rules, 1, |ctx| propose_alliance(ctx, &rome, &rome))
            .unwrap_err();
        assert_eq!(err, GameError::SelfTarget(rome.clone()));

        let err = with_ctx(&mut world, &rules, 1, |ctx| {
            propose_alliance(ctx, &rome, &id("atlantis"))
        })
        .unwrap_err();
        assert!(matches!(err, GameError::NotFound { entity: "country", .. }));
        assert_eq!(world.relations().count(), 0);
    }

    #[test]
    fn betrayal_turns_the_same_edge_to_war() {
        let rules = Rules::default();
        let mut world = test_world(&rules);
        let (rome, egypt) = (id("rome"), id("egypt"));

        with_ctx(&mut world, &rules, 1, |ctx| {
            propose_alliance(ctx, &rome, &egypt)?;
            betray_alliance(ctx, &egypt, &rome)
        })
        .unwrap();

        assert_eq!(world.relations().count(), 1);
        assert_eq!(world.relation(&rome, &egypt).unwrap().kind, RelationKind::War);
        assert_eq!(enemies_of(&world, &rome), vec![egypt.clone()]);

        let err = with_ctx(&mut world, &rules, 1, |ctx| betray_alliance(ctx, &rome, &egypt))
            .unwrap_err();
        assert!(matches!(err, GameError::NoAlliance { .. }));
    }

    #[test]
    fn war_blocks_new_alliance_until_peace() {
        let rules = Rules::default();
        let mut world = test_world(&rules);
        let (rome, egypt) = (id("rome"), id("egypt"));

        with_ctx(&mut world, &rules, 1, |ctx| {
            propose_alliance(ctx, &rome, &egypt)?;
            betray_alliance(ctx, &rome, &egypt)
        })
        .unwrap();

        let err = with_ctx(&mut world, &rules, 1, |ctx| propose_alliance(ctx, &rome, &egypt))
            .unwrap_err();
        assert!(matches!(
            err,
            GameError::DuplicateRelation {
                existing: RelationKind::War,
                ..
            }
        ));

        with_ctx(&mut world, &rules, 1, |ctx| make_peace(ctx, &egypt, &rome)).unwrap();
        assert_eq!(world.relation(&rome, &egypt).unwrap().kind, RelationKind::Neutral);

        with_ctx(&mut world, &rules, 1, |ctx| propose_alliance(ctx, &rome, &egypt)).unwrap();
        assert_eq!(world.relation(&rome, &egypt).unwrap().kind, RelationKind::Alliance);
        assert_eq!(world.relations().count(), 1);
    }

    #[test]
    fn peace_requires_a_war() {
        let rules = Rules::default();
        let mut world = test_world(&rules);
        let err = with_ctx(&mut world, &rules, 1, |ctx| {
            make_peace(ctx, &id("rome"), &id("egypt"))
        })
        .unwrap_err();
        assert!(matches!(err, GameError::NotAtWar { .. }));
    }

    #[test]
    fn listing_orders_alliances_before_wars() {
        let rules = Rules::default();
        let mut world = test_world(&rules);
        let rome = id("rome");

        with_ctx(&mut world, &rules, 1, |ctx| {
            propose_alliance(ctx, &rome, &id("persia"))?;
            propose_alliance(ctx, &rome, &id("greece"))?;
            betray_alliance(ctx, &rome, &id("persia"))?;
            propose_alliance(ctx, &id("china"), &rome)
        })
        .unwrap();
        world.relation_mut(&rome, &id("china")).unwrap().strength = 80;

        let listed: Vec<(String, RelationKind)> = list_relations(&world, &rome)
            .into_iter()
            .map(|v| (v.counterpart.to_string(), v.kind))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("china".to_string(), RelationKind::Alliance),
                ("greece".to_string(), RelationKind::Alliance),
                ("persia".to_string(), RelationKind::War),
            ]
        );
        assert!(list_relations(&world, &id("babylon")).is_empty());
    }
}
