use sqlx::{PgPool, Postgres, Transaction};

use super::to_db;
use crate::model::{Changeset, CountryId, Event, RelationKey, World};

/// Write every row named in `changes` in one transaction.
///
/// Rows are upserted, so persisting the same changeset twice is harmless.
/// Order follows the foreign keys: countries, relations, seasons, events.
pub async fn persist(pool: &PgPool, world: &World, changes: &Changeset) -> Result<(), sqlx::Error> {
    if changes.is_empty() {
        return Ok(());
    }
    let mut tx = pool.begin().await?;

    for id in &changes.countries {
        upsert_country(&mut tx, world, id).await?;
    }
    for key in &changes.relations {
        upsert_relation(&mut tx, world, key).await?;
    }
    for season in changes.seasons.iter().filter_map(|id| world.season(*id)) {
        sqlx::query(
            "INSERT INTO seasons (id, started_at, ended_at, active, winner_country, winner_player)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                ended_at = EXCLUDED.ended_at,
                active = EXCLUDED.active,
                winner_country = EXCLUDED.winner_country,
                winner_player = EXCLUDED.winner_player",
        )
        .bind(to_db(season.id))
        .bind(to_db(season.started_at.as_millis()))
        .bind(season.ended_at.map(|t| to_db(t.as_millis())))
        .bind(season.active)
        .bind(season.winner_country.as_ref().map(CountryId::as_str))
        .bind(season.winner_player.map(to_db))
        .execute(&mut *tx)
        .await?;
    }
    let new_events = world
        .events()
        .iter()
        .skip(changes.first_new_event)
        .take(changes.new_event_count);
    for event in new_events {
        insert_event(&mut tx, event).await?;
    }

    tx.commit().await
}

async fn upsert_country(
    tx: &mut Transaction<'_, Postgres>,
    world: &World,
    id: &CountryId,
) -> Result<(), sqlx::Error> {
    let (Some(c), Some(res), Some(army)) = (world.country(id), world.resources(id), world.army(id))
    else {
        return Ok(());
    };
    sqlx::query(
        "INSERT INTO countries (id, name, specialty, controller, owner, joined_at, active)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            specialty = EXCLUDED.specialty,
            controller = EXCLUDED.controller,
            owner = EXCLUDED.owner,
            joined_at = EXCLUDED.joined_at,
            active = EXCLUDED.active",
    )
    .bind(c.id.as_str())
    .bind(&c.name)
    .bind(&c.specialty)
    .bind(c.controller.as_str())
    .bind(c.owner.map(to_db))
    .bind(c.joined_at.map(|t| to_db(t.as_millis())))
    .bind(c.active)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        "INSERT INTO resources (country_id, gold, iron, stone, food, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (country_id) DO UPDATE SET
            gold = EXCLUDED.gold,
            iron = EXCLUDED.iron,
            stone = EXCLUDED.stone,
            food = EXCLUDED.food,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(id.as_str())
    .bind(to_db(res.gold))
    .bind(to_db(res.iron))
    .bind(to_db(res.stone))
    .bind(to_db(res.food))
    .bind(to_db(res.updated_at.as_millis()))
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        "INSERT INTO army (country_id, level, infantry, cavalry, siege, defense, power, power_score)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (country_id) DO UPDATE SET
            level = EXCLUDED.level,
            infantry = EXCLUDED.infantry,
            cavalry = EXCLUDED.cavalry,
            siege = EXCLUDED.siege,
            defense = EXCLUDED.defense,
            power = EXCLUDED.power,
            power_score = EXCLUDED.power_score",
    )
    .bind(id.as_str())
    .bind(i16::from(army.level))
    .bind(i64::from(army.infantry))
    .bind(i64::from(army.cavalry))
    .bind(i64::from(army.siege))
    .bind(i64::from(army.defense))
    .bind(to_db(army.power))
    .bind(to_db(army.power_score))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn upsert_relation(
    tx: &mut Transaction<'_, Postgres>,
    world: &World,
    key: &RelationKey,
) -> Result<(), sqlx::Error> {
    let Some(rel) = world.relation(key.low(), key.high()) else {
        return Ok(());
    };
    sqlx::query(
        "INSERT INTO relations (country_low, country_high, kind, strength, since, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (country_low, country_high) DO UPDATE SET
            kind = EXCLUDED.kind,
            strength = EXCLUDED.strength,
            since = EXCLUDED.since,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(key.low().as_str())
    .bind(key.high().as_str())
    .bind(rel.kind.as_str())
    .bind(i16::from(rel.strength))
    .bind(to_db(rel.since.as_millis()))
    .bind(to_db(rel.updated_at.as_millis()))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_event(tx: &mut Transaction<'_, Postgres>, event: &Event) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO events (id, kind, actor, target, payload, occurred_at, season_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(to_db(event.id))
    .bind(event.kind.as_str())
    .bind(event.actor.as_ref().map(CountryId::as_str))
    .bind(event.target.as_ref().map(CountryId::as_str))
    .bind(&event.payload)
    .bind(to_db(event.occurred_at.as_millis()))
    .bind(event.season_id.map(to_db))
    .execute(&mut **tx)
    .await?;
    Ok(())
}
