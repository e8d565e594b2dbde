use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::from_db;
use crate::model::{
    Army, Controller, Country, CountryId, Event, EventKind, Relation, RelationKey, RelationKind,
    Resources, Season, Timestamp, World,
};

fn decode_err(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}

fn ts(row: &PgRow, col: &str) -> Result<Timestamp, sqlx::Error> {
    Ok(Timestamp::from_millis(from_db(row.try_get(col)?)))
}

fn opt_ts(row: &PgRow, col: &str) -> Result<Option<Timestamp>, sqlx::Error> {
    let v: Option<i64> = row.try_get(col)?;
    Ok(v.map(|m| Timestamp::from_millis(from_db(m))))
}

fn small(row: &PgRow, col: &str) -> Result<u32, sqlx::Error> {
    let v: i64 = row.try_get(col)?;
    u32::try_from(v).map_err(|_| decode_err(format!("{col} out of range: {v}")))
}

/// Read the whole game back from Postgres. `None` when no country exists yet,
/// i.e. the database has never been seeded.
pub async fn load_world(pool: &PgPool) -> Result<Option<World>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT c.id, c.name, c.specialty, c.controller, c.owner, c.joined_at, c.active,
                r.gold, r.iron, r.stone, r.food, r.updated_at,
                a.level, a.infantry, a.cavalry, a.siege, a.defense, a.power, a.power_score
         FROM countries c
         JOIN resources r ON r.country_id = c.id
         JOIN army a ON a.country_id = c.id
         ORDER BY c.id",
    )
    .fetch_all(pool)
    .await?;
    if rows.is_empty() {
        return Ok(None);
    }

    let mut countries = Vec::with_capacity(rows.len());
    for row in &rows {
        let controller: String = row.try_get("controller")?;
        let level: i16 = row.try_get("level")?;
        let country = Country {
            id: CountryId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            specialty: row.try_get("specialty")?,
            controller: controller.parse::<Controller>().map_err(decode_err)?,
            owner: row.try_get::<Option<i64>, _>("owner")?.map(from_db),
            joined_at: opt_ts(row, "joined_at")?,
            active: row.try_get("active")?,
        };
        let resources = Resources {
            gold: from_db(row.try_get("gold")?),
            iron: from_db(row.try_get("iron")?),
            stone: from_db(row.try_get("stone")?),
            food: from_db(row.try_get("food")?),
            updated_at: ts(row, "updated_at")?,
        };
        let army = Army {
            level: u8::try_from(level).map_err(|_| decode_err(format!("bad level {level}")))?,
            infantry: small(row, "infantry")?,
            cavalry: small(row, "cavalry")?,
            siege: small(row, "siege")?,
            defense: small(row, "defense")?,
            power: from_db(row.try_get("power")?),
            power_score: from_db(row.try_get("power_score")?),
        };
        countries.push((country, resources, army));
    }

    let mut relations = Vec::new();
    for row in sqlx::query("SELECT * FROM relations").fetch_all(pool).await? {
        let low = CountryId::new(row.try_get::<String, _>("country_low")?);
        let high = CountryId::new(row.try_get::<String, _>("country_high")?);
        let key = RelationKey::new(&low, &high)
            .ok_or_else(|| decode_err(format!("self relation on {low}")))?;
        let kind: String = row.try_get("kind")?;
        let strength: i16 = row.try_get("strength")?;
        relations.push(Relation {
            key,
            kind: kind.parse::<RelationKind>().map_err(decode_err)?,
            strength: u8::try_from(strength)
                .map_err(|_| decode_err(format!("bad strength {strength}")))?,
            since: ts(&row, "since")?,
            updated_at: ts(&row, "updated_at")?,
        });
    }

    let mut seasons = Vec::new();
    for row in sqlx::query("SELECT * FROM seasons ORDER BY id").fetch_all(pool).await? {
        seasons.push(Season {
            id: from_db(row.try_get("id")?),
            started_at: ts(&row, "started_at")?,
            ended_at: opt_ts(&row, "ended_at")?,
            active: row.try_get("active")?,
            winner_country: row
                .try_get::<Option<String>, _>("winner_country")?
                .map(CountryId::new),
            winner_player: row.try_get::<Option<i64>, _>("winner_player")?.map(from_db),
        });
    }

    let mut events = Vec::new();
    for row in sqlx::query("SELECT * FROM events ORDER BY id").fetch_all(pool).await? {
        let kind: String = row.try_get("kind")?;
        events.push(Event {
            id: from_db(row.try_get("id")?),
            kind: EventKind::try_from(kind).map_err(decode_err)?,
            actor: row.try_get::<Option<String>, _>("actor")?.map(CountryId::new),
            target: row.try_get::<Option<String>, _>("target")?.map(CountryId::new),
            payload: row.try_get("payload")?,
            occurred_at: ts(&row, "occurred_at")?,
            season_id: row.try_get::<Option<i64>, _>("season_id")?.map(from_db),
        });
    }

    Ok(Some(World::from_rows(countries, relations, seasons, events)))
}
