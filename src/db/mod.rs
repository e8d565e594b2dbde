//! Postgres persistence: schema, write-through of changesets, startup load.

mod load;
mod migrate;
mod persist;

pub use load::load_world;
pub use migrate::migrate;
pub use persist::persist;

/// Postgres has no unsigned integers; every counter is stored as BIGINT.
pub(crate) fn to_db(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

pub(crate) fn from_db(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}
