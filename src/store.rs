//! The single shared-mutable handle on the game world.
//!
//! Writes are serialized behind one async `RwLock`; reads share it. Every
//! write runs against a checkpoint: if the operation fails, or its changes
//! cannot be persisted, the world is put back exactly as it was. No caller
//! waits longer than the configured time budget for the lock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::{GameConfig, Rules};
use crate::db;
use crate::error::GameError;
use crate::model::{Clock, World};
use crate::sim::{SimContext, seed_world};

pub struct StateStore {
    world: RwLock<World>,
    rng: Mutex<SmallRng>,
    pool: Option<PgPool>,
    rules: Arc<Rules>,
    clock: Arc<dyn Clock>,
    op_timeout: Duration,
}

fn rng_from(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}

impl StateStore {
    /// A store with no durable backing.
    pub fn in_memory(
        mut world: World,
        rules: Arc<Rules>,
        clock: Arc<dyn Clock>,
        seed: Option<u64>,
        op_timeout: Duration,
    ) -> Self {
        world.take_changes();
        Self {
            world: RwLock::new(world),
            rng: Mutex::new(rng_from(seed)),
            pool: None,
            rules,
            clock,
            op_timeout,
        }
    }

    /// Open the store described by `config`.
    ///
    /// Without a database URL the roster is seeded in memory. With one, the
    /// schema is created if missing and the world is loaded, or seeded and
    /// written when the database is empty.
    pub async fn open(config: &GameConfig, clock: Arc<dyn Clock>) -> Result<Self, GameError> {
        let rules = Arc::new(config.rules.clone());
        let op_timeout = config.scheduler.op_timeout();
        let Some(url) = &config.storage.database_url else {
            info!(countries = rules.roster.len(), "seeding in-memory world");
            let world = seed_world(&rules, clock.now());
            return Ok(Self::in_memory(world, rules, clock, config.seed, op_timeout));
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(op_timeout)
            .connect(url)
            .await?;
        db::migrate(&pool).await?;
        let world = match db::load_world(&pool).await? {
            Some(world) => {
                info!(
                    countries = world.countries().count(),
                    events = world.events().len(),
                    "world loaded"
                );
                world
            }
            None => {
                let mut world = seed_world(&rules, clock.now());
                let changes = world.take_changes();
                db::persist(&pool, &world, &changes).await?;
                info!(countries = rules.roster.len(), "seeded empty database");
                world
            }
        };
        Ok(Self::with_pool(world, pool, rules, clock, config.seed, op_timeout))
    }

    /// A store that writes every committed operation through to `pool`.
    pub fn with_pool(
        mut world: World,
        pool: PgPool,
        rules: Arc<Rules>,
        clock: Arc<dyn Clock>,
        seed: Option<u64>,
        op_timeout: Duration,
    ) -> Self {
        world.take_changes();
        Self {
            world: RwLock::new(world),
            rng: Mutex::new(rng_from(seed)),
            pool: Some(pool),
            rules,
            clock,
            op_timeout,
        }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn is_durable(&self) -> bool {
        self.pool.is_some()
    }

    fn busy(&self) -> GameError {
        GameError::Busy {
            waited_ms: u64::try_from(self.op_timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Run a read-only query under the shared lock.
    pub async fn read<T>(&self, f: impl FnOnce(&World) -> T) -> Result<T, GameError> {
        let world = timeout(self.op_timeout, self.world.read())
            .await
            .map_err(|_| self.busy())?;
        Ok(f(&*world))
    }

    /// Like [`read`](Self::read), with the store's generator for queries that
    /// pick among equal choices.
    pub async fn read_with_rng<T>(
        &self,
        f: impl FnOnce(&World, &mut dyn RngCore) -> T,
    ) -> Result<T, GameError> {
        let world = timeout(self.op_timeout, self.world.read())
            .await
            .map_err(|_| self.busy())?;
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Ok(f(&*world, &mut *rng))
    }

    /// Run one mutating operation atomically.
    ///
    /// The operation sees the world, the store's generator, the rules and the
    /// current time. On `Err` every change it made is undone. On `Ok` the
    /// touched rows are persisted before the lock is released; a persistence
    /// failure undoes the operation and surfaces as [`GameError::Persistence`].
    pub async fn write<T>(
        &self,
        f: impl FnOnce(&mut SimContext) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let mut world = timeout(self.op_timeout, self.world.write())
            .await
            .map_err(|_| self.busy())?;
        let checkpoint = world.checkpoint();
        let now = self.clock.now();

        let result = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            let mut ctx = SimContext {
                world: &mut *world,
                rng: &mut *rng,
                rules: &self.rules,
                now,
            };
            f(&mut ctx)
        };
        let value = match result {
            Ok(value) => value,
            Err(e) => {
                world.restore(checkpoint);
                return Err(e);
            }
        };

        let changes = world.take_changes();
        if let Some(pool) = &self.pool {
            let write_through = db::persist(pool, &*world, &changes);
            let persisted = match timeout(self.op_timeout, write_through).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(GameError::from(e)),
                Err(_) => Err(GameError::Persistence("write-through timed out".into())),
            };
            if let Err(e) = persisted {
                warn!(error = %e, "write-through failed, operation rolled back");
                world.restore(checkpoint);
                return Err(e);
            }
        }
        Ok(value)
    }
}
