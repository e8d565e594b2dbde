mod common;

use std::sync::Arc;

use ancient_war::config::GameConfig;
use ancient_war::db::{load_world, migrate, persist};
use ancient_war::game::Game;
use ancient_war::model::{Clock, ManualClock, Timestamp};
use ancient_war::sim::seed_world;
use ancient_war::{GameError, Rules};
use common::id;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;

async fn setup() -> (PgPool, String, ContainerAsync<Postgres>) {
    let container = Postgres::default().start().await.unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
    let pool = PgPoolOptions::new().connect(&url).await.unwrap();
    (pool, url, container)
}

fn clock() -> Arc<dyn Clock> {
    Arc::new(ManualClock::starting_at(Timestamp::from_secs(1_000)))
}

#[tokio::test]
#[ignore]
async fn empty_database_loads_nothing() {
    let (pool, _, _container) = setup().await;
    migrate(&pool).await.unwrap();
    // Running twice is harmless.
    migrate(&pool).await.unwrap();
    assert!(load_world(&pool).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn persisted_world_loads_back_identically() {
    let (pool, _, _container) = setup().await;
    migrate(&pool).await.unwrap();

    let rules = Rules::default();
    let mut world = seed_world(&rules, Timestamp::from_secs(5));
    let changes = world.take_changes();
    persist(&pool, &world, &changes).await.unwrap();

    let loaded = load_world(&pool).await.unwrap().unwrap();
    assert_eq!(loaded.countries().count(), 12);
    for c in world.countries() {
        assert_eq!(loaded.country(&c.id), Some(c));
        assert_eq!(loaded.resources(&c.id), world.resources(&c.id));
        assert_eq!(loaded.army(&c.id), world.army(&c.id));
    }
    loaded.check_invariants().unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM countries")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 12);
}

#[tokio::test]
#[ignore]
async fn game_state_survives_a_restart() {
    let (_pool, url, _container) = setup().await;
    let mut config = GameConfig::default();
    config.seed = Some(3);
    config.storage.database_url = Some(url);

    let (rome, egypt) = (id("rome"), id("egypt"));
    let before = {
        let game = Game::open(&config, clock()).await.unwrap();
        assert!(game.store().is_durable());
        game.assign_country(&rome, 1).await.unwrap();
        game.propose_alliance(&rome, &egypt).await.unwrap();
        game.start_season().await.unwrap();
        game.upgrade_army(&rome).await.unwrap();
        game.attack(&id("persia"), &id("china")).await.unwrap();
        let err = game.upgrade_army(&id("atlantis")).await.unwrap_err();
        assert!(matches!(err, GameError::NotFound { .. }));
        (
            game.get_country_snapshot(&rome).await.unwrap(),
            game.recent_events(100).await.unwrap(),
            game.stats().await.unwrap(),
        )
    };

    let game = Game::open(&config, clock()).await.unwrap();
    assert_eq!(game.get_country_snapshot(&rome).await.unwrap(), before.0);
    assert_eq!(game.recent_events(100).await.unwrap(), before.1);
    assert_eq!(game.stats().await.unwrap(), before.2);

    // Sequences resume after the loaded rows.
    game.collect_resources(&rome).await.unwrap();
    let newest = game.recent_events(1).await.unwrap();
    assert!(newest[0].id > before.1[0].id);
    assert!(matches!(
        game.start_season().await.unwrap_err(),
        GameError::SeasonAlreadyActive { .. }
    ));
}
