#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ancient_war::config::Rules;
use ancient_war::game::Game;
use ancient_war::model::{Clock, CountryId, ManualClock, Timestamp};
use ancient_war::sim::economy::power_score;
use ancient_war::sim::seed_world;
use ancient_war::store::StateStore;

pub fn id(s: &str) -> CountryId {
    CountryId::new(s)
}

/// An in-memory game over the default roster with a seeded generator and a
/// hand-driven clock.
pub fn game_with(rules: Rules, seed: u64) -> (Game, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_at(Timestamp::from_secs(1_000)));
    let shared: Arc<dyn Clock> = clock.clone();
    let rules = Arc::new(rules);
    let world = seed_world(&rules, Timestamp::from_secs(1_000));
    let store = StateStore::in_memory(world, rules, shared, Some(seed), Duration::from_secs(2));
    (Game::new(store), clock)
}

pub fn game() -> (Game, Arc<ManualClock>) {
    game_with(Rules::default(), 7)
}

/// Force a country's army power and treasury so its power score is exactly
/// `power / 10 + gold / 100`.
pub async fn set_power(game: &Game, country: &CountryId, power: u64, gold: u64) {
    game.store()
        .write(|ctx| {
            let (res, army) = ctx.world.economy_mut(country)?;
            res.gold = gold;
            res.iron = 0;
            res.stone = 0;
            army.power = power;
            army.power_score = power_score(power, res);
            Ok(())
        })
        .await
        .unwrap();
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}
