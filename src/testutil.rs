use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::config::Rules;
use crate::model::*;
use crate::sim::economy::power_score;
use crate::sim::{SimContext, seed_world};

// ---------------------------------------------------------------------------
// Randomness
// ---------------------------------------------------------------------------

/// Generator that replays a fixed list of `u64`s, cycling when it runs out.
///
/// `0` makes `random_range` return the low end of a float range and
/// `u64::MAX` lands within rounding of the high end, which pins combat
/// outcomes.
pub struct ScriptedRng {
    values: Vec<u64>,
    next: usize,
}

impl ScriptedRng {
    pub fn new(values: Vec<u64>) -> Self {
        assert!(!values.is_empty(), "ScriptedRng needs at least one value");
        Self { values, next: 0 }
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let v = self.values[self.next % self.values.len()];
        self.next += 1;
        v
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

// ---------------------------------------------------------------------------
// World builders
// ---------------------------------------------------------------------------

pub fn id(s: &str) -> CountryId {
    CountryId::new(s)
}

/// The default roster at starting figures, stamped at the epoch, with no
/// pending changes.
pub fn test_world(rules: &Rules) -> World {
    let mut world = seed_world(rules, Timestamp::EPOCH);
    world.take_changes();
    world
}

/// Run `f` with a context over `world`, a generator seeded from `seed`, and
/// the clock at one minute past the epoch.
pub fn with_ctx<T>(
    world: &mut World,
    rules: &Rules,
    seed: u64,
    f: impl FnOnce(&mut SimContext) -> T,
) -> T {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut ctx = SimContext {
        world,
        rng: &mut rng,
        rules,
        now: Timestamp::from_secs(60),
    };
    f(&mut ctx)
}

/// Force an army's power and the country's gold, zero its iron and stone,
/// and recompute the power score. Lets a test dial in exact scores:
/// `power / 10 + gold / 100`.
pub fn set_power(world: &mut World, id: &CountryId, power: u64, gold: u64) {
    let (res, army) = world.economy_mut(id).unwrap();
    res.gold = gold;
    res.iron = 0;
    res.stone = 0;
    army.power = power;
    army.power_score = power_score(power, res);
}

pub fn make_human(world: &mut World, id: &CountryId, player: PlayerId) {
    let c = world.country_mut(id).unwrap();
    c.controller = Controller::Human;
    c.owner = Some(player);
    c.joined_at = Some(Timestamp::from_secs(player));
}
