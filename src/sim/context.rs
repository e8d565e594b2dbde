use rand::RngCore;

use crate::config::Rules;
use crate::model::{Timestamp, World};

/// Everything one operation needs, bundled so the engines share a signature.
///
/// Built by the store for the duration of a single write; nothing in it
/// outlives the operation.
pub struct SimContext<'a> {
    pub world: &'a mut World,
    pub rng: &'a mut dyn RngCore,
    pub rules: &'a Rules,
    pub now: Timestamp,
}
