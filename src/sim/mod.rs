pub mod advisor;
pub mod ai;
pub mod combat;
mod context;
pub mod diplomacy;
pub mod economy;
pub mod military;
mod scheduler;
pub mod season;

pub use context::SimContext;
pub use scheduler::spawn_ai_scheduler;
pub use season::seed_world;
