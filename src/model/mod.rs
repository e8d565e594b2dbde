#[macro_use]
mod macros;

pub mod army;
pub mod country;
pub mod event;
pub mod relation;
pub mod resources;
pub mod season;
pub mod timestamp;
pub mod world;

pub use army::{Army, MAX_LEVEL};
pub use country::{Controller, Country, CountryId, PlayerId};
pub use event::{Event, EventKind};
pub use relation::{Relation, RelationKey, RelationKind};
pub use resources::{ResourceDelta, ResourceKind, Resources, Shortfall};
pub use season::{Season, SeasonSummary, Winner};
pub use timestamp::{Clock, ManualClock, SystemClock, Timestamp};
pub use world::{Changeset, Checkpoint, World};
