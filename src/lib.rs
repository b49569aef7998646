pub mod ai;
pub mod graph;
pub mod influence;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod tile;

pub use ai::{AttackHeuristic, ComputerPlayer, Decision};
pub use graph::{MapError, MapErrorReason, TileGraph};
pub use influence::{InfluenceMap, InfluencePropagator, InfluenceSettings};
pub use scenario::{Scenario, ScenarioLoader, Session};
pub use tile::{Coord, PlayerId, Tile};
