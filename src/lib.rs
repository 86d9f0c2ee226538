pub mod clusters;
pub mod connectivity;
pub mod danger;
pub mod forecast;
pub mod grid;
pub mod map;
pub mod planner;
pub mod position;
pub mod snapshot;
pub mod state;
pub mod units;

pub use map::Map;
pub use planner::{plan_turn, Command};
pub use position::Position;
pub use state::{Player, State, TurnError};
