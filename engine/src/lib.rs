//! Simulated thermal zones: a registry of rooms and an engine that walks
//! each switched-on room's temperature toward its setpoint, then replays a
//! scripted sequence of test temperatures.

pub mod engine;
pub mod error;
pub mod registry;
pub mod regulation;
pub mod schedule;
pub mod store;
pub mod zone;

pub use engine::{RegulationEngine, RegulationEvent};
pub use error::ZoneError;
pub use regulation::{RegulationConfig, RegulationState};
pub use store::ZoneStore;
pub use zone::{status, Mode, Zone, ZoneId, ZoneSeed, ZoneStatus};
