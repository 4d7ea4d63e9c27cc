// ── Sensor state store ──
//
// Fixed registry of published values with push-based change notification.

mod sensor;
mod state_store;

pub use sensor::{Reading, SensorId, SensorKind, SensorStatus, SensorValue};
pub use state_store::{SensorTable, StateStore};
