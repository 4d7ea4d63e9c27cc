// jive-core: Bridge between KATCP-style requests and the jive5ab control channel.

pub mod bridge;
pub mod command;
pub mod config;
mod dispatch;
pub mod error;
mod poll;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::Bridge;
pub use command::{OutcomeStatus, Request, RequestKind, RequestOutcome};
pub use config::BridgeConfig;
pub use error::CoreError;
pub use store::{Reading, SensorId, SensorKind, SensorStatus, SensorTable, SensorValue, StateStore};
