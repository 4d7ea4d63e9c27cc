// ── KATCP front end ──
//
// Minimal KATCP v5 device server: line codec plus the accept loop that
// routes requests to the bridge.

pub mod message;
pub mod server;

pub use message::{Message, MessageError, MessageKind};
pub use server::KatcpServer;
