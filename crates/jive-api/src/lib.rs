//! Async client for the jive5ab text control channel.
//!
//! jive5ab speaks a line-oriented protocol on a local TCP port: one
//! `;`-terminated command per connection, one textual reply back. This
//! crate covers the wire level only:
//!
//! - **[`TcpControlChannel`]**: one-shot exchanges (connect, write, single
//!   bounded read, close) behind the [`ControlChannel`] trait.
//! - **[`Command`]**: typed commands rendered to wire text.
//! - **[`reply`]**: grammar-aware reply tokenizing with fallback-only
//!   extractors that never fail.

pub mod command;
pub mod error;
pub mod reply;
pub mod transport;

pub use command::{Command, Net2FileAction, NetDestination, NetProtocol, Query};
pub use error::{Error, Stage};
pub use reply::{Ack, ProgressReport, Reply, ReplyKind};
pub use transport::{ControlChannel, TcpControlChannel, TransportConfig};
