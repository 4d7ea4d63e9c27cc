//! KATCP front end for the jive5ab proxy.
//!
//! The `jive5ab-katcp-proxy` binary wires this server to a
//! [`jive_core::Bridge`]; the library target exists so the server can be
//! driven directly from integration tests.

pub mod katcp;
