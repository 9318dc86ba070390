//! Stratus provisioning daemon
//!
//! Exposes the multi-cloud provisioning layer over HTTP: one endpoint to
//! create a resource, one to probe whether a credential bundle can reach its
//! cloud at all. Provider clients live in the `stratus-cloud-*` crates; this
//! crate only validates requests, dispatches, and shapes responses.

pub mod dispatch;
pub mod handler;
pub mod server;
pub mod state;

pub use server::router;
pub use state::{AppState, Endpoints};
