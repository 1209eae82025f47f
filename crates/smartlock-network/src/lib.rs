//! Admin panel for the smart lock.
//!
//! An axum HTTP server that lets an administrator manage the card table,
//! the PIN, the admin password, the lockout time and which inputs are
//! enabled. See [`server`] for the route table.

pub mod error;
pub mod pages;
pub mod server;
pub mod session;

pub use error::{AdminError, AdminResult};
pub use server::{AdminServer, AdminServerConfig, AdminState, StatusResponse, router};
pub use session::{SESSION_COOKIE, SessionStore};
