//! # Community Core
//!
//! The client layer of Fast Community.
//! This crate holds the session store, the post listing and detail views and
//! the login/profile flows. Every backend call goes through the traits in
//! [`ports`]; no transport or storage code lives here.

pub mod detail;
pub mod domain;
pub mod error;
pub mod flows;
pub mod listing;
pub mod ports;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ClientError;
pub use session::SessionStore;
