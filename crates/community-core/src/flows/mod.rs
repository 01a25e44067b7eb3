//! User-facing flows that combine the backend ports with the session store.

mod login;
mod profile;

pub use login::LoginFlow;
pub use profile::ProfileFlow;
