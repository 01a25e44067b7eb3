//! Domain entities - the records the client reads and keeps.

mod post;
mod user;

pub use post::{Comment, PostPage, PostSummary};
pub use user::{Profile, SessionUser, UserPatch};
