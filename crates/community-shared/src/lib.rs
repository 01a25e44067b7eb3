//! # Community Shared
//!
//! Wire types of the hosted backend: request bodies, table rows, error
//! bodies and the range headers used for pagination.

pub mod dto;
pub mod range;
pub mod response;

pub use range::ContentRange;
pub use response::ErrorResponse;
