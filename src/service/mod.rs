//! Service layer
//!
//! Contains business logic separated from HTTP handlers.

mod status;
pub mod visibility;

pub use status::{NewStatus, StatusService, ThreadContext};
