//! API layer
//!
//! HTTP handlers for:
//! - Mastodon API statuses (for client apps)
//! - Metrics (Prometheus)

mod converters;
mod dto;
mod extract;
mod mastodon;
pub mod metrics;

pub use converters::*;
pub use dto::*;
pub use extract::JsonOrForm;

pub use mastodon::mastodon_api_router;
pub use metrics::metrics_router;
