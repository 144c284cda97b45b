//! Visitor notifications.
//!
//! Every session gets a background pipeline that runs once the session ends:
//!
//! - **classifier**: scanner vs. human by connection duration
//! - **limiter**: per-address cool-downs shared by all sessions
//! - **geo**: best-effort IP geolocation
//! - **message**: notification text and webhook payload
//! - **sink**: webhook delivery
//! - **pipeline**: ties the above together per session
//!
//! # Flow
//!
//! ```text
//! session ends ──► classify ──► limiter ──► geo ──► message ──► sink
//!                                 │ muted
//!                                 └──► (dropped)
//! ```
//!
//! Nothing here can fail a session: errors are logged and swallowed.

pub mod classifier;
pub mod geo;
pub mod limiter;
pub mod message;
pub mod pipeline;
pub mod sink;

pub use geo::{GeoLookup, HttpGeoLookup};
pub use limiter::{Cooldowns, RateLimiter};
pub use pipeline::{Visit, VisitorWatch};
pub use sink::{NotificationSink, WebhookSink};
