//! Analytics: buffered, batched, at-least-once event delivery.

pub mod queue;
pub mod record;
pub mod sink;

pub use queue::{AnalyticsBuffer, AnalyticsHandle, spawn_analytics_queue};
pub use record::{AnalyticsRecord, events};
pub use sink::{AnalyticsSink, HttpAnalyticsSink, LogSink};
