//! Analytics record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Well-known event names emitted by a flow session.
pub mod events {
    pub const FLOW_STARTED: &str = "flow_started";
    pub const SCREEN_VIEWED: &str = "screen_viewed";
    pub const ACTION_TRIGGERED: &str = "action_triggered";
    pub const FLOW_COMPLETED: &str = "flow_completed";
    pub const FLOW_ABANDONED: &str = "flow_abandoned";
}

/// One analytics event, as delivered to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub event: String,
    pub user_id: String,
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub properties: Value,
}

impl AnalyticsRecord {
    pub fn new(
        event: impl Into<String>,
        user_id: impl Into<String>,
        session_id: Uuid,
        properties: Value,
    ) -> Self {
        Self {
            event: event.into(),
            user_id: user_id.into(),
            session_id,
            timestamp: Utc::now(),
            properties,
        }
    }
}
