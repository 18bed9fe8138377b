//! End-to-end flow tests: screen definitions as JSON, a session driving
//! navigation, and analytics captured through the real queue.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use screenflow::analytics::{AnalyticsRecord, AnalyticsSink, spawn_analytics_queue};
use screenflow::config::AnalyticsConfig;
use screenflow::error::{AnalyticsError, SourceError};
use screenflow::flow::{FlowSession, FlowState, RenderedScreen, ScreenDefinition, SessionEvent};
use screenflow::source::{FlowConfig, ScreenSource};

#[derive(Default)]
struct RecordingSink {
    records: Mutex<Vec<AnalyticsRecord>>,
}

#[async_trait]
impl AnalyticsSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_batch(&self, batch: &[AnalyticsRecord]) -> Result<(), AnalyticsError> {
        self.records.lock().await.extend_from_slice(batch);
        Ok(())
    }
}

struct StaticSource(FlowConfig);

#[async_trait]
impl ScreenSource for StaticSource {
    async fn fetch(&self) -> Result<FlowConfig, SourceError> {
        Ok(self.0.clone())
    }
}

struct DownSource;

#[async_trait]
impl ScreenSource for DownSource {
    async fn fetch(&self) -> Result<FlowConfig, SourceError> {
        Err(SourceError::RequestFailed {
            url: "http://flows.invalid".into(),
            reason: "connection refused".into(),
        })
    }
}

fn branching_flow() -> FlowConfig {
    serde_json::from_value(json!({
        "screens": [
            {"id": "A", "elements": [
                {"id": "start", "type": "hstack",
                 "action": {"type": "set_variable", "variable": "x", "value": "yes"},
                 "actions": [{"type": "navigate", "destination": "next"}]}
            ]},
            {"id": "B", "elements": [
                {"id": "continue", "type": "hstack",
                 "action": {"type": "navigate", "destination": {
                     "if": {"variable": "x", "operator": "equals", "value": "yes"},
                     "then": "C",
                     "else": "D"
                 }}}
            ]},
            {"id": "C", "elements": [{"id": "c-title", "type": "text", "props": {"text": "Path C"}}]},
            {"id": "D", "elements": [{"id": "d-title", "type": "text", "props": {"text": "Path D"}}]}
        ]
    }))
    .unwrap()
}

fn manual_flush() -> AnalyticsConfig {
    AnalyticsConfig {
        url: None,
        batch_size: 100,
        flush_interval: Duration::from_secs(60),
    }
}

#[tokio::test]
async fn conditional_destination_picks_branch_from_set_variable() {
    let sink = Arc::new(RecordingSink::default());
    let (analytics, _task) = spawn_analytics_queue(sink.clone(), &manual_flush());

    let mut session = FlowSession::new("user-42").with_analytics(analytics.clone());
    session.load(&StaticSource(branching_flow())).await.unwrap();
    assert_eq!(session.current_screen().unwrap().id, "A");

    session.dispatch("start").unwrap();
    assert_eq!(session.current_screen().unwrap().id, "B");
    assert_eq!(session.variables().get("x"), Some(&json!("yes")));

    session.dispatch("continue").unwrap();
    assert_eq!(session.current_screen().unwrap().id, "C");

    analytics.flush().await.unwrap();
    let records = sink.records.lock().await;
    let names: Vec<&str> = records.iter().map(|r| r.event.as_str()).collect();
    assert_eq!(
        names,
        [
            "flow_started",
            "screen_viewed",
            "action_triggered",
            "action_triggered",
            "screen_viewed",
            "action_triggered",
            "screen_viewed",
        ]
    );
    assert_eq!(records[2].properties["action_type"], "set_variable");
    assert_eq!(records[3].properties["destination"], "next");
    assert_eq!(records[5].properties["destination"], "conditional");
    assert_eq!(records[6].properties["screen_id"], "C");
    assert!(records.iter().all(|r| r.user_id == "user-42" && r.session_id == session.id()));
}

#[tokio::test]
async fn completion_payload_unions_collected_data_and_variables() {
    let config: FlowConfig = serde_json::from_value(json!({
        "screens": [
            {"id": "quiz", "component": "Quiz"},
            {"id": "skipped", "hidden": true, "elements": []},
            {"id": "finish", "elements": [
                {"id": "done", "type": "vstack",
                 "action": {"type": "set_variable", "variable": "plan", "value": "pro"},
                 "actions": [{"type": "navigate", "destination": "next"}]}
            ]}
        ]
    }))
    .unwrap();

    let mut session = FlowSession::new("u");
    let mut events = session.subscribe();
    session.load(&StaticSource(config)).await.unwrap();
    assert_eq!(session.screens().len(), 2);

    session
        .complete_custom_screen(json!({"score": 9, "plan": "basic"}).as_object().cloned().unwrap())
        .unwrap();
    session.dispatch("done").unwrap();
    assert_eq!(session.state(), &FlowState::Completed);

    // Terminal: further navigation does nothing and emits nothing.
    session.next();
    session.skip_all();

    let expected = json!({
        "score": 9,
        "plan": "basic",
        "_variables": {"score": 9, "plan": "pro"}
    });
    assert_eq!(Value::Object(session.completion().unwrap().clone()), expected);

    let mut completions = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::Completed { payload } => {
                completions += 1;
                assert_eq!(Value::Object(payload), expected);
            }
            SessionEvent::Abandoned { .. } => panic!("completed flow must not abandon"),
            SessionEvent::Started { .. } | SessionEvent::ScreenViewed { .. } => {}
        }
    }
    assert_eq!(completions, 1);
}

#[tokio::test]
async fn toggle_group_drives_visibility() {
    let screen: ScreenDefinition = serde_json::from_value(json!({
        "id": "plans",
        "elements": [
            {"id": "basic", "type": "hstack", "action": {"type": "toggle", "group": "plan"}},
            {"id": "pro", "type": "hstack", "action": {"type": "toggle", "group": "plan"}},
            {"id": "extras", "type": "hstack", "action": {"type": "toggle"}},
            {"id": "pro-perks", "type": "text", "props": {"text": "Perks"},
             "visibleWhen": {"group": "plan", "selected": "pro"}}
        ]
    }))
    .unwrap();

    let mut session = FlowSession::new("u");
    session.load_screens(vec![screen]).unwrap();

    let visible = |session: &FlowSession| -> Vec<(String, bool)> {
        match session.render().unwrap() {
            RenderedScreen::Elements { elements, .. } => {
                elements.into_iter().map(|n| (n.id, n.selected)).collect()
            }
            other => panic!("unexpected render {other:?}"),
        }
    };

    session.dispatch("basic").unwrap();
    session.dispatch("pro").unwrap();
    let nodes = visible(&session);
    assert!(nodes.contains(&("pro".to_string(), true)));
    assert!(nodes.contains(&("basic".to_string(), false)));
    assert!(nodes.iter().any(|(id, _)| id == "pro-perks"));

    session.dispatch("basic").unwrap();
    assert!(!visible(&session).iter().any(|(id, _)| id == "pro-perks"));

    session.dispatch("extras").unwrap();
    session.dispatch("extras").unwrap();
    assert!(!session.selection().is_toggled("extras"));
}

#[tokio::test]
async fn source_failure_ends_in_error_state() {
    let mut session = FlowSession::new("u");
    let mut events = session.subscribe();
    assert!(session.load(&DownSource).await.is_err());
    assert!(matches!(session.state(), FlowState::Error { .. }));
    assert!(session.render().is_none());
    assert!(events.try_recv().is_err());
}
