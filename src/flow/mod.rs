//! Flow runtime: screens, navigation state machine, and the session that
//! ties actions, variables and analytics together.

pub mod render;
pub mod screen;
pub mod session;
pub mod state;

pub use render::{RenderedNode, RenderedScreen};
pub use screen::{ComponentRegistry, ScreenContent, ScreenDefinition};
pub use session::{FlowSession, SessionEvent, VARIABLES_KEY};
pub use state::{FlowEvent, FlowState};
