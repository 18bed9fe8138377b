//! Action dispatch and selection bookkeeping.

pub mod dispatcher;
pub mod input;
pub mod selection;

pub use dispatcher::{
    ActionRecord, CONDITIONAL_DESTINATION, DispatchContext, DispatchOutcome, LinkOpener,
    LogLinkOpener, Navigation, dispatch,
};
pub use input::InputBuffer;
pub use selection::{SelectionAction, SelectionState};
