//! mrcpress core: pure session model and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::{JobResult, Msg};
pub use state::{AppState, JobId, SessionState};
pub use update::update;
pub use view_model::{FailureRowView, SessionView};
