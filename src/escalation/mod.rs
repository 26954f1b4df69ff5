//! High-priority escalation checklist.
//!
//! Any mutating action on a missing parcel whose client is high-priority,
//! and which is not already recovered, is held behind a fixed sequence of
//! yes/no safety questions. The action runs only after every question has
//! been affirmed in order; closing the checklist discards it.

mod questions;
mod session;
mod state;

pub use questions::{standard_questions, ChecklistQuestion};
pub use session::{ChecklistSession, ChecklistView, SessionOutcome};
pub use state::{ChecklistAnswer, ChecklistEvent, ChecklistState, Transition};

use crate::models::RegistrySnapshot;

/// Whether an action on a parcel for `client_id` must pass the checklist.
pub fn requires_checklist(registry: &RegistrySnapshot, client_id: i32, is_recovered: bool) -> bool {
    registry.is_high_priority(client_id) && !is_recovered
}
