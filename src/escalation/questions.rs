//! Safety questions asked before a high-priority parcel is logged as missing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistQuestion {
    pub prompt: String,
    /// Shown when the operator answers "No".
    pub alert: String,
}

impl ChecklistQuestion {
    pub fn new(prompt: &str, alert: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            alert: alert.to_string(),
        }
    }
}

/// The standard high-priority checklist.
pub fn standard_questions() -> Vec<ChecklistQuestion> {
    vec![
        ChecklistQuestion::new(
            "Have you checked the cages for this parcel?",
            "Please check the cages for this parcel before continuing.",
        ),
        ChecklistQuestion::new(
            "Has the courier checked their van?",
            "Ask the courier to search their van before the parcel is logged as missing.",
        ),
        ChecklistQuestion::new(
            "Have you checked the sorting area and conveyor?",
            "Walk the sorting area and conveyor line before continuing.",
        ),
        ChecklistQuestion::new(
            "Have you checked the carry-forward and returns shelves?",
            "Check the carry-forward and returns shelves before continuing.",
        ),
        ChecklistQuestion::new(
            "Has the duty manager been informed?",
            "Inform the duty manager before logging a high-priority parcel as missing.",
        ),
    ]
}
