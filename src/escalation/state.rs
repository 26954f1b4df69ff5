//! Checklist state machine.
//!
//! `ChecklistState::apply` is a pure function: given the current state, an
//! event and the number of questions it returns the next state and what
//! happened. Events that are not legal in the current state leave it
//! unchanged and report [`Transition::Ignored`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecklistAnswer {
    Yes,
    No,
}

impl std::str::FromStr for ChecklistAnswer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Ok(Self::Yes),
            "no" | "n" => Ok(Self::No),
            _ => Err(format!("Invalid answer '{}'. Valid options: yes, no", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecklistEvent {
    Start,
    Answer(ChecklistAnswer),
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChecklistState {
    #[default]
    Idle,
    Active {
        step: usize,
        /// The alert of `step` is showing after a "No".
        alert: bool,
    },
    Completed,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Advanced { step: usize },
    Alerted { step: usize },
    Completed,
    Aborted,
    Ignored,
}

impl ChecklistState {
    pub fn apply(self, event: ChecklistEvent, question_count: usize) -> (Self, Transition) {
        use ChecklistAnswer::{No, Yes};
        use ChecklistEvent::{Answer, Close, Start};

        match (self, event) {
            (Self::Idle, Start) if question_count == 0 => (Self::Completed, Transition::Completed),
            (Self::Idle, Start) => (
                Self::Active {
                    step: 0,
                    alert: false,
                },
                Transition::Started,
            ),
            (Self::Active { step, .. }, Answer(Yes)) if step + 1 >= question_count => {
                (Self::Completed, Transition::Completed)
            }
            (Self::Active { step, .. }, Answer(Yes)) => (
                Self::Active {
                    step: step + 1,
                    alert: false,
                },
                Transition::Advanced { step: step + 1 },
            ),
            (Self::Active { step, .. }, Answer(No)) => {
                (Self::Active { step, alert: true }, Transition::Alerted { step })
            }
            (Self::Active { .. }, Close) => (Self::Aborted, Transition::Aborted),
            (state, _) => (state, Transition::Ignored),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active { .. } => "active",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}
