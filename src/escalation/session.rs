//! A running checklist with its deferred action.

use serde::Serialize;
use tracing::{debug, info};

use super::questions::ChecklistQuestion;
use super::state::{ChecklistAnswer, ChecklistEvent, ChecklistState, Transition};

/// What a session event produced for the caller.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionOutcome<A> {
    /// Still waiting for answers.
    Pending(Transition),
    /// Every question was affirmed; the deferred action is handed over.
    Released(A),
    /// Closed before completion; the deferred action was dropped.
    Aborted,
    Ignored,
}

/// Serializable view of a session for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistView {
    pub state: &'static str,
    pub step: usize,
    pub total: usize,
    pub question: Option<String>,
    pub alert: Option<String>,
    /// Short description of what will happen on completion.
    pub pending: String,
}

/// Gating session holding the action to run once every question is
/// affirmed. The action is moved out on completion, so it can be released
/// at most once.
#[derive(Debug)]
pub struct ChecklistSession<A> {
    questions: Vec<ChecklistQuestion>,
    state: ChecklistState,
    action: Option<A>,
    label: String,
}

impl<A> ChecklistSession<A> {
    /// Open a session at step 0.
    ///
    /// With an empty question list the session completes immediately and
    /// the action comes straight back.
    pub fn start(
        questions: Vec<ChecklistQuestion>,
        action: A,
        label: impl Into<String>,
    ) -> Result<Self, A> {
        let label = label.into();
        let (state, transition) = ChecklistState::Idle.apply(ChecklistEvent::Start, questions.len());
        if transition == Transition::Completed {
            return Err(action);
        }
        debug!("Checklist opened for {}", label);
        Ok(Self {
            questions,
            state,
            action: Some(action),
            label,
        })
    }

    pub fn answer(&mut self, answer: ChecklistAnswer) -> SessionOutcome<A> {
        self.handle(ChecklistEvent::Answer(answer))
    }

    pub fn close(&mut self) -> SessionOutcome<A> {
        self.handle(ChecklistEvent::Close)
    }

    fn handle(&mut self, event: ChecklistEvent) -> SessionOutcome<A> {
        let (next, transition) = self.state.apply(event, self.questions.len());
        self.state = next;
        debug!("Checklist for {}: {:?} -> {:?}", self.label, event, transition);

        match transition {
            Transition::Completed => match self.action.take() {
                Some(action) => {
                    info!("Checklist completed for {}", self.label);
                    SessionOutcome::Released(action)
                }
                None => SessionOutcome::Ignored,
            },
            Transition::Aborted => {
                self.action = None;
                info!("Checklist aborted for {}", self.label);
                SessionOutcome::Aborted
            }
            Transition::Ignored => SessionOutcome::Ignored,
            other => SessionOutcome::Pending(other),
        }
    }

    pub fn state(&self) -> ChecklistState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn current_question(&self) -> Option<&ChecklistQuestion> {
        match self.state {
            ChecklistState::Active { step, .. } => self.questions.get(step),
            _ => None,
        }
    }

    /// Alert text for the current step, if the last answer there was "No".
    pub fn alert(&self) -> Option<&str> {
        match self.state {
            ChecklistState::Active { step, alert: true } => {
                self.questions.get(step).map(|q| q.alert.as_str())
            }
            _ => None,
        }
    }

    pub fn pending_action(&self) -> Option<&A> {
        self.action.as_ref()
    }

    pub fn view(&self) -> ChecklistView {
        let step = match self.state {
            ChecklistState::Active { step, .. } => step,
            ChecklistState::Completed => self.questions.len(),
            _ => 0,
        };
        ChecklistView {
            state: self.state.as_str(),
            step,
            total: self.questions.len(),
            question: self.current_question().map(|q| q.prompt.clone()),
            alert: self.alert().map(str::to_string),
            pending: self.label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::standard_questions;

    fn session() -> ChecklistSession<&'static str> {
        ChecklistSession::start(standard_questions(), "append", "1 parcel").unwrap()
    }

    #[test]
    fn test_all_yes_releases_once() {
        let mut s = session();
        let n = standard_questions().len();
        for _ in 0..n - 1 {
            assert!(matches!(
                s.answer(ChecklistAnswer::Yes),
                SessionOutcome::Pending(Transition::Advanced { .. })
            ));
        }
        assert_eq!(s.answer(ChecklistAnswer::Yes), SessionOutcome::Released("append"));
        assert_eq!(s.state(), ChecklistState::Completed);

        assert_eq!(s.answer(ChecklistAnswer::Yes), SessionOutcome::Ignored);
        assert_eq!(s.close(), SessionOutcome::Ignored);
        assert!(s.pending_action().is_none());
    }

    #[test]
    fn test_no_at_each_step_shows_that_steps_alert() {
        let questions = standard_questions();
        for i in 0..questions.len() {
            let mut s = session();
            for _ in 0..i {
                s.answer(ChecklistAnswer::Yes);
            }
            assert_eq!(
                s.answer(ChecklistAnswer::No),
                SessionOutcome::Pending(Transition::Alerted { step: i })
            );
            assert_eq!(s.state(), ChecklistState::Active { step: i, alert: true });
            assert_eq!(s.alert(), Some(questions[i].alert.as_str()));
            assert!(s.pending_action().is_some());
        }
    }

    #[test]
    fn test_close_never_releases() {
        let mut s = session();
        s.answer(ChecklistAnswer::Yes);
        s.answer(ChecklistAnswer::No);
        assert_eq!(s.close(), SessionOutcome::Aborted);
        assert!(s.pending_action().is_none());
        for _ in 0..10 {
            assert_eq!(s.answer(ChecklistAnswer::Yes), SessionOutcome::Ignored);
        }
    }

    #[test]
    fn test_view_tracks_step() {
        let mut s = session();
        let v = s.view();
        assert_eq!((v.state, v.step, v.total), ("active", 0, 5));
        assert!(v.question.unwrap().contains("cages"));
        assert!(v.alert.is_none());

        s.answer(ChecklistAnswer::No);
        assert!(s.view().alert.unwrap().contains("check the cages"));
    }

    #[test]
    fn test_empty_questions_hand_action_back() {
        let result = ChecklistSession::start(Vec::new(), 7u8, "noop");
        assert!(matches!(result, Err(7)));
    }
}
