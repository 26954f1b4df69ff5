//! Operator-facing parcel workflow.
//!
//! Decides whether an append or edit can run straight away or must pass the
//! escalation checklist first, owns the single active checklist session and
//! runs the deferred action when the session completes.

use thiserror::Error;
use tracing::{debug, info};

use crate::escalation::{
    requires_checklist, standard_questions, ChecklistAnswer, ChecklistQuestion, ChecklistSession,
    ChecklistView, SessionOutcome,
};
use crate::ledger::{AppendOutcome, LedgerError, ParcelLedger, RecoveryTracker};
use crate::models::{NewParcelEntry, ParcelPatch, ParcelScanEntry, RegistrySnapshot};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("A checklist is already in progress; finish or cancel it first")]
    ChecklistActive,
    #[error("No checklist is in progress")]
    NoActiveChecklist,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Mutation held by a checklist until it completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Append(Vec<NewParcelEntry>),
    Edit { id: i32, patch: ParcelPatch },
}

impl PendingAction {
    fn label(&self) -> String {
        match self {
            Self::Append(candidates) => format!("log {} missing parcel(s)", candidates.len()),
            Self::Edit { id, .. } => format!("edit missing parcel {}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Appended(AppendOutcome),
    Edited(ParcelScanEntry),
    /// The action is waiting on the checklist.
    ChecklistPending(ChecklistView),
    ChecklistAborted,
}

pub struct ParcelWorkflow {
    ledger: ParcelLedger,
    questions: Vec<ChecklistQuestion>,
    session: Option<ChecklistSession<PendingAction>>,
}

impl ParcelWorkflow {
    pub fn new(ledger: ParcelLedger) -> Self {
        Self::with_questions(ledger, standard_questions())
    }

    /// Use a custom question list. An empty list falls back to the standard one.
    pub fn with_questions(ledger: ParcelLedger, questions: Vec<ChecklistQuestion>) -> Self {
        let questions = if questions.is_empty() {
            standard_questions()
        } else {
            questions
        };
        Self {
            ledger,
            questions,
            session: None,
        }
    }

    pub fn ledger(&self) -> &ParcelLedger {
        &self.ledger
    }

    pub fn registry(&self) -> &RegistrySnapshot {
        self.ledger.registry()
    }

    /// Log new missing parcels, opening the checklist when any of them is an
    /// unrecovered high-priority parcel.
    pub async fn submit_append(
        &mut self,
        candidates: Vec<NewParcelEntry>,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        self.ensure_idle()?;

        let gated = candidates
            .iter()
            .any(|c| requires_checklist(self.registry(), c.client_id, c.recovered));
        if gated {
            return Ok(self.open(PendingAction::Append(candidates)));
        }

        debug!("Checklist bypassed for {} candidate(s)", candidates.len());
        self.run(PendingAction::Append(candidates)).await
    }

    /// Correct an entry. Validation runs first; the checklist opens when the
    /// entry, before or after the correction, belongs to a high-priority
    /// client and is unrecovered.
    pub async fn submit_edit(
        &mut self,
        id: i32,
        patch: ParcelPatch,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        self.ensure_idle()?;

        let preview = self.ledger.preview_edit(id, &patch).await?;
        let current = self.ledger.get(id).unwrap_or(&preview);
        let gated = [current, &preview]
            .iter()
            .any(|e| requires_checklist(self.registry(), e.client_id, e.is_recovered()));
        if gated {
            return Ok(self.open(PendingAction::Edit { id, patch }));
        }

        self.run(PendingAction::Edit { id, patch }).await
    }

    /// Answer the current question. On completion the deferred action runs
    /// and its result is returned.
    pub async fn answer(&mut self, answer: ChecklistAnswer) -> Result<WorkflowOutcome, WorkflowError> {
        let session = self
            .session
            .as_mut()
            .ok_or(WorkflowError::NoActiveChecklist)?;

        match session.answer(answer) {
            SessionOutcome::Released(action) => {
                self.session = None;
                self.run(action).await
            }
            SessionOutcome::Aborted => {
                self.session = None;
                Ok(WorkflowOutcome::ChecklistAborted)
            }
            SessionOutcome::Pending(_) | SessionOutcome::Ignored => {
                Ok(WorkflowOutcome::ChecklistPending(session.view()))
            }
        }
    }

    /// Close the checklist; the pending action is discarded.
    pub fn cancel(&mut self) -> Result<WorkflowOutcome, WorkflowError> {
        let mut session = self.session.take().ok_or(WorkflowError::NoActiveChecklist)?;
        session.close();
        Ok(WorkflowOutcome::ChecklistAborted)
    }

    pub fn view(&self) -> Option<ChecklistView> {
        self.session.as_ref().map(ChecklistSession::view)
    }

    pub fn has_active_checklist(&self) -> bool {
        self.session.as_ref().is_some_and(ChecklistSession::is_active)
    }

    /// Recovery toggles are never gated.
    pub async fn set_recovered(
        &mut self,
        id: i32,
        recovered: bool,
    ) -> Result<ParcelScanEntry, WorkflowError> {
        let mut tracker = RecoveryTracker::new(&mut self.ledger);
        let entry = if recovered {
            tracker.mark_recovered(id).await?
        } else {
            tracker.mark_missing(id).await?
        };
        Ok(entry)
    }

    fn ensure_idle(&self) -> Result<(), WorkflowError> {
        if self.has_active_checklist() {
            Err(WorkflowError::ChecklistActive)
        } else {
            Ok(())
        }
    }

    fn open(&mut self, action: PendingAction) -> WorkflowOutcome {
        let label = action.label();
        match ChecklistSession::start(self.questions.clone(), action, label) {
            Ok(session) => {
                let view = session.view();
                info!("Escalation checklist opened to {}", view.pending);
                self.session = Some(session);
                WorkflowOutcome::ChecklistPending(view)
            }
            // `with_questions` never leaves the list empty
            Err(_) => WorkflowOutcome::ChecklistAborted,
        }
    }

    async fn run(&mut self, action: PendingAction) -> Result<WorkflowOutcome, WorkflowError> {
        match action {
            PendingAction::Append(candidates) => {
                let outcome = self.ledger.append(&candidates).await?;
                Ok(WorkflowOutcome::Appended(outcome))
            }
            PendingAction::Edit { id, patch } => {
                let entry = self.ledger.edit(id, &patch).await?;
                Ok(WorkflowOutcome::Edited(entry))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ledger::InMemoryLedgerBackend;
    use crate::models::{Client, RegistryImport};

    const AMAZON: i32 = 1;
    const ASOS: i32 = 2;

    fn workflow() -> ParcelWorkflow {
        let registry = RegistrySnapshot::from_lists(RegistryImport {
            clients: vec![
                Client {
                    id: AMAZON,
                    name: "Amazon".into(),
                    is_high_priority: false,
                    tracking_carrier: None,
                },
                Client {
                    id: ASOS,
                    name: "ASOS".into(),
                    is_high_priority: true,
                    tracking_carrier: None,
                },
            ],
            ..Default::default()
        });
        let ledger = ParcelLedger::new(Arc::new(InMemoryLedgerBackend::new()), Arc::new(registry));
        ParcelWorkflow::new(ledger)
    }

    fn parcel(barcode: &str, client_id: i32) -> NewParcelEntry {
        NewParcelEntry::standard(barcode, 1, 71, "C001", 3, client_id)
    }

    #[tokio::test]
    async fn test_amazon_bypasses_checklist() {
        let mut wf = workflow();
        let outcome = wf
            .submit_append(vec![parcel("AMZN000000000001", AMAZON)])
            .await
            .unwrap();

        match outcome {
            WorkflowOutcome::Appended(out) => assert_eq!(out.persisted.len(), 1),
            other => panic!("expected append, got {:?}", other),
        }
        assert!(wf.view().is_none());
        assert_eq!(wf.ledger().len(), 1);
    }

    #[tokio::test]
    async fn test_asos_walks_the_checklist() {
        let mut wf = workflow();
        let outcome = wf
            .submit_append(vec![parcel("ASOS000000000001", ASOS)])
            .await
            .unwrap();
        match outcome {
            WorkflowOutcome::ChecklistPending(view) => assert_eq!(view.step, 0),
            other => panic!("expected checklist, got {:?}", other),
        }
        assert!(wf.ledger().is_empty());

        match wf.answer(ChecklistAnswer::No).await.unwrap() {
            WorkflowOutcome::ChecklistPending(view) => {
                assert_eq!(view.step, 0);
                assert!(view.alert.unwrap().contains("check the cages"));
            }
            other => panic!("expected pending, got {:?}", other),
        }

        for _ in 0..4 {
            assert!(matches!(
                wf.answer(ChecklistAnswer::Yes).await.unwrap(),
                WorkflowOutcome::ChecklistPending(_)
            ));
            assert!(wf.ledger().is_empty());
        }
        match wf.answer(ChecklistAnswer::Yes).await.unwrap() {
            WorkflowOutcome::Appended(out) => assert_eq!(out.persisted.len(), 1),
            other => panic!("expected append, got {:?}", other),
        }
        assert_eq!(wf.ledger().len(), 1);
        assert!(wf.view().is_none());
        assert!(matches!(
            wf.answer(ChecklistAnswer::Yes).await,
            Err(WorkflowError::NoActiveChecklist)
        ));
    }

    #[tokio::test]
    async fn test_cancel_discards_action() {
        let mut wf = workflow();
        wf.submit_append(vec![parcel("ASOS000000000001", ASOS)])
            .await
            .unwrap();
        wf.answer(ChecklistAnswer::Yes).await.unwrap();
        assert_eq!(wf.cancel().unwrap(), WorkflowOutcome::ChecklistAborted);
        assert!(wf.ledger().is_empty());
        assert!(matches!(wf.cancel(), Err(WorkflowError::NoActiveChecklist)));
    }

    #[tokio::test]
    async fn test_second_session_is_rejected() {
        let mut wf = workflow();
        wf.submit_append(vec![parcel("ASOS000000000001", ASOS)])
            .await
            .unwrap();
        wf.answer(ChecklistAnswer::Yes).await.unwrap();

        assert!(matches!(
            wf.submit_append(vec![parcel("AMZN000000000001", AMAZON)]).await,
            Err(WorkflowError::ChecklistActive)
        ));
        // The active session is untouched
        assert_eq!(wf.view().unwrap().step, 1);
    }

    #[tokio::test]
    async fn test_recovered_high_priority_parcel_bypasses() {
        let mut wf = workflow();
        let mut entry = parcel("ASOS000000000001", ASOS);
        entry.recovered = true;
        assert!(matches!(
            wf.submit_append(vec![entry]).await.unwrap(),
            WorkflowOutcome::Appended(_)
        ));
    }

    #[tokio::test]
    async fn test_edit_into_high_priority_client_is_gated() {
        let mut wf = workflow();
        wf.submit_append(vec![parcel("AMZN000000000001", AMAZON)])
            .await
            .unwrap();
        let id = wf.ledger().entries().next().unwrap().id;

        let patch = ParcelPatch {
            client_id: Some(ASOS),
            ..Default::default()
        };
        assert!(matches!(
            wf.submit_edit(id, patch).await.unwrap(),
            WorkflowOutcome::ChecklistPending(_)
        ));
        assert_eq!(wf.ledger().get(id).unwrap().client_id, AMAZON);

        let mut last = None;
        for _ in 0..5 {
            last = Some(wf.answer(ChecklistAnswer::Yes).await.unwrap());
        }
        match last {
            Some(WorkflowOutcome::Edited(entry)) => assert_eq!(entry.client_id, ASOS),
            other => panic!("expected edit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_edit_away_from_high_priority_client_is_gated() {
        let mut wf = workflow();
        wf.submit_append(vec![parcel("ASOS000000000001", ASOS)])
            .await
            .unwrap();
        for _ in 0..5 {
            wf.answer(ChecklistAnswer::Yes).await.unwrap();
        }
        let id = wf.ledger().entries().next().unwrap().id;

        let patch = ParcelPatch {
            client_id: Some(AMAZON),
            ..Default::default()
        };
        assert!(matches!(
            wf.submit_edit(id, patch).await.unwrap(),
            WorkflowOutcome::ChecklistPending(_)
        ));
        assert_eq!(wf.ledger().get(id).unwrap().client_id, ASOS);

        assert_eq!(wf.cancel().unwrap(), WorkflowOutcome::ChecklistAborted);
        assert_eq!(wf.ledger().get(id).unwrap().client_id, ASOS);
    }

    #[tokio::test]
    async fn test_edit_between_ordinary_clients_bypasses() {
        let mut wf = workflow();
        wf.submit_append(vec![parcel("AMZN000000000001", AMAZON)])
            .await
            .unwrap();
        let id = wf.ledger().entries().next().unwrap().id;

        let patch = ParcelPatch {
            drop_number: Some(9),
            ..Default::default()
        };
        match wf.submit_edit(id, patch).await.unwrap() {
            WorkflowOutcome::Edited(entry) => assert_eq!(entry.drop_number, 9),
            other => panic!("expected edit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_edit_fails_before_checklist() {
        let mut wf = workflow();
        wf.submit_append(vec![parcel("AMZN000000000001", AMAZON)])
            .await
            .unwrap();
        let id = wf.ledger().entries().next().unwrap().id;

        let patch = ParcelPatch {
            client_id: Some(ASOS),
            barcode: Some("SHORT".into()),
            ..Default::default()
        };
        assert!(matches!(
            wf.submit_edit(id, patch).await,
            Err(WorkflowError::Ledger(LedgerError::Validation(_)))
        ));
        assert!(wf.view().is_none());
    }

    #[tokio::test]
    async fn test_recovery_toggle_is_never_gated() {
        let mut wf = workflow();
        let mut entry = parcel("ASOS000000000001", ASOS);
        entry.recovered = true;
        wf.submit_append(vec![entry]).await.unwrap();
        let id = wf.ledger().entries().next().unwrap().id;

        let missing = wf.set_recovered(id, false).await.unwrap();
        assert!(!missing.is_recovered());
        assert!(wf.view().is_none());
    }
}
