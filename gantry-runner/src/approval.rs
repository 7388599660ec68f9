//! Approval gate
//!
//! Holds the approval requests opened by running pipelines. An Approval
//! action opens a request, notifies reviewers and waits; an external actor
//! resolves the request through `ApprovalGate::resolve`, which wakes the
//! waiting action exactly once.
//!
//! Retention: decided requests are kept as an audit trail, bounded by
//! `retention` (oldest decisions are evicted first). Requests still pending
//! when their run ends are dropped by `close_run`, since no decision could
//! affect that run any more.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gantry_core::domain::action::Action;
use gantry_core::domain::approval::{
    ApprovalDecision, ApprovalError, ApprovalRequest, ApprovalState,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{info, warn};
use uuid::Uuid;

/// Decided requests kept when no retention is configured
pub const DEFAULT_APPROVAL_RETENTION: usize = 1000;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("approval {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Resolve(#[from] ApprovalError),

    #[error("approval {0} was dropped before a decision arrived")]
    Abandoned(Uuid),
}

/// Delivers a newly opened request to reviewers
#[async_trait]
pub trait ApprovalNotifier: Send + Sync {
    async fn notify(&self, request: &ApprovalRequest) -> anyhow::Result<()>;
}

/// Notifier that only logs the pending request
pub struct LogNotifier;

#[async_trait]
impl ApprovalNotifier for LogNotifier {
    async fn notify(&self, request: &ApprovalRequest) -> anyhow::Result<()> {
        info!(
            "Approval {} pending for {}/{} (run {}): {}",
            request.id,
            request.stage,
            request.action,
            request.run_id,
            request.rationale.as_deref().unwrap_or("no rationale given")
        );
        Ok(())
    }
}

struct Entry {
    request: ApprovalRequest,
    waiter: Option<oneshot::Sender<ApprovalState>>,
}

/// Registry of approval requests across all runs
pub struct ApprovalGate {
    entries: Mutex<HashMap<Uuid, Entry>>,
    notifier: Arc<dyn ApprovalNotifier>,
    retention: usize,
}

impl ApprovalGate {
    pub fn new(notifier: Arc<dyn ApprovalNotifier>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            notifier,
            retention: DEFAULT_APPROVAL_RETENTION,
        }
    }

    /// Caps how many decided requests are kept
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention.max(1);
        self
    }

    /// Opens a pending request for an Approval action and notifies reviewers
    ///
    /// A notification failure is logged; the request stays pending and can
    /// still be resolved.
    pub async fn open(&self, run_id: Uuid, stage: &str, action: &Action) -> PendingApproval {
        let request = ApprovalRequest::new(run_id, stage, &action.name, action.rationale.clone());
        let id = request.id;
        let (tx, rx) = oneshot::channel();

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                Entry {
                    request: request.clone(),
                    waiter: Some(tx),
                },
            );

        if let Err(e) = self.notifier.notify(&request).await {
            warn!("Failed to notify reviewers of approval {}: {:#}", id, e);
        }

        PendingApproval { id, receiver: rx }
    }

    /// Applies a decision to a pending request
    ///
    /// Resolving an already decided request fails without changing it.
    pub fn resolve(
        &self,
        id: Uuid,
        decision: ApprovalDecision,
        resolved_by: Option<String>,
        comment: Option<String>,
    ) -> Result<ApprovalRequest, GateError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let request = {
            let entry = entries.get_mut(&id).ok_or(GateError::NotFound(id))?;
            let state = entry.request.resolve(decision, resolved_by, comment)?;
            info!("Approval {} resolved as {}", id, state);

            if let Some(waiter) = entry.waiter.take() {
                // The waiting action may already be gone
                let _ = waiter.send(state);
            }
            entry.request.clone()
        };

        evict_oldest_decided(&mut entries, self.retention);
        Ok(request)
    }

    /// Drops the requests of a finished run that nobody decided
    ///
    /// Returns how many were dropped. Decided requests are kept.
    pub fn close_run(&self, run_id: Uuid) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| {
            entry.request.run_id != run_id || entry.request.state.is_terminal()
        });
        let closed = before - entries.len();
        if closed > 0 {
            info!("Closed {} undecided approval(s) of run {}", closed, run_id);
        }
        closed
    }

    pub fn get(&self, id: Uuid) -> Option<ApprovalRequest> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(|entry| entry.request.clone())
    }

    /// Lists requests, oldest first, optionally filtered by state
    pub fn list(&self, state: Option<ApprovalState>) -> Vec<ApprovalRequest> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut requests: Vec<ApprovalRequest> = entries
            .values()
            .map(|entry| &entry.request)
            .filter(|request| state.is_none_or(|s| request.state == s))
            .cloned()
            .collect();
        requests.sort_by_key(|request| request.created_at);
        requests
    }
}

fn evict_oldest_decided(entries: &mut HashMap<Uuid, Entry>, retention: usize) {
    let mut decided: Vec<(Uuid, Option<DateTime<Utc>>)> = entries
        .iter()
        .filter(|(_, entry)| entry.request.state.is_terminal())
        .map(|(id, entry)| (*id, entry.request.resolved_at))
        .collect();

    if decided.len() <= retention {
        return;
    }

    decided.sort_by_key(|(_, resolved_at)| *resolved_at);
    let excess = decided.len() - retention;
    for (id, _) in decided.into_iter().take(excess) {
        entries.remove(&id);
    }
}

impl Default for ApprovalGate {
    fn default() -> Self {
        Self::new(Arc::new(LogNotifier))
    }
}

/// Handle held by the waiting Approval action
#[derive(Debug)]
pub struct PendingApproval {
    id: Uuid,
    receiver: oneshot::Receiver<ApprovalState>,
}

impl PendingApproval {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Waits for the request to be resolved
    pub async fn decision(self) -> Result<ApprovalState, GateError> {
        let id = self.id;
        self.receiver.await.map_err(|_| GateError::Abandoned(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::domain::action::ActionKind;

    fn review() -> Action {
        Action::new("Review", ActionKind::Approval).with_rationale("check staging")
    }

    #[tokio::test]
    async fn test_open_and_approve() {
        let gate = ApprovalGate::default();
        let pending = gate.open(Uuid::new_v4(), "Deploy-to-Production", &review()).await;
        let id = pending.id();

        let request = gate.get(id).unwrap();
        assert_eq!(request.state, ApprovalState::Pending);
        assert_eq!(request.rationale.as_deref(), Some("check staging"));

        let resolved = gate
            .resolve(id, ApprovalDecision::Approve, Some("alice".into()), None)
            .unwrap();
        assert_eq!(resolved.state, ApprovalState::Approved);
        assert_eq!(resolved.resolved_by.as_deref(), Some("alice"));

        assert_eq!(pending.decision().await.unwrap(), ApprovalState::Approved);
    }

    #[tokio::test]
    async fn test_second_resolution_is_rejected() {
        let gate = ApprovalGate::default();
        let pending = gate.open(Uuid::new_v4(), "Prod", &review()).await;
        let id = pending.id();

        gate.resolve(id, ApprovalDecision::Reject, None, Some("not yet".into()))
            .unwrap();

        let err = gate
            .resolve(id, ApprovalDecision::Approve, None, None)
            .unwrap_err();
        assert!(matches!(
            err,
            GateError::Resolve(ApprovalError::AlreadyResolved {
                state: ApprovalState::Rejected,
                ..
            })
        ));

        // The first decision is the one delivered and kept
        assert_eq!(pending.decision().await.unwrap(), ApprovalState::Rejected);
        assert_eq!(gate.get(id).unwrap().comment.as_deref(), Some("not yet"));
    }

    #[tokio::test]
    async fn test_close_run_drops_only_undecided_requests() {
        let gate = ApprovalGate::default();
        let run = Uuid::new_v4();
        let other_run = Uuid::new_v4();

        let decided = gate.open(run, "Prod", &review()).await;
        let undecided = gate.open(run, "Prod", &review()).await;
        let elsewhere = gate.open(other_run, "Prod", &review()).await;
        gate.resolve(decided.id(), ApprovalDecision::Approve, None, None)
            .unwrap();

        assert_eq!(gate.close_run(run), 1);
        assert!(gate.get(undecided.id()).is_none());
        assert_eq!(gate.get(decided.id()).unwrap().state, ApprovalState::Approved);
        assert_eq!(gate.get(elsewhere.id()).unwrap().state, ApprovalState::Pending);

        assert!(matches!(
            gate.resolve(undecided.id(), ApprovalDecision::Approve, None, None),
            Err(GateError::NotFound(_))
        ));
        assert!(matches!(
            undecided.decision().await,
            Err(GateError::Abandoned(_))
        ));
    }

    #[tokio::test]
    async fn test_retention_evicts_oldest_decisions() {
        let gate = ApprovalGate::default().with_retention(2);
        let mut ids = Vec::new();
        for _ in 0..3 {
            let pending = gate.open(Uuid::new_v4(), "Prod", &review()).await;
            ids.push(pending.id());
            gate.resolve(pending.id(), ApprovalDecision::Reject, None, None)
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        let still_pending = gate.open(Uuid::new_v4(), "Prod", &review()).await;

        assert!(gate.get(ids[0]).is_none());
        assert!(gate.get(ids[1]).is_some());
        assert!(gate.get(ids[2]).is_some());
        assert_eq!(gate.list(Some(ApprovalState::Rejected)).len(), 2);
        assert_eq!(gate.get(still_pending.id()).unwrap().state, ApprovalState::Pending);
    }

    #[test]
    fn test_resolve_unknown() {
        let gate = ApprovalGate::default();
        let id = Uuid::new_v4();
        assert!(matches!(
            gate.resolve(id, ApprovalDecision::Approve, None, None),
            Err(GateError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_list_filters_by_state() {
        let gate = ApprovalGate::default();
        let first = gate.open(Uuid::new_v4(), "Prod", &review()).await;
        let _second = gate.open(Uuid::new_v4(), "Prod", &review()).await;

        gate.resolve(first.id(), ApprovalDecision::Approve, None, None)
            .unwrap();

        assert_eq!(gate.list(None).len(), 2);
        assert_eq!(gate.list(Some(ApprovalState::Pending)).len(), 1);
        let approved = gate.list(Some(ApprovalState::Approved));
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, first.id());
    }

    #[tokio::test]
    async fn test_dropped_gate_entry_abandons_waiter() {
        let (tx, rx) = oneshot::channel::<ApprovalState>();
        drop(tx);
        let pending = PendingApproval {
            id: Uuid::new_v4(),
            receiver: rx,
        };
        assert!(matches!(
            pending.decision().await,
            Err(GateError::Abandoned(_))
        ));
    }
}
