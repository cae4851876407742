//! Optimistic create, status update, cancel and delete.
//!
//! Each action changes the canonical collection before the request is sent.
//! On success a create swaps its temporary record for the authoritative one;
//! the other actions just commit. On failure a create removes its temporary
//! record, while the other actions recover by reloading the whole collection
//! from the server. A reload re-applies the changes of mutations that are
//! still in flight, so server truth never hides an outstanding action.
//! Mutations are never retried.

use std::collections::VecDeque;

use chrono::Utc;
use lodge_core::{DomainError, RecordKey, ReservationId, TempId};
use lodge_reservations::{
    ReservationDraft, ReservationStatus, ReservationView, ensure_transition, normalize_guests,
    normalize_one, normalize_rooms,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::ReservationEngine;
use crate::error::{ApiError, EngineResult};
use crate::store::StoreAction;

/// Settled mutations kept for inspection.
const SETTLED_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    UpdateStatus(ReservationStatus),
    Cancel,
    Delete,
}

impl MutationKind {
    /// Counts toward the "status change in flight" flag.
    pub fn is_status_change(self) -> bool {
        matches!(self, MutationKind::UpdateStatus(_) | MutationKind::Cancel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    Pending,
    Committed,
    RolledBack,
}

/// How a failed mutation is undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    RemoveTemporary(TempId),
    Reload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingMutation {
    pub id: u64,
    pub kind: MutationKind,
    pub target: RecordKey,
    pub phase: MutationPhase,
}

impl PendingMutation {
    pub fn recovery(&self) -> Recovery {
        match (self.kind, self.target) {
            (MutationKind::Create, RecordKey::Temp(temp)) => Recovery::RemoveTemporary(temp),
            _ => Recovery::Reload,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.phase != MutationPhase::Pending
    }

    /// The optimistic change this mutation made, as it must be re-applied on
    /// top of a freshly loaded collection. Creates need nothing: the store
    /// keeps temporary records across loads.
    pub fn replay(&self) -> Option<StoreAction> {
        let id = self.target.server_id()?;
        match self.kind {
            MutationKind::Create => None,
            MutationKind::UpdateStatus(status) => Some(StoreAction::StatusChanged { id, status }),
            MutationKind::Cancel => Some(StoreAction::StatusChanged {
                id,
                status: ReservationStatus::Cancelled,
            }),
            MutationKind::Delete => Some(StoreAction::Removed { id }),
        }
    }
}

/// In-flight mutations plus a bounded history of settled ones.
#[derive(Debug, Clone, Default)]
pub struct MutationJournal {
    next_id: u64,
    in_flight: Vec<PendingMutation>,
    settled: VecDeque<PendingMutation>,
}

impl MutationJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, kind: MutationKind, target: RecordKey) -> u64 {
        self.next_id += 1;
        self.in_flight.push(PendingMutation {
            id: self.next_id,
            kind,
            target,
            phase: MutationPhase::Pending,
        });
        self.next_id
    }

    /// Move mutation `id` out of flight. Settling twice is a no-op.
    pub fn settle(&mut self, id: u64, phase: MutationPhase) -> Option<PendingMutation> {
        let idx = self.in_flight.iter().position(|m| m.id == id)?;
        let mut mutation = self.in_flight.remove(idx);
        mutation.phase = phase;
        if self.settled.len() == SETTLED_CAPACITY {
            self.settled.pop_front();
        }
        self.settled.push_back(mutation.clone());
        Some(mutation)
    }

    pub fn in_flight(&self) -> &[PendingMutation] {
        &self.in_flight
    }

    /// Oldest first.
    pub fn settled(&self) -> impl Iterator<Item = &PendingMutation> {
        self.settled.iter()
    }

    pub fn status_mutation_in_flight(&self) -> bool {
        self.in_flight.iter().any(|m| m.kind.is_status_change())
    }

    /// Store actions that restore every in-flight change, oldest first.
    pub fn replay(&self) -> impl Iterator<Item = StoreAction> + '_ {
        self.in_flight.iter().filter_map(PendingMutation::replay)
    }
}

impl ReservationEngine {
    /// Create a reservation. A temporary record is shown at the top of the
    /// list until the server answers.
    pub async fn create(&self, draft: ReservationDraft) -> EngineResult<ReservationView> {
        draft.validate()?;

        let temp = TempId::new();
        let mutation = self.update(|s| {
            let placeholder = ReservationView::temporary(
                temp,
                &draft,
                s.store.guest(draft.guest_id),
                s.store.room(draft.room_id),
                Utc::now(),
            );
            s.store.apply(StoreAction::CreateRequested(placeholder));
            s.journal.begin(MutationKind::Create, RecordKey::Temp(temp))
        })?;
        info!(
            "Creating reservation for guest {} in room {} ({})",
            draft.guest_id, draft.room_id, temp
        );

        match self.inner.api.create_reservation(&draft).await {
            Ok(created) => {
                let record = normalize_one(&created.reservation);
                let guest = created
                    .guest
                    .and_then(|g| normalize_guests(&[g]).into_iter().next());
                let room = created
                    .room
                    .and_then(|r| normalize_rooms(&[r]).into_iter().next());
                self.update(|s| {
                    s.store.apply(StoreAction::CreateSucceeded {
                        temp,
                        record: record.clone(),
                        guest,
                        room,
                    });
                    s.journal.settle(mutation, MutationPhase::Committed);
                })?;
                info!("Created reservation {}", record.code);
                Ok(record)
            }
            Err(e) => {
                self.roll_back(mutation, &e, "Failed to create reservation").await?;
                Err(e.into())
            }
        }
    }

    /// Move a reservation to `status`. The edge is checked against the
    /// registry before anything is sent.
    pub async fn update_status(
        &self,
        id: ReservationId,
        status: ReservationStatus,
    ) -> EngineResult<()> {
        let kind = MutationKind::UpdateStatus(status);
        let mutation = self.begin_status_change(id, status, kind)?;
        info!("Updating reservation {} to {}", id, status);
        let result = self.inner.api.update_status(id, status).await;
        self.finish(mutation, result, "Failed to update reservation status").await
    }

    /// Cancel is the `cancelled` transition through its own endpoint.
    pub async fn cancel(&self, id: ReservationId) -> EngineResult<()> {
        let mutation =
            self.begin_status_change(id, ReservationStatus::Cancelled, MutationKind::Cancel)?;
        info!("Cancelling reservation {}", id);
        let result = self.inner.api.cancel_reservation(id).await;
        self.finish(mutation, result, "Failed to cancel reservation").await
    }

    pub async fn delete(&self, id: ReservationId) -> EngineResult<()> {
        let mutation = self.update(|s| {
            let key = RecordKey::Server(id);
            if !s.store.contains(&key) {
                return Err(DomainError::not_found(format!("reservation {}", id)));
            }
            s.store.apply(StoreAction::Removed { id });
            Ok(s.journal.begin(MutationKind::Delete, key))
        })??;
        info!("Deleting reservation {}", id);
        let result = self.inner.api.delete_reservation(id).await;
        self.finish(mutation, result, "Failed to delete reservation").await
    }

    fn begin_status_change(
        &self,
        id: ReservationId,
        status: ReservationStatus,
        kind: MutationKind,
    ) -> EngineResult<u64> {
        let mutation = self.update(|s| {
            let key = RecordKey::Server(id);
            let current = s
                .store
                .get(&key)
                .map(|r| r.status)
                .ok_or_else(|| DomainError::not_found(format!("reservation {}", id)))?;
            ensure_transition(current, status)?;
            s.store.apply(StoreAction::StatusChanged { id, status });
            Ok::<_, DomainError>(s.journal.begin(kind, key))
        })??;
        Ok(mutation)
    }

    /// Commit on success, otherwise roll back and surface the mutation's
    /// own error.
    async fn finish(
        &self,
        mutation: u64,
        result: Result<(), ApiError>,
        fallback: &str,
    ) -> EngineResult<()> {
        match result {
            Ok(()) => {
                self.update(|s| {
                    s.journal.settle(mutation, MutationPhase::Committed);
                })?;
                Ok(())
            }
            Err(e) => {
                self.roll_back(mutation, &e, fallback).await?;
                Err(e.into())
            }
        }
    }

    /// Settle a rejected mutation and undo it as its [`Recovery`] says: drop
    /// the temporary record, or reload server truth. Then record the
    /// user-facing message.
    async fn roll_back(&self, mutation: u64, error: &ApiError, fallback: &str) -> EngineResult<()> {
        let recovery = self.update(|s| {
            let recovery = s
                .journal
                .settle(mutation, MutationPhase::RolledBack)
                .map(|m| m.recovery());
            if let Some(Recovery::RemoveTemporary(temp)) = recovery {
                s.store.apply(StoreAction::CreateFailed { temp });
            }
            recovery
        })?;

        match recovery {
            Some(Recovery::RemoveTemporary(temp)) => {
                warn!("Create rejected, removed temporary reservation {}: {}", temp, error);
            }
            Some(Recovery::Reload) => {
                warn!("Mutation {} rejected: {}; reloading reservations", mutation, error);
                if let Err(reload) = self.reload().await {
                    warn!("Reload after rejected mutation {} failed: {}", mutation, reload);
                }
            }
            None => debug!("Mutation {} was already settled", mutation),
        }

        let message = error.user_message(fallback);
        self.update(|s| s.last_error = Some(message))
    }

    /// Whether a status change or cancel is awaiting its response.
    pub fn status_mutation_in_flight(&self) -> bool {
        self.read(|s| s.journal.status_mutation_in_flight())
    }

    pub fn mutations_in_flight(&self) -> Vec<PendingMutation> {
        self.read(|s| s.journal.in_flight().to_vec())
    }

    pub fn settled_mutations(&self) -> Vec<PendingMutation> {
        self.read(|s| s.journal.settled().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(id: i64) -> RecordKey {
        RecordKey::Server(ReservationId::new(id))
    }

    #[test]
    fn journal_tracks_phases() {
        let mut journal = MutationJournal::new();
        let a = journal.begin(
            MutationKind::UpdateStatus(ReservationStatus::Confirmed),
            server(1),
        );
        let b = journal.begin(MutationKind::Delete, server(2));
        assert!(journal.status_mutation_in_flight());
        assert_eq!(journal.in_flight().len(), 2);

        let settled = journal.settle(a, MutationPhase::Committed).unwrap();
        assert_eq!(settled.phase, MutationPhase::Committed);
        assert!(!journal.status_mutation_in_flight());
        assert!(journal.settle(a, MutationPhase::RolledBack).is_none());

        journal.settle(b, MutationPhase::RolledBack);
        assert!(journal.in_flight().is_empty());
        let phases: Vec<_> = journal.settled().map(|m| m.phase).collect();
        assert_eq!(phases, vec![MutationPhase::Committed, MutationPhase::RolledBack]);
    }

    #[test]
    fn settled_history_is_bounded() {
        let mut journal = MutationJournal::new();
        for i in 0..40 {
            let id = journal.begin(MutationKind::Delete, server(i));
            journal.settle(id, MutationPhase::Committed);
        }
        let settled: Vec<_> = journal.settled().collect();
        assert_eq!(settled.len(), SETTLED_CAPACITY);
        assert_eq!(settled[0].target, server(8));
    }

    #[test]
    fn recovery_depends_on_kind() {
        let temp = TempId::new();
        let create = PendingMutation {
            id: 1,
            kind: MutationKind::Create,
            target: RecordKey::Temp(temp),
            phase: MutationPhase::Pending,
        };
        assert_eq!(create.recovery(), Recovery::RemoveTemporary(temp));
        assert!(!create.is_settled());

        let cancel = PendingMutation {
            kind: MutationKind::Cancel,
            target: server(3),
            ..create
        };
        assert_eq!(cancel.recovery(), Recovery::Reload);
    }

    #[test]
    fn replay_restores_in_flight_changes_in_order() {
        let mut journal = MutationJournal::new();
        journal.begin(MutationKind::Create, RecordKey::Temp(TempId::new()));
        journal.begin(MutationKind::UpdateStatus(ReservationStatus::Confirmed), server(2));
        let cancel = journal.begin(MutationKind::Cancel, server(1));
        journal.begin(MutationKind::Delete, server(3));
        journal.settle(cancel, MutationPhase::RolledBack);

        let actions: Vec<_> = journal.replay().collect();
        assert_eq!(
            actions,
            vec![
                StoreAction::StatusChanged {
                    id: ReservationId::new(2),
                    status: ReservationStatus::Confirmed,
                },
                StoreAction::Removed { id: ReservationId::new(3) },
            ]
        );
    }
}
