//! List / detail / invoice presentation modes and action routing.

use lodge_core::{DomainError, RecordKey, ReservationId};
use lodge_reservations::{PrimaryAction, ReservationStatus, ReservationView};
use tracing::debug;

use crate::engine::ReservationEngine;
use crate::error::EngineResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    List,
    Detail(RecordKey),
    Invoice(RecordKey),
}

impl ViewMode {
    pub fn selected(&self) -> Option<RecordKey> {
        match self {
            ViewMode::List => None,
            ViewMode::Detail(key) | ViewMode::Invoice(key) => Some(*key),
        }
    }
}

/// An action button on a reservation row or detail panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    /// The status-dependent button (Confirm, Check In, Check Out).
    PrimaryAction,
    SetStatus(ReservationStatus),
    Cancel,
    Delete,
}

#[derive(Debug, Clone)]
pub struct ViewController {
    engine: ReservationEngine,
    mode: ViewMode,
}

impl ViewController {
    pub fn new(engine: ReservationEngine) -> Self {
        Self {
            engine,
            mode: ViewMode::List,
        }
    }

    pub fn engine(&self) -> &ReservationEngine {
        &self.engine
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// The record behind the detail or invoice view.
    pub fn selected(&self) -> Option<ReservationView> {
        self.mode.selected().and_then(|key| self.engine.reservation(&key))
    }

    pub fn open_detail(&mut self, key: RecordKey) -> EngineResult<()> {
        if self.engine.reservation(&key).is_none() {
            return Err(DomainError::not_found(format!("reservation {}", describe(&key))).into());
        }
        self.mode = ViewMode::Detail(key);
        Ok(())
    }

    /// Only reachable from the detail view.
    pub fn show_invoice(&mut self) -> EngineResult<()> {
        match self.mode {
            ViewMode::Detail(key) => {
                self.mode = ViewMode::Invoice(key);
                Ok(())
            }
            other => Err(DomainError::conflict(format!(
                "invoice is opened from the detail view, not {:?}",
                other
            ))
            .into()),
        }
    }

    pub fn back_to_detail(&mut self) {
        if let ViewMode::Invoice(key) = self.mode {
            self.mode = ViewMode::Detail(key);
        }
    }

    pub fn close(&mut self) {
        self.mode = ViewMode::List;
    }

    /// Fall back to the list when the selected record is gone.
    pub fn sync(&mut self) -> ViewMode {
        if let Some(key) = self.mode.selected() {
            if self.engine.reservation(&key).is_none() {
                debug!("Selected reservation {} disappeared; back to list", describe(&key));
                self.mode = ViewMode::List;
            }
        }
        self.mode
    }

    pub fn primary_action(&self, key: &RecordKey) -> Option<PrimaryAction> {
        self.engine.reservation(key).and_then(|r| r.status.primary_action())
    }

    /// Disabled while a status change is in flight, and for temporary or
    /// terminal records.
    pub fn is_primary_action_disabled(&self, key: &RecordKey) -> bool {
        if self.engine.status_mutation_in_flight() {
            return true;
        }
        match self.engine.reservation(key) {
            Some(record) => record.is_temp() || record.status.primary_action().is_none(),
            None => true,
        }
    }

    /// Route an action to the engine.
    pub async fn dispatch(&mut self, key: RecordKey, action: ViewAction) -> EngineResult<()> {
        let record = self
            .engine
            .reservation(&key)
            .ok_or_else(|| DomainError::not_found(format!("reservation {}", describe(&key))))?;
        let id = server_id(&record)?;

        let result = match action {
            ViewAction::PrimaryAction => {
                let action = record.status.primary_action().ok_or_else(|| {
                    DomainError::invariant(format!(
                        "no action is available for a {} reservation",
                        record.status
                    ))
                })?;
                self.engine.update_status(id, action.target).await
            }
            ViewAction::SetStatus(status) => self.engine.update_status(id, status).await,
            ViewAction::Cancel => self.engine.cancel(id).await,
            ViewAction::Delete => self.engine.delete(id).await,
        };
        self.sync();
        result
    }
}

fn server_id(record: &ReservationView) -> Result<ReservationId, DomainError> {
    record
        .key
        .server_id()
        .ok_or_else(|| DomainError::conflict("reservation is still being created"))
}

fn describe(key: &RecordKey) -> String {
    match key {
        RecordKey::Server(id) => id.to_string(),
        RecordKey::Temp(temp) => temp.to_string(),
    }
}
