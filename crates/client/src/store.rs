//! The canonical reservation collection.
//!
//! State changes only through [`ReservationStore::apply`]; every action that
//! changes something bumps the revision, which is what the filter memo keys
//! on.

use std::collections::HashSet;

use lodge_core::entity::append_missing;
use lodge_core::{GuestId, RecordKey, ReservationId, RoomId, TempId};
use lodge_reservations::{Guest, ReservationStatus, ReservationView, Room};

/// Everything that can happen to the canonical collection.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    /// A fresh primary fetch. Replaces every acknowledged record; temporary
    /// records still awaiting their create response stay at the front.
    ReservationsLoaded(Vec<ReservationView>),
    /// Secondary wave; `None` leaves that collection untouched.
    SecondaryLoaded {
        guests: Option<Vec<Guest>>,
        rooms: Option<Vec<Room>>,
    },
    CreateRequested(ReservationView),
    CreateSucceeded {
        temp: TempId,
        record: ReservationView,
        guest: Option<Guest>,
        room: Option<Room>,
    },
    CreateFailed {
        temp: TempId,
    },
    StatusChanged {
        id: ReservationId,
        status: ReservationStatus,
    },
    Removed {
        id: ReservationId,
    },
}

#[derive(Debug, Default, Clone)]
pub struct ReservationStore {
    reservations: Vec<ReservationView>,
    guests: Vec<Guest>,
    rooms: Vec<Room>,
    revision: u64,
}

impl ReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an action; returns whether anything changed.
    pub fn apply(&mut self, action: StoreAction) -> bool {
        let changed = match action {
            StoreAction::ReservationsLoaded(records) => {
                self.replace_reservations(records);
                true
            }
            StoreAction::SecondaryLoaded { guests, rooms } => {
                let changed = guests.is_some() || rooms.is_some();
                if let Some(guests) = guests {
                    self.guests = guests;
                }
                if let Some(rooms) = rooms {
                    self.rooms = rooms;
                }
                changed
            }
            StoreAction::CreateRequested(record) => {
                if self.position(&record.key).is_some() {
                    false
                } else {
                    self.reservations.insert(0, record);
                    true
                }
            }
            StoreAction::CreateSucceeded { temp, record, guest, room } => {
                self.reconcile_create(temp, record);
                append_missing(&mut self.guests, guest.as_slice());
                append_missing(&mut self.rooms, room.as_slice());
                true
            }
            StoreAction::CreateFailed { temp } => self.remove(&RecordKey::Temp(temp)),
            StoreAction::StatusChanged { id, status } => {
                match self.position(&RecordKey::Server(id)) {
                    Some(idx) if self.reservations[idx].status != status => {
                        self.reservations[idx].status = status;
                        true
                    }
                    _ => false,
                }
            }
            StoreAction::Removed { id } => self.remove(&RecordKey::Server(id)),
        };

        if changed {
            self.revision += 1;
        }
        changed
    }

    fn replace_reservations(&mut self, records: Vec<ReservationView>) {
        let mut seen: HashSet<RecordKey> = HashSet::with_capacity(records.len());
        let mut next: Vec<ReservationView> = self
            .reservations
            .drain(..)
            .filter(|r| r.is_temp())
            .inspect(|r| {
                seen.insert(r.key);
            })
            .collect();
        next.extend(records.into_iter().filter(|r| seen.insert(r.key)));
        self.reservations = next;
    }

    /// Swap the temporary record for the authoritative one, keeping every key
    /// unique even when a reload already brought the new id in.
    fn reconcile_create(&mut self, temp: TempId, record: ReservationView) {
        let temp_key = RecordKey::Temp(temp);
        match (self.position(&record.key), self.position(&temp_key)) {
            (Some(existing), _) => {
                self.reservations[existing] = record;
                self.remove(&temp_key);
            }
            (None, Some(idx)) => self.reservations[idx] = record,
            (None, None) => self.reservations.insert(0, record),
        }
    }

    fn remove(&mut self, key: &RecordKey) -> bool {
        let before = self.reservations.len();
        self.reservations.retain(|r| &r.key != key);
        self.reservations.len() != before
    }

    fn position(&self, key: &RecordKey) -> Option<usize> {
        self.reservations.iter().position(|r| &r.key == key)
    }

    pub fn reservations(&self) -> &[ReservationView] {
        &self.reservations
    }

    pub fn get(&self, key: &RecordKey) -> Option<&ReservationView> {
        self.reservations.iter().find(|r| &r.key == key)
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.position(key).is_some()
    }

    pub fn guests(&self) -> &[Guest] {
        &self.guests
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn guest(&self, id: GuestId) -> Option<&Guest> {
        self.guests.iter().find(|g| g.id == id)
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
