//! Filter engine: the visible subset of the canonical collection.

use std::sync::Arc;

use chrono::NaiveDate;
use lodge_core::DomainError;
use serde::{Deserialize, Serialize};

use crate::status::ReservationStatus;
use crate::view::ReservationView;

/// Status dropdown value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ReservationStatus),
    /// A value that names no known status; matches nothing.
    Unrecognized(String),
}

impl StatusFilter {
    /// `""` and `"all"` (any case) mean everything.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return StatusFilter::All;
        }
        match ReservationStatus::parse(trimmed) {
            Some(status) => StatusFilter::Only(status),
            None => StatusFilter::Unrecognized(trimmed.to_string()),
        }
    }

    pub fn matches(&self, status: ReservationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
            StatusFilter::Unrecognized(_) => false,
        }
    }
}

/// Order of the visible set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// The order of the canonical collection.
    #[default]
    Canonical,
    /// See [`sort_by_urgency`].
    Urgency,
}

impl std::str::FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "canonical" => Ok(SortOrder::Canonical),
            "urgency" => Ok(SortOrder::Urgency),
            other => Err(DomainError::validation(format!("unknown sort order {other:?}"))),
        }
    }
}

/// The three filter inputs plus the order of the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search_term: String,
    pub status: StatusFilter,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub order: SortOrder,
}

impl FilterCriteria {
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// No predicate narrows the collection. The order does not count.
    pub fn is_empty(&self) -> bool {
        self.search_term.trim().is_empty()
            && self.status == StatusFilter::All
            && self.date.is_none()
    }

    pub fn matches(&self, view: &ReservationView) -> bool {
        let needle = self.search_term.trim().to_lowercase();
        self.matches_with_needle(view, &needle)
    }

    fn matches_with_needle(&self, view: &ReservationView, needle: &str) -> bool {
        if !needle.is_empty() && !view.search_haystack().contains(needle) {
            return false;
        }
        if !self.status.matches(view.status) {
            return false;
        }
        match self.date {
            Some(date) => view.covers(date),
            None => true,
        }
    }
}

/// All predicates ANDed. Canonical order is kept unless the criteria ask
/// for [`SortOrder::Urgency`].
pub fn filter_reservations(
    collection: &[ReservationView],
    criteria: &FilterCriteria,
) -> Vec<ReservationView> {
    let needle = criteria.search_term.trim().to_lowercase();
    let mut visible: Vec<ReservationView> = collection
        .iter()
        .filter(|view| criteria.matches_with_needle(view, &needle))
        .cloned()
        .collect();
    if criteria.order == SortOrder::Urgency {
        sort_by_urgency(&mut visible);
    }
    visible
}

/// Order by status urgency (registry priority), then check-in date, then
/// canonical position. Records without a check-in sort last within a status.
pub fn sort_by_urgency(views: &mut [ReservationView]) {
    views.sort_by(|a, b| {
        a.status
            .sort_priority()
            .cmp(&b.status.sort_priority())
            .then_with(|| match (a.check_in, b.check_in) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => core::cmp::Ordering::Less,
                (None, Some(_)) => core::cmp::Ordering::Greater,
                (None, None) => core::cmp::Ordering::Equal,
            })
    });
}

/// Memoized filter over a revisioned collection.
///
/// The owner bumps the collection revision on every mutation; the memo only
/// recomputes when the revision or the criteria change.
#[derive(Debug, Default)]
pub struct FilterMemo {
    key: Option<(u64, FilterCriteria)>,
    cached: Arc<[ReservationView]>,
    recomputations: u64,
}

impl FilterMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &mut self,
        revision: u64,
        collection: &[ReservationView],
        criteria: &FilterCriteria,
    ) -> Arc<[ReservationView]> {
        let fresh =
            matches!(&self.key, Some((rev, crit)) if *rev == revision && crit == criteria);
        if !fresh {
            self.cached = filter_reservations(collection, criteria).into();
            self.key = Some((revision, criteria.clone()));
            self.recomputations += 1;
        }
        Arc::clone(&self.cached)
    }

    /// How many times the filter actually ran.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}
