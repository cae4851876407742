//! Headline counts and totals for the reservation list.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use lodge_core::Money;
use serde::Serialize;

use crate::status::ReservationStatus;
use crate::view::ReservationView;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReservationSummary {
    pub total: usize,
    pub by_status: BTreeMap<ReservationStatus, usize>,
    /// Non-cancelled reservations checking in on the reference day.
    pub arrivals: usize,
    /// Non-cancelled reservations checking out on the reference day.
    pub departures: usize,
    pub total_amount: Money,
    pub paid_amount: Money,
    /// Sum of per-reservation balances.
    pub outstanding: Money,
}

impl ReservationSummary {
    pub fn from_views(views: &[ReservationView], day: NaiveDate) -> Self {
        let mut summary = ReservationSummary {
            total: views.len(),
            ..Default::default()
        };
        for view in views {
            *summary.by_status.entry(view.status).or_default() += 1;
            summary.total_amount = summary.total_amount + view.total_amount;
            summary.paid_amount = summary.paid_amount + view.paid_amount;
            summary.outstanding = summary.outstanding + view.balance();

            let active =
                !matches!(view.status, ReservationStatus::Cancelled | ReservationStatus::NoShow);
            if active && view.check_in == Some(day) {
                summary.arrivals += 1;
            }
            if active && view.check_out == Some(day) {
                summary.departures += 1;
            }
        }
        summary
    }

    pub fn count(&self, status: ReservationStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_one;
    use crate::wire::RawReservation;
    use serde_json::json;

    #[test]
    fn summarizes_counts_and_money() {
        let views: Vec<ReservationView> = [
            json!({"reservation_id": 1, "status": "confirmed",
                   "check_in": "2025-09-01", "check_out": "2025-09-03",
                   "total_amount": 300, "paid_amount": 100}),
            json!({"reservation_id": 2, "status": "checked_in",
                   "check_in": "2025-08-30", "check_out": "2025-09-01",
                   "total_amount": "150.50", "paid_amount": "150.50"}),
            json!({"reservation_id": 3, "status": "cancelled",
                   "check_in": "2025-09-01", "check_out": "2025-09-02",
                   "total_amount": 80}),
        ]
        .iter()
        .map(|v| normalize_one(&RawReservation::from_value(v)))
        .collect();

        let day = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let summary = ReservationSummary::from_views(&views, day);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(ReservationStatus::Confirmed), 1);
        assert_eq!(summary.count(ReservationStatus::Pending), 0);
        assert_eq!(summary.arrivals, 1);
        assert_eq!(summary.departures, 1);
        assert_eq!(summary.total_amount, Money::from_minor(53_050));
        assert_eq!(summary.paid_amount, Money::from_minor(25_050));
        assert_eq!(summary.outstanding, summary.total_amount - summary.paid_amount);
    }
}
