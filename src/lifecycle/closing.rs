//! Closing rentals, explicitly or once their end date has passed

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::billing;
use crate::error::AppResult;
use crate::models::{Rental, RentalStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Staff closed the rental
    Manual,
    /// Staff closed it because the end date was reached
    Flagged,
    /// The expiry sweep closed it
    Expired,
}

impl CloseReason {
    fn appends_note(self) -> bool {
        !matches!(self, CloseReason::Manual)
    }
}

/// The values written to a rental when it is closed
#[derive(Debug, Clone, PartialEq)]
pub struct ClosePlan {
    pub status: RentalStatus,
    pub end_date: DateTime<Utc>,
    pub total: Option<Decimal>,
    pub notes: Option<String>,
}

/// Marker appended to the notes of a rental closed at its end date
pub fn auto_close_note(now: DateTime<Utc>) -> String {
    format!(
        "[Auto-closed on {} UTC - end date reached]",
        now.format("%Y-%m-%d %H:%M")
    )
}

fn append_note(notes: Option<&str>, note: &str) -> String {
    match notes {
        Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, note),
        _ => note.to_string(),
    }
}

/// Plan closing `rental`
///
/// The end date is the requested one, else the stored one, else `now`. An
/// explicit charge is kept; otherwise it is computed from `daily_rate`.
pub fn plan_close(
    rental: &Rental,
    daily_rate: Decimal,
    requested_end: Option<DateTime<Utc>>,
    reason: CloseReason,
    now: DateTime<Utc>,
) -> AppResult<ClosePlan> {
    let end_date = requested_end.or(rental.end_date).unwrap_or(now);
    billing::check_window(rental.start_date, Some(end_date))?;

    let notes = if reason.appends_note() {
        Some(append_note(rental.notes.as_deref(), &auto_close_note(now)))
    } else {
        rental.notes.clone()
    };

    let total = billing::settle(rental.total, daily_rate, rental.start_date, Some(end_date));
    Ok(ClosePlan {
        status: RentalStatus::Closed,
        end_date,
        total: billing::check_total(total)?,
        notes,
    })
}

/// An active rental whose end date is strictly in the past
pub fn is_expired(rental: &Rental, now: DateTime<Utc>) -> bool {
    rental.status.is_active() && rental.end_date.map_or(false, |end| end < now)
}

/// Plan the sweep close of an expired rental, keeping its stored end date
///
/// Returns `None` for rentals that are not expired, and an error when the
/// computed charge cannot be stored.
pub fn plan_expiry(
    rental: &Rental,
    daily_rate: Decimal,
    now: DateTime<Utc>,
) -> AppResult<Option<ClosePlan>> {
    let Some(end_date) = rental.end_date.filter(|_| is_expired(rental, now)) else {
        return Ok(None);
    };
    let total = billing::settle(rental.total, daily_rate, rental.start_date, Some(end_date));
    Ok(Some(ClosePlan {
        status: RentalStatus::Closed,
        end_date,
        total: billing::check_total(total)?,
        notes: Some(append_note(rental.notes.as_deref(), &auto_close_note(now))),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use chrono::{Duration, TimeZone};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn rental(start: DateTime<Utc>, end: Option<DateTime<Utc>>, status: RentalStatus) -> Rental {
        Rental {
            id: 1,
            client_id: 1,
            equipment_id: 1,
            start_date: start,
            end_date: end,
            total: None,
            status,
            notes: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn test_close_without_end_uses_now() {
        let start = at(2024, 1, 1, 0);
        let now = at(2024, 1, 1, 12);
        let plan = plan_close(
            &rental(start, None, RentalStatus::Open),
            dec("48.00"),
            None,
            CloseReason::Manual,
            now,
        )
        .unwrap();
        assert_eq!(plan.status, RentalStatus::Closed);
        assert_eq!(plan.end_date, now);
        assert_eq!(plan.total, Some(dec("24.00")));
        assert!(plan.notes.is_none());
    }

    #[test]
    fn test_close_prefers_requested_then_stored_end() {
        let start = at(2024, 1, 1, 0);
        let stored = at(2024, 1, 2, 0);
        let requested = at(2024, 1, 3, 0);
        let r = rental(start, Some(stored), RentalStatus::Open);
        let now = at(2024, 1, 10, 0);

        let plan = plan_close(&r, dec("10"), Some(requested), CloseReason::Manual, now).unwrap();
        assert_eq!(plan.end_date, requested);
        assert_eq!(plan.total, Some(dec("20.00")));

        let plan = plan_close(&r, dec("10"), None, CloseReason::Manual, now).unwrap();
        assert_eq!(plan.end_date, stored);
        assert_eq!(plan.total, Some(dec("10.00")));
    }

    #[test]
    fn test_close_keeps_explicit_charge() {
        let start = at(2024, 1, 1, 0);
        let mut r = rental(start, None, RentalStatus::Open);
        r.total = Some(Decimal::ZERO);
        let plan = plan_close(&r, dec("99"), None, CloseReason::Manual, at(2024, 1, 5, 0)).unwrap();
        assert_eq!(plan.total, Some(Decimal::ZERO));
    }

    #[test]
    fn test_close_rejects_end_before_start() {
        let start = at(2024, 1, 2, 0);
        let result = plan_close(
            &rental(start, None, RentalStatus::Open),
            dec("10"),
            Some(at(2024, 1, 1, 0)),
            CloseReason::Manual,
            at(2024, 1, 3, 0),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_flagged_close_appends_note() {
        let start = at(2024, 1, 1, 0);
        let mut r = rental(start, Some(at(2024, 1, 2, 0)), RentalStatus::Open);
        r.notes = Some("Entregue na obra".into());
        let plan = plan_close(&r, dec("10"), None, CloseReason::Flagged, at(2024, 1, 3, 8)).unwrap();
        assert_eq!(
            plan.notes.as_deref(),
            Some("Entregue na obra\n[Auto-closed on 2024-01-03 08:00 UTC - end date reached]")
        );
    }

    #[test]
    fn test_note_not_prefixed_when_notes_empty() {
        let start = at(2024, 1, 1, 0);
        let mut r = rental(start, Some(at(2024, 1, 2, 0)), RentalStatus::Open);
        r.notes = Some(String::new());
        let plan = plan_close(&r, dec("10"), None, CloseReason::Flagged, at(2024, 1, 3, 8)).unwrap();
        let notes = plan.notes.unwrap();
        assert!(notes.starts_with("[Auto-closed on 2024-01-03"));
    }

    #[test]
    fn test_is_expired() {
        let now = at(2024, 3, 1, 0);
        let past = Some(at(2024, 2, 28, 0));
        let start = at(2024, 2, 1, 0);
        assert!(is_expired(&rental(start, past, RentalStatus::Open), now));
        assert!(is_expired(&rental(start, past, RentalStatus::InProgress), now));
        assert!(!is_expired(&rental(start, past, RentalStatus::Closed), now));
        assert!(!is_expired(&rental(start, past, RentalStatus::Cancelled), now));
        assert!(!is_expired(&rental(start, None, RentalStatus::Open), now));
        assert!(!is_expired(&rental(start, Some(now), RentalStatus::Open), now));
        assert!(!is_expired(
            &rental(start, Some(now + Duration::hours(1)), RentalStatus::Open),
            now
        ));
    }

    #[test]
    fn test_expiry_plan() {
        let now = at(2024, 3, 1, 0);
        let start = at(2024, 2, 27, 0);
        let end = at(2024, 2, 28, 0);
        let plan = plan_expiry(&rental(start, Some(end), RentalStatus::Open), dec("240.00"), now)
            .unwrap()
            .unwrap();
        assert_eq!(plan.status, RentalStatus::Closed);
        assert_eq!(plan.end_date, end);
        assert_eq!(plan.total, Some(dec("240.00")));
        assert!(plan.notes.unwrap().contains("2024-03-01"));
    }

    #[test]
    fn test_expiry_skips_live_rentals() {
        let now = at(2024, 3, 1, 0);
        let start = at(2024, 2, 27, 0);
        assert!(plan_expiry(&rental(start, None, RentalStatus::Open), dec("1"), now)
            .unwrap()
            .is_none());
        assert!(plan_expiry(
            &rental(start, Some(at(2024, 2, 28, 0)), RentalStatus::Closed),
            dec("1"),
            now
        )
        .unwrap()
        .is_none());
    }

    #[test]
    fn test_unstorable_charge_is_refused() {
        let start = at(2024, 1, 1, 0);
        let end = at(2024, 1, 12, 0);
        let r = rental(start, Some(end), RentalStatus::Open);
        let rate = dec("10000000.00");

        let result = plan_close(&r, rate, None, CloseReason::Manual, at(2024, 1, 13, 0));
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = plan_expiry(&r, rate, at(2024, 1, 13, 0));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
