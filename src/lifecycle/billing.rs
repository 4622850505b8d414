//! Hourly billing

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{AppError, AppResult};
use crate::models::equipment::validate_amount;

const MILLIS_PER_HOUR: i64 = 3_600_000;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Fractional hours between two instants (negative when `end` precedes `start`)
pub fn elapsed_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    let millis = (end - start).num_milliseconds();
    Decimal::from(millis) / Decimal::from(MILLIS_PER_HOUR)
}

/// Charge for the time between `start` and `end`: `(daily_rate / 24) * hours`
///
/// Negative spans bill nothing. The result is rounded to cents, half away
/// from zero, which is the scale of the stored column.
pub fn charge(daily_rate: Decimal, start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    let millis = (end - start).num_milliseconds().max(0);
    (daily_rate * Decimal::from(millis) / Decimal::from(MILLIS_PER_DAY))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Keep an explicit charge; otherwise compute one once the rental has an end
pub fn settle(
    total: Option<Decimal>,
    daily_rate: Decimal,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Option<Decimal> {
    match (total, end) {
        (Some(total), _) => Some(total),
        (None, Some(end)) => Some(charge(daily_rate, start, end)),
        (None, None) => None,
    }
}

/// Reject a charge the `valor_total` column cannot store
pub fn check_total(total: Option<Decimal>) -> AppResult<Option<Decimal>> {
    match total {
        Some(amount) => match validate_amount(&amount) {
            Ok(()) => Ok(Some(amount)),
            Err(e) => Err(AppError::Validation(format!(
                "valor_total {} {}",
                amount,
                e.message.as_deref().unwrap_or("is invalid")
            ))),
        },
        None => Ok(None),
    }
}

/// Reject a time window whose end precedes its start
pub fn check_window(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> AppResult<()> {
    match end {
        Some(end) if end < start => Err(AppError::Validation(format!(
            "data_fim ({}) must not be before data_inicio ({})",
            end.to_rfc3339(),
            start.to_rfc3339()
        ))),
        _ => Ok(()),
    }
}
