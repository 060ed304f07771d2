use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// `now + days`. Negative values land in the past; out-of-range values
/// saturate at chrono's representable bounds.
pub fn calculate_expiry_date(days: i64) -> DateTime<Utc> {
    calculate_expiry_date_at(Utc::now(), days)
}

pub fn calculate_expiry_date_at(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(days)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(if days < 0 { DateTime::<Utc>::MIN_UTC } else { DateTime::<Utc>::MAX_UTC })
}

/// Local view only; the contract enforces expiry on its own clock.
pub fn is_gift_expired(expires_at: DateTime<Utc>) -> bool {
    is_gift_expired_at(Utc::now(), expires_at)
}

pub fn is_gift_expired_at(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> bool {
    now > expires_at
}

pub fn format_time_remaining(expires_at: DateTime<Utc>) -> String {
    format_time_remaining_at(Utc::now(), expires_at)
}

/// Coarsest non-zero unit only: "2 days remaining", never "2 days 3 hours".
pub fn format_time_remaining_at(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> String {
    let remaining = expires_at.signed_duration_since(now);
    if remaining <= TimeDelta::zero() {
        return "Expired".to_string();
    }

    let units = [
        (remaining.num_days(), "day"),
        (remaining.num_hours(), "hour"),
        (remaining.num_minutes(), "minute"),
    ];
    match units.into_iter().find(|(n, _)| *n > 0) {
        Some((1, unit)) => format!("1 {} remaining", unit),
        Some((n, unit)) => format!("{} {}s remaining", n, unit),
        None => "Less than a minute remaining".to_string(),
    }
}

/// Creation instant plus lifetime, as tracked off-chain for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftLifecycleTimestamps {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl GiftLifecycleTimestamps {
    pub fn new(created_at: DateTime<Utc>, expiry_days: i64) -> Self {
        Self {
            created_at,
            expires_at: calculate_expiry_date_at(created_at, expiry_days),
        }
    }

    pub fn starting_now(expiry_days: i64) -> Self {
        Self::new(Utc::now(), expiry_days)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        is_gift_expired_at(now, self.expires_at)
    }

    pub fn time_remaining_at(&self, now: DateTime<Utc>) -> String {
        format_time_remaining_at(now, self.expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn expiry_against_wall_clock() {
        assert!(is_gift_expired(calculate_expiry_date(-1)));
        assert!(!is_gift_expired(calculate_expiry_date(30)));
    }

    #[test]
    fn expiry_date_arithmetic() {
        let now = noon();
        assert_eq!(
            calculate_expiry_date_at(now, 30),
            Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(calculate_expiry_date_at(now, 0), now);
        assert_eq!(calculate_expiry_date_at(now, i64::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(calculate_expiry_date_at(now, i64::MIN), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn expired_is_strictly_after() {
        let now = noon();
        assert!(!is_gift_expired_at(now, now));
        assert!(is_gift_expired_at(now + TimeDelta::seconds(1), now));
    }

    #[test]
    fn remaining_picks_coarsest_unit() {
        let now = noon();
        let at = |minutes: i64| format_time_remaining_at(now, now + TimeDelta::minutes(minutes));
        assert_eq!(at(90), "1 hour remaining");
        assert_eq!(at(60 * 24 + 180), "1 day remaining");
        assert_eq!(at(60 * 24 * 3), "3 days remaining");
        assert_eq!(at(60 * 5 + 59), "5 hours remaining");
        assert_eq!(at(1), "1 minute remaining");
        assert_eq!(at(59), "59 minutes remaining");
        assert_eq!(
            format_time_remaining_at(now, now + TimeDelta::seconds(30)),
            "Less than a minute remaining"
        );
    }

    #[test]
    fn remaining_in_the_past_is_expired() {
        let now = noon();
        assert_eq!(format_time_remaining_at(now, now - TimeDelta::hours(2)), "Expired");
        assert_eq!(format_time_remaining_at(now, now), "Expired");
        assert_eq!(format_time_remaining(calculate_expiry_date(-1)), "Expired");
    }

    #[test]
    fn lifecycle_tracks_expiry() {
        let created = noon();
        let gift = GiftLifecycleTimestamps::new(created, 7);
        assert!(!gift.is_expired_at(created + TimeDelta::days(6)));
        assert!(gift.is_expired_at(created + TimeDelta::days(8)));
        assert_eq!(gift.time_remaining_at(created + TimeDelta::days(6)), "1 day remaining");
        assert!(!GiftLifecycleTimestamps::starting_now(1).is_expired_at(Utc::now()));
    }
}
