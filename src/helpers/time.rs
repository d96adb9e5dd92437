use chrono::{DateTime, Duration, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Lifetime recorded for a freshly issued token: the issuer's real lifetime
/// shortened by the safety margin. Saturates at `Duration::MAX`.
pub fn cached_lifetime(token_lifetime_minutes: u64, safety_margin_minutes: u64) -> Duration {
    let minutes = token_lifetime_minutes.saturating_sub(safety_margin_minutes);
    i64::try_from(minutes)
        .ok()
        .and_then(Duration::try_minutes)
        .unwrap_or(Duration::MAX)
}

/// Whole minutes left until `expires_at`, never negative.
pub fn minutes_until(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    if expires_at <= now {
        return 0;
    }
    (expires_at - now).num_minutes()
}
