use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use uuid::Uuid;

/// Generates a new `urn:uuid:` identifier (random v4).
pub fn fresh_urn() -> String {
    Uuid::new_v4().urn().to_string()
}

/// Current UTC time truncated to whole seconds.
pub fn utc_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// RFC 3339 with a `Z` suffix; fractional seconds only when present.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
