use chrono::{TimeZone, Utc};

pub fn now_epoch_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Log-friendly rendering of an epoch-seconds instant.
pub fn epoch_secs_to_iso(secs: i64) -> String {
    match Utc.timestamp_opt(secs, 0).single() {
        Some(dt) => dt.to_rfc3339(),
        None => format!("epoch:{secs}"),
    }
}
