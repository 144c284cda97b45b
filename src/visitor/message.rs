//! Notification text.

use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::{json, Value};

use super::classifier::Classification;

/// `Jan 2 15:04:05 CET`
const TIMESTAMP_FORMAT: &str = "%b %-d %H:%M:%S %Z";

/// Everything that goes into a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report<'a> {
    pub classification: Classification,
    pub addr: IpAddr,
    pub location: &'a str,
    pub duration: Duration,
    pub started_at: DateTime<Utc>,
    pub timezone: Option<&'a str>,
    /// How long a scanner stays muted
    pub scanner_cooldown: Duration,
}

pub fn format_message(report: &Report<'_>) -> String {
    let connected = format_duration(report.duration);
    let time = format_timestamp(report.started_at, report.timezone);

    match report.classification {
        Classification::Scanner => format!(
            "🤖 **Scanner detected**\n**IP:** {}\n**Location:** {}\n**Connected:** {}\n**Time:** {}\n_Muted for {}_",
            report.addr,
            report.location,
            connected,
            time,
            format_window(report.scanner_cooldown),
        ),
        Classification::HumanVisitor => format!(
            "🖥️ **SSH Portfolio visitor!**\n**IP:** {}\n**Location:** {}\n**Connected:** {}\n**Time:** {}",
            report.addr, report.location, connected, time,
        ),
    }
}

/// Webhook body
pub fn payload(message: &str) -> Value {
    json!({ "content": message })
}

/// `12.3s` under a minute, `4m 5s` otherwise
pub fn format_duration(duration: Duration) -> String {
    if duration < Duration::from_secs(60) {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Format `at` in the given IANA zone, or as UTC if the zone is missing or
/// unknown.
pub fn format_timestamp(at: DateTime<Utc>, timezone: Option<&str>) -> String {
    match timezone.and_then(|tz| tz.parse::<Tz>().ok()) {
        Some(tz) => at.with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string(),
        None => at.format(TIMESTAMP_FORMAT).to_string(),
    }
}

/// Coarse human-readable window: `1 hour`, `30 minutes`, `45 seconds`
fn format_window(window: Duration) -> String {
    let secs = window.as_secs();
    let (n, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}
