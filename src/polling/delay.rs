//! Adaptive poll delay.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

/// `[d.]hh:mm:ss[.fffffff]`
const ETA_PATTERN: &str = r"^(?:(\d+)\.)?(\d{1,2}):(\d{2}):(\d{2})(?:\.\d+)?$";

fn eta_regex() -> Option<&'static Regex> {
    static ETA: OnceLock<Option<Regex>> = OnceLock::new();
    ETA.get_or_init(|| Regex::new(ETA_PATTERN).ok()).as_ref()
}

/// Parse a remaining-time estimate into hours, minutes and seconds.
///
/// A leading day group is accepted but not counted. Fractional seconds are
/// dropped.
pub fn parse_eta(raw: &str) -> Option<Duration> {
    let captures = eta_regex()?.captures(raw.trim())?;
    let field = |i: usize| -> Option<u64> { captures.get(i)?.as_str().parse().ok() };

    let seconds = field(2)? * 3_600 + field(3)? * 60 + field(4)?;
    Some(Duration::from_secs(seconds))
}

/// `2^(log10(entries) - 1)` seconds, unclamped. Zero entries count as one.
pub fn entry_count_delay(entries: u64) -> f64 {
    let entries = entries.max(1) as f64;
    2f64.powf(entries.log10() - 1.0)
}

/// Clamp a delay in seconds into `[min, max]`.
pub fn clamp_secs(seconds: f64, min: Duration, max: Duration) -> Duration {
    let clamped = seconds.clamp(min.as_secs_f64(), max.as_secs_f64());
    Duration::from_secs_f64(clamped)
}
