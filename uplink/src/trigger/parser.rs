//! Trigger-spec parsing.
//!
//! Grammar: comma-separated alternatives, each
//! `[selector@]event [delay:<duration>] [throttle:<duration>]`.
//! Durations accept `500ms`, `2s`, or a bare millisecond count.

use std::time::Duration;

/// One parsed trigger alternative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerEntry {
    /// Sub-selector the event's original target must match, if declared.
    pub selector: Option<String>,
    /// Event name; `None` matches any observed event.
    pub event: Option<String>,
    /// Debounce delay.
    pub delay: Duration,
    /// Throttle window.
    pub throttle: Duration,
}

/// Parses a trigger attribute value.
///
/// An absent or empty value yields one unconstrained entry, matching the
/// element's default trigger handling.
#[must_use]
pub fn parse_trigger(value: Option<&str>) -> Vec<TriggerEntry> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return vec![TriggerEntry::default()];
    };

    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_one)
        .collect()
}

fn parse_one(entry: &str) -> TriggerEntry {
    let mut tokens = entry.split_whitespace();
    let head = tokens.next().unwrap_or_default();

    let (selector, event) = match head.split_once('@') {
        Some((selector, event)) => (
            (!selector.is_empty()).then(|| selector.to_string()),
            (!event.is_empty()).then(|| event.to_string()),
        ),
        None => (None, Some(head.to_string())),
    };

    let mut parsed = TriggerEntry {
        selector,
        event,
        ..TriggerEntry::default()
    };

    for token in tokens {
        if let Some(raw) = token.strip_prefix("delay:") {
            parsed.delay = parse_duration(raw);
        } else if let Some(raw) = token.strip_prefix("throttle:") {
            parsed.throttle = parse_duration(raw);
        }
    }

    parsed
}

fn parse_duration(raw: &str) -> Duration {
    if let Some(ms) = raw.strip_suffix("ms") {
        return Duration::from_millis(ms.parse().unwrap_or(0));
    }
    if let Some(secs) = raw.strip_suffix('s') {
        return Duration::from_secs_f64(secs.parse().unwrap_or(0.0));
    }
    Duration::from_millis(raw.parse().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_value_is_unconstrained() {
        let entries = parse_trigger(None);
        assert_eq!(entries, vec![TriggerEntry::default()]);
        assert_eq!(parse_trigger(Some("  ")), vec![TriggerEntry::default()]);
    }

    #[test]
    fn test_plain_event() {
        let entries = parse_trigger(Some("click"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event.as_deref(), Some("click"));
        assert!(entries[0].selector.is_none());
    }

    #[test]
    fn test_selector_at_event() {
        let entries = parse_trigger(Some(".row@click"));
        assert_eq!(entries[0].selector.as_deref(), Some(".row"));
        assert_eq!(entries[0].event.as_deref(), Some("click"));
    }

    #[test]
    fn test_modifiers() {
        let entries = parse_trigger(Some("input delay:300ms"));
        assert_eq!(entries[0].event.as_deref(), Some("input"));
        assert_eq!(entries[0].delay, Duration::from_millis(300));

        let entries = parse_trigger(Some("scroll throttle:1s"));
        assert_eq!(entries[0].throttle, Duration::from_secs(1));

        let entries = parse_trigger(Some("input delay:250"));
        assert_eq!(entries[0].delay, Duration::from_millis(250));
    }

    #[test]
    fn test_comma_alternatives() {
        let entries = parse_trigger(Some("click, keyenter"));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event.as_deref(), Some("click"));
        assert_eq!(entries[1].event.as_deref(), Some("keyenter"));
    }
}
