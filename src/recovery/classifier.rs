use std::fmt;

use super::types::{ErrorCategory, ErrorRecord, ErrorSeverity};

/// Turns an arbitrary failure into an `ErrorRecord`.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, error: &dyn fmt::Display) -> ErrorRecord;
}

/// Keyword and HTTP status based classifier.
///
/// Only matches unambiguous patterns; anything else becomes `System`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageClassifier;

impl MessageClassifier {
    pub fn classify_message(&self, msg: &str) -> ErrorRecord {
        let lower = msg.to_lowercase();
        let status = extract_status_code(msg);
        let has = |patterns: &[&str]| patterns.iter().any(|p| lower.contains(p));

        let (category, severity) = if status == Some(429)
            || has(&["too many requests", "rate limit", "rate-limit"])
        {
            (ErrorCategory::RateLimit, ErrorSeverity::Medium)
        } else if matches!(status, Some(401) | Some(403))
            || has(&["unauthorized", "forbidden", "token expired", "invalid token"])
        {
            (ErrorCategory::Authentication, ErrorSeverity::High)
        } else if status == Some(503) || has(&["service unavailable", "maintenance"]) {
            (ErrorCategory::ServiceUnavailable, ErrorSeverity::Medium)
        } else if matches!(status, Some(408) | Some(504))
            || has(&["timed out", "timeout", "deadline exceeded"])
        {
            (ErrorCategory::Timeout, ErrorSeverity::Medium)
        } else if status.is_some_and(|s| (500..600).contains(&s)) {
            (ErrorCategory::Server, ErrorSeverity::High)
        } else if has(&[
            "connection refused",
            "connection reset",
            "econnrefused",
            "econnreset",
            "network",
            "dns",
            "unreachable",
            "offline",
        ]) {
            (ErrorCategory::Network, ErrorSeverity::Medium)
        } else if matches!(status, Some(400) | Some(422)) || has(&["invalid", "validation"]) {
            (ErrorCategory::Validation, ErrorSeverity::Low)
        } else {
            (ErrorCategory::System, ErrorSeverity::High)
        };

        let mut record = ErrorRecord::new(category, msg).with_severity(severity);
        if let Some(code) = status {
            record = record.with_status_code(code);
        }
        if category == ErrorCategory::RateLimit {
            if let Some(ms) = extract_retry_after_ms(&lower) {
                record = record.with_retry_after_ms(ms);
            }
        }
        record
    }
}

impl ErrorClassifier for MessageClassifier {
    fn classify(&self, error: &dyn fmt::Display) -> ErrorRecord {
        self.classify_message(&error.to_string())
    }
}

/// First standalone three-digit number in the 4xx/5xx range.
fn extract_status_code(msg: &str) -> Option<u16> {
    msg.split(|c: char| !c.is_ascii_digit())
        .filter(|token| token.len() == 3)
        .filter_map(|token| token.parse::<u16>().ok())
        .find(|code| (400..600).contains(code))
}

/// Parses `retry after N`, `retry-after: N` (seconds) or `retry_after_ms=N` from a lowercased message.
fn extract_retry_after_ms(lower: &str) -> Option<u64> {
    let leading_number = |rest: &str| -> Option<u64> {
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    };

    if let Some(idx) = lower.find("retry_after_ms=") {
        return leading_number(&lower[idx + "retry_after_ms=".len()..]);
    }
    for pattern in ["retry after ", "retry-after: ", "retry-after ", "retry_after="] {
        if let Some(idx) = lower.find(pattern) {
            if let Some(secs) = leading_number(&lower[idx + pattern.len()..]) {
                return Some(secs.saturating_mul(1000));
            }
        }
    }
    None
}
