//! Outbound payload bounding
//!
//! The analyzer has a token budget, so payloads are cut to a fixed number of
//! characters. The cut is a plain character slice and may land mid-record.

/// Default outbound character limit
pub const MAX_PAYLOAD_CHARS: usize = 500_000;

/// Appended after the retained prefix when a payload is cut
pub const TRUNCATION_NOTICE: &str =
    "\n\n[TRUNCATED: the log data exceeded the size limit. Only the first part of the logs is included in this analysis.]";

/// Payload ready to be sent to the analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    pub payload: String,
    pub was_truncated: bool,
}

/// Bound `raw` to the default limit
pub fn prepare(raw: &str) -> Prepared {
    prepare_with_limit(raw, MAX_PAYLOAD_CHARS)
}

/// Bound `raw` to `limit` characters, appending the truncation notice if cut
pub fn prepare_with_limit(raw: &str, limit: usize) -> Prepared {
    match raw.char_indices().nth(limit) {
        Some((cut, _)) => {
            log::warn!(
                "Payload exceeds {} characters, truncating before analysis",
                limit
            );
            let mut payload = String::with_capacity(cut + TRUNCATION_NOTICE.len());
            payload.push_str(&raw[..cut]);
            payload.push_str(TRUNCATION_NOTICE);
            Prepared {
                payload,
                was_truncated: true,
            }
        }
        None => Prepared {
            payload: raw.to_string(),
            was_truncated: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_limit_passes_through() {
        let raw = "a".repeat(MAX_PAYLOAD_CHARS);
        let prepared = prepare(&raw);

        assert!(!prepared.was_truncated);
        assert_eq!(prepared.payload, raw);
    }

    #[test]
    fn test_over_limit_is_cut_with_notice() {
        let raw = "b".repeat(MAX_PAYLOAD_CHARS + 1234);
        let prepared = prepare(&raw);

        assert!(prepared.was_truncated);
        assert!(prepared.payload.ends_with(TRUNCATION_NOTICE));
        let kept = &prepared.payload[..prepared.payload.len() - TRUNCATION_NOTICE.len()];
        assert_eq!(kept.chars().count(), MAX_PAYLOAD_CHARS);
        assert!(kept.chars().all(|c| c == 'b'));
    }

    #[test]
    fn test_limit_counts_characters_not_bytes() {
        let raw = "é".repeat(10);
        let prepared = prepare_with_limit(&raw, 4);

        assert!(prepared.was_truncated);
        assert_eq!(prepared.payload, format!("éééé{}", TRUNCATION_NOTICE));

        let untouched = prepare_with_limit(&raw, 10);
        assert!(!untouched.was_truncated);
        assert_eq!(untouched.payload, raw);
    }

    #[test]
    fn test_empty_input() {
        let prepared = prepare("");
        assert_eq!(prepared, Prepared { payload: String::new(), was_truncated: false });
    }
}
