//! Temporal pattern extraction.
//!
//! Patterns are tried in list order and the first one that matches wins,
//! regardless of where in the text the match occurs. A converter that cannot
//! produce a value (e.g. an overflowing count) falls through to the next
//! pattern.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

type Converter = fn(&Captures<'_>) -> Option<u32>;

/// A temporal phrase paired with its conversion to days
pub struct DurationPattern {
    pub name: &'static str,
    regex: Regex,
    convert: Converter,
}

impl DurationPattern {
    fn new(name: &'static str, pattern: &str, convert: Converter) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("Valid duration regex"),
            convert,
        }
    }

    fn apply(&self, text: &str) -> Option<u32> {
        self.regex.captures(text).and_then(|caps| (self.convert)(&caps))
    }
}

fn count(caps: &Captures<'_>) -> Option<u32> {
    caps.get(1)?.as_str().parse::<u32>().ok()
}

static PATTERNS: Lazy<Vec<DurationPattern>> = Lazy::new(|| {
    vec![
        DurationPattern::new("days", r"\b(\d+)\s*days?\b", count),
        DurationPattern::new("weeks", r"\b(\d+)\s*weeks?\b", |c| {
            count(c)?.checked_mul(7)
        }),
        DurationPattern::new("months", r"\b(\d+)\s*months?\b", |c| {
            count(c)?.checked_mul(30)
        }),
        DurationPattern::new("hours", r"\b(\d+)\s*(?:hours?|hrs?)\b", |c| {
            count(c).map(|h| h.div_ceil(24).max(1))
        }),
        DurationPattern::new("yesterday", r"\byesterday\b", |_| Some(1)),
        DurationPattern::new("today", r"\btoday\b", |_| Some(1)),
        DurationPattern::new("couple of days", r"\bcouple\s+(?:of\s+)?days\b", |_| Some(2)),
        DurationPattern::new("few days", r"\bfew\s+days\b", |_| Some(3)),
        DurationPattern::new("several days", r"\bseveral\s+days\b", |_| Some(5)),
        DurationPattern::new("last week", r"\blast\s+week\b", |_| Some(7)),
        DurationPattern::new("this week", r"\bthis\s+week\b", |_| Some(3)),
        DurationPattern::new("a week", r"\b(?:a|one)\s+week\b", |_| Some(7)),
        DurationPattern::new("two weeks", r"\btwo\s+weeks\b", |_| Some(14)),
        DurationPattern::new("three weeks", r"\bthree\s+weeks\b", |_| Some(21)),
        DurationPattern::new("last month", r"\blast\s+month\b", |_| Some(30)),
        DurationPattern::new("a month", r"\b(?:a|one)\s+month\b", |_| Some(30)),
    ]
});

/// Ordered temporal patterns
pub fn patterns() -> &'static [DurationPattern] {
    &PATTERNS
}

/// Extract a duration in days from case-folded text, if any pattern matches
pub fn extract_days(folded_text: &str) -> Option<(u32, &'static str)> {
    patterns()
        .iter()
        .find_map(|pattern| pattern.apply(folded_text).map(|days| (days, pattern.name)))
}
