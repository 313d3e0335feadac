//! Intensity bucket scoring.

use crate::types::Intensity;
use once_cell::sync::Lazy;
use regex::Regex;

struct Bucket {
    intensity: Intensity,
    keywords: Vec<Regex>,
}

static BUCKETS: Lazy<Vec<Bucket>> = Lazy::new(|| {
    let bucket = |intensity: Intensity, words: &[&str]| Bucket {
        intensity,
        keywords: words
            .iter()
            .map(|w| {
                Regex::new(&format!(r"\b{}\b", regex::escape(w))).expect("Valid intensity regex")
            })
            .collect(),
    };

    vec![
        bucket(
            Intensity::Mild,
            &[
                "mild", "slight", "slightly", "minor", "light", "gentle", "low", "barely",
                "little bit", "somewhat", "not too bad",
            ],
        ),
        bucket(
            Intensity::Moderate,
            &[
                "moderate", "medium", "average", "normal", "typical", "noticeable",
                "considerable", "fair", "decent",
            ],
        ),
        bucket(
            Intensity::Severe,
            &[
                "severe", "intense", "extreme", "extremely", "terrible", "awful", "excruciating",
                "unbearable", "very", "really bad", "horrible",
            ],
        ),
    ]
});

/// Per-bucket keyword hit counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntensityScores {
    pub mild: usize,
    pub moderate: usize,
    pub severe: usize,
}

impl IntensityScores {
    /// Bucket with strictly the most hits; all-zero or a tie at the top
    /// resolves to the default bucket.
    pub fn winner(&self) -> Intensity {
        let ranked = [
            (Intensity::Mild, self.mild),
            (Intensity::Moderate, self.moderate),
            (Intensity::Severe, self.severe),
        ];
        let best = ranked.iter().map(|(_, hits)| *hits).max().unwrap_or(0);
        if best == 0 {
            return Intensity::default();
        }

        let mut leaders = ranked.iter().filter(|(_, hits)| *hits == best);
        match (leaders.next(), leaders.next()) {
            (Some((intensity, _)), None) => *intensity,
            _ => Intensity::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mild == 0 && self.moderate == 0 && self.severe == 0
    }
}

/// Count keyword hits per intensity bucket in case-folded text
pub fn score(folded_text: &str) -> IntensityScores {
    let mut scores = IntensityScores::default();
    for bucket in BUCKETS.iter() {
        let hits = bucket
            .keywords
            .iter()
            .filter(|keyword| keyword.is_match(folded_text))
            .count();
        match bucket.intensity {
            Intensity::Mild => scores.mild = hits,
            Intensity::Moderate => scores.moderate = hits,
            Intensity::Severe => scores.severe = hits,
        }
    }
    scores
}
