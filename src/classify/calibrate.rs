use crate::constants::{CONFIDENCE_CEILING, CONFIDENCE_FLOOR, CONFIDENCE_NUDGE};
use crate::rules::Region;

/// Rule tags that count as a grounded legal signal.
pub const MEANINGFUL_RULES: &[&str] = &[
    "legal_cue",
    "utah",
    "florida",
    "california",
    "eu",
    "us_federal",
    "asl",
    "gh",
    "t5",
    "pf",
    "drt",
];

/// Adjusts raw model confidence by retrieval grounding.
///
/// `+0.05` when the jurisdiction filter applied, regions were inferred, and a meaningful
/// rule fired. `-0.05` when no filter applied. The result lies in `[0.2, 0.95]` rounded to
/// four decimals. Non-finite input counts as `0.0`.
pub fn calibrate<S: AsRef<str>>(
    raw: f64,
    rules_hit: &[S],
    regions: &[Region],
    filter_used: bool,
) -> f64 {
    let mut confidence = if raw.is_finite() {
        raw.clamp(0.0, 1.0)
    } else {
        0.0
    };

    if filter_used {
        let meaningful = rules_hit
            .iter()
            .any(|r| MEANINGFUL_RULES.contains(&r.as_ref().trim().to_lowercase().as_str()));
        if !regions.is_empty() && meaningful {
            confidence += CONFIDENCE_NUDGE;
        }
    } else {
        confidence -= CONFIDENCE_NUDGE;
    }

    let clamped = confidence.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING);
    (clamped * 10_000.0).round() / 10_000.0
}
