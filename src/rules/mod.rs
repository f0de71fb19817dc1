//! Rule-hit tagging and jurisdiction inference for feature text.
//!
//! The rule table is data: an ordered list of `(pattern, tag, promotion)` rows compiled once
//! on first use. Every matching row contributes its tag, and rows tied to a jurisdiction also
//! contribute the generic [`LEGAL_CUE`] tag. Regions are derived from the hit set alone.

mod region;


pub use region::{Region, RegionParseError};

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Tag added alongside any jurisdiction/law keyword hit.
pub const LEGAL_CUE: &str = "legal_cue";

/// Tag for Utah cues.
pub const TAG_UTAH: &str = "utah";
/// Tag for Florida cues.
pub const TAG_FLORIDA: &str = "florida";
/// Tag for California cues.
pub const TAG_CALIFORNIA: &str = "california";
/// Tag for EU/EEA cues.
pub const TAG_EU: &str = "eu";
/// Tag for US federal cues.
pub const TAG_US_FEDERAL: &str = "us_federal";

/// Ordered rule table: `(case-insensitive pattern, tag, promotion tag)`.
const RULE_TABLE: &[(&str, &str, Option<&str>)] = &[
    (
        r"\bASL\b|age[- ]?sensitive|age[- ]?verification|age[- ]?gate|age\s*check|parental\s+consent|curfew|night\s*hours|after\s*10:?30\s*(?:pm|p\.m\.)?|before\s*6:?30\s*(?:am|a\.m\.)?|under\s*1[38]|minor[s]?",
        "asl",
        None,
    ),
    (
        r"\bGH\b|geo[- ]?handler|geo[- ]?route|geo[- ]?fenc\w*|geofenc\w*|region[- ]specific|EEA|EU/EEA|\bEU\b|European Union",
        "gh",
        None,
    ),
    (r"\bNSP\b|non[- ]shareable policy", "nsp", None),
    (r"\bLCP\b|local compliance policy", "lcp", None),
    (r"\bEchoTrace\b", "echotrace", None),
    (r"\bRedline\b", "redline", None),
    (r"\bCDS\b|compliance detection system", "cds", None),
    (r"\bDRT\b|data retention", "drt", None),
    (r"\bSpanner\b", "spanner", None),
    (r"\bSnowcap\b", "snowcap", None),
    (r"\bJellybean\b", "jellybean", None),
    (r"\bIMT\b|internal monitoring trigger", "imt", None),
    (r"\bFR\b|feature rollout", "fr", None),
    (
        r"\bT5\b|high[- ]?risk|sensitive\s+reports|child\s+abuse|NCMEC",
        "t5",
        None,
    ),
    (r"\bPF\b|personalized feed|addictive feed", "pf", None),
    (r"\bNR\b|not\s+recommended", "nr", None),
    (r"\bSoftblock\b|soft[- ]?block", "softblock", None),
    (r"\bShadowMode\b|shadow[- ]?mode", "shadowmode", None),
    (r"\bGlow\b", "glow", None),
    (r"\bBB\b|baseline\s+behavior", "bb", None),
    // Word boundaries keep "status can" from reading as "US CA".
    (
        r"\bUtah\b|\bUS-UT\b|\bUS UT\b|Utah Social Media Regulation Act\b",
        TAG_UTAH,
        Some(LEGAL_CUE),
    ),
    (
        r"\bFlorida\b|\bUS-FL\b|\bUS FL\b|Online Protections for Minors\b",
        TAG_FLORIDA,
        Some(LEGAL_CUE),
    ),
    (
        r"\bCalifornia\b|\bUS-CA\b|\bUS CA\b|\bSB\s*976\b|Protecting Our Kids",
        TAG_CALIFORNIA,
        Some(LEGAL_CUE),
    ),
    (
        r"\bEU\b|\bEEA\b|Digital Services Act\b|\bDSA\b|EU/EEA",
        TAG_EU,
        Some(LEGAL_CUE),
    ),
    (
        r"\bUS\b|\bFederal\b|2258A|NCMEC|provider[s]?\s+to\s+report",
        TAG_US_FEDERAL,
        Some(LEGAL_CUE),
    ),
];

/// State tags and the state region each one implies (in inference order).
const STATE_REGIONS: &[(&str, Region)] = &[
    (TAG_UTAH, Region::UsUtah),
    (TAG_FLORIDA, Region::UsFlorida),
    (TAG_CALIFORNIA, Region::UsCalifornia),
];

/// A compiled rule row.
#[derive(Debug)]
pub struct Rule {
    pattern: Regex,
    tag: &'static str,
    promotion: Option<&'static str>,
}

impl Rule {
    /// The tag contributed when the pattern matches.
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// The extra tag contributed alongside [`Rule::tag`], if any.
    pub fn promotion(&self) -> Option<&'static str> {
        self.promotion
    }

    /// Returns `true` if the rule fires on `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    RULE_TABLE
        .iter()
        .filter_map(|(pattern, tag, promotion)| {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(pattern) => Some(Rule {
                    pattern,
                    tag,
                    promotion: *promotion,
                }),
                Err(e) => {
                    warn!(tag = *tag, error = %e, "Dropping rule with invalid pattern");
                    None
                }
            }
        })
        .collect()
});

/// Returns the compiled rule table in evaluation order.
pub fn rules() -> &'static [Rule] {
    &RULES
}

/// Tags every rule that matches `text` (sorted, deduplicated).
///
/// Empty or unmatched text yields an empty set.
pub fn infer_rule_hits(text: &str) -> BTreeSet<String> {
    infer_rule_hits_capped(text, None)
}

/// Like [`infer_rule_hits`], but stops scanning once `max_rules` tags were collected.
pub fn infer_rule_hits_capped(text: &str, max_rules: Option<usize>) -> BTreeSet<String> {
    let mut hits = BTreeSet::new();

    for rule in rules() {
        if rule.is_match(text) {
            hits.insert(rule.tag.to_string());
            if let Some(promotion) = rule.promotion {
                hits.insert(promotion.to_string());
            }
        }

        if let Some(cap) = max_rules
            && cap > 0
            && hits.len() >= cap
        {
            break;
        }
    }

    hits
}

/// Derives the ordered jurisdiction list for `text`.
pub fn infer_regions(text: &str) -> Vec<Region> {
    regions_from_hits(&infer_rule_hits(text))
}

/// Maps a hit set to regions: a state implies itself and [`Region::Us`], `eu` implies
/// [`Region::Eu`], and a federal cue implies [`Region::Us`]. First-seen order, no duplicates.
pub fn regions_from_hits<S: AsRef<str>>(hits: &BTreeSet<S>) -> Vec<Region>
where
    S: Ord,
{
    let has = |tag: &str| hits.iter().any(|h| h.as_ref() == tag);

    let mut regions = Vec::new();
    let mut state_hit = false;

    for (tag, region) in STATE_REGIONS {
        if has(tag) {
            push_unique(&mut regions, *region);
            state_hit = true;
        }
    }

    if has(TAG_EU) {
        push_unique(&mut regions, Region::Eu);
    }

    if has(TAG_US_FEDERAL) || state_hit {
        push_unique(&mut regions, Region::Us);
    }

    regions
}

fn push_unique(regions: &mut Vec<Region>, region: Region) {
    if !regions.contains(&region) {
        regions.push(region);
    }
}
