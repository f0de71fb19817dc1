use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static WORD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\w+").ok());

fn word_set(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    match WORD.as_ref() {
        Some(re) => re.find_iter(&lower).map(|m| m.as_str().to_string()).collect(),
        None => lower.split_whitespace().map(str::to_string).collect(),
    }
}

/// `|A ∩ B| / max(1, |A ∪ B|)` over lowercased word sets.
pub fn jaccard(query: &str, passage: &str) -> f32 {
    let a = word_set(query);
    let b = word_set(passage);

    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();

    intersection as f32 / union.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jaccard_overlap() {
        // {age, gate, utah} vs {utah, age, law}: 2 shared of 4.
        assert!((jaccard("Age gate Utah", "utah age law") - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_jaccard_empty_inputs() {
        assert_eq!(jaccard("", ""), 0.0);
        assert_eq!(jaccard("curfew", ""), 0.0);
    }

    #[test]
    fn test_jaccard_ignores_punctuation() {
        assert_eq!(jaccard("EU/EEA, minors!", "minors eea eu"), 1.0);
    }
}
