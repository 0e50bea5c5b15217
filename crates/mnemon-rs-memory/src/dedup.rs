//! Near-duplicate elimination over recalled memories.

use log::debug;
use mnemon_rs_protocol::MemoryRecord;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Default similarity at or above which two memories count as duplicates.
///
/// Chosen empirically; callers should treat it as tunable.
pub const DEFAULT_JACCARD_THRESHOLD: f64 = 0.65;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("word pattern"));

/// Lower-cased set of word tokens used for similarity comparison.
pub fn token_set(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|token| token.as_str().to_string())
        .collect()
}

/// Jaccard similarity of two token sets.
///
/// Two empty sets are identical (`1.0`); an empty union with differing sets
/// scores `0.0`.
pub fn jaccard_similarity(left: &HashSet<String>, right: &HashSet<String>) -> f64 {
    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    let union = left.union(right).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = left.intersection(right).count();
    intersection as f64 / union as f64
}

/// Drop memories that are near-duplicates of an earlier, better-ranked memory.
///
/// Input order is treated as rank order (best first). The first member of a
/// cluster is kept and relative order is preserved. Runs in O(n²), which is
/// fine for recall results already capped by a token budget.
pub fn deduplicate_by_jaccard(records: Vec<MemoryRecord>, threshold: f64) -> Vec<MemoryRecord> {
    if records.len() <= 1 {
        return records;
    }
    let total = records.len();
    let mut kept: Vec<(MemoryRecord, HashSet<String>)> = Vec::with_capacity(total);
    for record in records {
        let tokens = token_set(&record.text);
        let duplicate = kept
            .iter()
            .any(|(_, existing)| jaccard_similarity(existing, &tokens) >= threshold);
        if !duplicate {
            kept.push((record, tokens));
        }
    }
    debug!(
        "deduplicated memories (input={}, kept={}, threshold={})",
        total,
        kept.len(),
        threshold
    );
    kept.into_iter().map(|(record, _)| record).collect()
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_JACCARD_THRESHOLD, deduplicate_by_jaccard, jaccard_similarity, token_set};
    use mnemon_rs_protocol::MemoryRecord;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn records(texts: &[&str]) -> Vec<MemoryRecord> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| MemoryRecord::new(format!("m{index}"), *text))
            .collect()
    }

    fn ids(records: &[MemoryRecord]) -> Vec<&str> {
        records.iter().map(|record| record.id.as_str()).collect()
    }

    #[test]
    fn empty_and_single_inputs_pass_through() {
        assert_eq!(
            deduplicate_by_jaccard(Vec::new(), DEFAULT_JACCARD_THRESHOLD),
            Vec::new()
        );
        let single = records(&["only one"]);
        assert_eq!(
            deduplicate_by_jaccard(single.clone(), DEFAULT_JACCARD_THRESHOLD),
            single
        );
    }

    #[test]
    fn keeps_first_of_near_duplicate_pair() {
        let input = records(&[
            "Igor is the CTO of the company",
            "Igor is CTO of the company",
        ]);
        let kept = deduplicate_by_jaccard(input, DEFAULT_JACCARD_THRESHOLD);
        assert_eq!(ids(&kept), vec!["m0"]);
    }

    #[test]
    fn keeps_texts_without_shared_vocabulary() {
        let input = records(&["Igor likes espresso", "deploys run on Fridays"]);
        let kept = deduplicate_by_jaccard(input, DEFAULT_JACCARD_THRESHOLD);
        assert_eq!(ids(&kept), vec!["m0", "m1"]);
    }

    #[test]
    fn preserves_order_of_survivors() {
        let input = records(&[
            "Alice manages the design team",
            "Bob writes the billing service",
            "alice manages the DESIGN team!",
            "Carol owns incident response",
        ]);
        let kept = deduplicate_by_jaccard(input, DEFAULT_JACCARD_THRESHOLD);
        assert_eq!(ids(&kept), vec!["m0", "m1", "m3"]);
    }

    #[test]
    fn raising_threshold_never_keeps_fewer() {
        let input = records(&[
            "Igor is the CTO of the company",
            "Igor leads the company as CTO",
        ]);
        let strict = deduplicate_by_jaccard(input.clone(), 0.3).len();
        let lenient = deduplicate_by_jaccard(input, 0.95).len();
        assert!(lenient >= strict);
        assert_eq!((strict, lenient), (1, 2));
    }

    #[test]
    fn similarity_edge_cases() {
        let empty: HashSet<String> = HashSet::new();
        assert_eq!(jaccard_similarity(&empty, &empty), 1.0);
        assert_eq!(jaccard_similarity(&empty, &token_set("word")), 0.0);
        assert_eq!(
            token_set("Don't STOP, don't!"),
            ["don", "t", "stop"]
                .iter()
                .map(|t| t.to_string())
                .collect::<HashSet<String>>()
        );
    }
}
