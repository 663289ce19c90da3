//! Per-example metrics between an oracle and a prediction

use renamer_java::tokenize;
use renamer_llm::ReadabilityScore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

/// Scores of one prediction against its oracle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PairMetrics {
    /// Character error rate in percent
    pub cer: f64,
    /// Levenshtein distance in characters
    pub edit_distance: f64,
    /// Fraction of oracle identifiers matched at the same position
    pub correct_ordered: f64,
    /// Jaccard similarity of the identifier sets
    pub correct_unordered: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub readability_average: f64,
    pub readability_weighted_average: f64,
    /// Time spent computing these metrics
    pub elapsed_s: f64,
}

impl PairMetrics {
    /// Attach a readability score
    #[must_use]
    pub fn with_readability(mut self, score: ReadabilityScore) -> Self {
        self.readability_average = score.average;
        self.readability_weighted_average = score.weighted_average;
        self
    }
}

/// Edit distance over characters
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Identifier values in source order; empty if `code` does not tokenize
#[must_use]
pub fn extract_identifiers(code: &str) -> Vec<String> {
    match tokenize(code) {
        Ok(tokens) => tokens
            .into_iter()
            .filter(|t| t.is_identifier())
            .map(|t| t.value)
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, "identifier extraction failed");
            Vec::new()
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Score `prediction` against `oracle`
#[must_use]
pub fn evaluate(oracle: &str, prediction: &str) -> PairMetrics {
    let started = Instant::now();

    let edit = levenshtein(oracle, prediction);
    let cer = 100.0 * edit as f64 / oracle.chars().count().max(1) as f64;

    let oracle_ids = extract_identifiers(oracle);
    let pred_ids = extract_identifiers(prediction);

    // Positional on purpose: shifted identifiers do not count.
    let same_positions = oracle_ids
        .iter()
        .zip(&pred_ids)
        .filter(|(o, p)| o == p)
        .count();
    let correct_ordered = ratio(same_positions, oracle_ids.len());

    let oracle_set: HashSet<&str> = oracle_ids.iter().map(String::as_str).collect();
    let pred_set: HashSet<&str> = pred_ids.iter().map(String::as_str).collect();
    let tp = oracle_set.intersection(&pred_set).count();
    let union = oracle_set.union(&pred_set).count();
    let fp = pred_set.len() - tp;
    let fn_ = oracle_set.len() - tp;

    let correct_unordered = ratio(tp, union);
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    PairMetrics {
        cer,
        edit_distance: edit as f64,
        correct_ordered,
        correct_unordered,
        precision,
        recall,
        f1,
        readability_average: 0.0,
        readability_weighted_average: 0.0,
        elapsed_s: started.elapsed().as_secs_f64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("same", "same"), 0);
        assert_eq!(levenshtein("héllo", "hello"), 1);
    }

    #[test]
    fn different_names_score_zero() {
        let m = evaluate("testAddsTwo", "testAddsThree");
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
        assert_eq!(m.correct_unordered, 0.0);
        assert_eq!(m.correct_ordered, 0.0);
        assert_eq!(m.edit_distance, 4.0);
    }

    #[test]
    fn identical_code_scores_perfectly() {
        let code = "@Test public void testAddsTwo(){ int result = 2; assertEquals(2, result); }";
        let m = evaluate(code, code);
        assert_eq!(m.cer, 0.0);
        assert_eq!(m.correct_ordered, 1.0);
        assert_eq!(m.correct_unordered, 1.0);
        assert_eq!(m.f1, 1.0);
    }

    #[test]
    fn ordered_accuracy_is_positional() {
        // oracle ids: a b c, prediction ids: x a b c
        let m = evaluate("a(b, c);", "x(a, b, c);");
        assert_eq!(m.correct_ordered, 0.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.precision, 0.75);
    }

    #[test]
    fn oracle_without_identifiers() {
        let m = evaluate("1 + 2;", "1 + 2;");
        assert_eq!(m.correct_ordered, 0.0);
        assert_eq!(m.correct_unordered, 0.0);
    }

    #[test]
    fn empty_oracle_cer_uses_one_char() {
        assert_eq!(evaluate("", "ab").cer, 200.0);
    }

    #[test]
    fn readability_is_attached() {
        let m = evaluate("a;", "a;").with_readability(ReadabilityScore {
            average: 3.0,
            weighted_average: 2.5,
        });
        assert_eq!(m.readability_average, 3.0);
        assert_eq!(m.readability_weighted_average, 2.5);
    }

    proptest! {
        #[test]
        fn prop_levenshtein_is_symmetric_and_bounded(a in "[a-c]{0,12}", b in "[a-c]{0,12}") {
            let d = levenshtein(&a, &b);
            prop_assert_eq!(d, levenshtein(&b, &a));
            prop_assert!(d <= a.len().max(b.len()));
            prop_assert!(d >= a.len().abs_diff(b.len()));
        }
    }
}
