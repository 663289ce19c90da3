//! Dataset-level aggregation of per-example metrics

use crate::metrics::PairMetrics;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A unit that produced no score, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFailure {
    /// File path or record id
    pub unit: String,
    /// Human-readable cause
    pub reason: String,
}

/// Averages over every scored example plus the failures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetrics {
    pub cer: f64,
    pub edit_distance: f64,
    pub correct_ordered: f64,
    pub correct_unordered: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub readability_average: f64,
    pub readability_weighted_average: f64,
    /// Examples included in the means
    pub scored: usize,
    /// Examples excluded from the means
    pub failed: usize,
    /// Failed examples, sorted by unit
    pub failures: Vec<UnitFailure>,
    /// Wall-clock time of the whole run
    pub execution_time_s: f64,
}

#[derive(Debug, Default)]
struct Inner {
    scored: Vec<(String, PairMetrics)>,
    failures: Vec<UnitFailure>,
}

/// Thread-safe collector shared by all workers of a run
#[derive(Debug, Default)]
pub struct MetricsAccumulator {
    inner: Mutex<Inner>,
}

impl MetricsAccumulator {
    /// Create empty accumulator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the score of one unit
    pub fn push(&self, unit: impl Into<String>, metrics: PairMetrics) {
        self.inner.lock().scored.push((unit.into(), metrics));
    }

    /// Record a unit that could not be scored
    pub fn record_failure(&self, unit: impl Into<String>, reason: impl Into<String>) {
        let failure = UnitFailure {
            unit: unit.into(),
            reason: reason.into(),
        };
        tracing::debug!(unit = %failure.unit, reason = %failure.reason, "unit failed");
        self.inner.lock().failures.push(failure);
    }

    /// Units recorded so far, scored or failed
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.lock();
        inner.scored.len() + inner.failures.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Average everything recorded so far
    #[must_use]
    pub fn finish(&self, elapsed: Duration) -> DatasetMetrics {
        let inner = self.inner.lock();
        let n = inner.scored.len();
        let mean = |field: fn(&PairMetrics) -> f64| {
            if n == 0 {
                0.0
            } else {
                inner.scored.iter().map(|(_, m)| field(m)).sum::<f64>() / n as f64
            }
        };

        let mut failures = inner.failures.clone();
        failures.sort_by(|a, b| a.unit.cmp(&b.unit));

        DatasetMetrics {
            cer: mean(|m| m.cer),
            edit_distance: mean(|m| m.edit_distance),
            correct_ordered: mean(|m| m.correct_ordered),
            correct_unordered: mean(|m| m.correct_unordered),
            precision: mean(|m| m.precision),
            recall: mean(|m| m.recall),
            f1: mean(|m| m.f1),
            readability_average: mean(|m| m.readability_average),
            readability_weighted_average: mean(|m| m.readability_weighted_average),
            scored: n,
            failed: failures.len(),
            failures,
            execution_time_s: elapsed.as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn metrics(f1: f64) -> PairMetrics {
        PairMetrics {
            f1,
            precision: f1,
            ..PairMetrics::default()
        }
    }

    #[test]
    fn empty_run_has_zero_means() {
        let result = MetricsAccumulator::new().finish(Duration::from_millis(1500));
        assert_eq!(result.scored, 0);
        assert_eq!(result.f1, 0.0);
        assert_eq!(result.execution_time_s, 1.5);
    }

    #[test]
    fn failures_are_excluded_from_means() {
        let acc = MetricsAccumulator::new();
        acc.push("b.jsonl:1", metrics(1.0));
        acc.push("a.jsonl:1", metrics(0.5));
        acc.record_failure("c.jsonl:2", "exhausted");
        acc.record_failure("a.jsonl:9", "parse error");

        let result = acc.finish(Duration::ZERO);
        assert_eq!(result.scored, 2);
        assert_eq!(result.failed, 2);
        assert_eq!(result.f1, 0.75);
        assert_eq!(result.failures[0].unit, "a.jsonl:9");
    }

    #[test]
    fn concurrent_pushes_are_all_kept() {
        let acc = Arc::new(MetricsAccumulator::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let acc = Arc::clone(&acc);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        acc.push(format!("{i}:{j}"), metrics(1.0));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(acc.len(), 200);
        assert_eq!(acc.finish(Duration::ZERO).f1, 1.0);
    }

    #[test]
    fn serializes_with_snake_case_keys() {
        let json = serde_json::to_value(MetricsAccumulator::new().finish(Duration::ZERO)).unwrap();
        assert!(json.get("correct_unordered").is_some());
        assert!(json.get("execution_time_s").is_some());
        assert_eq!(json["failures"], serde_json::json!([]));
    }
}
