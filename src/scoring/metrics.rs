//! Scalar purity metrics derived from a finished score.
//!
//! Both metrics normalize by `dependency_count + 1` so heavily-connected
//! functions are not punished for fan-out alone, and both leave
//! [`Violation::UnknownCall`] out of the numerator: an unknown callee is
//! uncertainty, not observed impurity.

use crate::core::{violation_counts, PurityScore, Violation};

/// Per-kind weight applied by [`count_weighted_score`]. All kinds
/// currently weigh the same; the table is the hook for tuning.
pub fn coefficient(violation: Violation) -> f64 {
    match violation {
        Violation::ThrowsException => 1.0,
        Violation::ModifiesParameter => 1.0,
        Violation::ModifiesNonFreshObject => 1.0,
        Violation::ModifiesLocalState => 1.0,
        Violation::ReadsLocalState => 1.0,
        Violation::ReadsGlobalState => 1.0,
        Violation::ModifiesGlobalState => 1.0,
        Violation::UnknownCall => 1.0,
    }
}

/// Distance-weighted impurity density: nearby violations weigh `1/(d+1)`,
/// so a violation three hops away contributes a quarter of a local one.
pub fn distance_weighted_score(score: &PurityScore) -> f64 {
    let weighted: f64 = score
        .occurrences
        .iter()
        .filter(|o| o.violation != Violation::UnknownCall)
        .map(|o| 1.0 / (o.distance as f64 + 1.0))
        .sum();
    (weighted + 1.0) / (score.dependency_count as f64 + 1.0)
}

/// Coefficient-weighted violation count, distance-blind.
pub fn count_weighted_score(score: &PurityScore) -> f64 {
    let violations: Vec<Violation> = score
        .occurrences
        .iter()
        .map(|o| o.violation)
        .filter(|v| *v != Violation::UnknownCall)
        .collect();
    let weighted: f64 = violation_counts(&violations)
        .into_iter()
        .map(|(violation, count)| count as f64 * coefficient(violation))
        .sum();
    weighted / (score.dependency_count as f64 + 1.0)
}

impl PurityScore {
    /// See [`distance_weighted_score`].
    pub fn distance_weighted(&self) -> f64 {
        distance_weighted_score(self)
    }

    /// See [`count_weighted_score`].
    pub fn count_weighted(&self) -> f64 {
        count_weighted_score(self)
    }
}
