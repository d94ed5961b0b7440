//! Score calculation.
//!
//! Collapses the call graph into strongly connected components, walks them
//! callees-first, and gives every function the full set of violations
//! reachable from it, each tagged with a hop distance. Members of one
//! component share a single occurrence set: impurity anywhere in a cycle
//! belongs to every member.

mod cache;
mod metrics;

pub use cache::ScoreCache;
pub use metrics::{coefficient, count_weighted_score, distance_weighted_score};

use crate::core::{
    Dependency, FunctionIdentity, PurityLevel, PurityReport, PurityScore, Violation,
    ViolationOccurrence,
};
use crate::graph::CallGraph;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Callback consulted once per unknown callee: given the unresolved
/// dependency and the report that mentions it, it may supply a
/// hand-written report for the callee (third-party code, known library
/// functions). Supplied reports join the batch and are scored normally.
pub type UnknownResolver<'a> = dyn Fn(&Dependency, &PurityReport) -> Option<PurityReport> + 'a;

/// Turns a batch of reports into distance-tagged [`PurityScore`]s.
#[derive(Debug, Default)]
pub struct ScoreCalculator;

impl ScoreCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Score a batch. Unknown callees stay unknown and are recorded as
    /// [`Violation::UnknownCall`].
    pub fn calculate_scores(&self, reports: &[PurityReport]) -> Vec<PurityScore> {
        self.run(reports, None, None)
    }

    /// Score a batch, consulting `resolver` for every callee no report
    /// covers. Reports it supplies are re-examined for unknown callees of
    /// their own, so a chain of manual classifications converges.
    pub fn calculate_scores_with(
        &self,
        reports: &[PurityReport],
        resolver: &UnknownResolver<'_>,
    ) -> Vec<PurityScore> {
        self.run(reports, Some(resolver), None)
    }

    /// Score a batch against a shared cache: scores already cached feed
    /// violation inheritance for their callers, and newly computed scores
    /// are stored back.
    pub fn calculate_scores_cached(
        &self,
        reports: &[PurityReport],
        cache: &ScoreCache,
    ) -> Vec<PurityScore> {
        self.run(reports, None, Some(cache))
    }

    fn run(
        &self,
        reports: &[PurityReport],
        resolver: Option<&UnknownResolver<'_>>,
        cache: Option<&ScoreCache>,
    ) -> Vec<PurityScore> {
        let mut working: Vec<PurityReport> = reports.to_vec();

        if let Some(resolver) = resolver {
            resolve_unknowns(&mut working, resolver);
        }

        let graph = CallGraph::from_reports(&working);
        let mut table: HashMap<FunctionIdentity, PurityScore> = HashMap::new();

        // Callees-first order guarantees every cross-component dependency
        // is already in the table (or genuinely unknown) when its caller's
        // component is scored.
        for component in graph.components() {
            let members: Vec<(usize, &PurityReport)> = component
                .iter()
                .filter_map(|&ix| graph.node(ix).report)
                .map(|i| (i, &working[i]))
                .collect();
            if members.is_empty() {
                // Unknown leaf; callers record it as UnknownCall.
                continue;
            }

            let cyclic = graph.is_cyclic_component(&component);
            let base_distance = if cyclic { component.len() as u32 } else { 0 };
            let member_ids: HashSet<&FunctionIdentity> =
                members.iter().map(|(_, r)| &r.identity).collect();

            let mut shared: Vec<ViolationOccurrence> = Vec::new();
            for (_, report) in &members {
                for violation in &report.violations {
                    shared.push(ViolationOccurrence::new(base_distance, *violation));
                }
            }
            for (_, report) in &members {
                for dep in &report.dependencies {
                    if member_ids.contains(&dep.identity) {
                        continue;
                    }
                    if let Some(dep_score) = table.get(&dep.identity) {
                        shared.extend(dep_score.occurrences.iter().copied());
                    } else if let Some(cached) = cache.and_then(|c| c.get(&dep.identity)) {
                        shared.extend(cached.occurrences.iter().copied());
                    } else {
                        debug!(
                            "unknown callee `{}` of {}",
                            dep.identity.full_name(),
                            report.identity.full_name()
                        );
                        shared.push(ViolationOccurrence::new(base_distance, Violation::UnknownCall));
                    }
                }
            }

            let level =
                PurityLevel::from_violations(shared.iter().map(|o| &o.violation));
            for (_, report) in &members {
                let score = PurityScore {
                    report: (*report).clone(),
                    occurrences: shared.clone(),
                    level,
                    dependency_count: report.dependencies.len() as u32,
                    source_lines: report.source_lines,
                };
                if let Some(cache) = cache {
                    cache.insert(score.clone());
                }
                table.insert(report.identity.clone(), score);
            }
        }

        working
            .iter()
            .filter_map(|report| table.get(&report.identity).cloned())
            .collect()
    }
}

/// Grow the working set with resolver-supplied reports until every
/// dependency either matches a report or has been asked about once.
fn resolve_unknowns(working: &mut Vec<PurityReport>, resolver: &UnknownResolver<'_>) {
    let mut known: HashSet<FunctionIdentity> =
        working.iter().map(|r| r.identity.clone()).collect();
    let mut asked: HashSet<FunctionIdentity> = HashSet::new();

    let mut i = 0;
    while i < working.len() {
        let dependencies = working[i].dependencies.clone();
        for dep in dependencies {
            if known.contains(&dep.identity) || !asked.insert(dep.identity.clone()) {
                continue;
            }
            if let Some(mut report) = resolver(&dep, &working[i]) {
                report.is_manually_classified = true;
                known.insert(report.identity.clone());
                working.push(report);
            }
        }
        i += 1;
    }
}
