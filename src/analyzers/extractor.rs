//! Report extraction.
//!
//! Turns each function of a code model into one immutable [`PurityReport`]:
//! run every violation policy over the body, enumerate call dependencies,
//! and cross-reference the freshness trace onto them. Extraction is
//! per-function and side-effect free, so the batch pass runs in parallel.

use super::freshness::analyze_return_freshness;
use super::policies::{IdentifierPolicy, ThrowsExceptionPolicy, ViolationPolicy};
use crate::core::{Dependency, PurityReport};
use crate::errors::AnalysisError;
use crate::model::{queries, CodeModel, FunctionNode, NodeKind, SymbolKind};
use log::{debug, info, warn};
use rayon::prelude::*;

/// Runs the configured violation policies and assembles reports.
pub struct ReportExtractor {
    policies: Vec<Box<dyn ViolationPolicy + Send + Sync>>,
}

impl ReportExtractor {
    pub fn new() -> Self {
        Self {
            policies: vec![Box::new(ThrowsExceptionPolicy), Box::new(IdentifierPolicy)],
        }
    }

    /// Extract a report for every function in the model. Functions without
    /// an obtainable body are logged and skipped; input order is preserved.
    pub fn generate_reports<M: CodeModel + Sync>(&self, model: &M) -> Vec<PurityReport> {
        let reports: Vec<PurityReport> = model
            .functions()
            .par_iter()
            .filter_map(|function| match self.extract_report(function, model) {
                Ok(report) => Some(report),
                Err(err) => {
                    warn!("skipping {}: {err}", function.identity.full_name());
                    None
                }
            })
            .collect();
        info!(
            "extracted {} purity reports from {} functions",
            reports.len(),
            model.functions().len()
        );
        reports
    }

    /// Extract the report of a single function.
    pub fn extract_report<M: CodeModel>(
        &self,
        function: &FunctionNode,
        model: &M,
    ) -> Result<PurityReport, AnalysisError> {
        if function.body.is_none() {
            return Err(AnalysisError::MissingBody(function.identity.full_name()));
        }

        let mut violations = Vec::new();
        for policy in &self.policies {
            violations.extend(policy.check(function, model));
        }

        let mut dependencies = collect_dependencies(function, model);

        let freshness = analyze_return_freshness(function, model);
        for dep in &mut dependencies {
            if freshness.return_dependencies.contains(&dep.identity) {
                dep.depends_on_return_freshness = true;
            }
            if freshness.fresh_dependencies.contains(&dep.identity) {
                dep.must_return_fresh = true;
            }
        }

        Ok(PurityReport {
            identity: function.identity.clone(),
            file: function.file.clone(),
            line_start: function.line_start,
            line_end: function.line_end,
            source_lines: function.source_lines,
            return_value_is_fresh: freshness.is_fresh,
            is_manually_classified: false,
            violations,
            dependencies,
        })
    }
}

impl Default for ReportExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Lambdas and local functions first, then calls, each in scope order.
/// Constructor and operator invocations are not dependencies; they are
/// handled by freshness directly.
fn collect_dependencies<M: CodeModel + ?Sized>(
    function: &FunctionNode,
    model: &M,
) -> Vec<Dependency> {
    let scope = queries::descendants_in_scope(model, function);

    let mut dependencies = Vec::new();
    for &id in &scope {
        if !matches!(model.node(id), NodeKind::Lambda { .. }) {
            continue;
        }
        if let Some(SymbolKind::Method { identity, is_abstract, .. }) =
            model.resolve_symbol(id).map(|s| &s.kind)
        {
            dependencies.push(Dependency::resolved(identity.clone(), *is_abstract));
        }
    }

    for &id in &scope {
        if !matches!(model.node(id), NodeKind::Call { .. }) {
            continue;
        }
        match model.resolve_symbol(id).map(|s| &s.kind) {
            Some(SymbolKind::Method {
                identity,
                is_abstract,
                is_constructor,
                is_builtin_operator,
            }) => {
                if *is_constructor || *is_builtin_operator {
                    continue;
                }
                dependencies.push(Dependency::resolved(identity.clone(), *is_abstract));
            }
            _ => {
                let text = model.node_text(id);
                debug!(
                    "could not resolve call target `{text}` in {}",
                    function.identity.full_name()
                );
                dependencies.push(Dependency::unresolved(text));
            }
        }
    }

    dependencies
}

/// Batch extraction with the default policy set.
pub fn generate_reports<M: CodeModel + Sync>(model: &M) -> Vec<PurityReport> {
    ReportExtractor::new().generate_reports(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{violation_counts, FunctionIdentity, FunctionKind, Violation};
    use crate::model::{SnapshotBuilder, Symbol, TypeRef};
    use pretty_assertions::assert_eq;

    fn callee(name: &str) -> FunctionIdentity {
        FunctionIdentity::new(name, "Tests", "T", vec![], FunctionKind::Ordinary)
    }

    #[test]
    fn pure_function_yields_empty_report() {
        let mut snap = SnapshotBuilder::new();
        let mut f = snap.function("T.Add", "Tests", TypeRef::value("int"), FunctionKind::Ordinary);
        let a = f.ident_with("a", Symbol::parameter("a", TypeRef::value("int")));
        let b = f.ident_with("b", Symbol::parameter("b", TypeRef::value("int")));
        let sum = f.operator(vec![a, b]);
        let ret = f.ret(Some(sum));
        f.stmt(ret);
        f.finish();
        let snap = snap.build();

        let report = ReportExtractor::new()
            .extract_report(&snap.functions()[0], &snap)
            .unwrap();
        assert!(report.violations.is_empty());
        assert!(report.dependencies.is_empty());
        assert!(report.return_value_is_fresh);
        assert!(!report.is_manually_classified);
    }

    #[test]
    fn bodyless_function_is_an_error() {
        let mut snap = SnapshotBuilder::new();
        let mut f = snap.function("T.Ext", "Tests", TypeRef::void(), FunctionKind::Ordinary);
        f.no_body();
        f.finish();
        let snap = snap.build();

        let err = ReportExtractor::new()
            .extract_report(&snap.functions()[0], &snap)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MissingBody(_)));
    }

    #[test]
    fn bodyless_functions_are_skipped_in_batch() {
        let mut snap = SnapshotBuilder::new();
        let mut f = snap.function("T.Ext", "Tests", TypeRef::void(), FunctionKind::Ordinary);
        f.no_body();
        f.finish();
        let mut g = snap.function("T.Ok", "Tests", TypeRef::void(), FunctionKind::Ordinary);
        let t = g.throw_stmt();
        g.stmt(t);
        g.finish();
        let snap = snap.build();

        let reports = generate_reports(&snap);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].identity.name, "T.Ok");
        assert_eq!(reports[0].violations, vec![Violation::ThrowsException]);
    }

    #[test]
    fn calls_become_dependencies_in_scope_order() {
        let mut snap = SnapshotBuilder::new();
        let mut f = snap.function("T.M", "Tests", TypeRef::void(), FunctionKind::Ordinary);
        let first = f.call(callee("T.First"), vec![]);
        f.stmt(first);
        let second = f.call(callee("T.Second"), vec![]);
        f.stmt(second);
        f.finish();
        let snap = snap.build();

        let report = ReportExtractor::new()
            .extract_report(&snap.functions()[0], &snap)
            .unwrap();
        let names: Vec<_> = report.dependencies.iter().map(|d| d.identity.name.as_str()).collect();
        assert_eq!(names, vec!["T.First", "T.Second"]);
    }

    #[test]
    fn lambda_dependencies_precede_call_dependencies() {
        let mut snap = SnapshotBuilder::new();
        let mut inner = snap.function(
            "T.M.<lambda>.0",
            "Tests",
            TypeRef::void(),
            FunctionKind::Lambda,
        );
        let t = inner.throw_stmt();
        inner.stmt(t);
        let inner_id = inner.finish();

        let mut f = snap.function("T.M", "Tests", TypeRef::void(), FunctionKind::Ordinary);
        let call = f.call(callee("T.Helper"), vec![]);
        f.stmt(call);
        let l = f.lambda(inner_id);
        f.stmt(l);
        f.finish();
        let snap = snap.build();

        let report = ReportExtractor::new()
            .extract_report(&snap.functions()[1], &snap)
            .unwrap();
        let names: Vec<_> = report.dependencies.iter().map(|d| d.identity.name.as_str()).collect();
        assert_eq!(names, vec!["T.M.<lambda>.0", "T.Helper"]);
        // The lambda's own throw stays out of the encloser's report.
        assert!(report.violations.is_empty());
    }

    #[test]
    fn abstract_callees_are_marked_on_the_dependency() {
        let mut snap = SnapshotBuilder::new();
        let mut f = snap.function("T.M", "Tests", TypeRef::void(), FunctionKind::Ordinary);
        let call = f.call_abstract(callee("IShape.Area"), vec![]);
        f.stmt(call);
        f.finish();
        let snap = snap.build();

        let report = ReportExtractor::new()
            .extract_report(&snap.functions()[0], &snap)
            .unwrap();
        assert_eq!(report.dependencies.len(), 1);
        assert!(report.dependencies[0].is_abstract);
    }

    #[test]
    fn unresolved_call_becomes_placeholder_dependency() {
        let mut snap = SnapshotBuilder::new();
        let mut f = snap.function("T.M", "Tests", TypeRef::void(), FunctionKind::Ordinary);
        let call = f.call_unresolved("Console.WriteLine", vec![]);
        f.stmt(call);
        f.finish();
        let snap = snap.build();

        let report = ReportExtractor::new()
            .extract_report(&snap.functions()[0], &snap)
            .unwrap();
        assert_eq!(report.dependencies.len(), 1);
        assert_eq!(report.dependencies[0].identity.name, "Console.WriteLine()");
        assert!(report.dependencies[0].identity.namespace.is_empty());
    }

    #[test]
    fn freshness_flags_land_on_matching_dependencies() {
        // T Make2() { var x = Build(); return Wrap(); }
        let mut snap = SnapshotBuilder::new();
        let mut f = snap.function("T.Make2", "Tests", TypeRef::reference("T"), FunctionKind::Ordinary);
        let build = f.call(callee("T.Build"), vec![]);
        let decl = f.local("x", Some(build));
        f.stmt(decl);
        let wrap = f.call(callee("T.Wrap"), vec![]);
        let ret = f.ret(Some(wrap));
        f.stmt(ret);
        f.finish();
        let snap = snap.build();

        let report = ReportExtractor::new()
            .extract_report(&snap.functions()[0], &snap)
            .unwrap();
        let build_dep = report.dependency(&callee("T.Build")).unwrap();
        assert!(build_dep.must_return_fresh);
        assert!(!build_dep.depends_on_return_freshness);
        let wrap_dep = report.dependency(&callee("T.Wrap")).unwrap();
        assert!(wrap_dep.depends_on_return_freshness);
        assert!(!wrap_dep.must_return_fresh);
        assert!(report.return_value_is_fresh);
    }

    #[test]
    fn violations_from_both_policies_accumulate() {
        let mut snap = SnapshotBuilder::new();
        let mut f = snap.function("T.M", "Tests", TypeRef::void(), FunctionKind::Ordinary);
        let t = f.throw_stmt();
        f.stmt(t);
        let s = f.ident_with("flag", Symbol::static_field("flag", TypeRef::value("bool")));
        f.stmt(s);
        f.finish();
        let snap = snap.build();

        let report = ReportExtractor::new()
            .extract_report(&snap.functions()[0], &snap)
            .unwrap();
        let counts = violation_counts(&report.violations);
        assert_eq!(counts[&Violation::ThrowsException], 1);
        assert_eq!(counts[&Violation::ReadsGlobalState], 1);
    }
}
