//! Core data model for purity analysis.
//!
//! A [`PurityReport`] is the per-function unit of analysis: the function's
//! identity, its directly observed violations, and the calls it depends on.
//! Reports are immutable once extracted; the score calculator later merges
//! them across the call graph into [`PurityScore`]s.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// What kind of callable a [`FunctionIdentity`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    Ordinary,
    LocalFunction,
    Lambda,
    PropertyGetter,
    PropertySetter,
}

/// Stable, structurally-comparable identity of one function in a snapshot.
///
/// The name is qualified by the enclosing type; anonymous functions are
/// disambiguated by their positional index within the enclosing function
/// (`Parent.<lambda>.0`), local functions by name (`Parent.<local>.helper`).
/// Every lookup table in the crate is keyed by this value, never by node
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionIdentity {
    pub name: String,
    pub namespace: String,
    pub return_type: String,
    pub parameter_types: Vec<String>,
    pub kind: FunctionKind,
}

impl FunctionIdentity {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        return_type: impl Into<String>,
        parameter_types: Vec<String>,
        kind: FunctionKind,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            return_type: return_type.into(),
            parameter_types,
            kind,
        }
    }

    /// Name-only placeholder for a call whose symbol could not be resolved.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: String::new(),
            return_type: String::new(),
            parameter_types: Vec::new(),
            kind: FunctionKind::Ordinary,
        }
    }

    /// Namespace-qualified name used for display and logging.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for FunctionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

/// One impurity-causing construct observed in a function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Violation {
    ThrowsException,
    ModifiesParameter,
    ModifiesNonFreshObject,
    ModifiesLocalState,
    ReadsLocalState,
    ReadsGlobalState,
    ModifiesGlobalState,
    /// A call whose target matches no report in the analyzed set. Never
    /// raises the purity level by itself, but is always recorded so unknown
    /// callees cannot masquerade as pure.
    UnknownCall,
}

impl Violation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Violation::ThrowsException => "ThrowsException",
            Violation::ModifiesParameter => "ModifiesParameter",
            Violation::ModifiesNonFreshObject => "ModifiesNonFreshObject",
            Violation::ModifiesLocalState => "ModifiesLocalState",
            Violation::ReadsLocalState => "ReadsLocalState",
            Violation::ReadsGlobalState => "ReadsGlobalState",
            Violation::ModifiesGlobalState => "ModifiesGlobalState",
            Violation::UnknownCall => "UnknownCall",
        }
    }
}

/// A call the owning function makes, with the freshness expectations the
/// owner places on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub identity: FunctionIdentity,
    pub is_abstract: bool,
    /// The owner's return freshness presupposes this callee returns fresh.
    pub depends_on_return_freshness: bool,
    /// This callee's result is stored into a tracked variable and is
    /// expected to be fresh.
    pub must_return_fresh: bool,
}

impl Dependency {
    pub fn resolved(identity: FunctionIdentity, is_abstract: bool) -> Self {
        Self {
            identity,
            is_abstract,
            depends_on_return_freshness: false,
            must_return_fresh: false,
        }
    }

    /// Placeholder dependency for an unresolvable call target.
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::resolved(FunctionIdentity::placeholder(name), false)
    }
}

/// Everything observed about one function body, local to that body only.
///
/// Nested lambdas and local functions get their own reports; their
/// violations never leak into the enclosing function's report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurityReport {
    pub identity: FunctionIdentity,
    pub file: PathBuf,
    pub line_start: u32,
    pub line_end: u32,
    pub source_lines: u32,
    pub return_value_is_fresh: bool,
    pub is_manually_classified: bool,
    /// Multiset of directly observed violations. Order is irrelevant;
    /// compare with [`violation_counts`].
    pub violations: Vec<Violation>,
    pub dependencies: Vec<Dependency>,
}

impl PurityReport {
    /// Look up a dependency by callee identity.
    pub fn dependency(&self, identity: &FunctionIdentity) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| &d.identity == identity)
    }
}

/// A violation paired with the call-graph hop distance at which the score
/// calculator attributed it. Reports themselves never carry distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViolationOccurrence {
    pub distance: u32,
    pub violation: Violation,
}

impl ViolationOccurrence {
    pub fn new(distance: u32, violation: Violation) -> Self {
        Self { distance, violation }
    }
}

/// Ordered purity classification, most pure first.
///
/// Derivation checks the most impure kinds first, so the variant order
/// doubles as a severity order: `Pure < ThrowsException < ... < Impure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PurityLevel {
    Pure,
    ThrowsException,
    NonFreshObjectImpure,
    ParameterImpure,
    LocallyImpure,
    Impure,
}

impl PurityLevel {
    /// Derive the level from a set of violations, most-impure check first.
    /// `UnknownCall` never raises the level.
    pub fn from_violations<'a, I>(violations: I) -> Self
    where
        I: IntoIterator<Item = &'a Violation>,
    {
        let mut level = PurityLevel::Pure;
        for v in violations {
            let candidate = match v {
                Violation::ReadsGlobalState | Violation::ModifiesGlobalState => PurityLevel::Impure,
                Violation::ReadsLocalState | Violation::ModifiesLocalState => {
                    PurityLevel::LocallyImpure
                }
                Violation::ModifiesParameter => PurityLevel::ParameterImpure,
                Violation::ModifiesNonFreshObject => PurityLevel::NonFreshObjectImpure,
                Violation::ThrowsException => PurityLevel::ThrowsException,
                Violation::UnknownCall => PurityLevel::Pure,
            };
            level = level.max(candidate);
        }
        level
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PurityLevel::Pure => "Pure",
            PurityLevel::ThrowsException => "ThrowsException",
            PurityLevel::NonFreshObjectImpure => "NonFreshObjectImpure",
            PurityLevel::ParameterImpure => "ParameterImpure",
            PurityLevel::LocallyImpure => "LocallyImpure",
            PurityLevel::Impure => "Impure",
        }
    }
}

/// The scored view of one function: its report plus every violation
/// reachable through the call graph, each tagged with a hop distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurityScore {
    pub report: PurityReport,
    pub occurrences: Vec<ViolationOccurrence>,
    pub level: PurityLevel,
    pub dependency_count: u32,
    pub source_lines: u32,
}

impl PurityScore {
    pub fn identity(&self) -> &FunctionIdentity {
        &self.report.identity
    }

    /// Recompute the level from the current occurrence set.
    pub fn derive_level(&mut self) {
        self.level = PurityLevel::from_violations(self.occurrences.iter().map(|o| &o.violation));
    }
}

/// Collapse a violation list into kind → count, for multiset comparison.
pub fn violation_counts(violations: &[Violation]) -> BTreeMap<Violation, usize> {
    let mut counts = BTreeMap::new();
    for v in violations {
        *counts.entry(*v).or_insert(0) += 1;
    }
    counts
}
