//! Function purity analysis and scoring.
//!
//! The pipeline has three stages, each usable on its own:
//!
//! 1. **Extraction** ([`analyzers`]): violation policies and a freshness
//!    trace run over a [`model::CodeModel`] snapshot and produce one
//!    immutable [`PurityReport`] per function.
//! 2. **Graph resolution** ([`graph`]): reports form a call graph whose
//!    strongly connected components are ordered callees-first.
//! 3. **Scoring** ([`scoring`]): every function inherits the violations
//!    reachable from it, tagged with hop distances, and collapses into a
//!    [`PurityLevel`] plus two scalar metrics.
//!
//! ```
//! use puremetrics::{generate_reports, ScoreCalculator};
//! use puremetrics::model::{SnapshotBuilder, TypeRef};
//! use puremetrics::{FunctionKind, PurityLevel};
//!
//! let mut snap = SnapshotBuilder::new();
//! let mut f = snap.function("Math.Add", "Demo", TypeRef::value("int"), FunctionKind::Ordinary);
//! let a = f.literal();
//! let b = f.literal();
//! let sum = f.operator(vec![a, b]);
//! let ret = f.ret(Some(sum));
//! f.stmt(ret);
//! f.finish();
//! let snap = snap.build();
//!
//! let reports = generate_reports(&snap);
//! let scores = ScoreCalculator::new().calculate_scores(&reports);
//! assert_eq!(scores[0].level, PurityLevel::Pure);
//! ```

pub mod analyzers;
pub mod core;
pub mod errors;
pub mod graph;
pub mod io;
pub mod model;
pub mod scoring;

pub use crate::analyzers::{generate_reports, ReportExtractor, ViolationPolicy};
pub use crate::core::{
    Dependency, FunctionIdentity, FunctionKind, PurityLevel, PurityReport, PurityScore, Violation,
    ViolationOccurrence,
};
pub use crate::errors::AnalysisError;
pub use crate::graph::CallGraph;
pub use crate::scoring::{ScoreCache, ScoreCalculator, UnknownResolver};
