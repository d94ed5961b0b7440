//! Function-body analysis: violation policies, freshness tracing and
//! report extraction.

pub mod extractor;
pub mod freshness;
pub mod policies;

pub use extractor::{generate_reports, ReportExtractor};
pub use freshness::{analyze_return_freshness, FreshnessOutcome, OnceQueue};
pub use policies::{IdentifierPolicy, ThrowsExceptionPolicy, ViolationPolicy};
