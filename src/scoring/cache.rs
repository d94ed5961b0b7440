//! Write-once score cache shared across scoring runs.

use crate::core::{FunctionIdentity, PurityScore};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Thread-safe map from function identity to its finished score. Entries
/// are write-once: the first score stored for an identity wins, so cached
/// results stay stable across incremental re-runs.
#[derive(Debug, Default)]
pub struct ScoreCache {
    inner: RwLock<HashMap<FunctionIdentity, PurityScore>>,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &FunctionIdentity) -> Option<PurityScore> {
        self.inner.read().get(identity).cloned()
    }

    /// Store a score unless one is already present. Returns whether the
    /// score was inserted.
    pub fn insert(&self, score: PurityScore) -> bool {
        let mut inner = self.inner.write();
        match inner.entry(score.report.identity.clone()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(score);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FunctionIdentity, FunctionKind, PurityLevel, PurityReport, PurityScore};
    use std::path::PathBuf;

    fn score(name: &str, dependency_count: u32) -> PurityScore {
        PurityScore {
            report: PurityReport {
                identity: FunctionIdentity::new(name, "Tests", "void", vec![], FunctionKind::Ordinary),
                file: PathBuf::from("<memory>"),
                line_start: 0,
                line_end: 0,
                source_lines: 1,
                return_value_is_fresh: true,
                is_manually_classified: false,
                violations: vec![],
                dependencies: vec![],
            },
            occurrences: vec![],
            level: PurityLevel::Pure,
            dependency_count,
            source_lines: 1,
        }
    }

    #[test]
    fn first_insert_wins() {
        let cache = ScoreCache::new();
        assert!(cache.insert(score("F", 0)));
        assert!(!cache.insert(score("F", 7)));
        let cached = cache.get(&score("F", 0).report.identity).unwrap();
        assert_eq!(cached.dependency_count, 0);
        assert_eq!(cache.len(), 1);
    }
}
