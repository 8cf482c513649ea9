//! Process-wide compiled-validator cache
//!
//! Memoizes compiled validators by type identity for the life of the
//! process: unbounded, no eviction, build-once-per-type. Each cache entry
//! owns a once-cell, so concurrent first requests for the *same* type
//! coalesce onto a single build while requests for *different* types never
//! block each other. A failed build leaves its entry empty — the next
//! request retries instead of observing a poisoned cache.

use super::compiled::CompiledValidator;
use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use serde::Serialize;
use shapecheck_core::{RecordType, Result, TypeId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Snapshot of cache performance counters
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    /// Requests answered from an already-built validator
    pub hits: u64,
    /// Requests that found no built validator
    pub misses: u64,
    /// Compile attempts (a retried failure counts again)
    pub compilations: u64,
    /// Validators currently built and cached
    pub cached_validators: usize,
}

impl CacheStats {
    /// Fraction of requests answered without building
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                self.hits as f64 / total as f64
            }
        }
    }
}

/// Compiled validator cache, keyed by type identity
pub struct ValidatorCache {
    entries: DashMap<TypeId, Arc<OnceCell<Arc<CompiledValidator>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    compilations: AtomicU64,
}

impl Default for ValidatorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            compilations: AtomicU64::new(0),
        }
    }

    /// Get the validator for a record type, compiling it on first use.
    ///
    /// The compile step runs at most once per type: concurrent first
    /// requests for the same type block on one build; a repeated request
    /// returns the same shared validator instance.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeCheckError::Resolution`](shapecheck_core::ShapeCheckError::Resolution)
    /// if compilation fails. The failure is not cached; the next request
    /// retries the build.
    pub fn get_or_build(&self, record: &Arc<RecordType>) -> Result<Arc<CompiledValidator>> {
        let cell = {
            let entry = self
                .entries
                .entry(record.id())
                .or_insert_with(|| Arc::new(OnceCell::new()));
            Arc::clone(entry.value())
        };

        if let Some(existing) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(existing));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let built = cell.get_or_try_init(|| {
            self.compilations.fetch_add(1, Ordering::Relaxed);
            debug!(type_name = %record.name(), type_id = %record.id(), "compiling validator");
            CompiledValidator::compile(record).map(Arc::new)
        })?;

        Ok(Arc::clone(built))
    }

    /// Snapshot of the cache counters
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            compilations: self.compilations.load(Ordering::Relaxed),
            cached_validators: self.len(),
        }
    }

    /// Number of validators currently built and cached
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    /// Whether no validator has been built yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static GLOBAL: Lazy<ValidatorCache> = Lazy::new(ValidatorCache::new);

/// The process-wide cache backing [`validate`](crate::validate) and
/// [`check`](crate::check)
#[must_use]
pub fn global() -> &'static ValidatorCache {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapecheck_core::{Namespace, ScalarKind, ShapeCheckError, TypeExpr};

    #[test]
    fn builds_once_and_shares_the_instance() -> anyhow::Result<()> {
        let ns = Namespace::new("test");
        let user = RecordType::builder("User", &ns)
            .required("id", TypeExpr::Scalar(ScalarKind::String))
            .build()?;

        let cache = ValidatorCache::new();
        assert_eq!(cache.stats().compilations, 0);

        let first = cache.get_or_build(&user)?;
        let second = cache.get_or_build(&user)?;

        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!(stats.compilations, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.cached_validators, 1);
        Ok(())
    }

    #[test]
    fn distinct_types_get_distinct_entries() -> anyhow::Result<()> {
        let ns = Namespace::new("test");
        let a = RecordType::builder("Shape", &ns)
            .required("id", TypeExpr::Scalar(ScalarKind::String))
            .build()?;
        // structurally identical, still a different type
        let b = RecordType::builder("Shape", &ns)
            .required("id", TypeExpr::Scalar(ScalarKind::String))
            .build()?;

        let cache = ValidatorCache::new();
        let va = cache.get_or_build(&a)?;
        let vb = cache.get_or_build(&b)?;

        assert!(!Arc::ptr_eq(&va, &vb));
        assert_eq!(cache.stats().compilations, 2);
        Ok(())
    }

    #[test]
    fn failed_builds_are_not_cached() -> anyhow::Result<()> {
        let ns = Namespace::new("test");
        let user = RecordType::builder("User", &ns)
            .required("profile", TypeExpr::Named("Profile".to_string()))
            .build()?;

        let cache = ValidatorCache::new();
        let err = cache.get_or_build(&user).unwrap_err();
        assert!(matches!(err, ShapeCheckError::Resolution { .. }));
        assert_eq!(cache.stats().cached_validators, 0);

        // defining the missing symbol makes the same type compile
        let _profile = RecordType::builder("Profile", &ns)
            .optional("bio", TypeExpr::Scalar(ScalarKind::String))
            .define()?;
        let validator = cache.get_or_build(&user)?;
        assert_eq!(validator.type_id(), user.id());
        assert_eq!(cache.stats().compilations, 2);
        assert_eq!(cache.stats().cached_validators, 1);
        Ok(())
    }

    #[test]
    fn hit_rate_is_zero_on_an_empty_cache() {
        assert!((ValidatorCache::new().stats().hit_rate() - 0.0).abs() < f64::EPSILON);
    }
}
