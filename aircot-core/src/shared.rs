//! A classifier that can be replaced while readers are using it.
//!
//! Readers take a snapshot (`Arc<Classifier>`) and classify without holding
//! the lock. A reload builds a full new table set first and only then swaps
//! the pointer, so no reader ever sees a half-loaded set.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::classify::{ClassificationResult, Classifier, ClassifierOptions};
use crate::dataset::{DatasetPaths, TableSet};
use crate::types::{Report, Result};

#[derive(Debug)]
pub struct SharedClassifier {
    active: RwLock<Arc<Classifier>>,
}

impl SharedClassifier {
    pub fn new(classifier: Classifier) -> Self {
        SharedClassifier {
            active: RwLock::new(Arc::new(classifier)),
        }
    }

    /// Snapshot of the active classifier.
    pub fn current(&self) -> Arc<Classifier> {
        // The guarded value is a plain Arc, so a poisoned lock still holds a
        // complete classifier.
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn classify(&self, report: &Report) -> ClassificationResult {
        self.current().classify(report)
    }

    /// Swap in a new classifier, returning the one it replaced.
    pub fn replace(&self, classifier: Classifier) -> Arc<Classifier> {
        let mut guard = self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(classifier))
    }

    /// Load a new table set and swap it in. On error the active classifier
    /// is left as it was.
    pub fn reload(&self, paths: &DatasetPaths, options: ClassifierOptions) -> Result<()> {
        let tables = match TableSet::load(paths) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "reference table reload failed, keeping active tables");
                return Err(e);
            }
        };
        let stats = tables.stats();
        self.replace(Classifier::new(tables, options));
        info!(
            ranges = stats.ranges,
            known = stats.known_addresses,
            categories = stats.categories,
            "reference tables reloaded"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
