//! aircot-core: ADS-B report → Cursor-on-Target type classification.
//!
//! No async, no network. Reference tables are loaded once into an immutable
//! `TableSet`; a `Classifier` answers `classify` calls against it from any
//! number of threads. `SharedClassifier` adds atomic table reloads.

pub mod callsign;
pub mod category;
pub mod classify;
pub mod config;
pub mod dataset;
pub mod emergency;
pub mod exact;
pub mod range;
pub mod shared;
pub mod taxonomy;
pub mod types;

// Re-export commonly used types at crate root
pub use classify::{ClassificationResult, Classifier, ClassifierOptions, Confidence, Source};
pub use dataset::{DatasetPaths, LoadStats, TableSet};
pub use emergency::EmergencyStatus;
pub use shared::SharedClassifier;
pub use taxonomy::{AirframeClass, Attitude, CotType, DisplayHint, Operator};
pub use types::*;
