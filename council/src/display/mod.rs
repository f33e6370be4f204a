//! Display helpers shared by the interactive view and the report exporter
//!
//! - `deanonymize`: peer-review labels (`Response A`) back to model names
//! - `comparator`: good/fair/poor indicators against the best value in a set

pub mod comparator;
pub mod deanonymize;

pub use comparator::{compare, Indicator, StatsComparator, Thresholds};
pub use deanonymize::{deanonymize, deanonymize_legacy, resolve_ranking, short_model_name};
