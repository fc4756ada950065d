//! `leadgen-pipeline`: lead reconciliation, classification and scoring.
//!
//! Pure engine crate: receives pre-loaded records, returns scored leads with
//! outreach scripts. No CLI dependencies.

pub mod classify;
pub mod config;
pub mod density;
pub mod engine;
pub mod error;
pub mod load;
pub mod merger;
pub mod model;
pub mod score;
pub mod script;
pub mod similarity;
pub mod summary;
pub mod taxonomy;

pub use classify::Classifier;
pub use config::LeadConfig;
pub use density::{DensityLookup, ZoneDensityTable};
pub use engine::{run, Pipeline, PipelineOutput};
pub use error::LeadError;
pub use merger::merge;
pub use model::{Lead, LeadInput, LeadReport, LeadRow, RawRecord};
pub use score::Scorer;
pub use similarity::similarity;
pub use taxonomy::Taxonomy;
