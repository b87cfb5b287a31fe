//! `rackrecon`: two-source inventory reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded datasets, returns field-level and
//! existence-level differences. No CLI or IO dependencies.

pub mod align;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod existence;
pub mod model;
pub mod normalize;

pub use align::{align, AlignOptions, Alignment, IdentityKey};
pub use compare::compare_fields;
pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use existence::{compare_existence, ExistenceOptions, RawKey};
pub use model::{
    Dataset, ExistenceDifference, FieldDifference, Observed, Record, ReconResult, Side, Value,
};
