#![forbid(unsafe_code)]

//! Occupation measurement model.
//!
//! Pure kernel: dotted hierarchy ids, typed scales with element-scoped
//! semantics, the element schema and its per-occupation instances, rating
//! rows, population and the derived experience score. No I/O, no logging.

/// Schema layout version. Part of the schema fingerprint.
pub const SCHEMA_VERSION: u32 = 1;

pub mod hierarchy;
pub mod error;
pub mod scale;
pub mod distribution;
pub mod element;
pub mod organization;
pub mod families;
pub mod schema;
pub mod ratings;
pub mod populate;
pub mod score;

pub use error::ModelError;
pub use schema::{Occupation, OccupationSchema};
