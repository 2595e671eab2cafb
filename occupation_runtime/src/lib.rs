#![forbid(unsafe_code)]

//! Occupation runtime.
//!
//! Wraps the pure occupation model with file-format readers, the reference
//! catalog, rating ingestion, the population run, persisted snapshots and
//! schema drift checks.
//!
//! No measurement logic lives here: validation, population and scoring
//! are delegated to the model crate.

pub mod error;
pub mod tabular;
pub mod reference;
pub mod scale_schema;
pub mod mapping;
pub mod config;
pub mod catalog;
pub mod ingest;
pub mod proto_types;
pub mod proto_bridge;
pub mod snapshot_store;
pub mod snapshot;
pub mod drift;
pub mod run;
