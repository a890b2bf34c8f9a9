//! Value and wire types for the locus positioning session.
//!
//! This crate contains the serde-serializable types exchanged between the
//! session coordinator, the positioning service seams, and observers. They
//! represent the "protocol layer": the shapes of data as they cross a
//! boundary.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: Validation at construction, no behavior beyond that
//! * Boundary-shaped: Match what the positioning service reports
//! * Stable: Changes only when a boundary format changes
//!
//! Session behavior is built on top of these types in `locus-rs`.

pub mod activity;
pub mod config;
pub mod position;

pub use activity::*;
pub use config::*;
pub use position::*;
