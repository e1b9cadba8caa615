//! sheetmark-core — Exam pattern model, choice-rule scoring and digitization.
//!
//! This crate defines the pattern data model (questions, sub-marks, choice
//! rules), the two total computations, and the per-exam digitization session
//! that binds scanned sheets to students by roll-number suffix. Persistence
//! and recognition are reached through the traits in [`traits`].

pub mod capture;
pub mod error;
pub mod model;
pub mod parser;
pub mod pattern;
pub mod rules;
pub mod scoring;
pub mod session;
pub mod traits;

pub use error::{SheetError, StoreError};
