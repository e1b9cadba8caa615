//! sheetmark-backends — record stores and sheet recognizers.
//!
//! Implements `RecordStore` over memory and a JSON file, and
//! `SheetRecognizer` as a simulated OCR stand-in and a sidecar-file reader,
//! plus the configuration that picks between them.

pub mod config;
pub mod json_file;
pub mod memory;
pub mod sidecar;
pub mod simulated;

pub use config::{create_recognizer, load_config, RecognizerConfig, SheetmarkConfig};
pub use json_file::{JsonFileStore, StoreDocument};
pub use memory::InMemoryStore;
pub use sidecar::SidecarRecognizer;
pub use simulated::SimulatedRecognizer;
