//! Parsing of the external tool's human-oriented output
//!
//! - `table`: fixed-width listings (template lists)
//! - `diagnostics`: marker-driven extraction of error fragments

pub mod diagnostics;
pub mod table;

pub use diagnostics::{extract, ErrorMarker, Extraction, ExtractionShape, Fragment};
pub use table::{parse as parse_table, Column, TableLayout, TableRecord};
