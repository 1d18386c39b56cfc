//! Template operations on top of the scaffolding tool
//!
//! This module provides:
//! - Template records parsed from the tool's listing
//! - Translation of caller options into tool switches
//! - `TemplateService`, which sequences tool runs for each operation

pub mod info;
pub mod options;
pub mod service;

pub use info::{catalog_from_listing, difference, TemplateCatalog, TemplateInfo};
pub use options::{is_valid_project_name, ProjectOptions};
pub use service::{ProjectArchive, TemplateService};
