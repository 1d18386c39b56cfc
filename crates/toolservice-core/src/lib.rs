//! Toolservice Core - Driving a template-scaffolding CLI and packaging its output
//!
//! The library wraps a command-line template tool (by default `dotnet new`) so
//! its templates can be listed, installed, uninstalled, described and turned
//! into downloadable project archives.
//!
//! # Architecture
//!
//! - **Runtime** - `CommandExecutor` port and the `tokio::process` implementation
//! - **Parsing** - column-aligned listings and marker-driven diagnostics
//! - **Archive** - pluggable packagers keyed by name (`zip` built in)
//! - **Templates** - `TemplateService`, which sequences tool runs per operation
//!
//! # Example Usage
//!
//! ```ignore
//! use toolservice_core::{ProcessExecutor, ServiceConfig, TemplateService};
//!
//! let service = TemplateService::new(ServiceConfig::load(None)?, ProcessExecutor::new());
//! let templates = service.list().await?;
//! let project = service.generate_project("webapi", Some("output=Joe"), "zip").await?;
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod parse;
pub mod runtime;
pub mod scratch;
pub mod templates;

// Re-export main types for convenience
pub use archive::{CompressionLevel, PackageError, Packager, PackagerRegistry, ZipPackager};
pub use config::{Diagnosis, MarkerCatalog, ServiceConfig, COMMAND_ENV};
pub use error::{FailureKind, ServiceError};
pub use runtime::{CommandError, CommandExecutor, CommandResult, CommandSpec, ProcessExecutor};
pub use templates::{ProjectArchive, TemplateCatalog, TemplateInfo, TemplateService};
