//! Service configuration
//!
//! Loaded from an optional YAML file; every field has a default, so an empty
//! file (or no file) yields a working configuration for `dotnet new`.

use crate::archive::CompressionLevel;
use crate::parse::{ErrorMarker, ExtractionShape};
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the tool executable
pub const COMMAND_ENV: &str = "TOOLSERVICE_COMMAND";

const DEFAULT_COMMAND: &str = "dotnet";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_OUTPUT: &str = "Sample";
const DEFAULT_CREATED_MARKER: &str = " was created successfully.";

/// What a recognized diagnostic means for the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
    UnknownTemplate,
    UnknownPackage,
    NotInstalled,
    InvalidSwitch,
    InvalidParameter,
}

/// Ordered diagnostic markers for each tool operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerCatalog {
    pub help: Vec<ErrorMarker<Diagnosis>>,
    pub install: Vec<ErrorMarker<Diagnosis>>,
    pub uninstall: Vec<ErrorMarker<Diagnosis>>,
    pub generate: Vec<ErrorMarker<Diagnosis>>,
}

impl Default for MarkerCatalog {
    fn default() -> Self {
        use ExtractionShape::*;

        Self {
            help: vec![
                ErrorMarker::new("No templates found", ToNextNewline, Diagnosis::UnknownTemplate)
                    .keep_marker(),
            ],
            install: vec![ErrorMarker::new(
                "error NU1101: ",
                ToNextNewline,
                Diagnosis::UnknownPackage,
            )],
            uninstall: vec![ErrorMarker::new(
                "Could not find something to uninstall",
                ToNextNewline,
                Diagnosis::NotInstalled,
            )],
            generate: vec![
                ErrorMarker::new("No templates found", ToNextNewline, Diagnosis::UnknownTemplate),
                ErrorMarker::new("Invalid option(s)", TokenAfterDoubleDash, Diagnosis::InvalidSwitch),
                ErrorMarker::new(
                    "Invalid input switch:",
                    TokenAfterDoubleDash,
                    Diagnosis::InvalidSwitch,
                ),
                ErrorMarker::new(
                    "Error: Invalid parameter(s):",
                    NameValuePair,
                    Diagnosis::InvalidParameter,
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// External tool executable (name on PATH or full path)
    pub command: String,

    /// Per-invocation deadline in seconds; 0 waits forever, null means the default
    #[serde(deserialize_with = "timeout_or_default")]
    pub timeout_secs: u64,

    /// Project name used when the caller gives no `output` option
    pub default_output: String,

    /// Parent directory for per-request scratch directories
    pub work_root: Option<PathBuf>,

    /// Compression for generated archives
    pub compression: CompressionLevel,

    /// Text the tool prints when a project was generated
    pub created_marker: String,

    pub markers: MarkerCatalog,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_output: DEFAULT_OUTPUT.to_string(),
            work_root: None,
            compression: CompressionLevel::default(),
            created_marker: DEFAULT_CREATED_MARKER.to_string(),
            markers: MarkerCatalog::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from `path` (defaults when `None`), then apply `TOOLSERVICE_COMMAND`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.override_command(std::env::var(COMMAND_ENV).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Invalid service configuration")
    }

    /// Replace the tool command when `command` is set and non-blank
    pub fn override_command(&mut self, command: Option<String>) {
        if let Some(command) = command.filter(|c| !c.trim().is_empty()) {
            self.command = command.trim().to_string();
        }
    }

    /// Deadline applied to every tool invocation
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn timeout_or_default<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(DEFAULT_TIMEOUT_SECS))
}
