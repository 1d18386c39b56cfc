//! Template orchestration: list, install, uninstall, help and project generation
//!
//! Each operation is a short sequence of tool invocations. Failures the tool
//! reports in prose are classified with the configured marker catalog.

use super::info::{catalog_from_listing, difference, TemplateCatalog};
use super::options::{is_valid_project_name, ProjectOptions};
use crate::archive::PackagerRegistry;
use crate::config::{Diagnosis, ServiceConfig};
use crate::error::ServiceError;
use crate::parse::{extract, ErrorMarker, Extraction, Fragment};
use crate::runtime::{CommandExecutor, CommandResult, CommandSpec};
use crate::scratch::ScratchDir;
use std::time::Instant;
use tracing::{debug, info};

/// Prefix of per-request scratch directory names
const SCRATCH_PREFIX: &str = "toolservice-";

/// A generated project, ready to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectArchive {
    /// Suggested download name, e.g. `Sample.zip`
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Drives the template tool through a `CommandExecutor`
pub struct TemplateService<E> {
    config: ServiceConfig,
    executor: E,
    packagers: PackagerRegistry,
}

impl<E: CommandExecutor> TemplateService<E> {
    /// Create a service with the zip packager at the configured compression
    pub fn new(config: ServiceConfig, executor: E) -> Self {
        let packagers = PackagerRegistry::with_compression(config.compression);
        Self {
            config,
            executor,
            packagers,
        }
    }

    /// Replace the set of available archive formats
    pub fn with_packagers(mut self, packagers: PackagerRegistry) -> Self {
        self.packagers = packagers;
        self
    }

    pub fn packagers(&self) -> &PackagerRegistry {
        &self.packagers
    }

    /// Installed templates keyed by short name
    pub async fn list(&self) -> Result<TemplateCatalog, ServiceError> {
        let result = self.run(self.tool().arg("--list")).await?;
        if !result.success() {
            return Err(ServiceError::ToolFailed(failure_text(&result)));
        }
        let catalog = catalog_from_listing(&result.stdout);
        debug!(templates = catalog.len(), "listed templates");
        Ok(catalog)
    }

    /// Install a template pack and return the templates it added
    pub async fn install(&self, package: &str) -> Result<TemplateCatalog, ServiceError> {
        let package = check_name("package ID", package)?;

        // A reinstalled pack must still report its templates as added.
        self.run(self.tool().args(["--uninstall", package])).await?;

        let before = self.list().await?;
        let result = self.run(self.tool().args(["--install", package])).await?;
        if let Some(found) = diagnose(&result, &self.config.markers.install) {
            return Err(diagnosis_error(&found, package));
        }
        if !result.success() {
            return Err(ServiceError::ToolFailed(failure_text(&result)));
        }
        let after = self.list().await?;

        let added = difference(&after, &before);
        info!(package, added = added.len(), "installed template pack");
        Ok(added)
    }

    /// Uninstall a template pack and return the templates it removed
    pub async fn uninstall(&self, package: &str) -> Result<TemplateCatalog, ServiceError> {
        let package = check_name("package ID", package)?;

        let before = self.list().await?;
        let result = self.run(self.tool().args(["--uninstall", package])).await?;
        if let Some(found) = diagnose(&result, &self.config.markers.uninstall) {
            return Err(diagnosis_error(&found, package));
        }
        if !result.success() {
            return Err(ServiceError::ToolFailed(failure_text(&result)));
        }
        let after = self.list().await?;

        let removed = difference(&before, &after);
        info!(package, removed = removed.len(), "uninstalled template pack");
        Ok(removed)
    }

    /// The tool's help text for one template
    pub async fn help(&self, template: &str) -> Result<String, ServiceError> {
        let template = check_name("template", template)?;

        let result = self.run(self.tool().args([template, "--help"])).await?;
        if !result.success() {
            return Err(match diagnose(&result, &self.config.markers.help) {
                // Keep the tool's own sentence.
                Some(found) if *found.tag() == Diagnosis::UnknownTemplate => {
                    ServiceError::TemplateNotFound {
                        template: template.to_string(),
                        message: found.fragment.to_string(),
                    }
                }
                Some(found) => diagnosis_error(&found, template),
                None => ServiceError::ToolFailed(failure_text(&result)),
            });
        }
        Ok(result.stdout.trim().to_string())
    }

    /// Generate a project from `template` and package it as `packaging`
    ///
    /// `options` is a comma-separated list of `flag` or `flag=value` items.
    pub async fn generate_project(
        &self,
        template: &str,
        options: Option<&str>,
        packaging: &str,
    ) -> Result<ProjectArchive, ServiceError> {
        let started = Instant::now();
        info!(template, options, packaging, "generating project");

        let template = check_name("template", template)?;
        let options = ProjectOptions::parse(options.unwrap_or_default());
        let output = options
            .output()
            .unwrap_or(&self.config.default_output)
            .to_string();
        if !is_valid_project_name(&output) {
            return Err(ServiceError::InvalidName {
                what: "project name",
                value: output,
            });
        }
        let packager = self
            .packagers
            .lookup(packaging)
            .ok_or_else(|| ServiceError::UnknownPackaging(packaging.to_string()))?;

        let scratch = ScratchDir::create(SCRATCH_PREFIX, self.config.work_root.as_deref())
            .map_err(ServiceError::Scratch)?;
        let spec = self
            .tool()
            .arg(template)
            .arg(format!("--output={}", output))
            .args(options.switches())
            .current_dir(scratch.path());
        let result = self.run(spec).await?;

        if let Some(found) = extract(&result.stderr, &self.config.markers.generate) {
            return Err(diagnosis_error(&found, template));
        }
        if !result.success() {
            return Err(ServiceError::ToolFailed(failure_text(&result)));
        }
        if !result.stdout.contains(&self.config.created_marker) {
            return Err(ServiceError::UnexpectedOutput(
                result.stdout.trim().to_string(),
            ));
        }

        let file_name = format!("{}{}", output, packager.file_extension());
        let mime_type = packager.mime_type().to_string();
        let root = scratch.path().to_path_buf();
        let bytes = tokio::task::spawn_blocking(move || packager.pack(&root)).await??;

        info!(
            template,
            file_name = %file_name,
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated project"
        );
        Ok(ProjectArchive {
            file_name,
            mime_type,
            bytes,
        })
    }

    /// `<tool> new` with the configured deadline
    fn tool(&self) -> CommandSpec {
        CommandSpec::new(&self.config.command)
            .arg("new")
            .with_timeout(self.config.timeout())
    }

    async fn run(&self, spec: CommandSpec) -> Result<CommandResult, ServiceError> {
        Ok(self.executor.execute(&spec).await?)
    }
}

/// Trim a name and reject it if the tool would read it as a switch rather than
/// a positional argument
fn check_name<'a>(what: &'static str, value: &'a str) -> Result<&'a str, ServiceError> {
    let value = value.trim();
    if value.is_empty() || value.starts_with('-') || value.chars().any(char::is_control) {
        return Err(ServiceError::InvalidName {
            what,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Look for a known diagnostic in stderr, then stdout
fn diagnose<'m>(
    result: &CommandResult,
    markers: &'m [ErrorMarker<Diagnosis>],
) -> Option<Extraction<'m, Diagnosis>> {
    extract(&result.stderr, markers).or_else(|| extract(&result.stdout, markers))
}

/// Turn a recognized diagnostic about `subject` into a caller-facing error
fn diagnosis_error(found: &Extraction<'_, Diagnosis>, subject: &str) -> ServiceError {
    match (found.tag(), &found.fragment) {
        (Diagnosis::UnknownTemplate, _) => ServiceError::TemplateNotFound {
            template: subject.to_string(),
            message: format!("Template '{}' not found.", subject),
        },
        (Diagnosis::UnknownPackage, fragment) => ServiceError::PackageNotFound {
            package: subject.to_string(),
            message: fragment.to_string(),
        },
        (Diagnosis::NotInstalled, _) => ServiceError::NotInstalled(subject.to_string()),
        (Diagnosis::InvalidSwitch, fragment) => ServiceError::InvalidSwitch(fragment.to_string()),
        (Diagnosis::InvalidParameter, Fragment::Pair { name, value }) => {
            ServiceError::InvalidParameter {
                option: name.clone(),
                value: value.clone(),
            }
        }
        (Diagnosis::InvalidParameter, Fragment::Text(text)) => ServiceError::InvalidParameter {
            option: text.clone(),
            value: String::new(),
        },
    }
}

/// Best available description of a failed run
fn failure_text(result: &CommandResult) -> String {
    let stderr = result.stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = result.stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    format!("The template tool exited with code {}.", result.exit_code)
}
