//! Failures surfaced by the template service
//!
//! Every variant renders a message that is safe to show to an API caller: no
//! stack traces and no scratch paths.

use crate::archive::PackageError;
use crate::runtime::CommandError;
use std::time::Duration;
use thiserror::Error;

/// Transport-neutral failure class, for mapping onto status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    InvalidRequest,
    Unavailable,
    Timeout,
    Internal,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The tool binary could not be launched; the cause is kept for logs only
    #[error("The template tool is unavailable.")]
    ToolUnavailable(#[source] CommandError),

    #[error("The template tool did not respond within {} seconds.", .0.as_secs())]
    ToolTimeout(Duration),

    /// Reading the tool's output failed after it started
    #[error("Lost contact with the template tool.")]
    ToolIo(#[source] CommandError),

    #[error("{message}")]
    TemplateNotFound { template: String, message: String },

    #[error("{message}")]
    PackageNotFound { package: String, message: String },

    #[error("No templates with package ID '{0}' installed.")]
    NotInstalled(String),

    #[error("Switch '{0}' not found.")]
    InvalidSwitch(String),

    #[error("Option '{option}' parameter '{value}' not found.")]
    InvalidParameter { option: String, value: String },

    /// The tool failed without a recognized diagnostic; carries its raw error text
    #[error("{0}")]
    ToolFailed(String),

    /// The tool exited successfully but did not report success
    #[error("{0}")]
    UnexpectedOutput(String),

    #[error("Unknown or unsupported packaging '{0}'.")]
    UnknownPackaging(String),

    #[error("Invalid {what} '{value}'.")]
    InvalidName { what: &'static str, value: String },

    #[error("Failed to create a working directory.")]
    Scratch(#[source] std::io::Error),

    #[error("Failed to package the generated project.")]
    Packaging(#[from] PackageError),

    #[error("Packaging task failed.")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ServiceError::ToolUnavailable(_) => FailureKind::Unavailable,
            ServiceError::ToolTimeout(_) => FailureKind::Timeout,
            ServiceError::TemplateNotFound { .. }
            | ServiceError::NotInstalled(_)
            | ServiceError::InvalidSwitch(_)
            | ServiceError::InvalidParameter { .. } => FailureKind::NotFound,
            ServiceError::PackageNotFound { .. }
            | ServiceError::UnknownPackaging(_)
            | ServiceError::InvalidName { .. } => FailureKind::InvalidRequest,
            ServiceError::ToolIo(_)
            | ServiceError::ToolFailed(_)
            | ServiceError::UnexpectedOutput(_)
            | ServiceError::Scratch(_)
            | ServiceError::Packaging(_)
            | ServiceError::Task(_) => FailureKind::Internal,
        }
    }
}

impl From<CommandError> for ServiceError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Timeout { timeout, .. } => ServiceError::ToolTimeout(timeout),
            err @ CommandError::Start { .. } => ServiceError::ToolUnavailable(err),
            err @ CommandError::Io { .. } => ServiceError::ToolIo(err),
        }
    }
}
