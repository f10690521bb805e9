//! Common error types used throughout jobreel.
//!
//! The variants follow how the render pipeline treats a failure: validation,
//! external-service and resource failures abort a job, while degradable and
//! quality failures are absorbed and recorded on the job's debug trace.

use crate::types::JobStatus;

/// Common error type for jobreel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A collaborator response or request was malformed or incomplete.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A network or service failure talking to an external collaborator.
    #[error("External service error [{service}]: {message}")]
    External {
        /// Name of the collaborator that failed (e.g. "llm", "generation").
        service: String,
        /// Human-readable error description.
        message: String,
    },

    /// A failure that the pipeline recovers from with a local fallback.
    #[error("Degraded [{stage}]: {message}")]
    Degraded {
        /// Stage that degraded.
        stage: String,
        /// Human-readable error description.
        message: String,
    },

    /// A local tool or filesystem resource failed.
    #[error("Resource error [{tool}]: {message}")]
    Resource {
        /// Tool or resource that failed (e.g. "ffmpeg").
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// A quality-check finding.
    #[error("Quality check: {0}")]
    Quality(String),

    /// The requested job was not found.
    #[error("Job not found: {0}")]
    NotFound(String),

    /// A job already exists under the given id.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A job status change that the state machine forbids.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: JobStatus,
        /// Requested status.
        to: JobStatus,
    },

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new Validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new External error.
    pub fn external(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::External {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new Degraded error.
    pub fn degraded(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Degraded {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a new Resource error.
    pub fn resource(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resource {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error must move the job to `ERROR`.
    ///
    /// Degradable and quality failures are recovered locally; everything
    /// else aborts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Degraded { .. } | Self::Quality(_))
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
