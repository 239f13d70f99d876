use thiserror::Error;

/// Main error type for the slideshow compositor
#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal outcome after the single fallback attempt also failed
    #[error("Render failed: {cause} (fallback: {fallback})")]
    RenderFailed {
        cause: Box<CompositorError>,
        fallback: Box<CompositorError>,
    },

    #[error("Render request cancelled")]
    Cancelled,

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Schedule fitting errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Infeasible schedule: {reason}")]
    Infeasible { reason: String },
}

/// Transition vocabulary errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    #[error("No transition available (requested: {requested:?})")]
    NoTransitionAvailable { requested: Vec<String> },
}

/// External renderer and artifact validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Renderer execution failed: {reason}")]
    ExecutionFailed { reason: String },

    #[error("Renderer timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("Output does not match plan: {details}")]
    ValidationMismatch { details: String },

    #[error("Measurement failed for {path}: {reason}")]
    MeasurementFailed { path: String, reason: String },

    #[error("Capability probe failed: {reason}")]
    ProbeFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using CompositorError
pub type Result<T> = std::result::Result<T, CompositorError>;

impl CompositorError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    pub(crate) fn infeasible<S: Into<String>>(reason: S) -> Self {
        ScheduleError::Infeasible { reason: reason.into() }.into()
    }

    /// Check if this error is recovered by the single hard-cut fallback.
    ///
    /// Other errors end the request without a fallback attempt.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Schedule(_) | Self::Transition(_) | Self::Render(_) | Self::Config(_)
        )
    }

    /// The error that started the failure chain.
    ///
    /// For an aggregated [`CompositorError::RenderFailed`] this is the error
    /// raised by the full-effects attempt, not the fallback's.
    pub fn root_cause(&self) -> &CompositorError {
        match self {
            Self::RenderFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Schedule(ScheduleError::Infeasible { reason }) => {
                format!("Could not fit the images into the requested duration: {}", reason)
            }
            Self::Render(RenderError::TimedOut { seconds }) => {
                format!("ffmpeg did not finish within {} seconds. Try a shorter video or raise renderer.timeout_secs.", seconds)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            Self::RenderFailed { cause, .. } => {
                format!("Rendering failed even after falling back to hard cuts. Original cause: {}", cause)
            }
            _ => self.to_string(),
        }
    }
}
