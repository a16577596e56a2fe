use thiserror::Error;

/// Result type alias for topic-modeling operations.
pub type Result<T> = std::result::Result<T, TopicError>;

/// Errors surfaced by the topic-modeling core.
///
/// Every variant names the pipeline stage it came from so a failed batch run
/// can be re-launched with corrected input.
#[derive(Error, Debug)]
pub enum TopicError {
    /// The caller handed the stage something it cannot work with.
    #[error("invalid input in {stage}: {reason}")]
    InvalidInput { stage: &'static str, reason: String },

    /// Training or inference produced non-finite probabilities.
    #[error("numeric instability in {stage}: {reason}")]
    NumericInstability { stage: &'static str, reason: String },

    /// The parallel sampling pool could not be set up.
    #[error("worker pool failure in {stage}: {reason}")]
    ResourceExhaustion { stage: &'static str, reason: String },
}

impl TopicError {
    pub(crate) fn invalid_input(stage: &'static str, reason: impl Into<String>) -> Self {
        TopicError::InvalidInput {
            stage,
            reason: reason.into(),
        }
    }

    pub(crate) fn numeric(stage: &'static str, reason: impl Into<String>) -> Self {
        TopicError::NumericInstability {
            stage,
            reason: reason.into(),
        }
    }

    pub(crate) fn workers(stage: &'static str, reason: impl Into<String>) -> Self {
        TopicError::ResourceExhaustion {
            stage,
            reason: reason.into(),
        }
    }
}
