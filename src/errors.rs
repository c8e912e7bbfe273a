use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomatorError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Element detached from page: {0}")]
    ElementDetached(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Page operation failed: {0}")]
    PageFailed(String),

    #[error("No status listener")]
    NoListener,

    #[error("Engine stopped")]
    EngineStopped,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AutomatorError>;

/// Failures that end a run. The display strings are what the control panel
/// shows to the user, so they are part of the wire contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("Input not found")]
    InputNotFound,

    #[error("Generate button not found")]
    ButtonNotFound,

    #[error("Failed to enter prompt")]
    SubmissionFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_error_messages_match_panel_text() {
        assert_eq!(RunError::InputNotFound.to_string(), "Input not found");
        assert_eq!(
            RunError::ButtonNotFound.to_string(),
            "Generate button not found"
        );
        assert_eq!(
            RunError::SubmissionFailed.to_string(),
            "Failed to enter prompt"
        );
    }
}
