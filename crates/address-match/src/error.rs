//! Error types for address-match

use thiserror::Error;

/// Result type alias for address-match operations
pub type Result<T> = std::result::Result<T, MatchError>;

/// Main error type for address-match operations
#[derive(Error, Debug)]
#[cfg_attr(feature = "native", derive(uniffi::Error), uniffi(flat_error))]
pub enum MatchError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Clustering errors
    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    /// Reference data errors
    #[error("Gazetteer error: {0}")]
    Gazetteer(String),
}

/// Configuration validation and parsing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Value is out of its valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// Weight set is negative or does not sum to one
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    /// JSON or TOML could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors raised by a `cluster()` call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    /// Batch exceeds the configured size limit; pre-bucket the input
    #[error("Batch of {size} addresses exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// Threshold outside [0, 1] or not finite
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(f64),

    /// The caller's checkpoint asked to stop between matrix rows
    #[error("Cancelled after {completed_rows} matrix rows")]
    Cancelled { completed_rows: usize },
}

/// Errors returned by upstream collaborators (parser, geocoder, embeddings)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    /// The collaborator is not configured or cannot serve requests
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    /// The collaborator failed for this input
    #[error("Collaborator failed: {0}")]
    Failed(String),
}

/// Failure inside a single similarity signal
///
/// Never escapes a comparison: the signal is zeroed and tagged instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    /// A computation produced NaN or infinity
    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),

    /// Embedding vectors of different lengths
    #[error("Embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// A collaborator failed mid-computation
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_error_message() {
        let err = ClusterError::BatchTooLarge { size: 10, max: 5 };
        assert_eq!(err.to_string(), "Batch of 10 addresses exceeds the limit of 5");
    }

    #[test]
    fn test_config_error_converts_to_match_error() {
        let err: MatchError = ConfigError::OutOfRange("threshold".to_string()).into();
        assert!(matches!(err, MatchError::Config(_)));
        assert!(err.to_string().contains("threshold"));
    }

    #[test]
    fn test_signal_error_from_collaborator() {
        let err: SignalError = CollaboratorError::Failed("timeout".to_string()).into();
        assert_eq!(err.to_string(), "Collaborator failed: timeout");
    }
}
