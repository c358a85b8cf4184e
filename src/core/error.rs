use thiserror::Error;

use crate::adapters::transport::TransportError;

/// Error taxonomy for the client. Every kind stays distinguishable at the
/// library boundary so the CLI can map them to distinct exit codes.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Required setting {0} is not set")]
    MissingConfig(String),

    #[error("Version {version} is not a known version of model {model_id}")]
    InvalidVersion { model_id: String, version: String },

    #[error("Could not determine input type from input name {0}")]
    Classification(String),

    #[error("Cannot decode field {field}: unexpected {kind} token")]
    SchemaViolation {
        field: &'static str,
        kind: &'static str,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Job submission rejected with status {0}")]
    Submission(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
