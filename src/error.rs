use thiserror::Error as ThisError;

/// Different errors that the relay can raise
#[derive(Debug, ThisError)]
pub enum RuntimeError {
    /// Error returned when a required environment variable is absent or empty
    #[error("missing required environment variable: {0}")]
    MissingConfig(String),
    /// Error returned when the environment cannot be deserialized into a config
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] envy::Error),
    /// Error returned if we cannot assume a specific role
    #[error("failed to assume role: {0}")]
    AssumeRoleFailure(#[from] aws_sdk_sts::Error),
    /// Error returned if the credentials are missing after assuming a new role
    #[error("missing credentials in assume role response")]
    MissingCredentials,
    /// Error returned if the identity assertion cannot be signed
    #[error("failed to sign caller identity request: {0}")]
    Signing(String),
    /// Error returned by the GCP token exchange endpoint
    #[error("Failed to get GCP token: {status} - {body}")]
    TokenExchange {
        /// HTTP status returned upstream
        status: u16,
        /// Response text returned upstream
        body: String,
    },
    /// Error returned if the token exchange succeeded with an unexpected body
    #[error("Invalid token response: {source}: {body}")]
    InvalidTokenResponse {
        /// Decoding failure
        source: serde_json::Error,
        /// Response text returned upstream
        body: String,
    },
    /// Error returned if the inbound event doesn't match the SNS envelope
    #[error("Invalid SNS event structure: {0}")]
    InvalidEvent(String),
    /// Error returned by the Pub/Sub publish endpoint
    #[error("Pub/Sub API call failed: {status} - {body}")]
    Publish {
        /// HTTP status returned upstream
        status: u16,
        /// Response text returned upstream
        body: String,
    },
    /// Error returned by the HTTP client
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Error returned when a payload cannot be serialized
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RuntimeError {
    /// Status code reported to the caller for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            RuntimeError::TokenExchange { status, .. } | RuntimeError::Publish { status, .. } => {
                *status
            }
            RuntimeError::InvalidTokenResponse { .. } | RuntimeError::InvalidEvent(_) => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_code() {
        let err = RuntimeError::TokenExchange {
            status: 403,
            body: "denied".into(),
        };
        assert_eq!(403, err.status_code());
        assert_eq!("Failed to get GCP token: 403 - denied", err.to_string());

        assert_eq!(400, RuntimeError::InvalidEvent("Records: missing field".into()).status_code());
        assert_eq!(500, RuntimeError::MissingConfig("pool_id".into()).status_code());
        assert_eq!(500, RuntimeError::MissingCredentials.status_code());
    }
}
