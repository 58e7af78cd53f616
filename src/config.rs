use crate::error::RuntimeError;
use serde::Deserialize;
use std::ffi::OsString;

/// Default `sts_token_url` value.
fn default_sts_token_url() -> String {
    String::from("https://sts.googleapis.com/v1/token")
}

/// Default `pubsub_endpoint` value.
fn default_pubsub_endpoint() -> String {
    String::from("https://pubsub.googleapis.com")
}

/// `InvocationConfig` holds the values the relay reads from the
/// function environment on every invocation.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct InvocationConfig {
    /// Number of the GCP project that owns the workload identity pool.
    pub project_number: String,
    /// Workload identity pool id.
    pub pool_id: String,
    /// Workload identity pool provider id.
    pub provider_id: String,
    /// AWS role assumed before signing the identity assertion.
    pub role_arn: String,
    /// Session name used when assuming `role_arn`.
    pub role_session_name: String,
    /// Pub/Sub topic receiving the messages.
    pub pubsub_topic_name: String,
    /// GCP project id that owns the topic.
    pub gcp_project_id: String,
    /// GCP security token service endpoint.
    #[serde(default = "default_sts_token_url")]
    pub sts_token_url: String,
    /// Base URL of the Pub/Sub REST API.
    #[serde(default = "default_pubsub_endpoint")]
    pub pubsub_endpoint: String,
}

fn unicode_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
}

impl InvocationConfig {
    /// Load the configuration from the process environment.
    /// Variables that are not valid unicode are skipped.
    pub fn from_env() -> Result<InvocationConfig, RuntimeError> {
        Self::from_vars(unicode_vars(std::env::vars_os()))
    }

    /// Load the configuration from a list of key/value pairs.
    /// Keys are matched case-insensitively.
    pub fn from_vars<I>(vars: I) -> Result<InvocationConfig, RuntimeError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: InvocationConfig = envy::from_iter(vars).map_err(|err| match err {
            envy::Error::MissingValue(key) => RuntimeError::MissingConfig(key.into()),
            err => RuntimeError::InvalidConfig(err),
        })?;

        let required = [
            ("project_number", &config.project_number),
            ("pool_id", &config.pool_id),
            ("provider_id", &config.provider_id),
            ("role_arn", &config.role_arn),
            ("role_session_name", &config.role_session_name),
            ("pubsub_topic_name", &config.pubsub_topic_name),
            ("gcp_project_id", &config.gcp_project_id),
        ];
        if let Some((key, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(RuntimeError::MissingConfig((*key).into()));
        }

        Ok(config)
    }

    /// Fully qualified name of the workload identity pool provider.
    /// It's both the target resource of the AWS assertion and the
    /// audience of the token exchange.
    pub fn audience(&self) -> String {
        format!(
            "//iam.googleapis.com/projects/{}/locations/global/workloadIdentityPools/{}/providers/{}",
            self.project_number, self.pool_id, self.provider_id
        )
    }

    /// Publish endpoint for the configured topic.
    pub fn publish_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/topics/{}:publish",
            self.pubsub_endpoint.trim_end_matches('/'),
            self.gcp_project_id,
            self.pubsub_topic_name
        )
    }
}
