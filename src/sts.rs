use crate::error::RuntimeError;
use aws_sdk_sts::{Client, Error};
use std::fmt;

/// Temporary credentials returned by STS after assuming a role.
/// They only live for the duration of an invocation.
#[derive(Clone, PartialEq)]
pub struct TemporaryAwsCredentials {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Session token bound to the key pair
    pub session_token: String,
}

impl fmt::Debug for TemporaryAwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryAwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .finish()
    }
}

/// Assume the role federated with the GCP workload identity pool.
#[tracing::instrument(skip(client))]
pub async fn assume_role(
    client: &Client,
    role_arn: &str,
    session_name: &str,
) -> Result<TemporaryAwsCredentials, RuntimeError> {
    tracing::info!("assuming role");

    let assumed_role = client
        .assume_role()
        .role_arn(role_arn)
        .role_session_name(session_name)
        .send()
        .await
        .map_err(Error::from)?;

    let credentials = match assumed_role.credentials() {
        Some(creds) => creds,
        None => return Err(RuntimeError::MissingCredentials),
    };

    if let Some(user) = assumed_role.assumed_role_user() {
        tracing::info!(arn = user.arn(), "successfully assumed role");
    }

    Ok(TemporaryAwsCredentials {
        access_key_id: credentials.access_key_id().to_owned(),
        secret_access_key: credentials.secret_access_key().to_owned(),
        session_token: credentials.session_token().to_owned(),
    })
}
