use crate::{assertion::AssertionToken, error::RuntimeError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token Exchange grant type for a sts exchange.
pub const TOKEN_EXCHANGE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
/// Requested token type for a sts exchange.
pub const ACCESS_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:access_token";
/// Subject token type of a signed AWS `GetCallerIdentity` request.
pub const AWS4_REQUEST_TOKEN_TYPE: &str = "urn:ietf:params:aws:token-type:aws4_request";
/// Scope granted to the exchanged token.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Body of an oauth2 token exchange request.
/// Reference: https://cloud.google.com/iam/docs/reference/sts/rest/v1/TopLevel/token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeTokenRequest<'a> {
    audience: &'a str,
    grant_type: &'static str,
    subject_token: &'a str,
    requested_token_type: &'static str,
    scope: &'static str,
    subject_token_type: &'static str,
}

/// Short-lived access token returned by the GCP token exchange.
#[derive(Clone, Deserialize, PartialEq)]
pub struct GcpAccessToken {
    /// Bearer token
    pub access_token: String,
    /// Type of the issued token
    pub issued_token_type: String,
    /// Token type, `Bearer`
    pub token_type: String,
    /// Lifetime of the token in seconds
    pub expires_in: u64,
}

impl fmt::Debug for GcpAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcpAccessToken")
            .field("access_token", &"** redacted **")
            .field("issued_token_type", &self.issued_token_type)
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Exchange an AWS assertion token for a GCP access token.
#[tracing::instrument(skip(client, token))]
pub async fn exchange_token(
    client: &reqwest::Client,
    url: &str,
    audience: &str,
    token: &AssertionToken,
) -> Result<GcpAccessToken, RuntimeError> {
    tracing::info!("requesting GCP access token");

    let request = ExchangeTokenRequest {
        audience,
        grant_type: TOKEN_EXCHANGE_GRANT_TYPE,
        subject_token: token.as_str(),
        requested_token_type: ACCESS_TOKEN_TYPE,
        scope: CLOUD_PLATFORM_SCOPE,
        subject_token_type: AWS4_REQUEST_TOKEN_TYPE,
    };

    let res = client.post(url).json(&request).send().await?;
    let status = res.status();
    let body = res.text().await?;

    if status != reqwest::StatusCode::OK {
        return Err(RuntimeError::TokenExchange {
            status: status.as_u16(),
            body,
        });
    }

    let token = serde_json::from_str::<GcpAccessToken>(&body)
        .map_err(|source| RuntimeError::InvalidTokenResponse { source, body })?;

    tracing::info!(
        token_type = %token.token_type,
        expires_in = token.expires_in,
        "obtained GCP access token"
    );
    Ok(token)
}
