use crate::{
    config::InvocationConfig,
    error::RuntimeError,
    sts::{self, TemporaryAwsCredentials},
};
use aws_sdk_sts::Client;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

const STS_HOST: &str = "sts.amazonaws.com";
const CALLER_IDENTITY_QUERY: &str = "Action=GetCallerIdentity&Version=2011-06-15";
const TARGET_RESOURCE_HEADER: &str = "x-goog-cloud-target-resource";

// GCP only accepts assertions signed for the global STS endpoint.
const SIGNING_REGION: &str = "us-east-1";
const SIGNING_SERVICE: &str = "sts";
const SIGNING_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Characters left as-is in the encoded token. Everything else,
/// JSON punctuation included, is percent-encoded.
const TOKEN_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// A single header of the signed request
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Header {
    /// Header name, as sent
    pub key: String,
    /// Header value
    pub value: String,
}

/// `SignedRequest` describes the `GetCallerIdentity` call GCP replays to
/// verify the caller's AWS identity. Changing any of its fields after
/// signing invalidates the signature.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SignedRequest {
    /// Request URL, including the action query
    pub url: String,
    /// HTTP method
    pub method: String,
    /// Headers in the order they were added, signature included
    pub headers: Vec<Header>,
}

/// Percent-encoded, serialized [`SignedRequest`], used as the
/// subject token of the GCP token exchange.
#[derive(Clone, PartialEq)]
pub struct AssertionToken(pub(crate) String);

impl AssertionToken {
    /// The encoded token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AssertionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AssertionToken(** redacted **)")
    }
}

impl SignedRequest {
    /// Serialize the request into a transport-safe token.
    pub fn to_token(&self) -> Result<AssertionToken, RuntimeError> {
        let json = serde_json::to_string(self)?;
        Ok(AssertionToken(
            utf8_percent_encode(&json, TOKEN_ENCODE_SET).to_string(),
        ))
    }
}

fn hmac_sha256(key: &[u8], data: &str) -> Result<Vec<u8>, RuntimeError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|err| RuntimeError::Signing(err.to_string()))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Derive the SigV4 signing key for a date, region and service.
fn signing_key(
    secret_access_key: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, RuntimeError> {
    let k_date = hmac_sha256(format!("AWS4{secret_access_key}").as_bytes(), date)?;
    let k_region = hmac_sha256(&k_date, region)?;
    let k_service = hmac_sha256(&k_region, service)?;
    hmac_sha256(&k_service, "aws4_request")
}

/// Canonical request of an empty-bodied POST to the STS root path.
/// Returns the canonical request and the signed header list.
fn canonical_request(headers: &[Header]) -> (String, String) {
    let mut canonical: Vec<(String, &str)> = headers
        .iter()
        .map(|h| (h.key.to_lowercase(), h.value.trim()))
        .collect();
    canonical.sort();

    let canonical_headers: String = canonical
        .iter()
        .map(|(key, value)| format!("{key}:{value}\n"))
        .collect();
    let signed_headers = canonical
        .iter()
        .map(|(key, _)| key.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let request = format!(
        "POST\n/\n{CALLER_IDENTITY_QUERY}\n{canonical_headers}\n{signed_headers}\n{}",
        sha256_hex(b"")
    );
    (request, signed_headers)
}

/// Build and sign, with AWS Signature Version 4, the `GetCallerIdentity`
/// request scoped to the given workload identity pool provider.
pub fn sign_caller_identity_request(
    credentials: &TemporaryAwsCredentials,
    target_resource: &str,
    now: DateTime<Utc>,
) -> Result<SignedRequest, RuntimeError> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();

    let mut headers = vec![
        Header {
            key: "Host".into(),
            value: STS_HOST.into(),
        },
        Header {
            key: TARGET_RESOURCE_HEADER.into(),
            value: target_resource.into(),
        },
        Header {
            key: "X-Amz-Date".into(),
            value: amz_date.clone(),
        },
        Header {
            key: "X-Amz-Security-Token".into(),
            value: credentials.session_token.clone(),
        },
    ];

    let (request, signed_headers) = canonical_request(&headers);
    let scope = format!("{date}/{SIGNING_REGION}/{SIGNING_SERVICE}/aws4_request");
    let string_to_sign = format!(
        "{SIGNING_ALGORITHM}\n{amz_date}\n{scope}\n{}",
        sha256_hex(request.as_bytes())
    );

    let key = signing_key(
        &credentials.secret_access_key,
        &date,
        SIGNING_REGION,
        SIGNING_SERVICE,
    )?;
    let signature = hex::encode(hmac_sha256(&key, &string_to_sign)?);

    headers.push(Header {
        key: "Authorization".into(),
        value: format!(
            "{SIGNING_ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            credentials.access_key_id
        ),
    });

    Ok(SignedRequest {
        url: format!("https://{STS_HOST}/?{CALLER_IDENTITY_QUERY}"),
        method: "POST".into(),
        headers,
    })
}

/// Assume the configured role and turn its credentials into
/// an assertion token for the configured pool provider.
#[tracing::instrument(skip(client, config))]
pub async fn create_assertion_token(
    client: &Client,
    config: &InvocationConfig,
) -> Result<AssertionToken, RuntimeError> {
    let credentials =
        sts::assume_role(client, &config.role_arn, &config.role_session_name).await?;

    let request = sign_caller_identity_request(&credentials, &config.audience(), Utc::now())?;
    tracing::info!("signed caller identity request");

    request.to_token()
}
