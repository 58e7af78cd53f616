#![deny(missing_docs)]
//! <fullname>SNS to Pub/Sub relay</fullname>
//!
//! Lambda function that receives notifications from SNS
//! and republishes them to a Google Cloud Pub/Sub topic.
//! It authenticates to GCP with workload identity federation:
//! a signed AWS identity assertion is exchanged for a short-lived
//! GCP access token on every invocation.
use aws_sdk_sts::Client as StsClient;
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;

/// `assertion` builds the signed AWS identity assertion
pub mod assertion;

/// `config` loads the function configuration from the environment
pub mod config;
pub use config::InvocationConfig;

mod error;
pub use error::RuntimeError;

/// `event` validates SNS events and extracts the relayed fields
pub mod event;

mod outcome;
pub use outcome::PublishOutcome;

/// `pubsub` publishes messages to Pub/Sub
pub mod pubsub;

/// `sts` includes helpers to work with AWS STS
pub mod sts;

/// `token_exchange` trades AWS assertions for GCP access tokens
pub mod token_exchange;

#[cfg(test)]
mod test_util;

/// `handle_event` is the Lambda function entry point
/// that receives the events from SNS
#[tracing::instrument(skip(sts_client, http_client, event), fields(request_id = %event.context.request_id))]
pub async fn handle_event(
    sts_client: &StsClient,
    http_client: &reqwest::Client,
    event: LambdaEvent<Value>,
) -> Result<PublishOutcome, Error> {
    let config = InvocationConfig::from_env();
    let outcome = process_event(sts_client, http_client, config, &event.payload).await;

    tracing::info!(
        success = outcome.success,
        status_code = outcome.status_code,
        "execution completed"
    );
    Ok(outcome)
}

/// Relay one SNS event and normalize the result.
/// Failures of any stage are reported in the outcome, never returned.
pub async fn process_event(
    sts_client: &StsClient,
    http_client: &reqwest::Client,
    config: Result<InvocationConfig, RuntimeError>,
    payload: &Value,
) -> PublishOutcome {
    match relay(sts_client, http_client, config, payload).await {
        Ok(message_ids) => PublishOutcome::success(message_ids),
        Err(err) => {
            tracing::error!(error = %err, "execution failed");
            err.into()
        }
    }
}

async fn relay(
    sts_client: &StsClient,
    http_client: &reqwest::Client,
    config: Result<InvocationConfig, RuntimeError>,
    payload: &Value,
) -> Result<Vec<String>, RuntimeError> {
    let config = config?;

    let token = assertion::create_assertion_token(sts_client, &config).await?;

    let audience = config.audience();
    tracing::info!(%audience, "using audience");
    let access_token =
        token_exchange::exchange_token(http_client, &config.sts_token_url, &audience, &token)
            .await?;

    let message = event::extract_message(payload)?;

    pubsub::publish(http_client, &config.publish_url(), &message, &access_token).await
}
