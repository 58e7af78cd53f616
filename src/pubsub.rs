use crate::{error::RuntimeError, event::ExtractedMessage, token_exchange::GcpAccessToken};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute identifying where relayed messages come from.
pub const SOURCE_ATTRIBUTE: &str = "aws-sns";

/// `RelayedMessage` is the JSON document carried in the data of each
/// Pub/Sub message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedMessage<'a> {
    /// Raw SNS message body
    pub message: &'a str,
    /// SNS message id
    pub message_id: &'a str,
    /// SNS subject, possibly empty
    pub subject: &'a str,
    /// The SNS notification object
    pub original_payload: &'a Value,
}

/// A Pub/Sub message, as sent to the publish API
#[derive(Debug, Serialize)]
pub struct PubsubMessage {
    /// Base64 encoded payload
    pub data: String,
    /// Message attributes
    pub attributes: BTreeMap<String, String>,
}

/// Body of a Pub/Sub publish call
#[derive(Debug, Serialize)]
pub struct PublishRequest {
    /// Messages to publish
    pub messages: Vec<PubsubMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Option<Vec<String>>,
}

impl PublishRequest {
    /// Package an extracted SNS message into a single-message publish request.
    pub fn from_message(message: &ExtractedMessage) -> Result<PublishRequest, RuntimeError> {
        let data = serde_json::to_vec(&RelayedMessage {
            message: &message.message,
            message_id: &message.message_id,
            subject: &message.subject,
            original_payload: &message.payload,
        })?;

        let subject = if message.subject.is_empty() {
            "no-subject"
        } else {
            message.subject.as_str()
        };

        let attributes = BTreeMap::from([
            ("source".to_string(), SOURCE_ATTRIBUTE.to_string()),
            ("messageId".to_string(), message.message_id.clone()),
            ("subject".to_string(), subject.to_string()),
        ]);

        Ok(PublishRequest {
            messages: vec![PubsubMessage {
                data: base64::encode(data),
                attributes,
            }],
        })
    }
}

/// Publish a message to the topic behind `url`.
/// Returns the ids Pub/Sub assigned to the published messages.
#[tracing::instrument(skip(client, message, token), fields(message_id = %message.message_id))]
pub async fn publish(
    client: &reqwest::Client,
    url: &str,
    message: &ExtractedMessage,
    token: &GcpAccessToken,
) -> Result<Vec<String>, RuntimeError> {
    let request = PublishRequest::from_message(message)?;

    tracing::info!("sending message to Pub/Sub");
    let res = client
        .post(url)
        .bearer_auth(&token.access_token)
        .json(&request)
        .send()
        .await?;

    let status = res.status();
    if status != reqwest::StatusCode::OK {
        let body = res.text().await?;
        return Err(RuntimeError::Publish {
            status: status.as_u16(),
            body,
        });
    }

    let response: PublishResponse = res.json().await?;
    let message_ids = response.message_ids.unwrap_or_default();
    tracing::info!(?message_ids, "message published");

    Ok(message_ids)
}
