use crate::error::RuntimeError;
use serde::Serialize;
use serde_json::{Map, Value};

/// `SnsNotification` is the `Sns` object of an SNS record, once validated
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnsNotification {
    /// Message body, as published to the SNS topic
    pub message: String,
    /// Id assigned by SNS to the message
    pub message_id: String,
    /// Optional subject line
    pub subject: Option<String>,
    /// Topic the message was published to
    pub topic_arn: String,
    /// Publication time, as sent by SNS
    pub timestamp: String,
}

/// `SnsRecord` represents a single record of the event delivered by SNS
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SnsRecord {
    /// Event source, `aws:sns` unless stated otherwise
    pub event_source: String,
    /// Envelope version
    pub event_version: String,
    /// Subscription that delivered the record
    pub event_subscription_arn: String,
    /// Notification carried by the record
    pub sns: SnsNotification,
}

/// `ExtractedMessage` holds the fields of the first record relayed to Pub/Sub
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedMessage {
    /// Raw message body
    pub message: String,
    /// SNS message id
    pub message_id: String,
    /// Subject, empty when the notification has none
    pub subject: String,
    /// The validated notification object
    pub payload: Value,
    /// Message body decoded as a JSON object, if it is one.
    /// Bodies holding a JSON scalar or array are only kept in `message`.
    pub parsed_message: Option<Map<String, Value>>,
}

/// Collects every field-level problem found while walking the event,
/// so a single error can report all of them.
#[derive(Default)]
struct Validator {
    errors: Vec<String>,
}

impl Validator {
    fn fail(&mut self, path: &str, reason: &str) {
        self.errors.push(format!("{path}: {reason}"));
    }

    fn object<'v>(&mut self, value: Option<&'v Value>, path: &str) -> Option<&'v Map<String, Value>> {
        match value {
            Some(Value::Object(map)) => Some(map),
            Some(_) => {
                self.fail(path, "expected an object");
                None
            }
            None => {
                self.fail(path, "missing field");
                None
            }
        }
    }

    fn string(&mut self, parent: &Map<String, Value>, parent_path: &str, key: &str) -> String {
        let path = format!("{parent_path}.{key}");
        match parent.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                self.fail(&path, "expected a string");
                String::new()
            }
            None => {
                self.fail(&path, "missing field");
                String::new()
            }
        }
    }

    fn optional_string(
        &mut self,
        parent: &Map<String, Value>,
        parent_path: &str,
        key: &str,
    ) -> Option<String> {
        match parent.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(_) => {
                self.fail(&format!("{parent_path}.{key}"), "expected a string");
                None
            }
        }
    }

    fn finish<T>(self, value: T) -> Result<T, RuntimeError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(RuntimeError::InvalidEvent(self.errors.join("; ")))
        }
    }
}

impl SnsRecord {
    /// Validate the first record of an SNS event.
    /// Any other record in the event is ignored.
    pub fn first_from_event(event: &Value) -> Result<SnsRecord, RuntimeError> {
        let mut v = Validator::default();

        let records = match event.get("Records") {
            Some(Value::Array(records)) if !records.is_empty() => records,
            Some(Value::Array(_)) => {
                v.fail("Records", "expected at least one record");
                return v.finish(SnsRecord::default());
            }
            Some(_) => {
                v.fail("Records", "expected an array");
                return v.finish(SnsRecord::default());
            }
            None => {
                v.fail("Records", "missing field");
                return v.finish(SnsRecord::default());
            }
        };

        let path = "Records[0]";
        let record = match v.object(records.first(), path) {
            Some(record) => record,
            None => return v.finish(SnsRecord::default()),
        };

        let event_source = v
            .optional_string(record, path, "EventSource")
            .unwrap_or_else(|| "aws:sns".into());
        let event_version = v.string(record, path, "EventVersion");
        let event_subscription_arn = v.string(record, path, "EventSubscriptionArn");

        let sns_path = format!("{path}.Sns");
        let sns = match v.object(record.get("Sns"), &sns_path) {
            Some(sns) => SnsNotification {
                message: v.string(sns, &sns_path, "Message"),
                message_id: v.string(sns, &sns_path, "MessageId"),
                subject: v.optional_string(sns, &sns_path, "Subject"),
                topic_arn: v.string(sns, &sns_path, "TopicArn"),
                timestamp: v.string(sns, &sns_path, "Timestamp"),
            },
            None => SnsNotification::default(),
        };

        v.finish(SnsRecord {
            event_source,
            event_version,
            event_subscription_arn,
            sns,
        })
    }
}

/// Validate an SNS event and extract the fields relayed to Pub/Sub
/// from its first record.
#[tracing::instrument(skip(event))]
pub fn extract_message(event: &Value) -> Result<ExtractedMessage, RuntimeError> {
    let record = SnsRecord::first_from_event(event)?;
    let payload = serde_json::to_value(&record.sns)?;
    let sns = record.sns;

    let parsed_message = match serde_json::from_str::<Value>(&sns.message) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            tracing::info!("message is valid JSON but not an object, keeping as string");
            None
        }
        Err(_) => {
            tracing::info!("message is not valid JSON, keeping as string");
            None
        }
    };

    Ok(ExtractedMessage {
        message: sns.message,
        message_id: sns.message_id,
        subject: sns.subject.unwrap_or_default(),
        payload,
        parsed_message,
    })
}
