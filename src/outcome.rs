use crate::error::RuntimeError;
use serde::Serialize;

/// `PublishOutcome` is the normalized result returned to the Lambda caller,
/// whatever stage of the relay succeeded or failed.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutcome {
    /// Whether the message reached Pub/Sub
    pub success: bool,
    /// HTTP-like status code describing the result
    pub status_code: u16,
    /// Ids assigned by Pub/Sub to the published messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_ids: Option<Vec<String>>,
    /// Human readable failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PublishOutcome {
    /// Successful publish with the ids returned by Pub/Sub.
    pub fn success(message_ids: Vec<String>) -> PublishOutcome {
        PublishOutcome {
            success: true,
            status_code: 200,
            message_ids: Some(message_ids),
            message: None,
        }
    }
}

impl From<RuntimeError> for PublishOutcome {
    fn from(err: RuntimeError) -> Self {
        let message = match &err {
            RuntimeError::Http(_) | RuntimeError::Serialization(_) => {
                format!("Internal error: {err}")
            }
            RuntimeError::MissingConfig(_)
            | RuntimeError::InvalidConfig(_)
            | RuntimeError::AssumeRoleFailure(_)
            | RuntimeError::MissingCredentials
            | RuntimeError::Signing(_) => format!("Lambda execution failed: {err}"),
            _ => err.to_string(),
        };

        PublishOutcome {
            success: false,
            status_code: err.status_code(),
            message_ids: None,
            message: Some(message),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_success() {
        let outcome = PublishOutcome::success(vec!["m1".into()]);
        assert_eq!(
            json!({"success": true, "statusCode": 200, "messageIds": ["m1"]}),
            serde_json::to_value(&outcome).unwrap()
        );
    }

    #[test]
    fn test_failure_from_error() {
        let outcome = PublishOutcome::from(RuntimeError::Publish {
            status: 404,
            body: "topic not found".into(),
        });
        assert!(!outcome.success);
        assert_eq!(404, outcome.status_code);
        assert_eq!(None, outcome.message_ids);
        assert_eq!(
            json!({
                "success": false,
                "statusCode": 404,
                "message": "Pub/Sub API call failed: 404 - topic not found"
            }),
            serde_json::to_value(&outcome).unwrap()
        );
    }

    #[test]
    fn test_missing_config_names_key() {
        let outcome = PublishOutcome::from(RuntimeError::MissingConfig("role_arn".into()));
        assert_eq!(500, outcome.status_code);
        assert!(outcome.message.unwrap().contains("role_arn"));
    }
}
