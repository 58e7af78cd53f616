use crate::{
    assertion::AssertionToken, config::InvocationConfig, sts::TemporaryAwsCredentials,
    token_exchange::GcpAccessToken,
};
use aws_sdk_sts::config::{BehaviorVersion, Credentials, Region};
use aws_smithy_runtime::client::http::test_util::StaticReplayClient;
use aws_smithy_types::body::SdkBody;
use serde_json::{json, Value};

pub const MOCK_ROLE_ARN: &str = "arn:aws:iam::123456789012:role/pubsub-relay";

pub const REQUIRED_KEYS: [&str; 7] = [
    "project_number",
    "pool_id",
    "provider_id",
    "role_arn",
    "role_session_name",
    "pubsub_topic_name",
    "gcp_project_id",
];

pub const ASSUME_ROLE_RESPONSE: &str = r#"<AssumeRoleResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <AssumeRoleResult>
    <AssumedRoleUser>
      <AssumedRoleId>AROAEXAMPLEID:relay-session</AssumedRoleId>
      <Arn>arn:aws:sts::123456789012:assumed-role/pubsub-relay/relay-session</Arn>
    </AssumedRoleUser>
    <Credentials>
      <AccessKeyId>ASIAEXAMPLEKEY</AccessKeyId>
      <SecretAccessKey>secretexamplekey</SecretAccessKey>
      <SessionToken>session-token-example</SessionToken>
      <Expiration>2030-01-01T00:00:00Z</Expiration>
    </Credentials>
  </AssumeRoleResult>
  <ResponseMetadata>
    <RequestId>c6104cbe-af31-11e0-8154-cbc7ccf896c7</RequestId>
  </ResponseMetadata>
</AssumeRoleResponse>"#;

pub const ACCESS_DENIED_RESPONSE: &str = r#"<ErrorResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <Error>
    <Type>Sender</Type>
    <Code>AccessDenied</Code>
    <Message>User is not authorized to perform: sts:AssumeRole</Message>
  </Error>
  <RequestId>c6104cbe-af31-11e0-8154-cbc7ccf896c7</RequestId>
</ErrorResponse>"#;

/// STS client answering with the given replay connection
pub fn get_mock_sts_client(conn: StaticReplayClient) -> aws_sdk_sts::Client {
    let config = aws_sdk_sts::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-west-1"))
        .credentials_provider(Credentials::new(
            "accesskey",
            "privatekey",
            None,
            None,
            "dummy",
        ))
        .http_client(conn)
        .build();
    aws_sdk_sts::Client::from_conf(config)
}

/// Base request builder for the AWS SDK calls
pub fn get_request_builder(service: &str) -> http::request::Builder {
    http::Request::builder().uri(format!("https://{service}.us-west-1.amazonaws.com/"))
}

pub fn assume_role_request_body() -> SdkBody {
    SdkBody::from(
        "Action=AssumeRole&Version=2011-06-15\
         &RoleArn=arn%3Aaws%3Aiam%3A%3A123456789012%3Arole%2Fpubsub-relay\
         &RoleSessionName=relay-session",
    )
}

pub fn assume_role_response() -> http::Response<SdkBody> {
    http::Response::builder()
        .status(200)
        .body(SdkBody::from(ASSUME_ROLE_RESPONSE))
        .unwrap()
}

/// Environment of a correctly configured function
pub fn get_mock_vars() -> Vec<(String, String)> {
    [
        ("project_number", "123456789"),
        ("pool_id", "aws-pool"),
        ("provider_id", "aws-provider"),
        ("role_arn", MOCK_ROLE_ARN),
        ("role_session_name", "relay-session"),
        ("pubsub_topic_name", "sns-events"),
        ("gcp_project_id", "gcp-project"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn get_mock_config() -> InvocationConfig {
    InvocationConfig::from_vars(get_mock_vars()).unwrap()
}

pub fn get_mock_credentials() -> TemporaryAwsCredentials {
    TemporaryAwsCredentials {
        access_key_id: "ASIAEXAMPLEKEY".into(),
        secret_access_key: "secretexamplekey".into(),
        session_token: "session-token-example".into(),
    }
}

pub fn get_mock_assertion_token() -> AssertionToken {
    AssertionToken("%7B%7D".into())
}

pub fn get_mock_access_token() -> GcpAccessToken {
    GcpAccessToken {
        access_token: "an_example_token".into(),
        issued_token_type: "urn:ietf:params:oauth:token-type:access_token".into(),
        token_type: "Bearer".into(),
        expires_in: 3600,
    }
}

/// SNS event with a single record
pub fn get_mock_event(message: &str, subject: Option<&str>) -> Value {
    json!({
        "Records": [
            {
                "EventVersion": "1.0",
                "EventSubscriptionArn": "arn:aws:sns:us-east-1:123456789012:sns-lambda:21be56ed-a058-49f5-8c98-aedd2564c486",
                "EventSource": "aws:sns",
                "Sns": {
                    "SignatureVersion": "1",
                    "Timestamp": "2019-01-02T12:45:07.000Z",
                    "Signature": "tcc6faL2yUC6dgZdmrwh1Y4cGa/ebXEkAi6RibDsvpi+tE/1+82j...65r==",
                    "SigningCertUrl": "https://sns.us-east-1.amazonaws.com/SimpleNotificationService-ac565b8b1a6c5d002d285f9598aa1d9b.pem",
                    "MessageId": "95df01b4-ee98-5cb9-9903-4c221d41eb5e",
                    "Message": message,
                    "MessageAttributes": {},
                    "Type": "Notification",
                    "UnsubscribeUrl": "https://sns.us-east-1.amazonaws.com/?Action=Unsubscribe&amp;SubscriptionArn=arn:aws:sns:us-east-1:123456789012:test-lambda:21be56ed-a058-49f5-8c98-aedd2564c486",
                    "TopicArn": "arn:aws:sns:us-east-1:123456789012:sns-lambda",
                    "Subject": subject
                }
            }
        ]
    })
}
