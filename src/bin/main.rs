#![recursion_limit = "256"]

use aws_sdk_sts::Client as StsClient;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use sns_pubsub_relay::handle_event;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .with_target(false)
        .init();

    // Get AWS Configuration
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let sts_client = StsClient::new(&config);
    let http_client = reqwest::Client::new();

    run(service_fn(|event: LambdaEvent<Value>| {
        handle_event(&sts_client, &http_client, event)
    }))
    .await
}
