use anyhow::{anyhow, Result};
use aws_lambda_events::event::s3::S3Event;
use aws_sdk_s3::Client;
use lambda_runtime::{run, service_fn, LambdaEvent};
use s3_thumbnailer::app::App;
use s3_thumbnailer::client;

/// Handle each S3 event record, storing a thumbnail for every image.
/// Failing records are logged and dropped, so the invocation itself
/// succeeds.
async fn function_handler(app: &App, client: &Client, event: LambdaEvent<S3Event>) -> Result<()> {
    app.handle_event(&event.payload, client).await;
    Ok(())
}

/// Run an AWS Lambda function that listens to S3 events, pulls each
/// new image, shrinks it into a thumbnail and pushes the thumbnail to
/// the destination bucket.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();
    let app = App::from_env()?;
    let client = client::connect().await;

    let app = &app;
    let client = &client;
    run(service_fn(move |event: LambdaEvent<S3Event>| async move {
        function_handler(app, client, event).await
    }))
    .await
    .map_err(|e| anyhow!("{:?}", e))
}
