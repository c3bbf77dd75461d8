use anyhow::{bail, Context, Result};
use s3_thumbnailer::app::App;
use s3_thumbnailer::client;
use s3_thumbnailer::record::NotificationRecord;
use std::env::{args, var};

/// Generate thumbnails for the keys given as arguments, pulled from
/// the bucket named by `SOURCE_BUCKET`, exactly as if S3 had notified
/// their arrival.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();
    let app = App::from_env()?;
    let client = client::connect().await;

    let bucket = var("SOURCE_BUCKET").context("SOURCE_BUCKET is required")?;
    let keys = args().skip(1).collect::<Vec<_>>();
    if keys.is_empty() {
        bail!("usage: command <key>...");
    }

    let total = keys.len();
    let report = app
        .handle(
            keys.into_iter()
                .map(|key| Some(NotificationRecord::new(bucket.as_str(), key))),
            &client,
        )
        .await;
    if report.failed() > 0 {
        bail!("{} out of {} records failed", report.failed(), total);
    }
    Ok(())
}
