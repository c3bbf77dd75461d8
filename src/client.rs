//! Defines object storage access: the seam the handler pulls from
//! and pushes to, and its S3 implementation.

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::env;
use std::path::Path;
use tokio::fs::File;
use tokio::io::copy;
use tracing::info;

/// Object storage as seen by the handler: whole objects moved between
/// a bucket and a local file.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    /// Downloads a single object from storage into the specified path.
    async fn download(&self, bucket: &str, key: &str, path: &Path) -> Result<()>;

    /// Uploads the file at the specified path as a single object.
    async fn upload(&self, bucket: &str, path: &Path, key: &str) -> Result<()>;
}

impl ObjectStore for Client {
    async fn download(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let mut body = self
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to download object {:?} from bucket {:?}",
                    key, bucket
                )
            })?
            .body
            .into_async_read();
        let mut file = File::create(path).await.with_context(|| {
            format!(
                "Failed to create local file {:?} to hold remote object {:?} from bucket {:?}",
                path, key, bucket
            )
        })?;
        copy(&mut body, &mut file).await.with_context(|| {
            format!(
                "Failed to save the contents of remote object {:?} from bucket {:?} \
                 into local file {:?}",
                key, bucket, path
            )
        })?;
        Ok(())
    }

    async fn upload(&self, bucket: &str, path: &Path, key: &str) -> Result<()> {
        let body = ByteStream::from_path(path).await.with_context(|| {
            format!(
                "Failed to load contents of local file {:?} for upload",
                path
            )
        })?;
        self.put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to upload local file {:?} to remote object {:?} in bucket {:?}",
                    path, key, bucket
                )
            })?;
        Ok(())
    }
}

/// Build an S3 client from the ambient AWS configuration. An
/// `AWS_ENDPOINT_URL` variable points the client at an S3-compatible
/// store instead, addressed with path-style requests.
pub async fn connect() -> Client {
    let loader = aws_config::defaults(BehaviorVersion::latest());
    match env::var("AWS_ENDPOINT_URL") {
        Ok(endpoint_url) => {
            let endpoint_url =
                if endpoint_url.starts_with("http://") || endpoint_url.starts_with("https://") {
                    endpoint_url
                } else {
                    format!("https://{}", endpoint_url)
                };
            info!("Using S3 endpoint {}", endpoint_url);
            let sdk_config = loader
                .endpoint_url(endpoint_url)
                .region(Region::new("us-east-1")) // should be OK since the endpoint was overridden
                .load()
                .await;
            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(true)
                .build();
            Client::from_conf(s3_config)
        }
        Err(_) => Client::new(&loader.load().await),
    }
}
