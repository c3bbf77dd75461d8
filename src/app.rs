//! Defines the read-only application state and the notification
//! handler.

use crate::client::ObjectStore;
use crate::conf::Settings;
use crate::error::ProcessError;
use crate::outcome::{BatchReport, Outcome, SkipReason};
use crate::record::{self, NotificationRecord, ThumbnailTask, THUMBNAIL_PREFIX};
use crate::thumbnail::{self, BoxSize};
use anyhow::{bail, Context, Result};
use aws_lambda_events::event::s3::S3Event;
use tracing::{error, info, instrument};

/// Key suffixes considered images, matched case-insensitively. A
/// leading dot is not required.
const IMAGE_SUFFIXES: [&str; 3] = ["jpg", "jpeg", "png"];

/// Decide whether a key should be turned into a thumbnail.
pub fn eligibility(key: &str) -> Result<(), SkipReason> {
    let lowered = key.to_lowercase();
    if !IMAGE_SUFFIXES
        .iter()
        .any(|suffix| lowered.ends_with(suffix))
    {
        return Err(SkipReason::NotAnImage);
    }
    if key.starts_with(THUMBNAIL_PREFIX) {
        return Err(SkipReason::AlreadyThumbnail);
    }
    Ok(())
}

/// An App is an initialized application state, derived from
/// settings. It is built once per process and shared by every
/// invocation.
#[derive(Debug)]
pub struct App {
    /// The original settings.
    pub settings: Settings,

    /// The box thumbnails are shrunk to fit in.
    pub box_size: BoxSize,
}

impl App {
    /// Initialize an App instance given a settings struct. Consumes
    /// the settings struct.
    pub fn new(settings: Settings) -> Result<Self> {
        if settings.dest_bucket.trim().is_empty() {
            bail!("DEST_BUCKET must not be empty");
        }
        let box_size = settings
            .thumbnail_size
            .parse::<BoxSize>()
            .context("THUMBNAIL_SIZE is malformed")?;
        Ok(App { settings, box_size })
    }

    /// Initialize an App instance from the process environment.
    pub fn from_env() -> Result<Self> {
        let settings = Settings::from_env().context("Failed to read configuration")?;
        App::new(settings)
    }

    /// Handle every record of an S3 event.
    pub async fn handle_event<S: ObjectStore>(&self, event: &S3Event, store: &S) -> BatchReport {
        self.handle(record::from_event(event), store).await
    }

    /// Handle a batch of records, one at a time and in order. Records
    /// given as `None` couldn't be parsed and are skipped. Failures
    /// are contained within each record.
    #[instrument(skip_all)]
    pub async fn handle<S, I>(&self, records: I, store: &S) -> BatchReport
    where
        S: ObjectStore,
        I: IntoIterator<Item = Option<NotificationRecord>>,
    {
        info!("Starting thumbnail generation");
        let mut report = BatchReport::default();
        for record in records {
            let outcome = match record {
                Some(record) => self.process(&record, store).await,
                None => Outcome::Skipped {
                    key: None,
                    reason: SkipReason::MalformedRecord,
                },
            };
            report.push(outcome);
        }
        report.log_summary();
        report
    }

    /// Handle a single record: filter it, then pull, shrink and push
    /// it.
    #[instrument(skip(self, store), fields(bucket = %record.source_bucket, key = %record.object_key))]
    pub async fn process<S: ObjectStore>(&self, record: &NotificationRecord, store: &S) -> Outcome {
        let key = &record.object_key;
        if let Err(reason) = eligibility(key) {
            info!("Skipping {}: {}", key, reason);
            return Outcome::Skipped {
                key: Some(key.clone()),
                reason,
            };
        }

        let task = record.task();
        match self.run(&task, store).await {
            Ok(()) => Outcome::Uploaded {
                key: key.clone(),
                destination_key: task.destination_key,
            },
            Err(error) => {
                error!("Error processing file {}: {}", key, error);
                Outcome::Failed {
                    key: key.clone(),
                    error,
                }
            }
        }
    }

    /// Run the pipeline for a task inside its own working area, which
    /// is removed when this returns.
    async fn run<S: ObjectStore>(
        &self,
        task: &ThumbnailTask<'_>,
        store: &S,
    ) -> Result<(), ProcessError> {
        let working_area = tempfile::tempdir().map_err(ProcessError::WorkingArea)?;
        let source_path = working_area.path().join("source");
        let thumbnail_path = working_area.path().join("thumbnail");

        store
            .download(task.source_bucket, task.object_key, &source_path)
            .await
            .map_err(ProcessError::Transfer)?;
        info!(
            "Downloaded {} from bucket {}",
            task.object_key, task.source_bucket
        );

        let generated = thumbnail::generate(&source_path, &thumbnail_path, self.box_size)?;
        info!(
            "Thumbnail generated for {}: {:?} {}x{} -> {}x{}",
            task.object_key,
            generated.format,
            generated.original.0,
            generated.original.1,
            generated.thumbnail.0,
            generated.thumbnail.1
        );

        store
            .upload(
                &self.settings.dest_bucket,
                &thumbnail_path,
                &task.destination_key,
            )
            .await
            .map_err(ProcessError::Transfer)?;
        info!(
            "Thumbnail uploaded to {}/{}",
            self.settings.dest_bucket, task.destination_key
        );
        Ok(())
    }
}
