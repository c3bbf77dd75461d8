//! Defines the ways in which handling a single record can fail.

use thiserror::Error;

/// A failure while processing one notification record. These never
/// abort a batch: they are logged and the record is dropped.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The temporary working area couldn't be prepared or read.
    #[error("working area unavailable: {0}")]
    WorkingArea(#[source] std::io::Error),

    /// Downloading the source object or uploading the thumbnail
    /// failed.
    #[error("{0:#}")]
    Transfer(anyhow::Error),

    /// The downloaded bytes don't start like any supported image.
    #[error("object is not a recognizable JPEG or PNG image")]
    UnrecognizedFormat,

    /// The downloaded bytes couldn't be decoded as an image.
    #[error("couldn't decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The thumbnail couldn't be encoded into the working area.
    #[error("couldn't encode thumbnail: {0}")]
    Encode(#[source] image::ImageError),
}
