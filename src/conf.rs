//! Defines configuration as read from the environment.

use serde::Deserialize;

/// Default `thumbnail_size` value.
fn default_thumbnail_size() -> String {
    String::from("128x128")
}

/// The thumbnailer pulls images from S3, shrinks them, and pushes the
/// results to a destination bucket. The configuration must be given
/// as environment variables.
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Defines the bucket receiving every generated thumbnail. It may
    /// be the same bucket as the triggering one, since thumbnails are
    /// never picked up again as sources.
    pub dest_bucket: String,

    /// Defines the box the thumbnails must fit in, as two positive
    /// integers: `"WxH"` or `"W,H"`, optionally wrapped in
    /// parentheses, e.g. `"(128, 128)"`.
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: String,
}

impl Settings {
    /// Read the settings from the process environment.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}
