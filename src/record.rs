//! Defines the notification records the handler is invoked with, and
//! the thumbnail tasks derived from them.

use aws_lambda_events::event::s3::{S3Event, S3EventRecord};
use std::borrow::Cow;
use tracing::warn;

/// The prefix given to every generated thumbnail's key.
pub const THUMBNAIL_PREFIX: &str = "thumb-";

/// A single object arrival in a source bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub source_bucket: String,
    pub object_key: String,
}

impl NotificationRecord {
    pub fn new(source_bucket: impl Into<String>, object_key: impl Into<String>) -> Self {
        NotificationRecord {
            source_bucket: source_bucket.into(),
            object_key: object_key.into(),
        }
    }

    /// Extract the record from an S3 event record. Returns `None` if
    /// the bucket name or the object key are missing. Keys are
    /// URL-decoded, since S3 encodes them in event notifications.
    pub fn from_event_record(record: &S3EventRecord) -> Option<Self> {
        let bucket = record.s3.bucket.name.as_deref()?;
        let key = record.s3.object.key.as_deref()?;
        Some(NotificationRecord::new(bucket, decode_key(key)))
    }

    /// Build a thumbnail task for this record.
    pub fn task(&self) -> ThumbnailTask<'_> {
        ThumbnailTask {
            source_bucket: &self.source_bucket,
            object_key: &self.object_key,
            destination_key: thumbnail_key(&self.object_key),
        }
    }
}

/// Extract every record from an S3 event. Records lacking a bucket
/// name or object key are reported as `None`, in place, so they can
/// still be accounted for.
pub fn from_event(event: &S3Event) -> Vec<Option<NotificationRecord>> {
    event
        .records
        .iter()
        .map(|record| {
            let parsed = NotificationRecord::from_event_record(record);
            if parsed.is_none() {
                warn!(
                    "Event record lacks a bucket name or an object key: {:?}",
                    record.s3
                );
            }
            parsed
        })
        .collect()
}

/// The work derived from a single record: pull `object_key` from
/// `source_bucket` and store its thumbnail as `destination_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailTask<'a> {
    pub source_bucket: &'a str,
    pub object_key: &'a str,
    pub destination_key: String,
}

/// The key under which the thumbnail of `key` is stored.
pub fn thumbnail_key(key: &str) -> String {
    format!("{}{}", THUMBNAIL_PREFIX, key)
}

/// Undo the encoding applied by S3 to keys in event notifications:
/// spaces arrive as `+` and other characters percent-encoded. Keys
/// that don't decode to valid UTF-8 are kept as given.
fn decode_key(key: &str) -> String {
    let spaced = key.replace('+', " ");
    let decoded = urlencoding::decode(&spaced).map(Cow::into_owned);
    decoded.unwrap_or(spaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_EVENT: &str = r#"{
      "Records": [
        {
          "eventVersion": "2.1",
          "eventSource": "aws:s3",
          "awsRegion": "us-east-1",
          "eventTime": "2023-09-01T12:00:00.000Z",
          "eventName": "ObjectCreated:Put",
          "userIdentity": { "principalId": "EXAMPLE" },
          "requestParameters": { "sourceIPAddress": "127.0.0.1" },
          "responseElements": {
            "x-amz-request-id": "EXAMPLE123456789",
            "x-amz-id-2": "EXAMPLE123/5678abcdefghijklambdaisawesome/mnopqrstuvwxyzABCDEFGH"
          },
          "s3": {
            "s3SchemaVersion": "1.0",
            "configurationId": "testConfigRule",
            "bucket": {
              "name": "uploads",
              "ownerIdentity": { "principalId": "EXAMPLE" },
              "arn": "arn:aws:s3:::uploads"
            },
            "object": {
              "key": "holiday/beach+day%281%29.JPG",
              "size": 1024,
              "eTag": "0123456789abcdef0123456789abcdef",
              "sequencer": "0A1B2C3D4E5F678901"
            }
          }
        }
      ]
    }"#;

    #[test]
    fn extracts_records_from_s3_event() {
        let event: S3Event = serde_json::from_str(SAMPLE_EVENT).unwrap();
        let records = from_event(&event);
        assert_eq!(
            records,
            vec![Some(NotificationRecord::new(
                "uploads",
                "holiday/beach day(1).JPG"
            ))]
        );
    }

    #[test]
    fn decodes_keys() {
        assert_eq!(decode_key("photo.jpg"), "photo.jpg");
        assert_eq!(decode_key("my+photo.jpg"), "my photo.jpg");
        assert_eq!(decode_key("a%2Bb.png"), "a+b.png");
        assert_eq!(decode_key("caf%C3%A9.jpeg"), "café.jpeg");
        assert_eq!(decode_key("bad%FF.png"), "bad%FF.png");
    }

    #[test]
    fn destination_key_is_prefixed_source_key() {
        let record = NotificationRecord::new("uploads", "dir/photo.JPG");
        let task = record.task();
        assert_eq!(task.source_bucket, "uploads");
        assert_eq!(task.object_key, "dir/photo.JPG");
        assert_eq!(task.destination_key, "thumb-dir/photo.JPG");
    }
}
