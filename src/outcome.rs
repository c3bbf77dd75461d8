//! Defines the result of handling each record, and the summary of a
//! whole batch.

use crate::error::ProcessError;
use std::fmt;
use tracing::info;

/// Why a record wasn't processed. Skips are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The key doesn't end in a supported image suffix.
    NotAnImage,
    /// The key already names a thumbnail.
    AlreadyThumbnail,
    /// The notification lacked a bucket name or an object key.
    MalformedRecord,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::NotAnImage => "not a supported image",
            SkipReason::AlreadyThumbnail => "already a thumbnail",
            SkipReason::MalformedRecord => "malformed notification record",
        })
    }
}

/// What happened to one record.
#[derive(Debug)]
pub enum Outcome {
    /// A thumbnail was stored under `destination_key`.
    Uploaded { key: String, destination_key: String },
    Skipped { key: Option<String>, reason: SkipReason },
    /// Processing was abandoned; the record is dropped.
    Failed { key: String, error: ProcessError },
}

/// Tally of the outcomes of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    pub fn uploaded(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Uploaded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(*o)).count()
    }

    /// Emit a one-line summary of the batch.
    pub fn log_summary(&self) {
        info!(
            "Batch done: {} uploaded, {} skipped, {} failed",
            self.uploaded(),
            self.skipped(),
            self.failed()
        );
    }
}
