//! Turns images landing in an S3 bucket into thumbnails stored in
//! another bucket.

pub mod app;
pub mod client;
pub mod conf;
pub mod error;
pub mod outcome;
pub mod record;
pub mod thumbnail;
