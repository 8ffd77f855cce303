//! Image assets for Loom.
//!
//! Discovers image-bearing nodes, fetches each unique reference with bounded
//! concurrency, timeouts and retries, validates payloads, fingerprints them
//! and deduplicates identical bytes into one record.

mod cache;
mod fetch;
mod payload;
mod pipeline;
mod request;
mod source;

pub use cache::AssetCache;
pub use fetch::{fetch_payload, AttemptError, Exhausted, Payload, RetryPolicy};
pub use payload::{decode_data_uri, is_data_uri, sniff, AssetFormat, Fingerprint, PayloadError};
pub use pipeline::{placeholder_svg, AssetFailure, AssetPipeline, AssetRecord, AssetSet, MaterializeError};
pub use request::{collect, AssetRequest};
pub use source::ImageSource;
