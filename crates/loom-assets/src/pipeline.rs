//! Asset materialization.

use crate::cache::AssetCache;
use crate::fetch::{fetch_payload, Exhausted, Payload, RetryPolicy};
use crate::payload::{AssetFormat, Fingerprint};
use crate::request::AssetRequest;
use crate::source::ImageSource;
use futures::stream::{self, StreamExt as _};
use indexmap::IndexMap;
use loom_core::{AssetError, EngineConfig, NodeId};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// One unique asset of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub file_name: String,
    /// `None` for placeholders.
    pub fingerprint: Option<Fingerprint>,
    pub format: AssetFormat,
    /// Referencing nodes, in traversal order.
    pub nodes: Vec<NodeId>,
    /// Source references that produced these bytes.
    pub references: Vec<String>,
    /// Location in a disk cache.
    pub cache_path: Option<PathBuf>,
    /// Failure reason when this record stands in for a missing image.
    pub placeholder: Option<String>,
}

impl AssetRecord {
    pub fn is_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }
}

/// A non-required image that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFailure {
    pub reference: String,
    pub nodes: Vec<NodeId>,
    pub attempts: u32,
    pub reason: String,
}

/// Materialization stopped by a required image or a cache failure.
///
/// `failures` holds the placeholders recorded for earlier requests.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct MaterializeError {
    #[source]
    pub error: AssetError,
    pub failures: Vec<AssetFailure>,
}

/// The materialized assets of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetSet {
    records: IndexMap<String, AssetRecord>,
    failures: Vec<AssetFailure>,
}

impl AssetSet {
    /// Records in first-encounter order.
    pub fn records(&self) -> impl Iterator<Item = &AssetRecord> {
        self.records.values()
    }

    pub fn failures(&self) -> &[AssetFailure] {
        &self.failures
    }

    /// The record used by a node.
    pub fn record_for(&self, node: &NodeId) -> Option<&AssetRecord> {
        self.records.values().find(|record| record.nodes.contains(node))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a fetched asset, merging with an existing record of identical
    /// bytes. Returns `true` when a new record was created.
    pub fn insert(&mut self, record: AssetRecord) -> bool {
        let key = record
            .fingerprint
            .as_ref()
            .map_or_else(|| record.file_name.clone(), |fp| fp.as_str().to_string());

        match self.records.get_mut(&key) {
            Some(existing) => {
                existing.nodes.extend(record.nodes);
                existing.references.extend(record.references);
                false
            }
            None => {
                self.records.insert(key, record);
                true
            }
        }
    }

    fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.records.contains_key(fingerprint.as_str())
    }

    fn record_failure(&mut self, request: &AssetRequest, exhausted: &Exhausted) {
        let reason = exhausted.last.to_string();
        let fingerprint = Fingerprint::of(request.reference.as_bytes());

        self.insert(AssetRecord {
            file_name: format!("placeholder-{}.svg", fingerprint.short()),
            fingerprint: None,
            format: AssetFormat::Svg,
            nodes: request.nodes.to_vec(),
            references: vec![request.reference.clone()],
            cache_path: None,
            placeholder: Some(reason.clone()),
        });
        self.failures.push(AssetFailure {
            reference: request.reference.clone(),
            nodes: request.nodes.to_vec(),
            attempts: exhausted.attempts,
            reason,
        });
    }
}

/// Body of the SVG written in place of an image that could not be fetched.
pub fn placeholder_svg() -> &'static str {
    concat!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100" preserveAspectRatio="none">"##,
        r##"<rect width="100" height="100" fill="#e5e7eb"/>"##,
        r##"<path d="M0 0L100 100M100 0L0 100" stroke="#9ca3af" stroke-width="1"/>"##,
        "</svg>\n"
    )
}

/// Fetches, validates, deduplicates and caches the images of a run.
#[derive(Debug, Clone)]
pub struct AssetPipeline {
    policy: RetryPolicy,
    max_concurrent: usize,
    cache: AssetCache,
}

impl AssetPipeline {
    pub fn new(config: &EngineConfig, cache: AssetCache) -> Self {
        Self::with_policy(RetryPolicy::from_config(config), config.fetch.max_concurrent_fetches, cache)
    }

    pub fn with_policy(policy: RetryPolicy, max_concurrent: usize, cache: AssetCache) -> Self {
        Self { policy, max_concurrent: max_concurrent.max(1), cache }
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Materialize every requested image.
    ///
    /// References are fetched concurrently; results are assembled in request
    /// order so the outcome does not depend on completion order. A required
    /// image that cannot be fetched fails the whole set. Dropping the
    /// returned future cancels outstanding fetches.
    pub async fn materialize<S: ImageSource>(
        &self,
        source: &S,
        requests: &[AssetRequest],
    ) -> Result<AssetSet, MaterializeError> {
        let mut outcomes: Vec<_> = stream::iter(requests.iter().enumerate())
            .map(|(index, request)| async move {
                (index, fetch_payload(source, &request.reference, &self.policy).await)
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;
        outcomes.sort_by_key(|(index, _)| *index);

        let mut set = AssetSet::default();
        for (index, outcome) in outcomes {
            if let Err(error) = self.absorb(&mut set, &requests[index], outcome).await {
                return Err(MaterializeError { error, failures: set.failures });
            }
        }

        info!(
            requested = requests.len(),
            records = set.len(),
            placeholders = set.failures().len(),
            "materialized assets"
        );
        Ok(set)
    }

    async fn absorb(
        &self,
        set: &mut AssetSet,
        request: &AssetRequest,
        outcome: Result<Payload, Exhausted>,
    ) -> Result<(), AssetError> {
        match outcome {
            Ok(payload) => {
                let fingerprint = Fingerprint::of(&payload.bytes);
                let cache_path = if set.contains(&fingerprint) {
                    None
                } else {
                    self.cache.store(&fingerprint, payload.format, &payload.bytes).await?
                };

                let created = set.insert(AssetRecord {
                    file_name: fingerprint.file_name(payload.format),
                    fingerprint: Some(fingerprint),
                    format: payload.format,
                    nodes: request.nodes.to_vec(),
                    references: vec![request.reference.clone()],
                    cache_path,
                    placeholder: None,
                });
                if !created {
                    debug!(reference = %request.reference, "deduplicated asset by fingerprint");
                }
            }
            Err(exhausted) if request.required => {
                return Err(AssetError::RequiredUnavailable {
                    reference: request.reference.clone(),
                    nodes: request.nodes.to_vec(),
                    attempts: exhausted.attempts,
                    reason: exhausted.last.to_string(),
                });
            }
            Err(exhausted) => {
                warn!(
                    reference = %request.reference,
                    attempts = exhausted.attempts,
                    error = %exhausted.last,
                    "asset unavailable, using placeholder"
                );
                set.record_failure(request, &exhausted);
            }
        }
        Ok(())
    }

    /// Bytes of a materialized record, read back from the cache.
    pub async fn bytes(&self, record: &AssetRecord) -> Result<Option<Vec<u8>>, AssetError> {
        match &record.fingerprint {
            Some(fingerprint) => self.cache.read(fingerprint).await,
            None => Ok(Some(placeholder_svg().as_bytes().to_vec())),
        }
    }
}
