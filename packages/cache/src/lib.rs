#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! TTL-bounded cache for generated panels.
//!
//! Generation is the only expensive step in the system and is a pure
//! function of its configuration, so panels are generated at most once per
//! distinct configuration and shared by read-only [`Arc`] reference.
//!
//! Entries are keyed by a fingerprint of the full [`GeneratorConfig`]
//! (roster, date range, seed, campaign start) and expire after a
//! configurable time-to-live. The map is guarded by a `Mutex` so one cache
//! can serve a multi-threaded host; the generator itself stays
//! single-threaded.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use epi_dash_panel::GeneratorError;
use epi_dash_panel::progress::ProgressCallback;
use epi_dash_panel_models::DailyRecord;
use epi_dash_panel_models::config::GeneratorConfig;
use sha2::{Digest as _, Sha256};
use thiserror::Error;

/// Default entry time-to-live: one hour, the lifetime of a dashboard
/// session's data.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Errors that can occur during cached panel retrieval.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The configuration could not be serialized for fingerprinting.
    #[error("Fingerprint error: {0}")]
    Fingerprint(#[from] serde_json::Error),

    /// Panel generation failed.
    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

/// Computes the cache key for a configuration: the hex SHA-256 of its
/// canonical JSON encoding.
///
/// # Errors
///
/// Returns [`CacheError::Fingerprint`] if the configuration cannot be
/// serialized.
pub fn fingerprint(config: &GeneratorConfig) -> Result<String, CacheError> {
    let encoded = serde_json::to_vec(config)?;
    Ok(hex::encode(Sha256::digest(&encoded)))
}

struct CacheEntry {
    panel: Arc<Vec<DailyRecord>>,
    created_at: Instant,
}

/// Fingerprint-keyed panel cache with entry expiry.
pub struct PanelCache {
    ttl: Duration,
    entries: Mutex<BTreeMap<String, CacheEntry>>,
}

impl PanelCache {
    /// Creates a cache whose entries expire after `ttl`.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the cached panel for `config`, generating (or
    /// regenerating, when the entry has expired) as needed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if fingerprinting or generation fails.
    pub fn get_or_generate(
        &self,
        config: &GeneratorConfig,
    ) -> Result<Arc<Vec<DailyRecord>>, CacheError> {
        self.get_or_generate_with_progress(config, epi_dash_panel::progress::null_progress().as_ref())
    }

    /// Same as [`Self::get_or_generate`], reporting generation progress
    /// through `progress` on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if fingerprinting or generation fails.
    pub fn get_or_generate_with_progress(
        &self,
        config: &GeneratorConfig,
        progress: &dyn ProgressCallback,
    ) -> Result<Arc<Vec<DailyRecord>>, CacheError> {
        let key = fingerprint(config)?;
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get(&key) {
            if entry.created_at.elapsed() < self.ttl {
                log::debug!("Panel cache hit for {key}");
                return Ok(Arc::clone(&entry.panel));
            }
            log::info!("Panel cache entry {key} expired after {:?}", self.ttl);
        }

        // Generated under the lock: concurrent callers for the same key
        // wait instead of duplicating the work.
        let panel = Arc::new(epi_dash_panel::generate_with_progress(config, progress)?);
        entries.insert(
            key,
            CacheEntry {
                panel: Arc::clone(&panel),
                created_at: Instant::now(),
            },
        );
        Ok(panel)
    }

    /// Drops every cached entry.
    pub fn invalidate(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let dropped = entries.len();
        entries.clear();
        if dropped > 0 {
            log::info!("Panel cache invalidated ({dropped} entries dropped)");
        }
    }

    /// Number of cached entries, including expired ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PanelCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
