//! Chunk planning
//!
//! Splits the unexported window `[watermark, now)` into contiguous chunks no
//! wider than the chunk size. The chunk size is either the configured default
//! or, with adaptive chunking, derived from the log group's stored bytes.

use crate::adapters::LogRegistry;
use crate::config::ChunkingConfig;
use crate::domain::{Chunk, LogGroupName, MILLIS_PER_DAY};

/// Plan the chunks covering `[watermark, now)`
///
/// Every chunk but the last is exactly `chunk_size_millis` wide; the last is
/// clipped to `now`. Returns an empty plan when `watermark >= now`.
///
/// # Examples
///
/// ```
/// use cwl_export::core::planner::plan_chunks;
/// use cwl_export::domain::MILLIS_PER_DAY;
///
/// let chunks = plan_chunks(0, 20 * MILLIS_PER_DAY, 7 * MILLIS_PER_DAY);
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(chunks[2].to, 20 * MILLIS_PER_DAY);
/// ```
pub fn plan_chunks(watermark: i64, now: i64, chunk_size_millis: i64) -> Vec<Chunk> {
    if watermark >= now {
        return Vec::new();
    }

    let step = chunk_size_millis.max(1);
    let mut chunks = Vec::with_capacity(((now - watermark) / step + 1) as usize);
    let mut from = watermark;
    while from < now {
        let to = from.saturating_add(step).min(now);
        chunks.push(Chunk::new(from, to));
        from = to;
    }
    chunks
}

/// Chooses the chunk width for a log group
#[derive(Debug, Clone)]
pub struct ChunkSizer {
    config: ChunkingConfig,
    default_millis: i64,
}

impl ChunkSizer {
    /// Create a sizer falling back to `default_millis`
    pub fn new(config: ChunkingConfig, default_millis: i64) -> Self {
        Self {
            config,
            default_millis,
        }
    }

    /// Width for a log group holding `stored_bytes`
    pub fn size_for_bytes(&self, stored_bytes: i64) -> i64 {
        let days = if stored_bytes > self.config.large_threshold_bytes {
            self.config.short_window_days
        } else if stored_bytes > self.config.medium_threshold_bytes {
            self.config.medium_window_days
        } else if stored_bytes < self.config.small_threshold_bytes {
            self.config.long_window_days
        } else {
            return self.default_millis;
        };
        i64::from(days) * MILLIS_PER_DAY
    }

    /// Width for `log_group`, looking up its volume when adaptive sizing is on
    ///
    /// A failed lookup falls back to the default width.
    pub async fn chunk_size_for(&self, registry: &dyn LogRegistry, log_group: &LogGroupName) -> i64 {
        if !self.config.adaptive {
            return self.default_millis;
        }

        match registry.get_stored_bytes(log_group).await {
            Ok(bytes) => {
                let size = self.size_for_bytes(bytes);
                tracing::debug!(
                    log_group = %log_group,
                    stored_bytes = bytes,
                    chunk_days = size / MILLIS_PER_DAY,
                    "Sized chunks from stored volume"
                );
                size
            }
            Err(e) => {
                tracing::warn!(
                    log_group = %log_group,
                    error = %e,
                    "Could not read stored bytes, using default chunk size"
                );
                self.default_millis
            }
        }
    }
}
