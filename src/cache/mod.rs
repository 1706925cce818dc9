//! Cache module for regeneration
//!
//! `CacheDb` is the on-disk manifest of the last `generate` run. It lets a
//! later run skip regeneration while the output is still fresh, and remember
//! which post pages were written so removed posts can be cleaned up.
//! `RenderCache` keeps rendered pages in memory for the server.

mod render;

pub use render::{Lookup, RenderCache};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Cache directory, relative to the site base
pub const CACHE_DIR: &str = ".spacetraveling-cache";
const CACHE_FILE: &str = "db.json";

/// Manifest of the last generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheDb {
    /// Version of the cache format
    pub version: u32,
    /// When the site was last generated
    pub generated_at: Option<DateTime<Utc>>,
    /// Hash of the site config (changes force a rebuild)
    pub config_hash: u64,
    /// Uids of the post pages written
    pub posts: Vec<String>,
    /// Number of listing pages written
    pub listing_pages: usize,
}

impl CacheDb {
    /// Current cache format version
    const VERSION: u32 = 1;

    /// Create a new cache with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Default::default()
        }
    }

    /// Load cache from disk, or create a new empty cache
    pub fn load(base_dir: &Path) -> Self {
        let cache_path = base_dir.join(CACHE_DIR).join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&cache_path) {
            if let Ok(cache) = serde_json::from_str::<CacheDb>(&content) {
                if cache.version == Self::VERSION {
                    return cache;
                }
                tracing::info!("Cache version mismatch, rebuilding cache");
            }
        }
        Self::new()
    }

    /// Save cache to disk
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let cache_dir = base_dir.join(CACHE_DIR);
        fs::create_dir_all(&cache_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_dir.join(CACHE_FILE), content)?;
        Ok(())
    }

    /// Whether the last generation is younger than `revalidate_secs` and was
    /// made with the same config
    pub fn is_fresh(&self, config_hash: u64, revalidate_secs: u64, now: DateTime<Utc>) -> bool {
        let Some(generated_at) = self.generated_at else {
            return false;
        };
        if self.config_hash != config_hash {
            tracing::info!("Config changed, full rebuild required");
            return false;
        }
        let age = now.signed_duration_since(generated_at).num_seconds();
        age >= 0 && (age as u64) < revalidate_secs
    }

    /// Posts written last time that are no longer published
    pub fn removed_posts(&self, current: &[String]) -> Vec<String> {
        let current: HashSet<&String> = current.iter().collect();
        self.posts
            .iter()
            .filter(|uid| !current.contains(uid))
            .cloned()
            .collect()
    }
}

/// Calculate a hash for file content
pub fn hash_content(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Calculate hash for site config; a missing file hashes to 0
pub fn hash_config(config_path: &Path) -> Result<u64> {
    if !config_path.exists() {
        return Ok(0);
    }
    let content = fs::read_to_string(config_path)?;
    Ok(hash_content(&content))
}

/// Remove the cache directory
pub fn clear(base_dir: &Path) -> Result<()> {
    let cache_dir = base_dir.join(CACHE_DIR);
    if cache_dir.exists() {
        fs::remove_dir_all(&cache_dir)?;
        tracing::info!("Deleted: {:?}", cache_dir);
    }
    Ok(())
}
