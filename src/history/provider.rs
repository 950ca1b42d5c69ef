use super::HistoricalStatistics;
use anyhow::Context;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Hands out read-only statistics snapshots to the classifier.
pub trait StatisticsProvider: Send + Sync {
    /// `None` means no statistics are available and rules should be used.
    fn snapshot(&self) -> Option<Arc<HistoricalStatistics>>;
}

/// Somewhere a fresh statistics bundle can be loaded from.
pub trait StatisticsSource: Send + Sync {
    fn load(&self) -> anyhow::Result<HistoricalStatistics>;
}

/// Reads the JSON bundle written by `--build-stats`.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl StatisticsSource for JsonFileSource {
    fn load(&self) -> anyhow::Result<HistoricalStatistics> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read statistics: {}", self.path.display()))?;
        HistoricalStatistics::from_json(&content)
            .with_context(|| format!("Failed to parse statistics: {}", self.path.display()))
    }
}

/// Always returns the same snapshot.
pub struct StaticProvider {
    stats: Option<Arc<HistoricalStatistics>>,
}

impl StaticProvider {
    pub fn new(stats: HistoricalStatistics) -> Self {
        Self {
            stats: Some(Arc::new(stats)),
        }
    }

    pub fn empty() -> Self {
        Self { stats: None }
    }
}

impl StatisticsProvider for StaticProvider {
    fn snapshot(&self) -> Option<Arc<HistoricalStatistics>> {
        self.stats.clone()
    }
}

struct CacheEntry {
    stats: Arc<HistoricalStatistics>,
    loaded_at: Instant,
    invalidated: bool,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.invalidated && self.loaded_at.elapsed() < ttl
    }
}

/// Time-to-live cache in front of a `StatisticsSource`.
///
/// At most one caller rebuilds an expired entry; concurrent callers keep
/// receiving the stale snapshot until the rebuild lands. A failed rebuild
/// leaves the stale snapshot in place.
pub struct CachedProvider<S: StatisticsSource> {
    source: S,
    ttl: Duration,
    entry: RwLock<Option<CacheEntry>>,
    rebuilding: AtomicBool,
}

impl<S: StatisticsSource> CachedProvider<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entry: RwLock::new(None),
            rebuilding: AtomicBool::new(false),
        }
    }

    /// Force the next `snapshot` call to rebuild.
    pub fn invalidate(&self) {
        if let Ok(mut entry) = self.entry.write() {
            if let Some(entry) = entry.as_mut() {
                entry.invalidated = true;
            }
        }
    }

    fn cached(&self) -> (Option<Arc<HistoricalStatistics>>, bool) {
        match self.entry.read() {
            Ok(entry) => match entry.as_ref() {
                Some(e) => (Some(e.stats.clone()), e.is_fresh(self.ttl)),
                None => (None, false),
            },
            Err(_) => (None, false),
        }
    }

    fn rebuild(&self) -> Option<Arc<HistoricalStatistics>> {
        match self.source.load() {
            Ok(stats) => {
                let stats = Arc::new(stats);
                log::info!(
                    "Historical statistics refreshed: {} senders, {} keywords",
                    stats.sender_profiles.len(),
                    stats.keyword_profiles.len()
                );
                if let Ok(mut entry) = self.entry.write() {
                    *entry = Some(CacheEntry {
                        stats: stats.clone(),
                        loaded_at: Instant::now(),
                        invalidated: false,
                    });
                }
                Some(stats)
            }
            Err(e) => {
                log::warn!("Failed to refresh historical statistics: {e:#}");
                None
            }
        }
    }
}

impl<S: StatisticsSource> StatisticsProvider for CachedProvider<S> {
    fn snapshot(&self) -> Option<Arc<HistoricalStatistics>> {
        let (stale, fresh) = self.cached();
        if fresh {
            return stale;
        }

        if self
            .rebuilding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Statistics rebuild in progress, serving cached snapshot");
            return stale;
        }

        let rebuilt = self.rebuild();
        self.rebuilding.store(false, Ordering::Release);
        rebuilt.or(stale)
    }
}
