//! TTL cache for full-tree scans.
//!
//! One entry is kept per visibility flag. A miss runs the supplied walk while
//! the cache lock is held, so concurrent callers for the same key wait for a
//! single scan instead of repeating it.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use protocol::Entry;
use tracing::{debug, error, warn};

/// A completed scan.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Entries sorted by path.
    entries: Arc<Vec<Entry>>,
    /// When the scan finished.
    captured_at: Instant,
}

/// Mutex-guarded store of prior scan results keyed by `show_hidden`.
#[derive(Debug)]
pub struct DirectoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<bool, CacheEntry>>,
}

impl DirectoryCache {
    /// Create an empty cache whose entries stay fresh for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<bool, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Directory cache lock was poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// Return the cached scan for `show_hidden`, running `walk` on a miss.
    ///
    /// A fresh entry is returned without calling `walk` unless `force` is set.
    /// If `walk` fails, the previous entry for the key is served (even when
    /// expired); without one, the result is empty.
    pub fn get_or_refresh<F, E>(&self, show_hidden: bool, force: bool, walk: F) -> Arc<Vec<Entry>>
    where
        F: FnOnce() -> Result<Vec<Entry>, E>,
        E: Display,
    {
        let mut entries = self.lock();

        if !force {
            if let Some(entry) = entries.get(&show_hidden) {
                if entry.captured_at.elapsed() < self.ttl {
                    debug!(show_hidden, "Directory cache hit");
                    return Arc::clone(&entry.entries);
                }
            }
        }

        match walk() {
            Ok(fresh) => {
                let fresh = Arc::new(fresh);
                entries.insert(
                    show_hidden,
                    CacheEntry {
                        entries: Arc::clone(&fresh),
                        captured_at: Instant::now(),
                    },
                );
                fresh
            }
            Err(e) => {
                error!(error = %e, show_hidden, "Tree scan failed");
                match entries.get(&show_hidden) {
                    Some(stale) => {
                        warn!(show_hidden, "Serving stale directory listing");
                        Arc::clone(&stale.entries)
                    }
                    None => Arc::new(Vec::new()),
                }
            }
        }
    }

    /// Drop every cached scan.
    pub fn invalidate(&self) {
        self.lock().clear();
        debug!("Directory cache invalidated");
    }

    /// Whether a fresh entry exists for `show_hidden`.
    pub fn is_fresh(&self, show_hidden: bool) -> bool {
        self.lock()
            .get(&show_hidden)
            .is_some_and(|entry| entry.captured_at.elapsed() < self.ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn entries(names: &[&str]) -> Vec<Entry> {
        names.iter().map(|n| Entry::file(*n, *n, 1)).collect()
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = DirectoryCache::new(Duration::from_secs(30));
        let calls = Cell::new(0);

        let first = cache.get_or_refresh(false, false, || {
            calls.set(calls.get() + 1);
            Ok::<_, String>(entries(&["a.yaml"]))
        });
        let second = cache.get_or_refresh(false, false, || {
            calls.set(calls.get() + 1);
            Ok::<_, String>(entries(&["b.yaml"]))
        });

        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second[0].path, "a.yaml");
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = DirectoryCache::new(Duration::from_secs(30));

        cache.get_or_refresh(false, false, || Ok::<_, String>(entries(&["a.yaml"])));
        let hidden = cache.get_or_refresh(true, false, || {
            Ok::<_, String>(entries(&[".hidden.yaml"]))
        });

        assert_eq!(hidden[0].path, ".hidden.yaml");
        assert!(cache.is_fresh(false));
        assert!(cache.is_fresh(true));
    }

    #[test]
    fn test_force_rewalks() {
        let cache = DirectoryCache::new(Duration::from_secs(30));

        cache.get_or_refresh(false, false, || Ok::<_, String>(entries(&["a.yaml"])));
        let forced = cache.get_or_refresh(false, true, || Ok::<_, String>(entries(&["b.yaml"])));

        assert_eq!(forced[0].path, "b.yaml");
    }

    #[test]
    fn test_expired_entry_rewalks() {
        let cache = DirectoryCache::new(Duration::ZERO);

        cache.get_or_refresh(false, false, || Ok::<_, String>(entries(&["a.yaml"])));
        assert!(!cache.is_fresh(false));

        let next = cache.get_or_refresh(false, false, || Ok::<_, String>(entries(&["b.yaml"])));
        assert_eq!(next[0].path, "b.yaml");
    }

    #[test]
    fn test_failure_serves_stale() {
        let cache = DirectoryCache::new(Duration::from_secs(30));

        cache.get_or_refresh(false, false, || Ok::<_, String>(entries(&["a.yaml"])));
        let stale = cache.get_or_refresh(false, true, || Err::<Vec<Entry>, _>("disk gone"));

        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].path, "a.yaml");
    }

    #[test]
    fn test_failure_without_stale_is_empty() {
        let cache = DirectoryCache::new(Duration::from_secs(30));
        let result = cache.get_or_refresh(true, false, || Err::<Vec<Entry>, _>("disk gone"));
        assert!(result.is_empty());
        assert!(!cache.is_fresh(true));
    }

    #[test]
    fn test_invalidate_clears_all_keys() {
        let cache = DirectoryCache::new(Duration::from_secs(30));
        cache.get_or_refresh(false, false, || Ok::<_, String>(entries(&["a.yaml"])));
        cache.get_or_refresh(true, false, || Ok::<_, String>(entries(&["a.yaml"])));

        cache.invalidate();

        assert!(!cache.is_fresh(false));
        assert!(!cache.is_fresh(true));
        let fresh = cache.get_or_refresh(false, false, || Ok::<_, String>(entries(&["c.yaml"])));
        assert_eq!(fresh[0].path, "c.yaml");
    }
}
