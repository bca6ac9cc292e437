//! In-memory cache of resolved projects.
//!
//! Entries expire a fixed time after insertion. When full, inserting a new project
//! evicts the oldest fifth of the entries (at least one).

use rescope_api::{
    EffectiveResourceSet, MergedIndex, ModuleIndex, ProjectId, ResourceSet, Warning, WarningKind,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything derived for one project in one build.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub project: ProjectId,
    /// The project's own resources, before inheritance.
    pub scanned: Arc<ResourceSet>,
    pub effective: Arc<EffectiveResourceSet>,
    /// The project's own script modules.
    pub modules: Arc<ModuleIndex>,
    pub merged: Arc<MergedIndex>,
    pub content_hash: u64,
    pub warnings: Vec<Warning>,
}

impl CacheEntry {
    /// Stand-in for a project whose scan failed: nothing resolved, only the failure.
    ///
    /// Never cached, so the next read or event retries the scan.
    pub fn failed(project: ProjectId, warning: Warning) -> Self {
        Self {
            effective: Arc::new(EffectiveResourceSet::from_entries(
                project.clone(),
                Default::default(),
            )),
            project,
            scanned: Default::default(),
            modules: Default::default(),
            merged: Default::default(),
            content_hash: 0,
            warnings: vec![warning],
        }
    }

    pub fn is_failed(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w.kind, WarningKind::ScanFailed { .. }))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

struct Slot {
    entry: Arc<CacheEntry>,
    inserted_at: Instant,
}

pub struct IndexCache {
    slots: HashMap<ProjectId, Slot>,
    ttl: Duration,
    capacity: usize,
    stats: CacheStats,
}

impl IndexCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            slots: HashMap::new(),
            ttl,
            capacity: capacity.max(1),
            stats: CacheStats::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&mut self, project: &ProjectId) -> Option<Arc<CacheEntry>> {
        self.get_at(project, Instant::now())
    }

    /// Lookup as of `now`. An expired entry is dropped and reported as a miss.
    pub fn get_at(&mut self, project: &ProjectId, now: Instant) -> Option<Arc<CacheEntry>> {
        let expired = match self.slots.get(project) {
            None => {
                self.stats.misses += 1;
                return None;
            }
            Some(slot) => self.is_expired(slot, now),
        };
        if expired {
            self.slots.remove(project);
            self.stats.expirations += 1;
            self.stats.misses += 1;
            return None;
        }
        self.stats.hits += 1;
        self.slots.get(project).map(|slot| slot.entry.clone())
    }

    /// Lookup without touching statistics or dropping expired entries.
    pub fn peek_at(&self, project: &ProjectId, now: Instant) -> Option<Arc<CacheEntry>> {
        self.slots
            .get(project)
            .filter(|slot| !self.is_expired(slot, now))
            .map(|slot| slot.entry.clone())
    }

    pub fn peek(&self, project: &ProjectId) -> Option<Arc<CacheEntry>> {
        self.peek_at(project, Instant::now())
    }

    pub fn put(&mut self, entry: Arc<CacheEntry>) {
        self.put_at(entry, Instant::now())
    }

    pub fn put_at(&mut self, entry: Arc<CacheEntry>, now: Instant) {
        let project = entry.project.clone();
        if !self.slots.contains_key(&project) && self.slots.len() >= self.capacity {
            self.evict_oldest();
        }
        self.slots.insert(
            project,
            Slot {
                entry,
                inserted_at: now,
            },
        );
    }

    /// Drop one project, or everything when `project` is `None`. Returns how many entries went.
    pub fn invalidate(&mut self, project: Option<&ProjectId>) -> usize {
        match project {
            Some(id) => usize::from(self.slots.remove(id).is_some()),
            None => {
                let n = self.slots.len();
                self.slots.clear();
                n
            }
        }
    }

    pub fn invalidate_many<'a>(&mut self, projects: impl IntoIterator<Item = &'a ProjectId>) -> usize {
        projects
            .into_iter()
            .map(|id| self.invalidate(Some(id)))
            .sum()
    }

    pub fn contains(&self, project: &ProjectId) -> bool {
        self.slots.contains_key(project)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.slots.len(),
            ..self.stats
        }
    }

    fn is_expired(&self, slot: &Slot, now: Instant) -> bool {
        now.saturating_duration_since(slot.inserted_at) >= self.ttl
    }

    fn evict_oldest(&mut self) {
        let count = self.slots.len().div_ceil(5).max(1);
        let mut by_age: Vec<(Instant, ProjectId)> = self
            .slots
            .iter()
            .map(|(id, slot)| (slot.inserted_at, id.clone()))
            .collect();
        by_age.sort();
        for (_, id) in by_age.into_iter().take(count) {
            self.slots.remove(&id);
            self.stats.evictions += 1;
        }
        tracing::debug!("Evicted {} cache entries", count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> Arc<CacheEntry> {
        let project = ProjectId::new(id);
        Arc::new(CacheEntry {
            effective: Arc::new(EffectiveResourceSet::from_entries(
                project.clone(),
                Default::default(),
            )),
            project,
            scanned: Default::default(),
            modules: Default::default(),
            merged: Default::default(),
            content_hash: 0,
            warnings: Vec::new(),
        })
    }

    #[test]
    fn test_ttl_boundary() {
        let mut cache = IndexCache::new(Duration::from_secs(300), 10);
        let t0 = Instant::now();
        let a = ProjectId::new("a");
        cache.put_at(entry("a"), t0);

        assert!(cache.get_at(&a, t0 + Duration::from_secs(299)).is_some());
        assert!(cache.get_at(&a, t0 + Duration::from_secs(301)).is_none());
        assert!(!cache.contains(&a));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expirations, 1);
    }

    #[test]
    fn test_eviction_drops_oldest_fifth() {
        let mut cache = IndexCache::new(Duration::from_secs(300), 10);
        let t0 = Instant::now();
        for i in 0..10 {
            cache.put_at(entry(&format!("p{i}")), t0 + Duration::from_secs(i));
        }
        assert_eq!(cache.len(), 10);

        cache.put_at(entry("new"), t0 + Duration::from_secs(20));
        assert_eq!(cache.len(), 9);
        assert!(!cache.contains(&ProjectId::new("p0")));
        assert!(!cache.contains(&ProjectId::new("p1")));
        assert!(cache.contains(&ProjectId::new("p2")));
        assert!(cache.contains(&ProjectId::new("new")));
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_replacing_existing_key_does_not_evict() {
        let mut cache = IndexCache::new(Duration::from_secs(300), 2);
        let t0 = Instant::now();
        cache.put_at(entry("a"), t0);
        cache.put_at(entry("b"), t0);
        cache.put_at(entry("a"), t0 + Duration::from_secs(1));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);

        // Replacement restarts the TTL.
        assert!(cache
            .get_at(&ProjectId::new("a"), t0 + Duration::from_secs(300))
            .is_some());
    }

    #[test]
    fn test_invalidate() {
        let mut cache = IndexCache::new(Duration::from_secs(300), 10);
        cache.put(entry("a"));
        cache.put(entry("b"));
        assert_eq!(cache.invalidate(Some(&ProjectId::new("a"))), 1);
        assert_eq!(cache.invalidate(Some(&ProjectId::new("a"))), 0);
        cache.put(entry("c"));
        assert_eq!(cache.invalidate(None), 2);
        assert!(cache.is_empty());
    }
}
