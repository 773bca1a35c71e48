use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use super::models::CacheEntry;
use crate::utils::Clock;

/// 容量有限的 LRU 缓存，条目带固定 TTL。
///
/// 过期条目视为不存在并在读取时删除；命中会把条目提升为最近使用；
/// 插入新键且已满时淘汰最久未使用的一条。房源增删改不会主动清理缓存，
/// 在 TTL 内可能读到旧数据。
pub struct ResponseCache<V> {
    entries: HashMap<String, (CacheEntry<V>, u64)>,
    // 访问序号 -> 键，最小的即最久未使用
    recency: BTreeMap<u64, String>,
    tick: u64,
    max_entries: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(max_entries: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            tick: 0,
            max_entries: max_entries.max(1),
            ttl,
            clock,
        }
    }

    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_millis();
        let (fresh, old_tick) = match self.entries.get(key) {
            Some((entry, tick)) => (entry.is_fresh(now), *tick),
            None => return None,
        };

        if !fresh {
            tracing::debug!(key, "cache entry expired");
            self.remove(key);
            return None;
        }

        let tick = self.next_tick();
        self.recency.remove(&old_tick);
        self.recency.insert(tick, key.to_string());
        let (entry, slot) = self.entries.get_mut(key)?;
        *slot = tick;
        Some(entry.data.clone())
    }

    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = self.clock.now_millis();

        if let Some((_, old_tick)) = self.entries.get(&key) {
            let old_tick = *old_tick;
            self.recency.remove(&old_tick);
        } else if self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }

        let tick = self.next_tick();
        let entry = CacheEntry {
            data: value,
            timestamp: now,
            expires_at: now + self.ttl.as_millis() as i64,
        };
        self.recency.insert(tick, key.clone());
        self.entries.insert(key, (entry, tick));
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    fn remove(&mut self, key: &str) {
        if let Some((_, tick)) = self.entries.remove(key) {
            self.recency.remove(&tick);
        }
    }

    fn evict_oldest(&mut self) {
        if let Some((_, key)) = self.recency.pop_first() {
            tracing::debug!(key = %key, "evicting least recently used cache entry");
            self.entries.remove(&key);
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}
