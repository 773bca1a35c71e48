/// 缓存条目，时间均为 Unix 毫秒
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    pub timestamp: i64,
    pub expires_at: i64,
}

impl<V> CacheEntry<V> {
    pub fn is_fresh(&self, now: i64) -> bool {
        now <= self.expires_at
    }
}
