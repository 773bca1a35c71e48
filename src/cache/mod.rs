// 缓存模块
// 本地响应缓存：按 (页码, 每页数量, 筛选条件) 缓存房源列表响应

pub mod keys;
pub mod lru;
pub mod models;

// 重新导出常用类型和函数，方便其他模块使用
pub use keys::listing_key;
pub use lru::ResponseCache;
pub use models::CacheEntry;
