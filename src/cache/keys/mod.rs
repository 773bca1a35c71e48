/// 缓存键模块
/// 提供各种缓存键生成函数

// 房源列表缓存键
pub mod listing_keys;

pub use listing_keys::{LISTING_PREFIX, listing_key};
