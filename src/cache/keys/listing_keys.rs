use crate::listing::FilterState;

/// 房源列表缓存键前缀
pub const LISTING_PREFIX: &str = "listing:";

/// 生成房源列表缓存键。
/// 筛选条件先规范化（字段排序、设施排序、省略空值），同样语义的条件得到同一个键
pub fn listing_key(page: u32, page_size: u32, filters: &FilterState) -> String {
    format!(
        "{}{}:{}:{}",
        LISTING_PREFIX,
        page,
        page_size,
        filters.canonical()
    )
}
