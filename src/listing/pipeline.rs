use super::filter::{FilterState, matches};
use super::property::Property;

/// 对一页原始数据做本地筛选和排序，纯函数
pub fn apply(properties: &[Property], filters: &FilterState) -> Vec<Property> {
    let mut visible: Vec<Property> = properties
        .iter()
        .filter(|p| matches(p, filters))
        .cloned()
        .collect();
    filters.sort.sort(&mut visible);
    visible
}
