use serde::Serialize;

use super::property::Property;

/// 当前页的渲染结果。后端按 page/limit 分页，本地筛选只作用于当前页
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    pub items: Vec<Property>,
    pub page: u32,
    pub page_size: u32,
    /// 后端返回的总数（本地筛选前）
    pub total_count: u64,
    pub total_pages: u32,
}

impl ListingPage {
    pub fn new(items: Vec<Property>, page: u32, page_size: u32, total_count: u64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_count.div_ceil(u64::from(page_size)).max(1) as u32;
        Self {
            items,
            page: page.max(1),
            page_size,
            total_count,
            total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// 页码导航，超出范围时截断
    pub fn clamp_page(&self, requested: u32) -> u32 {
        requested.clamp(1, self.total_pages)
    }
}
