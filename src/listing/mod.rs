// 房源列表：视图模型、筛选、排序、分页

pub mod filter;
pub mod paginate;
pub mod pipeline;
pub mod property;
pub mod sort;

// 重新导出常用类型
pub use filter::{FilterState, matches};
pub use paginate::ListingPage;
pub use pipeline::apply;
pub use property::{AgentContact, Coordinates, Property, PropertyStatus};
pub use sort::SortKey;
