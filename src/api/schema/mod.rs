// 后端 REST API 的请求/响应结构

pub mod auth;
pub mod favorite;
pub mod property;

// 重新导出常用类型
pub use auth::{LoginRequest, ProfileDto, RefreshRequest, TokenPair};
pub use favorite::{FavoriteEntry, FavoriteProperty, FavoritesResponse};
pub use property::{
    AgentDto, FilePart, MediaDto, PropertyDto, PropertyForm, PropertyId, PropertyListResponse,
};
