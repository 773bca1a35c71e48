// 后端 REST API：接口定义、reqwest 实现与请求/响应结构

pub mod client;
#[cfg(test)]
pub mod fake;
pub mod schema;

use async_trait::async_trait;

use crate::error::AppResult;
use schema::{
    FavoritesResponse, LoginRequest, ProfileDto, PropertyDto, PropertyForm, PropertyId,
    PropertyListResponse, TokenPair,
};

pub use client::ApiClient;

/// 核心逻辑依赖的后端操作
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// POST /auth/login
    async fn login(&self, req: &LoginRequest) -> AppResult<TokenPair>;

    /// GET /auth/profile
    async fn profile(&self, access_token: &str) -> AppResult<ProfileDto>;

    /// POST /token/refresh，刷新令牌会轮换
    async fn refresh_token(&self, refresh_token: &str) -> AppResult<TokenPair>;

    /// GET /properties?page&limit&...
    async fn list_properties(&self, params: &[(String, String)]) -> AppResult<PropertyListResponse>;

    /// GET /properties/{id}
    async fn get_property(&self, id: PropertyId) -> AppResult<PropertyDto>;

    /// POST /properties (multipart)
    async fn create_property(&self, access_token: &str, form: PropertyForm) -> AppResult<PropertyDto>;

    /// PATCH /properties/{id} (multipart)
    async fn update_property(
        &self,
        access_token: &str,
        id: PropertyId,
        form: PropertyForm,
    ) -> AppResult<PropertyDto>;

    /// DELETE /properties/{id}
    async fn delete_property(&self, access_token: &str, id: PropertyId) -> AppResult<()>;

    /// GET /favorites
    async fn list_favorites(&self, access_token: &str) -> AppResult<FavoritesResponse>;

    /// POST /favorites/{propertyId}
    async fn add_favorite(&self, access_token: &str, id: PropertyId) -> AppResult<()>;

    /// DELETE /favorites/{propertyId}
    async fn remove_favorite(&self, access_token: &str, id: PropertyId) -> AppResult<()>;
}
