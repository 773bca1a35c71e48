use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::MarketplaceApi;
use super::schema::{
    FavoritesResponse, LoginRequest, ProfileDto, PropertyDto, PropertyForm, PropertyId,
    PropertyListResponse, RefreshRequest, TokenPair,
};
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// 错误消息最多保留的字符数
const MAX_ERROR_BODY: usize = 200;

/// 基于 reqwest 的后端客户端
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Config(format!("failed to build http client: {}", e)))?;
        Self::with_client(client, &config.api_base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> AppResult<Self> {
        // 保证以 / 结尾，否则 join 会替换掉最后一段路径
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = check_status(request.send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> AppResult<()> {
        check_status(request.send().await?).await?;
        Ok(())
    }
}

/// 非 2xx 响应转换为错误，尽量提取后端给出的 detail/message
async fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body);
    tracing::warn!(%url, status = status.as_u16(), message = %message, "api request failed");

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::Unauthorized(message)),
        _ => Err(AppError::Api {
            status: status.as_u16(),
            message,
        }),
    }
}

fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    body.chars().take(MAX_ERROR_BODY).collect()
}

fn multipart(form: PropertyForm) -> AppResult<Form> {
    let mut multipart = Form::new();
    for (key, value) in form.fields {
        multipart = multipart.text(key, value);
    }
    for file in form.files {
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .map_err(|e| AppError::Validation(
                [(file.field.clone(), format!("不支持的文件类型：{}", e))].into(),
            ))?;
        multipart = multipart.part(file.field, part);
    }
    Ok(multipart)
}

#[async_trait]
impl MarketplaceApi for ApiClient {
    async fn login(&self, req: &LoginRequest) -> AppResult<TokenPair> {
        let url = self.endpoint("auth/login")?;
        self.send(self.client.post(url).json(req)).await
    }

    async fn profile(&self, access_token: &str) -> AppResult<ProfileDto> {
        let url = self.endpoint("auth/profile")?;
        self.send(self.client.get(url).bearer_auth(access_token)).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let url = self.endpoint("token/refresh")?;
        let body = RefreshRequest {
            refresh: refresh_token.to_string(),
        };
        self.send(self.client.post(url).json(&body)).await
    }

    async fn list_properties(&self, params: &[(String, String)]) -> AppResult<PropertyListResponse> {
        let url = self.endpoint("properties")?;
        self.send(self.client.get(url).query(params)).await
    }

    async fn get_property(&self, id: PropertyId) -> AppResult<PropertyDto> {
        let url = self.endpoint(&format!("properties/{}", id))?;
        self.send(self.client.get(url)).await
    }

    async fn create_property(&self, access_token: &str, form: PropertyForm) -> AppResult<PropertyDto> {
        let url = self.endpoint("properties")?;
        let request = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .multipart(multipart(form)?);
        self.send(request).await
    }

    async fn update_property(
        &self,
        access_token: &str,
        id: PropertyId,
        form: PropertyForm,
    ) -> AppResult<PropertyDto> {
        let url = self.endpoint(&format!("properties/{}", id))?;
        let request = self
            .client
            .patch(url)
            .bearer_auth(access_token)
            .multipart(multipart(form)?);
        self.send(request).await
    }

    async fn delete_property(&self, access_token: &str, id: PropertyId) -> AppResult<()> {
        let url = self.endpoint(&format!("properties/{}", id))?;
        self.send_empty(self.client.delete(url).bearer_auth(access_token))
            .await
    }

    async fn list_favorites(&self, access_token: &str) -> AppResult<FavoritesResponse> {
        let url = self.endpoint("favorites")?;
        self.send(self.client.get(url).bearer_auth(access_token)).await
    }

    async fn add_favorite(&self, access_token: &str, id: PropertyId) -> AppResult<()> {
        let url = self.endpoint(&format!("favorites/{}", id))?;
        self.send_empty(self.client.post(url).bearer_auth(access_token))
            .await
    }

    async fn remove_favorite(&self, access_token: &str, id: PropertyId) -> AppResult<()> {
        let url = self.endpoint(&format!("favorites/{}", id))?;
        self.send_empty(self.client.delete(url).bearer_auth(access_token))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = ApiClient::with_client(Client::new(), "http://localhost:8000/api").unwrap();
        assert_eq!(
            client.endpoint("/auth/login").unwrap().as_str(),
            "http://localhost:8000/api/auth/login"
        );
        assert_eq!(
            client.endpoint("favorites/9").unwrap().as_str(),
            "http://localhost:8000/api/favorites/9"
        );
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        assert!(matches!(
            ApiClient::with_client(Client::new(), "not a url"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn error_message_prefers_detail_field() {
        assert_eq!(extract_message(r#"{"detail":"No active account"}"#), "No active account");
        assert_eq!(extract_message("plain failure"), "plain failure");
        assert_eq!(extract_message(&"x".repeat(500)).len(), MAX_ERROR_BODY);
    }
}
