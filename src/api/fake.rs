//! 内存中的假后端，供各模块单元测试使用

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::MarketplaceApi;
use super::schema::{
    FavoriteEntry, FavoriteProperty, FavoritesResponse, LoginRequest, ProfileDto, PropertyDto,
    PropertyForm, PropertyId, PropertyListResponse, TokenPair,
};
use crate::error::{AppError, AppResult};
use crate::session::Role;

#[derive(Default)]
pub struct Calls {
    pub login: AtomicUsize,
    pub profile: AtomicUsize,
    pub refresh: AtomicUsize,
    pub list_properties: AtomicUsize,
    pub get_property: AtomicUsize,
    pub create_property: AtomicUsize,
    pub update_property: AtomicUsize,
    pub list_favorites: AtomicUsize,
    pub add_favorite: AtomicUsize,
    pub remove_favorite: AtomicUsize,
}

#[derive(Default)]
pub struct FakeApi {
    pub calls: Calls,
    users: Mutex<HashMap<String, (String, ProfileDto)>>,
    sessions: Mutex<HashMap<String, String>>,
    token_counter: AtomicUsize,
    pub fail_refresh: AtomicBool,
    pub fail_profile: AtomicBool,
    pub fail_favorites: AtomicBool,
    pub fail_listings: AtomicBool,
    pub fail_mutations: AtomicBool,
    favorites: Mutex<HashSet<PropertyId>>,
    properties: Mutex<Vec<PropertyDto>>,
    delays: Mutex<HashMap<PropertyId, Duration>>,
    mutation_delay: Mutex<Option<Duration>>,
    refresh_delay: Mutex<Option<Duration>>,
    pub last_params: Mutex<Vec<(String, String)>>,
    pub last_form: Mutex<Option<PropertyForm>>,
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, id: u64, email: &str, password: &str, role: Role) -> Self {
        let profile = ProfileDto {
            id,
            first_name: "Test".into(),
            last_name: format!("User{}", id),
            email: email.into(),
            role,
            is_verified: true,
        };
        self.users
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), profile));
        self
    }

    pub fn with_properties(self, properties: Vec<PropertyDto>) -> Self {
        *self.properties.lock().unwrap() = properties;
        self
    }

    pub fn with_favorites(self, ids: &[PropertyId]) -> Self {
        self.favorites.lock().unwrap().extend(ids.iter().copied());
        self
    }

    /// get_property 对该 id 延迟返回
    pub fn delay_property(&self, id: PropertyId, delay: Duration) {
        self.delays.lock().unwrap().insert(id, delay);
    }

    /// 收藏的增删请求延迟返回
    pub fn delay_mutations(&self, delay: Duration) {
        *self.mutation_delay.lock().unwrap() = Some(delay);
    }

    /// 刷新令牌请求延迟返回
    pub fn delay_refresh(&self, delay: Duration) {
        *self.refresh_delay.lock().unwrap() = Some(delay);
    }

    async fn mutation_latency(&self) {
        let delay = *self.mutation_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn server_favorites(&self) -> HashSet<PropertyId> {
        self.favorites.lock().unwrap().clone()
    }

    fn issue_tokens(&self, email: &str) -> TokenPair {
        let n = self.token_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let pair = TokenPair {
            access: format!("access-{}", n),
            refresh: format!("refresh-{}", n),
        };
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(pair.access.clone(), email.to_string());
        sessions.insert(pair.refresh.clone(), email.to_string());
        pair
    }

    fn email_for(&self, token: &str) -> AppResult<String> {
        self.sessions
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("token not valid".into()))
    }
}

#[async_trait]
impl MarketplaceApi for FakeApi {
    async fn login(&self, req: &LoginRequest) -> AppResult<TokenPair> {
        self.calls.login.fetch_add(1, Ordering::SeqCst);
        let valid = self
            .users
            .lock()
            .unwrap()
            .get(&req.email)
            .is_some_and(|(password, _)| *password == req.password);
        if !valid {
            return Err(AppError::Unauthorized("No active account found".into()));
        }
        Ok(self.issue_tokens(&req.email))
    }

    async fn profile(&self, access_token: &str) -> AppResult<ProfileDto> {
        self.calls.profile.fetch_add(1, Ordering::SeqCst);
        if self.fail_profile.load(Ordering::SeqCst) {
            return Err(AppError::Api {
                status: 500,
                message: "profile unavailable".into(),
            });
        }
        let email = self.email_for(access_token)?;
        self.users
            .lock()
            .unwrap()
            .get(&email)
            .map(|(_, profile)| profile.clone())
            .ok_or_else(|| AppError::Unauthorized("unknown user".into()))
    }

    async fn refresh_token(&self, refresh_token: &str) -> AppResult<TokenPair> {
        self.calls.refresh.fetch_add(1, Ordering::SeqCst);
        let delay = *self.refresh_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(AppError::Unauthorized("Token is invalid or expired".into()));
        }
        let email = self.email_for(refresh_token)?;
        Ok(self.issue_tokens(&email))
    }

    async fn list_properties(&self, params: &[(String, String)]) -> AppResult<PropertyListResponse> {
        self.calls.list_properties.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock().unwrap() = params.to_vec();
        if self.fail_listings.load(Ordering::SeqCst) {
            return Err(AppError::Api {
                status: 500,
                message: String::new(),
            });
        }
        let results = self.properties.lock().unwrap().clone();
        Ok(PropertyListResponse {
            count: results.len() as u64,
            results,
        })
    }

    async fn get_property(&self, id: PropertyId) -> AppResult<PropertyDto> {
        self.calls.get_property.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().unwrap().get(&id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.properties
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(AppError::Api {
                status: 404,
                message: String::new(),
            })
    }

    async fn create_property(&self, access_token: &str, form: PropertyForm) -> AppResult<PropertyDto> {
        self.calls.create_property.fetch_add(1, Ordering::SeqCst);
        self.email_for(access_token)?;
        let title = form.field("title").unwrap_or_default().to_string();
        *self.last_form.lock().unwrap() = Some(form);
        let mut properties = self.properties.lock().unwrap();
        let id = properties.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let created = PropertyDto {
            id,
            title,
            ..Default::default()
        };
        properties.push(created.clone());
        Ok(created)
    }

    async fn update_property(
        &self,
        access_token: &str,
        id: PropertyId,
        form: PropertyForm,
    ) -> AppResult<PropertyDto> {
        self.calls.update_property.fetch_add(1, Ordering::SeqCst);
        self.email_for(access_token)?;
        *self.last_form.lock().unwrap() = Some(form);
        Ok(PropertyDto {
            id,
            ..Default::default()
        })
    }

    async fn delete_property(&self, access_token: &str, id: PropertyId) -> AppResult<()> {
        self.email_for(access_token)?;
        self.properties.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }

    async fn list_favorites(&self, access_token: &str) -> AppResult<FavoritesResponse> {
        self.calls.list_favorites.fetch_add(1, Ordering::SeqCst);
        self.email_for(access_token)?;
        if self.fail_favorites.load(Ordering::SeqCst) {
            return Err(AppError::Network("connection reset".into()));
        }
        let results = self
            .favorites
            .lock()
            .unwrap()
            .iter()
            .map(|id| FavoriteEntry {
                property: FavoriteProperty { id: *id },
            })
            .collect();
        Ok(FavoritesResponse { results })
    }

    async fn add_favorite(&self, access_token: &str, id: PropertyId) -> AppResult<()> {
        self.calls.add_favorite.fetch_add(1, Ordering::SeqCst);
        self.email_for(access_token)?;
        self.mutation_latency().await;
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(AppError::Network("connection reset".into()));
        }
        self.favorites.lock().unwrap().insert(id);
        Ok(())
    }

    async fn remove_favorite(&self, access_token: &str, id: PropertyId) -> AppResult<()> {
        self.calls.remove_favorite.fetch_add(1, Ordering::SeqCst);
        self.email_for(access_token)?;
        self.mutation_latency().await;
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(AppError::Network("connection reset".into()));
        }
        self.favorites.lock().unwrap().remove(&id);
        Ok(())
    }
}
