// 会话模块
// 当前登录用户与令牌的唯一数据源：登录、登出、刷新、资料更新

pub mod model;
pub mod persist;
pub mod refresh;
pub mod token;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::api::MarketplaceApi;
use crate::api::schema::LoginRequest;
use crate::error::{AppError, AppResult};
use crate::routes::{Navigator, Route, landing_route};
use crate::storage::SessionStorages;

pub use model::{Role, SessionState, User, UserPatch};
pub use persist::StoredSession;
pub use refresh::RefreshLoop;

/// 会话存储。任何组件都可以读取，只有这里的方法会修改状态。
///
/// 状态放在 `watch` 通道里，收藏等依赖会话的模块通过 [`SessionStore::subscribe`]
/// 感知 user/token 的变化。
pub struct SessionStore {
    api: Arc<dyn MarketplaceApi>,
    storages: SessionStorages,
    navigator: Option<Arc<dyn Navigator>>,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(api: Arc<dyn MarketplaceApi>, storages: SessionStorages) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            api,
            storages,
            navigator: None,
            state,
        }
    }

    /// 登录成功与登出后通过它跳转
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn storages(&self) -> &SessionStorages {
        &self.storages
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_initializing(&self) -> bool {
        self.state.borrow().is_initializing
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.borrow().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state.borrow().refresh_token.clone()
    }

    /// 启动时同步读取一次存储：先持久存储，再会话存储。不发网络请求，重复调用无效果
    pub fn initialize(&self) {
        if !self.state.borrow().is_initializing {
            return;
        }

        let restored = persist::load(&self.storages.durable)
            .or_else(|| persist::load(&self.storages.session));

        match &restored {
            Some(stored) => tracing::info!(user_id = stored.user.id, "session restored from storage"),
            None => tracing::debug!("no stored session"),
        }

        self.state.send_modify(|state| {
            if let Some(stored) = restored {
                state.user = Some(stored.user);
                state.access_token = Some(stored.access_token);
                state.refresh_token = Some(stored.refresh_token);
            }
            state.is_initializing = false;
        });
    }

    /// 用账号密码换取令牌，再用新令牌拉取用户资料。
    ///
    /// 任一步失败都返回错误，内存状态和存储保持不变。成功后凭证只写入
    /// `remember_me` 选中的那一级存储，另一级被清空。
    pub async fn login(&self, email: &str, password: &str, remember_me: bool) -> AppResult<User> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let tokens = self.api.login(&request).await.inspect_err(|e| {
            tracing::warn!(error = %e, "login failed");
        })?;
        let profile = self.api.profile(&tokens.access).await.inspect_err(|e| {
            tracing::warn!(error = %e, "failed to fetch profile after login");
        })?;
        let user = User::from(profile);

        let stored = StoredSession {
            access_token: tokens.access,
            refresh_token: tokens.refresh,
            user: user.clone(),
        };
        let target = self.storages.select(remember_me);
        if let Err(e) = persist::save(target, &stored) {
            persist::clear(target);
            tracing::error!(error = %e, "failed to persist session");
            return Err(e);
        }
        persist::clear(self.storages.other(target.kind()));

        self.state.send_modify(|state| {
            state.user = Some(stored.user);
            state.access_token = Some(stored.access_token);
            state.refresh_token = Some(stored.refresh_token);
            state.is_initializing = false;
        });
        tracing::info!(user_id = user.id, role = ?user.role, remember_me, "logged in");

        if let Some(navigator) = &self.navigator {
            navigator.navigate(landing_route(&user.role));
        }
        Ok(user)
    }

    /// 清空内存与两级存储，可重复调用
    pub fn logout(&self) {
        for backend in self.storages.both() {
            persist::clear(backend);
        }
        let was_authenticated = self.state.send_if_modified(|state| {
            let changed = state.user.is_some()
                || state.access_token.is_some()
                || state.refresh_token.is_some();
            state.user = None;
            state.access_token = None;
            state.refresh_token = None;
            changed
        });
        if was_authenticated {
            tracing::info!("logged out");
        }

        if let Some(navigator) = &self.navigator {
            navigator.navigate(Route::Home);
        }
    }

    /// 用刷新令牌换取新的一对令牌，同时替换内存和当前持有令牌的那一级存储。
    /// 失败视为会话失效，直接登出。
    ///
    /// 请求期间会话已被登出或替换时，无论成败都不动当前会话，返回 [`AppError::Stale`]。
    /// 新令牌写入存储失败时清空该级存储，旧的刷新令牌已被后端作废，不能留给下次启动。
    pub async fn refresh(&self) -> AppResult<()> {
        let Some(refresh_token) = self.refresh_token() else {
            return Err(AppError::NotLoggedIn);
        };

        let result = self.api.refresh_token(&refresh_token).await;

        // 等待期间已登出或令牌已被替换
        if self.refresh_token().as_deref() != Some(refresh_token.as_str()) {
            tracing::debug!(failed = result.is_err(), "session changed while refreshing, discarding result");
            return Err(AppError::Stale);
        }

        let tokens = match result {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed, logging out");
                self.logout();
                return Err(e);
            }
        };

        // 通过探测确定令牌所在的存储，而不是记住登录时的选择
        match self.storages.active() {
            Some(backend) => {
                if let Err(e) = persist::save_tokens(backend, &tokens.access, &tokens.refresh) {
                    tracing::error!(backend = ?backend.kind(), error = %e, "failed to persist refreshed tokens, clearing stored session");
                    persist::clear(backend);
                }
            }
            None => tracing::debug!("no storage holds a token, refreshed tokens kept in memory only"),
        }

        self.state.send_modify(|state| {
            state.access_token = Some(tokens.access);
            state.refresh_token = Some(tokens.refresh);
        });
        tracing::info!("access token refreshed");
        Ok(())
    }

    /// 合并资料字段并重新写入当前使用的存储。未登录时不做任何事
    pub fn update_user_context(&self, patch: UserPatch) -> AppResult<()> {
        let mut updated = None;
        self.state.send_if_modified(|state| match state.user.as_mut() {
            Some(user) => {
                patch.apply_to(user);
                updated = Some(user.clone());
                true
            }
            None => false,
        });

        let Some(user) = updated else {
            return Ok(());
        };
        match self.storages.active() {
            Some(backend) => persist::save_user(backend, &user),
            None => {
                tracing::warn!("no active storage to persist updated user");
                Ok(())
            }
        }
    }

    pub fn access_token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.access_token().as_deref().and_then(token::expires_at)
    }
}
