// 收藏
// 只对租客生效：会话切换到租客时拉取一次收藏列表，其它情况立即清空

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;

use crate::api::MarketplaceApi;
use crate::api::schema::PropertyId;
use crate::error::{AppError, AppResult};
use crate::middleware::report_error;
use crate::notify::Notifier;
use crate::session::{Role, SessionState, SessionStore};
use crate::utils::RequestSequence;

const LOGIN_REQUIRED: &str = "请先登录后再收藏房源";
const TENANT_ONLY: &str = "只有租客账号可以收藏房源";

/// 决定是否需要重新拉取：用户、角色或访问令牌任一变化
type SyncKey = (Option<(u64, Role)>, Option<String>);

fn sync_key(state: &SessionState) -> SyncKey {
    (
        state.user.as_ref().map(|user| (user.id, user.role)),
        state.access_token.clone(),
    )
}

pub struct FavoritesStore {
    api: Arc<dyn MarketplaceApi>,
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
    ids: Mutex<HashSet<PropertyId>>,
    in_flight: Mutex<HashSet<PropertyId>>,
    sequence: RequestSequence,
}

/// drop 时把 id 移出进行中集合
struct InFlight<'a> {
    set: &'a Mutex<HashSet<PropertyId>>,
    id: PropertyId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.id);
    }
}

impl FavoritesStore {
    pub fn new(
        api: Arc<dyn MarketplaceApi>,
        session: Arc<SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            session,
            notifier,
            ids: Mutex::new(HashSet::new()),
            in_flight: Mutex::new(HashSet::new()),
            sequence: RequestSequence::new(),
        }
    }

    pub fn is_saved(&self, id: PropertyId) -> bool {
        lock(&self.ids).contains(&id)
    }

    pub fn ids(&self) -> HashSet<PropertyId> {
        lock(&self.ids).clone()
    }

    pub fn is_busy(&self, id: PropertyId) -> bool {
        lock(&self.in_flight).contains(&id)
    }

    /// 按会话快照同步收藏集合。
    ///
    /// 非租客或未登录时同步清空并返回 None；租客则发起一次拉取，返回其任务句柄。
    /// 每次调用都会让之前未完成的拉取失效。
    pub fn sync(self: &Arc<Self>, state: &SessionState) -> Option<JoinHandle<()>> {
        let ticket = self.sequence.issue();

        let token = match (state.role(), state.access_token.clone()) {
            (Some(Role::Tenant), Some(token)) => token,
            _ => {
                let mut ids = lock(&self.ids);
                if !ids.is_empty() {
                    tracing::debug!(cleared = ids.len(), "clearing favorites for non-tenant session");
                    ids.clear();
                }
                return None;
            }
        };

        let store = Arc::clone(self);
        Some(tokio::spawn(async move {
            match store.api.list_favorites(&token).await {
                Ok(response) => {
                    let fetched: HashSet<PropertyId> = response.property_ids().collect();
                    if let Some(fetched) = store.sequence.apply(ticket, fetched) {
                        tracing::debug!(count = fetched.len(), "favorites loaded");
                        *lock(&store.ids) = fetched;
                    }
                }
                Err(e) if store.sequence.is_current(ticket) => {
                    // 保留现有集合
                    report_error(store.notifier.as_ref(), "load favorites", &e);
                }
                Err(e) => tracing::debug!(error = %e, "ignoring failure of superseded favorites fetch"),
            }
        }))
    }

    /// 跟随会话变化自动同步，会话初始化完成前不做任何事
    pub fn watch(self: Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.session.subscribe();
        tokio::spawn(async move {
            let mut last: Option<SyncKey> = None;
            loop {
                let state = changes.borrow_and_update().clone();
                if !state.is_initializing {
                    let key = sync_key(&state);
                    if last.as_ref() != Some(&key) {
                        last = Some(key);
                        self.sync(&state);
                    }
                }
                if changes.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// 切换收藏状态，返回切换后是否已收藏。
    ///
    /// 后端确认成功后才修改本地集合；同一房源的上一次切换未完成时直接拒绝。
    /// 请求期间会话发生变化则不动本地集合，返回 [`AppError::Stale`]。
    pub async fn toggle(&self, id: PropertyId) -> AppResult<bool> {
        let state = self.session.snapshot();
        let token = match state.access_token.clone() {
            Some(token) if state.is_authenticated() => token,
            _ => {
                self.notifier.info(LOGIN_REQUIRED);
                return Err(AppError::NotLoggedIn);
            }
        };
        if !state.is_tenant() {
            self.notifier.error(TENANT_ONLY);
            return Err(AppError::Forbidden(TENANT_ONLY.into()));
        }

        if !lock(&self.in_flight).insert(id) {
            tracing::debug!(property_id = id, "favorite toggle already in flight");
            return Err(AppError::DuplicateSubmission);
        }
        let _in_flight = InFlight {
            set: &self.in_flight,
            id,
        };

        let key = sync_key(&state);
        let was_saved = self.is_saved(id);
        let result = if was_saved {
            self.api.remove_favorite(&token, id).await
        } else {
            self.api.add_favorite(&token, id).await
        };

        if let Err(e) = result {
            report_error(self.notifier.as_ref(), "toggle favorite", &e);
            return Err(e);
        }

        // 等待期间登出或切换了账号，本地集合已归属新的会话
        if sync_key(&self.session.snapshot()) != key {
            tracing::debug!(property_id = id, "session changed during favorite toggle, discarding result");
            return Err(AppError::Stale);
        }

        {
            let mut ids = lock(&self.ids);
            if was_saved {
                ids.remove(&id);
            } else {
                ids.insert(id);
            }
        }
        if was_saved {
            self.notifier.success("已取消收藏");
        } else {
            self.notifier.success("已加入收藏");
        }
        tracing::info!(property_id = id, saved = !was_saved, "favorite toggled");
        Ok(!was_saved)
    }
}

fn lock(set: &Mutex<HashSet<PropertyId>>) -> MutexGuard<'_, HashSet<PropertyId>> {
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
