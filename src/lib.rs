use std::sync::Arc;

use tokio::task::JoinHandle;

use api::{ApiClient, MarketplaceApi};
use config::Config;
use error::AppResult;
use favorites::FavoritesStore;
use middleware::GuardOutcome;
use notify::ToastQueue;
use routes::{HistoryNavigator, Route};
use search::{DetailsController, ListingController};
use session::{RefreshLoop, SessionStore};
use storage::{FileStorage, MemoryStorage, SessionStorages, StorageKind};
use utils::{Clock, SystemClock};
use wizard::{PreviewRegistry, Publisher, Wizard, WizardMode};

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod favorites;
pub mod listing;
pub mod middleware;
pub mod notify;
pub mod routes;
pub mod search;
pub mod session;
pub mod storage;
pub mod utils;
pub mod wizard;

/// 应用上下文，各页面共享的服务都从这里取
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub api: Arc<dyn MarketplaceApi>,
    pub session: Arc<SessionStore>,
    pub favorites: Arc<FavoritesStore>,
    pub toasts: Arc<ToastQueue>,
    pub navigator: Arc<HistoryNavigator>,
    pub clock: Arc<dyn Clock>,
    pub previews: Arc<PreviewRegistry>,
}

/// 后台任务，drop 时全部停止
pub struct BootHandles {
    pub refresh: RefreshLoop,
    pub favorites: JoinHandle<()>,
}

impl Drop for BootHandles {
    fn drop(&mut self) {
        self.favorites.abort();
    }
}

impl AppContext {
    /// 使用真实后端与文件存储
    pub fn new(config: Config) -> AppResult<Self> {
        let api = Arc::new(ApiClient::new(&config)?);
        let storages = SessionStorages::new(
            Arc::new(FileStorage::open(&config.storage_path)),
            Arc::new(MemoryStorage::new(StorageKind::Session)),
        );
        Ok(Self::with_api(config, api, storages))
    }

    pub fn with_api(config: Config, api: Arc<dyn MarketplaceApi>, storages: SessionStorages) -> Self {
        let toasts = Arc::new(ToastQueue::new());
        let navigator = Arc::new(HistoryNavigator::new());
        let session = Arc::new(
            SessionStore::new(api.clone(), storages).with_navigator(navigator.clone()),
        );
        let favorites = Arc::new(FavoritesStore::new(
            api.clone(),
            session.clone(),
            toasts.clone(),
        ));

        Self {
            config,
            api,
            session,
            favorites,
            toasts,
            navigator,
            clock: Arc::new(SystemClock),
            previews: Arc::new(PreviewRegistry::new()),
        }
    }

    /// 恢复会话，启动令牌刷新与收藏同步
    pub fn boot(&self) -> BootHandles {
        self.session.initialize();
        let refresh = RefreshLoop::spawn(self.session.clone(), self.config.token_refresh_interval());
        let favorites = self.favorites.clone().watch();
        tracing::info!(
            api = %self.config.api_base_url,
            authenticated = self.session.is_authenticated(),
            "marketplace client booted"
        );
        BootHandles { refresh, favorites }
    }

    pub fn guard(&self, route: Route) -> GuardOutcome {
        middleware::guard_route(&self.session.snapshot(), route)
    }

    /// 需要在 tokio 运行时内调用
    pub fn listing_controller(&self) -> ListingController {
        ListingController::new(
            self.api.clone(),
            self.toasts.clone(),
            &self.config,
            self.clock.clone(),
        )
        .with_favorites(self.favorites.clone())
    }

    pub fn details_controller(&self) -> DetailsController {
        DetailsController::new(self.api.clone(), self.toasts.clone())
            .with_favorites(self.favorites.clone())
    }

    pub fn publisher(&self) -> Publisher {
        Publisher::new(
            self.api.clone(),
            self.session.clone(),
            self.toasts.clone(),
            self.config.publish_min_interval(),
            self.clock.clone(),
        )
        .with_navigator(self.navigator.clone())
    }

    pub fn wizard(&self, mode: WizardMode) -> Wizard {
        Wizard::new(mode, self.previews.clone())
    }
}
