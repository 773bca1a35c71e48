use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::to_view;
use crate::api::MarketplaceApi;
use crate::api::schema::PropertyListResponse;
use crate::cache::{ResponseCache, listing_key};
use crate::config::Config;
use crate::error::AppResult;
use crate::favorites::FavoritesStore;
use crate::listing::{FilterState, ListingPage, Property, pipeline};
use crate::middleware::report_error;
use crate::notify::Notifier;
use crate::utils::{Clock, Debouncer, RequestSequence, Ticket};

#[derive(Debug, Clone, PartialEq)]
pub enum ListingState {
    Idle,
    Loading,
    Ready(ListingPage),
    Failed(String),
}

/// 房源列表页控制器。
///
/// URL 查询串是筛选条件的唯一来源：[`ListingController::set_query_string`] 立即更新
/// URL 状态，同时经过防抖后才触发请求。响应先查缓存，再经过本地筛选排序。
pub struct ListingController {
    api: Arc<dyn MarketplaceApi>,
    notifier: Arc<dyn Notifier>,
    favorites: Option<Arc<FavoritesStore>>,
    cache: Mutex<ResponseCache<PropertyListResponse>>,
    sequence: RequestSequence,
    url_state: Mutex<FilterState>,
    debounced: Debouncer<FilterState>,
    page_size: u32,
    view: watch::Sender<ListingState>,
}

impl ListingController {
    /// 需要在 tokio 运行时内创建
    pub fn new(
        api: Arc<dyn MarketplaceApi>,
        notifier: Arc<dyn Notifier>,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (view, _) = watch::channel(ListingState::Idle);
        Self {
            api,
            notifier,
            favorites: None,
            cache: Mutex::new(ResponseCache::new(
                config.cache_max_entries,
                config.cache_ttl(),
                clock,
            )),
            sequence: RequestSequence::new(),
            url_state: Mutex::new(FilterState::default()),
            debounced: Debouncer::new(FilterState::default(), config.search_debounce()),
            page_size: config.page_size.max(1),
            view,
        }
    }

    pub fn with_favorites(mut self, favorites: Arc<FavoritesStore>) -> Self {
        self.favorites = Some(favorites);
        self
    }

    pub fn set_query_string(&self, qs: &str) {
        self.set_filters(FilterState::from_query_string(qs));
    }

    pub fn set_filters(&self, filters: FilterState) {
        *self.url_state() = filters.clone();
        self.debounced.set(filters);
    }

    /// 翻页不需要防抖
    pub fn go_to_page(&self, page: u32) {
        let mut filters = self.filters();
        filters.page = page.max(1);
        *self.url_state() = filters.clone();
        self.debounced.set(filters);
        self.debounced.flush();
    }

    pub fn filters(&self) -> FilterState {
        self.url_state().clone()
    }

    pub fn query_string(&self) -> String {
        self.url_state().to_query_string()
    }

    pub fn state(&self) -> ListingState {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListingState> {
        self.view.subscribe()
    }

    pub fn cached_pages(&self) -> usize {
        self.cache().size()
    }

    /// 按条件加载一页。结果已被更新的请求取代时返回 `Ok(None)`
    pub async fn load(&self, filters: FilterState) -> AppResult<Option<ListingPage>> {
        let ticket = self.sequence.issue();
        self.load_with(ticket, filters).await
    }

    /// 跟随防抖后的条件自动加载，先加载一次当前条件
    pub fn run(self: Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.debounced.subscribe();
        tokio::spawn(async move {
            loop {
                let filters = changes.borrow_and_update().clone();
                // 领号在派发之前，保证序号与条件变化的顺序一致
                let ticket = self.sequence.issue();
                let controller = Arc::clone(&self);
                tokio::spawn(async move {
                    if let Err(e) = controller.load_with(ticket, filters).await {
                        tracing::debug!(error = %e, "listing load failed");
                    }
                });
                if changes.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    async fn load_with(&self, ticket: Ticket, filters: FilterState) -> AppResult<Option<ListingPage>> {
        let key = listing_key(filters.page, self.page_size, &filters);

        let cached = self.cache().get(&key);
        let response = match cached {
            Some(response) => {
                tracing::debug!(key = %key, "listing cache hit");
                response
            }
            None => {
                if self.sequence.is_current(ticket) {
                    self.view.send_replace(ListingState::Loading);
                }
                let params = filters.api_params(filters.page, self.page_size);
                match self.api.list_properties(&params).await {
                    Ok(response) => {
                        self.cache().set(key, response.clone());
                        response
                    }
                    Err(e) if self.sequence.is_current(ticket) => {
                        report_error(self.notifier.as_ref(), "load listings", &e);
                        self.view.send_replace(ListingState::Failed(e.user_message()));
                        return Err(e);
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "ignoring failure of superseded listing request");
                        return Ok(None);
                    }
                }
            }
        };

        let Some(response) = self.sequence.apply(ticket, response) else {
            return Ok(None);
        };

        let properties: Vec<Property> = response
            .results
            .into_iter()
            .map(|dto| to_view(dto, self.favorites.as_ref()))
            .collect();
        let items = pipeline::apply(&properties, &filters);
        let page = ListingPage::new(items, filters.page, self.page_size, response.count);
        tracing::debug!(
            page = page.page,
            shown = page.items.len(),
            total = page.total_count,
            "listing rendered"
        );

        self.view.send_replace(ListingState::Ready(page.clone()));
        Ok(Some(page))
    }

    fn cache(&self) -> MutexGuard<'_, ResponseCache<PropertyListResponse>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn url_state(&self) -> MutexGuard<'_, FilterState> {
        self.url_state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
