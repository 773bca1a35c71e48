use std::sync::Arc;

use tokio::sync::watch;

use super::to_view;
use crate::api::MarketplaceApi;
use crate::api::schema::PropertyId;
use crate::error::AppResult;
use crate::favorites::FavoritesStore;
use crate::listing::Property;
use crate::middleware::report_error;
use crate::notify::Notifier;
use crate::utils::RequestSequence;

#[derive(Debug, Clone, PartialEq)]
pub enum DetailsState {
    Idle,
    Loading(PropertyId),
    Ready(Box<Property>),
    Failed(String),
}

/// 房源详情页。快速切换 id 时只有最后一次请求的结果会被显示
pub struct DetailsController {
    api: Arc<dyn MarketplaceApi>,
    notifier: Arc<dyn Notifier>,
    favorites: Option<Arc<FavoritesStore>>,
    sequence: RequestSequence,
    view: watch::Sender<DetailsState>,
}

impl DetailsController {
    pub fn new(api: Arc<dyn MarketplaceApi>, notifier: Arc<dyn Notifier>) -> Self {
        let (view, _) = watch::channel(DetailsState::Idle);
        Self {
            api,
            notifier,
            favorites: None,
            sequence: RequestSequence::new(),
            view,
        }
    }

    pub fn with_favorites(mut self, favorites: Arc<FavoritesStore>) -> Self {
        self.favorites = Some(favorites);
        self
    }

    pub fn state(&self) -> DetailsState {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailsState> {
        self.view.subscribe()
    }

    /// 结果已被更新的请求取代时返回 `Ok(None)`，状态不变
    pub async fn load(&self, id: PropertyId) -> AppResult<Option<Property>> {
        let ticket = self.sequence.issue();
        self.view.send_replace(DetailsState::Loading(id));

        let result = self.api.get_property(id).await;
        let Some(result) = self.sequence.apply(ticket, result) else {
            return Ok(None);
        };

        match result {
            Ok(dto) => {
                let property = to_view(dto, self.favorites.as_ref());
                self.view
                    .send_replace(DetailsState::Ready(Box::new(property.clone())));
                Ok(Some(property))
            }
            Err(e) => {
                report_error(self.notifier.as_ref(), "load property details", &e);
                self.view.send_replace(DetailsState::Failed(e.user_message()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::api::fake::FakeApi;
    use crate::api::schema::PropertyDto;
    use crate::error::AppError;
    use crate::notify::ToastQueue;

    fn dto(id: PropertyId, title: &str) -> PropertyDto {
        PropertyDto {
            id,
            title: title.into(),
            price: serde_json::json!("250000"),
            ..Default::default()
        }
    }

    fn controller(api: Arc<FakeApi>) -> (DetailsController, Arc<ToastQueue>) {
        let toasts = Arc::new(ToastQueue::new());
        (DetailsController::new(api, toasts.clone()), toasts)
    }

    #[tokio::test(start_paused = true)]
    async fn slow_earlier_response_never_overwrites_later_one() {
        let api = Arc::new(FakeApi::new().with_properties(vec![dto(1, "Slow"), dto(2, "Fast")]));
        api.delay_property(1, Duration::from_millis(300));
        let (details, _) = controller(api);

        let (first, second) = tokio::join!(details.load(1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            details.load(2).await
        });

        assert_eq!(first.unwrap(), None);
        assert_eq!(second.unwrap().map(|p| p.title), Some("Fast".to_string()));
        match details.state() {
            DetailsState::Ready(property) => assert_eq!(property.id, 2),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn not_found_reports_and_fails() {
        let (details, toasts) = controller(Arc::new(FakeApi::new()));

        let result = details.load(42).await;
        assert!(matches!(result, Err(AppError::Api { status: 404, .. })));
        assert!(matches!(details.state(), DetailsState::Failed(_)));
        assert_eq!(
            toasts.last().map(|t| t.message),
            Some("请求的资源不存在".to_string())
        );
    }

    #[tokio::test]
    async fn normalises_price() {
        let api = Arc::new(FakeApi::new().with_properties(vec![dto(1, "Loft")]));
        let (details, _) = controller(api);
        let property = details.load(1).await.unwrap().unwrap();
        assert_eq!(property.price, 250000.0);
        assert!(!property.is_saved);
    }
}
