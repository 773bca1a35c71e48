use std::sync::Arc;
use std::time::Duration;

use super::{Wizard, WizardMode};
use crate::api::MarketplaceApi;
use crate::api::schema::PropertyDto;
use crate::error::{AppError, AppResult};
use crate::middleware::{SubmitGuard, report_error};
use crate::notify::Notifier;
use crate::routes::{Navigator, Route};
use crate::session::{Role, SessionStore};
use crate::utils::Clock;

const PUBLISHER_ROLES: &[Role] = &[Role::Broker, Role::Admin];

/// 提交向导内容。校验不通过、角色不符或在最小间隔内重复提交都不会发请求
pub struct Publisher {
    api: Arc<dyn MarketplaceApi>,
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
    navigator: Option<Arc<dyn Navigator>>,
    guard: SubmitGuard,
}

impl Publisher {
    pub fn new(
        api: Arc<dyn MarketplaceApi>,
        session: Arc<SessionStore>,
        notifier: Arc<dyn Notifier>,
        min_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            session,
            notifier,
            navigator: None,
            guard: SubmitGuard::new(min_interval, clock),
        }
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    pub async fn publish(&self, wizard: &mut Wizard) -> AppResult<PropertyDto> {
        let errors = wizard.validate_all().clone();
        if !errors.is_empty() {
            let err = AppError::Validation(errors);
            self.notifier.error(&err.user_message());
            return Err(err);
        }

        let state = self.session.snapshot();
        let token = match state.access_token.clone() {
            Some(token) if state.is_authenticated() => token,
            _ => {
                let err = AppError::NotLoggedIn;
                report_error(self.notifier.as_ref(), "publish property", &err);
                return Err(err);
            }
        };
        if !state.role().is_some_and(|role| PUBLISHER_ROLES.contains(&role)) {
            let err = AppError::Forbidden("只有经纪人或管理员可以发布房源".into());
            report_error(self.notifier.as_ref(), "publish property", &err);
            return Err(err);
        }

        let _permit = self.guard.try_begin()?;

        let form = wizard.to_form();
        let result = match wizard.mode() {
            WizardMode::Create => self.api.create_property(&token, form).await,
            WizardMode::Edit(id) => self.api.update_property(&token, id, form).await,
        };

        match result {
            Ok(property) => {
                tracing::info!(property_id = property.id, mode = ?wizard.mode(), "property published");
                self.notifier.success(match wizard.mode() {
                    WizardMode::Create => "房源发布成功",
                    WizardMode::Edit(_) => "房源更新成功",
                });
                wizard.media_mut().clear();
                if let Some(navigator) = &self.navigator {
                    navigator.navigate(Route::PropertyDetails(property.id));
                }
                Ok(property)
            }
            Err(e) => {
                report_error(self.notifier.as_ref(), "publish property", &e);
                Err(e)
            }
        }
    }
}
