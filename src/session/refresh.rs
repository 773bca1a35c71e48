use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::SessionStore;

/// 后台定时刷新令牌。
///
/// 持有刷新令牌时每隔 `period` 调用一次 [`SessionStore::refresh`]；刷新令牌
/// 变化（轮换、登出、重新登录）会重新计时，令牌为空时停止计时直到再次登录。
/// 调用 [`RefreshLoop::cancel`] 或 drop 后任务结束。
pub struct RefreshLoop {
    handle: JoinHandle<()>,
}

impl RefreshLoop {
    pub fn spawn(session: Arc<SessionStore>, period: Duration) -> Self {
        if let Some(expires_at) = session.access_token_expires_at() {
            let lifetime = expires_at - chrono::Utc::now();
            if lifetime.to_std().is_ok_and(|lifetime| period >= lifetime) {
                tracing::warn!(
                    period_secs = period.as_secs(),
                    "token refresh interval is not shorter than the access token lifetime"
                );
            }
        }

        let handle = tokio::spawn(supervise(session, period));
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RefreshLoop {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn supervise(session: Arc<SessionStore>, period: Duration) {
    let mut changes = session.subscribe();
    loop {
        let current = changes.borrow_and_update().refresh_token.clone();

        let Some(token) = current else {
            // 等待登录
            if changes
                .wait_for(|state| state.refresh_token.is_some())
                .await
                .map(|_| ())
                .is_err()
            {
                break;
            }
            continue;
        };

        tokio::select! {
            _ = tokio::time::sleep(period) => {
                if let Err(e) = session.refresh().await {
                    tracing::warn!(error = %e, "background token refresh failed");
                }
            }
            // Ref 持有读锁，不能跨越上面分支里的 await
            changed = async {
                changes
                    .wait_for(|state| state.refresh_token.as_deref() != Some(token.as_str()))
                    .await
                    .map(|_| ())
            } => {
                if changed.is_err() {
                    break;
                }
                tracing::debug!("refresh token changed, restarting refresh timer");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use tokio::time::sleep;

    use super::*;
    use crate::api::fake::{FakeApi, count};
    use crate::session::Role;
    use crate::storage::SessionStorages;

    const PERIOD: Duration = Duration::from_secs(240);

    async fn logged_in() -> (Arc<SessionStore>, Arc<FakeApi>) {
        let api = Arc::new(FakeApi::new().with_user(1, "t@example.com", "pw", Role::Tenant));
        let session = Arc::new(SessionStore::new(api.clone(), SessionStorages::in_memory()));
        session.initialize();
        session.login("t@example.com", "pw", true).await.unwrap();
        (session, api)
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn supervisor_future_can_be_spawned() {
        let (session, _) = logged_in().await;
        let task = supervise(session, PERIOD);
        assert_send(&task);
        drop(task);
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_on_a_fixed_interval() {
        let (session, api) = logged_in().await;
        let first = session.access_token();
        let _refresh = RefreshLoop::spawn(session.clone(), PERIOD);

        sleep(PERIOD - Duration::from_secs(1)).await;
        assert_eq!(count(&api.calls.refresh), 0);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(count(&api.calls.refresh), 1);
        assert_ne!(session.access_token(), first);

        sleep(PERIOD).await;
        assert_eq!(count(&api.calls.refresh), 2);
        assert!(session.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_logs_out_and_stops_refreshing() {
        let (session, api) = logged_in().await;
        api.fail_refresh.store(true, Ordering::SeqCst);
        let _refresh = RefreshLoop::spawn(session.clone(), PERIOD);

        sleep(PERIOD + Duration::from_secs(1)).await;
        assert_eq!(count(&api.calls.refresh), 1);
        assert!(!session.is_authenticated());

        sleep(PERIOD * 3).await;
        assert_eq!(count(&api.calls.refresh), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn logout_stops_timer_and_login_restarts_it() {
        let (session, api) = logged_in().await;
        let _refresh = RefreshLoop::spawn(session.clone(), PERIOD);

        sleep(Duration::from_secs(10)).await;
        session.logout();
        sleep(PERIOD * 2).await;
        assert_eq!(count(&api.calls.refresh), 0);

        session.login("t@example.com", "pw", false).await.unwrap();
        sleep(PERIOD + Duration::from_secs(1)).await;
        assert_eq!(count(&api.calls.refresh), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_tears_down_the_task() {
        let (session, api) = logged_in().await;
        let refresh = RefreshLoop::spawn(session.clone(), PERIOD);
        refresh.cancel();

        sleep(PERIOD * 2).await;
        assert!(refresh.is_finished());
        assert_eq!(count(&api.calls.refresh), 0);
    }
}
