use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::utils::Clock;

#[derive(Debug, Default)]
struct SubmitState {
    in_flight: bool,
    last_attempt: Option<i64>,
}

/// 防重复提交：同一时间只允许一个请求，且两次尝试之间至少间隔 `min_interval`
pub struct SubmitGuard {
    min_interval: Duration,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<SubmitState>>,
}

/// 持有期间视为请求进行中，drop 时释放
pub struct SubmitPermit {
    state: Arc<Mutex<SubmitState>>,
}

impl SubmitGuard {
    pub fn new(min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            min_interval,
            clock,
            state: Arc::new(Mutex::new(SubmitState::default())),
        }
    }

    pub fn try_begin(&self) -> AppResult<SubmitPermit> {
        let now = self.clock.now_millis();
        let mut state = lock(&self.state);

        if state.in_flight {
            tracing::debug!("submission already in flight");
            return Err(AppError::DuplicateSubmission);
        }
        if let Some(last) = state.last_attempt {
            if now - last < self.min_interval.as_millis() as i64 {
                tracing::debug!(since_last_ms = now - last, "submission attempted too soon");
                return Err(AppError::DuplicateSubmission);
            }
        }

        state.in_flight = true;
        state.last_attempt = Some(now);
        Ok(SubmitPermit {
            state: self.state.clone(),
        })
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.state).in_flight
    }
}

impl Drop for SubmitPermit {
    fn drop(&mut self) {
        lock(&self.state).in_flight = false;
    }
}

fn lock(state: &Mutex<SubmitState>) -> MutexGuard<'_, SubmitState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
