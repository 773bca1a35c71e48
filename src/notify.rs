use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

/// 短暂显示的提示消息
#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, level: ToastLevel, message: &str);

    fn success(&self, message: &str) {
        self.notify(ToastLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(ToastLevel::Error, message);
    }

    fn info(&self, message: &str) {
        self.notify(ToastLevel::Info, message);
    }
}

/// 按顺序收集提示，由界面层取走显示
#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: Mutex<Vec<Toast>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.toasts())
    }

    pub fn len(&self) -> usize {
        self.toasts().len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts().is_empty()
    }

    pub fn last(&self) -> Option<Toast> {
        self.toasts().last().cloned()
    }

    fn toasts(&self) -> MutexGuard<'_, Vec<Toast>> {
        self.toasts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, level: ToastLevel, message: &str) {
        tracing::debug!(?level, message, "toast");
        self.toasts().push(Toast {
            level,
            message: message.to_string(),
            created_at: Utc::now(),
        });
    }
}
