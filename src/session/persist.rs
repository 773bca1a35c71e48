use std::sync::Arc;

use super::model::User;
use crate::error::AppResult;
use crate::storage::{StorageBackend, keys};

/// 存储中的一组登录凭证
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// 三个键齐全且 user 可解析才算有效
pub fn load(backend: &Arc<dyn StorageBackend>) -> Option<StoredSession> {
    let access_token = backend.get(keys::ACCESS_TOKEN)?;
    let refresh_token = backend.get(keys::REFRESH_TOKEN)?;
    let raw_user = backend.get(keys::USER)?;
    match serde_json::from_str::<User>(&raw_user) {
        Ok(user) => Some(StoredSession {
            access_token,
            refresh_token,
            user,
        }),
        Err(e) => {
            tracing::warn!(backend = ?backend.kind(), error = %e, "stored user is unreadable");
            None
        }
    }
}

pub fn save(backend: &Arc<dyn StorageBackend>, stored: &StoredSession) -> AppResult<()> {
    save_tokens(backend, &stored.access_token, &stored.refresh_token)?;
    save_user(backend, &stored.user)
}

pub fn save_tokens(backend: &Arc<dyn StorageBackend>, access: &str, refresh: &str) -> AppResult<()> {
    backend.set(keys::ACCESS_TOKEN, access)?;
    backend.set(keys::REFRESH_TOKEN, refresh)
}

pub fn save_user(backend: &Arc<dyn StorageBackend>, user: &User) -> AppResult<()> {
    let json = serde_json::to_string(user)?;
    backend.set(keys::USER, &json)
}

/// 逐个删除，失败只记录日志
pub fn clear(backend: &Arc<dyn StorageBackend>) {
    for key in [keys::ACCESS_TOKEN, keys::REFRESH_TOKEN, keys::USER] {
        if let Err(e) = backend.remove(key) {
            tracing::warn!(backend = ?backend.kind(), key, error = %e, "failed to clear stored credential");
        }
    }
}
