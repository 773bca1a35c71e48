use std::collections::BTreeMap;

use thiserror::Error;

/// 表单字段 -> 错误提示
pub type FieldErrors = BTreeMap<String, String>;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// 401/403，凭证错误或令牌失效
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// 后端返回的其它非 2xx 响应
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation failed on {} field(s)", .0.len())]
    Validation(FieldErrors),

    #[error("not logged in")]
    NotLoggedIn,

    /// 已登录但角色不允许
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("duplicate submission")]
    DuplicateSubmission,

    /// 响应已被更新的请求取代
    #[error("response superseded by a newer request")]
    Stale,
}

impl AppError {
    /// 面向用户的简短提示
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthorized(_) => "登录已失效，请重新登录".into(),
            AppError::Api { status, message } if *status == 404 => {
                if message.is_empty() {
                    "请求的资源不存在".into()
                } else {
                    format!("请求的资源不存在：{}", message)
                }
            }
            AppError::Api { message, .. } if !message.is_empty() => format!("操作失败：{}", message),
            AppError::Api { .. } => "服务器错误，请稍后重试".into(),
            AppError::Network(_) => "网络连接失败，请检查网络后重试".into(),
            AppError::Decode(_) => "服务器返回了无法识别的数据".into(),
            AppError::Storage(_) => "本地存储失败".into(),
            AppError::Config(_) => "客户端配置错误".into(),
            AppError::Validation(_) => "请先修正表单中的错误".into(),
            AppError::NotLoggedIn => "请先登录".into(),
            AppError::Forbidden(reason) => reason.clone(),
            AppError::DuplicateSubmission => "请求处理中，请勿重复提交".into(),
            AppError::Stale => String::new(),
        }
    }

    /// 过期响应与重复提交不打扰用户
    pub fn is_silent(&self) -> bool {
        matches!(self, AppError::Stale | AppError::DuplicateSubmission)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return AppError::Decode(err.to_string());
        }
        match err.status() {
            Some(status) if status.as_u16() == 401 || status.as_u16() == 403 => {
                AppError::Unauthorized(err.to_string())
            }
            Some(status) => AppError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => AppError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(err.to_string())
    }
}
