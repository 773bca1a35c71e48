use serde::{Deserialize, Serialize};

use crate::session::Role;

/// POST /auth/login
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /token/refresh
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// 登录与刷新都返回一对令牌（刷新令牌会轮换）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// GET /auth/profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDto {
    pub id: u64,
    #[serde(default, alias = "firstName")]
    pub first_name: String,
    #[serde(default, alias = "lastName")]
    pub last_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, alias = "isVerified")]
    pub is_verified: bool,
}
