use serde::{Deserialize, Serialize};

use crate::api::schema::ProfileDto;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Tenant,
    Broker,
    Admin,
    /// 后端新增的角色，按普通已登录用户对待
    #[serde(other)]
    Unknown,
}

/// 当前登录用户，序列化后存入 `user` 键
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl From<ProfileDto> for User {
    fn from(profile: ProfileDto) -> Self {
        User {
            id: profile.id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            role: profile.role,
            is_verified: profile.is_verified,
        }
    }
}

/// 资料更新，只覆盖给出的字段
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_verified: Option<bool>,
}

impl UserPatch {
    pub fn apply_to(self, user: &mut User) {
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(is_verified) = self.is_verified {
            user.is_verified = is_verified;
        }
    }
}

/// 会话状态。user 非空时两个令牌必然在最近一次登录或刷新时同时写入过
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// 启动后读取一次存储前为 true
    pub is_initializing: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            access_token: None,
            refresh_token: None,
            is_initializing: true,
        }
    }
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }

    pub fn is_tenant(&self) -> bool {
        self.is_authenticated() && self.role() == Some(Role::Tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Broker).unwrap(), "\"BROKER\"");
        assert_eq!(serde_json::from_str::<Role>("\"ADMIN\"").unwrap(), Role::Admin);
        assert_eq!(serde_json::from_str::<Role>("\"LANDLORD\"").unwrap(), Role::Unknown);
    }

    #[test]
    fn user_is_stored_camel_case() {
        let user = User {
            id: 3,
            first_name: "Mia".into(),
            last_name: "Chen".into(),
            email: "mia@example.com".into(),
            role: Role::Tenant,
            is_verified: true,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["firstName"], "Mia");
        assert_eq!(json["isVerified"], true);
        assert_eq!(user.full_name(), "Mia Chen");
    }

    #[test]
    fn patch_merges_only_given_fields() {
        let mut user = User {
            id: 1,
            first_name: "A".into(),
            last_name: "B".into(),
            email: "a@b.c".into(),
            role: Role::Tenant,
            is_verified: false,
        };
        UserPatch {
            first_name: Some("Alice".into()),
            is_verified: Some(true),
            ..Default::default()
        }
        .apply_to(&mut user);
        assert_eq!(user.first_name, "Alice");
        assert_eq!(user.last_name, "B");
        assert!(user.is_verified);
    }

    #[test]
    fn default_state_is_initializing_and_anonymous() {
        let state = SessionState::default();
        assert!(state.is_initializing);
        assert!(!state.is_authenticated());
        assert!(!state.is_tenant());
    }
}
