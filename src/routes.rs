use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::api::schema::PropertyId;
use crate::session::Role;

/// 客户端可见的路由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Listings,
    PropertyDetails(PropertyId),
    LoginRegister,
    ProfileSettings,
    TenantDashboard,
    AgentDashboard,
    AdminDashboard,
    PropertyCreate,
    PropertyEdit(PropertyId),
    Unauthorized,
    NotFound,
}

/// 路由的访问要求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// 空列表表示任意已登录用户
    Roles(&'static [Role]),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".into(),
            Route::Listings => "/listings".into(),
            Route::PropertyDetails(id) => format!("/properties/{}", id),
            Route::LoginRegister => "/login-register".into(),
            Route::ProfileSettings => "/profile-settings".into(),
            Route::TenantDashboard => "/tenant-dashboard".into(),
            Route::AgentDashboard => "/agent-dashboard".into(),
            Route::AdminDashboard => "/admin-dashboard".into(),
            Route::PropertyCreate => "/properties/new".into(),
            Route::PropertyEdit(id) => format!("/properties/{}/edit", id),
            Route::Unauthorized => "/unauthorized".into(),
            Route::NotFound => "/not-found".into(),
        }
    }

    /// 未知路径返回 NotFound，查询串被忽略
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Home,
            ["listings"] => Route::Listings,
            ["login-register"] => Route::LoginRegister,
            ["profile-settings"] => Route::ProfileSettings,
            ["tenant-dashboard"] => Route::TenantDashboard,
            ["agent-dashboard"] => Route::AgentDashboard,
            ["admin-dashboard"] => Route::AdminDashboard,
            ["unauthorized"] => Route::Unauthorized,
            ["properties", "new"] => Route::PropertyCreate,
            ["properties", id] => id.parse().map(Route::PropertyDetails).unwrap_or(Route::NotFound),
            ["properties", id, "edit"] => id.parse().map(Route::PropertyEdit).unwrap_or(Route::NotFound),
            _ => Route::NotFound,
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::ProfileSettings => Access::Roles(&[]),
            Route::TenantDashboard => Access::Roles(&[Role::Tenant]),
            Route::AgentDashboard => Access::Roles(&[Role::Broker]),
            Route::AdminDashboard => Access::Roles(&[Role::Admin]),
            Route::PropertyCreate | Route::PropertyEdit(_) => {
                Access::Roles(&[Role::Broker, Role::Admin])
            }
            _ => Access::Public,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// 登录成功后按角色跳转
pub fn landing_route(role: &Role) -> Route {
    match role {
        Role::Admin => Route::AdminDashboard,
        Role::Broker => Route::AgentDashboard,
        Role::Tenant => Route::TenantDashboard,
        Role::Unknown => Route::Home,
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// 记录导航历史
#[derive(Debug)]
pub struct HistoryNavigator {
    history: Mutex<Vec<Route>>,
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self {
            history: Mutex::new(vec![Route::Home]),
        }
    }
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Route {
        self.history().last().copied().unwrap_or(Route::Home)
    }

    pub fn visited(&self) -> Vec<Route> {
        self.history().clone()
    }

    fn history(&self) -> MutexGuard<'_, Vec<Route>> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!(path = %route, "navigate");
        self.history().push(route);
    }
}
