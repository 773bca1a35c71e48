use crate::routes::{Access, Route};
use crate::session::{Role, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// 会话还在从存储恢复，什么都不渲染，避免闪跳到登录页
    Pending,
    Redirect(Route),
    Render,
}

/// 按登录状态和角色判断能否进入受保护的页面。
/// `allowed_roles` 为空表示任意已登录用户。纯函数，每次渲染重新计算
pub fn guard(state: &SessionState, allowed_roles: &[Role]) -> GuardOutcome {
    if state.is_initializing {
        return GuardOutcome::Pending;
    }

    if !state.is_authenticated() {
        return GuardOutcome::Redirect(Route::LoginRegister);
    }

    if !allowed_roles.is_empty() {
        let permitted = state
            .role()
            .is_some_and(|role| allowed_roles.contains(&role));
        if !permitted {
            return GuardOutcome::Redirect(Route::Unauthorized);
        }
    }

    GuardOutcome::Render
}

/// 按路由自身的访问要求检查
pub fn guard_route(state: &SessionState, route: Route) -> GuardOutcome {
    match route.access() {
        Access::Public => GuardOutcome::Render,
        Access::Roles(roles) => guard(state, roles),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::User;

    fn state(role: Option<Role>) -> SessionState {
        SessionState {
            user: role.map(|role| User {
                id: 1,
                first_name: "A".into(),
                last_name: "B".into(),
                email: "a@b.c".into(),
                role,
                is_verified: true,
            }),
            access_token: role.map(|_| "access".to_string()),
            refresh_token: role.map(|_| "refresh".to_string()),
            is_initializing: false,
        }
    }

    #[test]
    fn pending_while_initializing() {
        let mut s = state(Some(Role::Admin));
        s.is_initializing = true;
        assert_eq!(guard(&s, &[Role::Admin]), GuardOutcome::Pending);
    }

    #[test]
    fn admin_only_route() {
        let admin_only = [Role::Admin];
        assert_eq!(
            guard(&state(Some(Role::Tenant)), &admin_only),
            GuardOutcome::Redirect(Route::Unauthorized)
        );
        assert_eq!(
            guard(&state(None), &admin_only),
            GuardOutcome::Redirect(Route::LoginRegister)
        );
        assert_eq!(guard(&state(Some(Role::Admin)), &admin_only), GuardOutcome::Render);
    }

    #[test]
    fn empty_roles_means_any_authenticated_user() {
        assert_eq!(guard(&state(Some(Role::Tenant)), &[]), GuardOutcome::Render);
        assert_eq!(
            guard(&state(None), &[]),
            GuardOutcome::Redirect(Route::LoginRegister)
        );
    }

    #[test]
    fn route_policies() {
        let broker = state(Some(Role::Broker));
        assert_eq!(guard_route(&broker, Route::PropertyCreate), GuardOutcome::Render);
        assert_eq!(guard_route(&broker, Route::AgentDashboard), GuardOutcome::Render);
        assert_eq!(
            guard_route(&broker, Route::TenantDashboard),
            GuardOutcome::Redirect(Route::Unauthorized)
        );
        assert_eq!(guard_route(&state(None), Route::Listings), GuardOutcome::Render);
    }
}
