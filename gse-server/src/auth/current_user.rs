//! 当前用户上下文
//!
//! 由认证中间件根据数据库中的教师记录创建，注入到请求扩展。

use serde::Serialize;
use shared::models::{Capability, Role, Teacher};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub role_level: i64,
    /// 生效的权限集合
    pub authorities: Vec<Capability>,
}

impl From<&Teacher> for CurrentUser {
    fn from(teacher: &Teacher) -> Self {
        Self {
            id: teacher.id.clone(),
            name: teacher.name.clone(),
            email: teacher.email.clone(),
            role: teacher.role,
            role_level: teacher.role.level(),
            authorities: effective_capabilities(teacher.role, &teacher.authorities),
        }
    }
}

/// 生效权限：管理员全部；其他角色未显式配置时使用角色默认集合
pub fn effective_capabilities(role: Role, stored: &[Capability]) -> Vec<Capability> {
    if role == Role::Admin {
        return Capability::ALL.to_vec();
    }
    let mut caps = if stored.is_empty() {
        Capability::defaults_for(role)
    } else {
        stored.to_vec()
    };
    // 撤销审计操作只属于管理员
    caps.retain(|c| *c != Capability::RevokeActions);
    caps.sort();
    caps.dedup();
    caps
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// MANAGER 及以上
    pub fn is_manager(&self) -> bool {
        self.role >= Role::Manager
    }

    pub fn has_capability(&self, cap: Capability) -> bool {
        self.is_admin() || self.authorities.contains(&cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_capabilities() {
        assert_eq!(effective_capabilities(Role::Admin, &[]).len(), 10);
        assert_eq!(
            effective_capabilities(Role::Manager, &[]),
            {
                let mut d = Capability::defaults_for(Role::Manager);
                d.sort();
                d
            }
        );
        assert!(effective_capabilities(Role::Employee, &[]).is_empty());

        let granted = effective_capabilities(
            Role::Manager,
            &[Capability::ViewReports, Capability::RevokeActions],
        );
        assert_eq!(granted, vec![Capability::ViewReports]);
    }
}
