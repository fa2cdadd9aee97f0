//! 权限策略 - `can(user, action, target)`
//!
//! | 角色 | 规则 |
//! |------|------|
//! | ADMIN | 全部允许，但不能审批自己的申请 |
//! | MANAGER | 需要对应权限；不能创建/修改/删除 ADMIN，不能授予 ADMIN 角色，不能审批自己的申请，不能撤销审计操作 |
//! | EMPLOYEE | 只能读取/修改自己的资料，提交/撤回自己的申请，为自己签到签退 |

use shared::models::{Capability, Role};

use super::CurrentUser;

/// 受控操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadTeacher,
    CreateTeacher,
    UpdateTeacher,
    DeleteTeacher,
    ReadRequest,
    CreateRequest,
    CancelRequest,
    DecideRequest,
    ReadAttendance,
    CheckInOut,
    ManageAttendance,
    ManageHolidays,
    ViewReports,
    ViewAudit,
    RevokeAction,
    ManageSettings,
}

/// 操作对象
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// 无具体对象 (列表、全局设置)
    Global,
    /// 教师记录；`role` 为目标当前角色，`grants` 为本次要授予的角色
    Teacher {
        id: &'a str,
        role: Role,
        grants: Option<Role>,
    },
    /// 归属于某教师的记录 (申请、考勤)
    OwnedBy(&'a str),
}

impl Action {
    /// 操作对应的权限 (MANAGER / EMPLOYEE 需要持有)
    pub const fn capability(self) -> Option<Capability> {
        match self {
            Action::CreateTeacher => Some(Capability::ManageTeachers),
            Action::UpdateTeacher => Some(Capability::EditTeachers),
            Action::DeleteTeacher => Some(Capability::DeleteTeachers),
            Action::DecideRequest => Some(Capability::ApproveRequests),
            Action::ManageAttendance => Some(Capability::ManageAttendance),
            Action::ManageHolidays => Some(Capability::ManageHolidays),
            Action::ViewReports => Some(Capability::ViewReports),
            Action::ViewAudit => Some(Capability::ViewAudit),
            Action::RevokeAction => Some(Capability::RevokeActions),
            Action::ManageSettings => Some(Capability::ManageSettings),
            Action::ReadTeacher
            | Action::ReadRequest
            | Action::CreateRequest
            | Action::CancelRequest
            | Action::ReadAttendance
            | Action::CheckInOut => None,
        }
    }
}

fn is_self(user: &CurrentUser, target: Target<'_>) -> bool {
    match target {
        Target::Teacher { id, .. } | Target::OwnedBy(id) => id == user.id,
        Target::Global => false,
    }
}

fn touches_admin(target: Target<'_>) -> bool {
    matches!(
        target,
        Target::Teacher { role: Role::Admin, .. }
            | Target::Teacher {
                grants: Some(Role::Admin),
                ..
            }
    )
}

pub fn can(user: &CurrentUser, action: Action, target: Target<'_>) -> bool {
    // 任何人都不能审批自己的申请
    if action == Action::DecideRequest && is_self(user, target) {
        return false;
    }

    match user.role {
        Role::Admin => true,
        Role::Manager => can_manager(user, action, target),
        Role::Employee => can_employee(user, action, target),
    }
}

fn can_manager(user: &CurrentUser, action: Action, target: Target<'_>) -> bool {
    match action {
        Action::RevokeAction => false,
        Action::CreateTeacher | Action::UpdateTeacher | Action::DeleteTeacher
            if touches_admin(target) =>
        {
            false
        }
        // 修改自己的资料不需要 EditTeachers
        Action::UpdateTeacher if is_self(user, target) => true,
        _ => action.capability().is_none_or(|cap| user.has_capability(cap)),
    }
}

fn can_employee(user: &CurrentUser, action: Action, target: Target<'_>) -> bool {
    match action {
        Action::ReadTeacher
        | Action::UpdateTeacher
        | Action::ReadRequest
        | Action::CreateRequest
        | Action::CancelRequest
        | Action::ReadAttendance
        | Action::CheckInOut => is_self(user, target),
        // 显式授予的权限 (删除 / 管理 ADMIN 仍不允许)
        Action::CreateTeacher | Action::DeleteTeacher if touches_admin(target) => false,
        Action::RevokeAction => false,
        _ => action.capability().is_some_and(|cap| user.has_capability(cap)),
    }
}
