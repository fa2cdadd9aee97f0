//! Teacher Model (教师 / 员工)

use serde::{Deserialize, Serialize};

/// Role of a teacher account
///
/// Role level: ADMIN = 3, MANAGER = 2, EMPLOYEE = 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

lenient_vocab!(Role, "role", {
    Admin => ["admin", "administrator", "superadmin"],
    Manager => ["manager", "supervisor"],
    Employee => ["employee", "teacher", "staff", "user"],
});

impl Role {
    pub const fn level(self) -> i64 {
        match self {
            Role::Admin => 3,
            Role::Manager => 2,
            Role::Employee => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Employee => "EMPLOYEE",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Employee
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed capability set (权限)
///
/// Legacy free-text authority strings ("Add new teachers", ...) are accepted
/// on input and folded into these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Capability {
    ManageTeachers,
    EditTeachers,
    DeleteTeachers,
    ApproveRequests,
    ManageAttendance,
    ManageHolidays,
    ViewReports,
    ViewAudit,
    RevokeActions,
    ManageSettings,
}

lenient_vocab!(Capability, "capability", {
    ManageTeachers => ["manageteachers", "addnewteachers", "addteachers", "createteachers"],
    EditTeachers => ["editteachers", "editteacherinformation", "updateteachers"],
    DeleteTeachers => ["deleteteachers", "removeteachers"],
    ApproveRequests => ["approverequests", "approverejectrequests", "managerequests", "approveleaverequests"],
    ManageAttendance => ["manageattendance", "editattendance", "recordattendance"],
    ManageHolidays => ["manageholidays", "editholidays"],
    ViewReports => ["viewreports", "viewanalytics", "viewdashboard"],
    ViewAudit => ["viewaudit", "viewauditlog", "viewaudittrail"],
    RevokeActions => ["revokeactions", "revokeaction"],
    ManageSettings => ["managesettings", "systemsettings"],
});

impl Capability {
    pub const ALL: [Capability; 10] = [
        Capability::ManageTeachers,
        Capability::EditTeachers,
        Capability::DeleteTeachers,
        Capability::ApproveRequests,
        Capability::ManageAttendance,
        Capability::ManageHolidays,
        Capability::ViewReports,
        Capability::ViewAudit,
        Capability::RevokeActions,
        Capability::ManageSettings,
    ];

    /// Default capability set granted with a role
    pub fn defaults_for(role: Role) -> Vec<Capability> {
        match role {
            Role::Admin => Self::ALL.to_vec(),
            Role::Manager => Self::ALL
                .into_iter()
                .filter(|c| {
                    !matches!(
                        c,
                        Capability::RevokeActions
                            | Capability::ManageSettings
                            | Capability::DeleteTeachers
                    )
                })
                .collect(),
            Role::Employee => Vec::new(),
        }
    }
}

/// Teacher account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum TeacherStatus {
    Active,
    Inactive,
}

lenient_vocab!(TeacherStatus, "teacher status", {
    Active => ["active", "enabled"],
    Inactive => ["inactive", "disabled", "suspended"],
});

impl Default for TeacherStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Employment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum WorkType {
    FullTime,
    PartTime,
    Contract,
}

lenient_vocab!(WorkType, "work type", {
    FullTime => ["fulltime", "full", "permanent"],
    PartTime => ["parttime", "part"],
    Contract => ["contract", "contractor", "temporary"],
});

impl Default for WorkType {
    fn default() -> Self {
        Self::FullTime
    }
}

/// Teacher entity
///
/// `password_hash` is argon2 PHC; it never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub work_type: WorkType,
    pub birthdate: Option<String>,
    pub employment_date: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub role_level: i64,
    /// JSON array of capabilities
    #[cfg_attr(feature = "db", sqlx(json))]
    pub authorities: Vec<Capability>,
    pub status: TeacherStatus,
    /// Absence allowance (days per year)
    pub absence_balance: f64,
    /// Late / early-leave allowance (hours per month)
    pub late_hours_balance: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Teacher {
    pub fn is_active(&self) -> bool {
        self.status == TeacherStatus::Active
    }
}

/// Create teacher payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherCreate {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub work_type: Option<WorkType>,
    pub birthdate: Option<String>,
    pub employment_date: Option<String>,
    pub role: Option<Role>,
    pub authorities: Option<Vec<Capability>>,
    pub absence_balance: Option<f64>,
    pub late_hours_balance: Option<f64>,
}

/// Update teacher payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub work_type: Option<WorkType>,
    pub birthdate: Option<String>,
    pub employment_date: Option<String>,
    pub role: Option<Role>,
    pub authorities: Option<Vec<Capability>>,
    pub status: Option<TeacherStatus>,
    pub absence_balance: Option<f64>,
    pub late_hours_balance: Option<f64>,
}

impl TeacherUpdate {
    /// Fields a non-admin may change on their own record
    pub fn is_self_service(&self) -> bool {
        self.role.is_none()
            && self.authorities.is_none()
            && self.status.is_none()
            && self.absence_balance.is_none()
            && self.late_hours_balance.is_none()
            && self.work_type.is_none()
            && self.email.is_none()
    }
}
