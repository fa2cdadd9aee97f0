//! 教师人员结构统计

use chrono::NaiveDate;
use serde::Serialize;
use shared::models::{Role, Teacher, WorkType};

use crate::utils::time::{age_on, parse_date};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub label: &'static str,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub total_teachers: u64,
    pub age_groups: Vec<Bucket>,
    pub work_types: Vec<Bucket>,
    pub roles: Vec<Bucket>,
    /// 有出生日期的教师平均年龄
    pub average_age: Option<f64>,
}

const AGE_LABELS: [&str; 5] = ["<30", "30-39", "40-49", "50+", "unknown"];

fn age_bucket(age: Option<u32>) -> usize {
    match age {
        Some(a) if a < 30 => 0,
        Some(a) if a < 40 => 1,
        Some(a) if a < 50 => 2,
        Some(_) => 3,
        None => 4,
    }
}

fn work_type_label(w: WorkType) -> &'static str {
    match w {
        WorkType::FullTime => "FullTime",
        WorkType::PartTime => "PartTime",
        WorkType::Contract => "Contract",
    }
}

pub fn demographics(teachers: &[Teacher], today: NaiveDate) -> Demographics {
    let mut ages = [0u64; 5];
    let mut age_sum = 0u64;
    let mut aged = 0u64;
    let mut work = [0u64; 3];
    let mut roles = [0u64; 3];

    for t in teachers {
        let age = t
            .birthdate
            .as_deref()
            .and_then(|b| parse_date(b).ok())
            .and_then(|b| age_on(b, today));
        if let Some(a) = age {
            age_sum += u64::from(a);
            aged += 1;
        }
        ages[age_bucket(age)] += 1;

        work[match t.work_type {
            WorkType::FullTime => 0,
            WorkType::PartTime => 1,
            WorkType::Contract => 2,
        }] += 1;
        roles[match t.role {
            Role::Admin => 0,
            Role::Manager => 1,
            Role::Employee => 2,
        }] += 1;
    }

    Demographics {
        total_teachers: teachers.len() as u64,
        age_groups: AGE_LABELS
            .into_iter()
            .zip(ages)
            .map(|(label, count)| Bucket { label, count })
            .collect(),
        work_types: [WorkType::FullTime, WorkType::PartTime, WorkType::Contract]
            .into_iter()
            .zip(work)
            .map(|(w, count)| Bucket {
                label: work_type_label(w),
                count,
            })
            .collect(),
        roles: [Role::Admin, Role::Manager, Role::Employee]
            .into_iter()
            .zip(roles)
            .map(|(r, count)| Bucket {
                label: r.as_str(),
                count,
            })
            .collect(),
        average_age: (aged > 0).then(|| super::round1(age_sum as f64 / aged as f64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::TeacherStatus;

    fn teacher(birthdate: Option<&str>, work_type: WorkType, role: Role) -> Teacher {
        Teacher {
            id: shared::util::new_id(),
            name: "T".into(),
            email: "t@school.test".into(),
            phone: None,
            subject: None,
            work_type,
            birthdate: birthdate.map(Into::into),
            employment_date: None,
            password_hash: String::new(),
            role,
            role_level: role.level(),
            authorities: vec![],
            status: TeacherStatus::Active,
            absence_balance: 10.0,
            late_hours_balance: 6.0,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_age_buckets() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let teachers = vec![
            teacher(Some("2000-01-01"), WorkType::FullTime, Role::Employee), // 25
            teacher(Some("1990-06-01"), WorkType::PartTime, Role::Employee), // 35
            teacher(Some("1980-06-02"), WorkType::FullTime, Role::Manager),  // 44
            teacher(Some("1970-01-01"), WorkType::Contract, Role::Admin),    // 55
            teacher(None, WorkType::FullTime, Role::Employee),
            teacher(Some("not-a-date"), WorkType::FullTime, Role::Employee),
        ];
        let d = demographics(&teachers, today);
        let counts: Vec<u64> = d.age_groups.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 1, 2]);
        assert_eq!(d.age_groups[3].label, "50+");
        assert_eq!(d.work_types[0].count, 4);
        assert_eq!(d.roles[0].label, "ADMIN");
        assert_eq!(d.roles[2].count, 4);
        // (25 + 35 + 44 + 55) / 4
        assert_eq!(d.average_age, Some(39.8));
    }
}
