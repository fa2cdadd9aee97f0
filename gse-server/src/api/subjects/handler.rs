//! Subject API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use shared::models::{Teacher, TeacherStatus};

use crate::auth::{self, Action, CurrentUser, Target};
use crate::core::ServerState;
use crate::db::repository::teacher::{self, TeacherFilter};
use crate::utils::{ApiResponse, AppResult, ok};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectCount {
    pub subject: String,
    pub teacher_count: i64,
}

pub async fn list(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<SubjectCount>>>> {
    let subjects: Vec<SubjectCount> = teacher::subject_counts(&state.pool)
        .await?
        .into_iter()
        .map(|(subject, teacher_count)| SubjectCount {
            subject,
            teacher_count,
        })
        .collect();
    Ok(ok(subjects))
}

pub async fn teachers(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(subject): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<Teacher>>>> {
    auth::ensure(&user, Action::ReadTeacher, Target::Global)?;

    let filter = TeacherFilter {
        status: Some(TeacherStatus::Active),
        subject: Some(subject),
        ..Default::default()
    };
    Ok(ok(teacher::find_all(&state.pool, &filter).await?))
}
