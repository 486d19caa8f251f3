use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{patch, post},
};
use db::models::{
    project::Project,
    task::{CreateTask, Task, UpdateTask},
};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, http::auth::CurrentMember};

#[derive(Debug, Deserialize)]
pub struct TaskPath {
    pub task_id: Uuid,
}

pub async fn create_task(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
    CurrentMember(member): CurrentMember,
    Json(payload): Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    tracing::debug!(
        project_id = %project.id,
        title = %payload.title,
        "Creating task"
    );
    let task = state
        .board()
        .add_task(state.db(), project.id, member.id, payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
    Path(TaskPath { task_id }): Path<TaskPath>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = state
        .board()
        .update_task(state.db(), project.id, task_id, payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
    Path(TaskPath { task_id }): Path<TaskPath>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state
        .board()
        .delete_task(state.db(), project.id, task_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Mounted under `/projects/{project_id}/tasks` behind the membership gate.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_task))
        .route("/{task_id}", patch(update_task).delete(delete_task))
}
