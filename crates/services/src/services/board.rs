use db::{
    DbPool,
    models::{
        board::{Board, BoardView, LayoutEntry},
        project::Project,
        project_member::ProjectMember,
        task::{CreateTask, Task, UpdateTask},
    },
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::error::{Result, ServiceError, validate_optional_text, validate_text};

pub const MAX_TASK_TITLE_CHARS: usize = 200;
pub const MAX_TASK_DESCRIPTION_CHARS: usize = 5000;

/// Body of a layout submission: the desired position of every listed task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct ApplyLayoutRequest {
    pub entries: Vec<LayoutEntry>,
}

/// Board reads and task writes for a project whose membership was already checked.
#[derive(Clone, Default)]
pub struct BoardService;

impl BoardService {
    pub fn new() -> Self {
        Self
    }

    pub async fn board_view(&self, pool: &DbPool, project_id: Uuid) -> Result<BoardView> {
        let project = Project::find_by_id(pool, project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound)?;
        let members = ProjectMember::list_for_project(pool, project_id).await?;
        let tasks = Task::find_by_project_id(pool, project_id).await?;
        Ok(BoardView {
            project,
            members,
            columns: Board::group_and_sort(tasks),
        })
    }

    pub async fn add_task(
        &self,
        pool: &DbPool,
        project_id: Uuid,
        creator_id: Uuid,
        payload: CreateTask,
    ) -> Result<Task> {
        let payload = CreateTask {
            title: validate_text("title", &payload.title, MAX_TASK_TITLE_CHARS)?,
            description: validate_optional_text(
                "description",
                payload.description.as_deref(),
                MAX_TASK_DESCRIPTION_CHARS,
            )?,
            ..payload
        };

        let task = Task::append(pool, project_id, creator_id, &payload, Uuid::new_v4()).await?;
        tracing::info!(%project_id, task_id = %task.id, status = %task.status, "Created task");
        Ok(task)
    }

    pub async fn update_task(
        &self,
        pool: &DbPool,
        project_id: Uuid,
        task_id: Uuid,
        payload: UpdateTask,
    ) -> Result<Task> {
        let title = payload
            .title
            .as_deref()
            .map(|title| validate_text("title", title, MAX_TASK_TITLE_CHARS))
            .transpose()?;
        let description = match payload.description.as_ref() {
            Some(description) => Some(validate_optional_text(
                "description",
                description.as_deref(),
                MAX_TASK_DESCRIPTION_CHARS,
            )?),
            None => None,
        };
        let payload = UpdateTask {
            title,
            description,
            ..payload
        };

        Ok(Task::update(pool, project_id, task_id, &payload).await?)
    }

    /// Applies the layout and returns the board as it now stands.
    pub async fn apply_layout(
        &self,
        pool: &DbPool,
        project_id: Uuid,
        entries: &[LayoutEntry],
    ) -> Result<BoardView> {
        let updated = Task::apply_layout(pool, project_id, entries).await?;
        tracing::debug!(%project_id, updated, "Layout applied");
        self.board_view(pool, project_id).await
    }

    pub async fn delete_task(&self, pool: &DbPool, project_id: Uuid, task_id: Uuid) -> Result<()> {
        Task::delete(pool, project_id, task_id).await?;
        tracing::info!(%project_id, %task_id, "Deleted task");
        Ok(())
    }
}
