use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionSession, TransactionTrait,
};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

pub use crate::types::TaskStatus;
use crate::{
    entities::task,
    models::{board::LayoutEntry, ids, project::Project, project_member::ProjectMember},
    retry::{Contended, retry_on_contention},
};

/// Highest order a client may set. Appends past it still fit in an `i32`.
pub const MAX_ORDER: i32 = 1_000_000_000;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Project not found")]
    ProjectNotFound,
    #[error("Task not found")]
    TaskNotFound,
    #[error("Member not found")]
    MemberNotFound,
    #[error("Tasks not in project: {}", format_ids(.0))]
    TasksNotInProject(Vec<Uuid>),
    #[error("Assignee is not a member of this project")]
    AssigneeNotInProject,
    #[error("{0}")]
    Validation(String),
}

impl Contended for TaskError {
    fn is_contention(&self) -> bool {
        matches!(self, TaskError::Database(err) if err.is_contention())
    }
}

fn format_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub order: i32,
    #[ts(type = "Date | null")]
    pub due_date: Option<DateTime<Utc>>,
    pub assignee_id: Option<Uuid>,
    pub creator_id: Uuid,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    #[ts(type = "Date | null")]
    pub due_date: Option<DateTime<Utc>>,
    pub assignee_id: Option<Uuid>,
}

/// Partial update. For `description`, `due_date` and `assignee_id` an absent field
/// keeps the value, `null` clears it and anything else replaces it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(optional)]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(optional)]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(optional)]
    pub assignee_id: Option<Option<Uuid>>,
}

/// Present fields, `null` included, become `Some`; missing ones stay `None` via `default`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl Task {
    async fn from_model<C: ConnectionTrait>(db: &C, model: task::Model) -> Result<Self, DbErr> {
        let project_id = ids::project_uuid_by_id(db, model.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
        let mut member_ids = vec![model.creator_id];
        member_ids.extend(model.assignee_id);
        let members = ids::member_uuids_by_ids(db, member_ids).await?;
        Self::from_model_with(model, project_id, &members)
    }

    fn from_model_with(
        model: task::Model,
        project_id: Uuid,
        members: &HashMap<i64, Uuid>,
    ) -> Result<Self, DbErr> {
        let creator_id = *members
            .get(&model.creator_id)
            .ok_or(DbErr::RecordNotFound("Member not found".to_string()))?;
        let assignee_id = match model.assignee_id {
            Some(id) => members
                .get(&id)
                .copied()
                .ok_or(DbErr::RecordNotFound("Member not found".to_string()))
                .map(Some)?,
            None => None,
        };

        Ok(Self {
            id: model.uuid,
            project_id,
            title: model.title,
            description: model.description,
            status: model.status,
            order: model.sort_order,
            due_date: model.due_date,
            assignee_id,
            creator_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Every task of the project, in storage order. Use `Board::group_and_sort` for display.
    pub async fn find_by_project_id<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let Some(project_row_id) = ids::project_id_by_uuid(db, project_id).await? else {
            return Ok(Vec::new());
        };

        let models = task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_row_id))
            .order_by_asc(task::Column::Id)
            .all(db)
            .await?;

        let mut member_ids: Vec<i64> = models
            .iter()
            .flat_map(|m| std::iter::once(m.creator_id).chain(m.assignee_id))
            .collect();
        member_ids.sort_unstable();
        member_ids.dedup();
        let members = ids::member_uuids_by_ids(db, member_ids).await?;

        models
            .into_iter()
            .map(|model| Self::from_model_with(model, project_id, &members))
            .collect()
    }

    /// Creates the task at the end of its status column.
    pub async fn append<C>(
        db: &C,
        project_id: Uuid,
        creator_id: Uuid,
        data: &CreateTask,
        task_id: Uuid,
    ) -> Result<Self, TaskError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        retry_on_contention(|| Self::append_once(db, project_id, creator_id, data, task_id)).await
    }

    async fn append_once<C>(
        db: &C,
        project_id: Uuid,
        creator_id: Uuid,
        data: &CreateTask,
        task_id: Uuid,
    ) -> Result<Self, TaskError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let txn = db.begin().await?;
        let project_row_id = Project::lock_row(&txn, project_id)
            .await?
            .ok_or(TaskError::ProjectNotFound)?;
        let creator_row_id = ids::member_id_by_uuid(&txn, creator_id)
            .await?
            .ok_or(TaskError::MemberNotFound)?;
        let assignee_row_id = match data.assignee_id {
            Some(id) => Some(assignee_row_id(&txn, project_row_id, id).await?),
            None => None,
        };

        let status = data.status.unwrap_or_default();
        let order = next_order(&txn, project_row_id, status).await?;
        let now = Utc::now();
        let active = task::ActiveModel {
            uuid: Set(task_id),
            project_id: Set(project_row_id),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            status: Set(status),
            sort_order: Set(order),
            due_date: Set(data.due_date),
            assignee_id: Set(assignee_row_id),
            creator_id: Set(creator_row_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(&txn).await?;
        let task = Self::from_model(&txn, model).await?;
        txn.commit().await?;

        tracing::debug!(task_id = %task.id, %status, order, "Appended task");
        Ok(task)
    }

    /// Persists a client layout for tasks of one project. Either every entry is
    /// written or none is. Orders are stored as given.
    pub async fn apply_layout<C>(
        db: &C,
        project_id: Uuid,
        entries: &[LayoutEntry],
    ) -> Result<u64, TaskError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        validate_layout(entries)?;
        if entries.is_empty() {
            return Ok(0);
        }
        retry_on_contention(|| Self::apply_layout_once(db, project_id, entries)).await
    }

    async fn apply_layout_once<C>(
        db: &C,
        project_id: Uuid,
        entries: &[LayoutEntry],
    ) -> Result<u64, TaskError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let txn = db.begin().await?;
        let project_row_id = Project::lock_row(&txn, project_id)
            .await?
            .ok_or(TaskError::ProjectNotFound)?;

        let task_ids: Vec<Uuid> = entries.iter().map(|entry| entry.task_id).collect();
        let row_ids: HashMap<Uuid, i64> = task::Entity::find()
            .select_only()
            .column(task::Column::Uuid)
            .column(task::Column::Id)
            .filter(task::Column::ProjectId.eq(project_row_id))
            .filter(task::Column::Uuid.is_in(task_ids))
            .into_tuple::<(Uuid, i64)>()
            .all(&txn)
            .await?
            .into_iter()
            .collect();

        let missing: Vec<Uuid> = entries
            .iter()
            .map(|entry| entry.task_id)
            .filter(|id| !row_ids.contains_key(id))
            .collect();
        if !missing.is_empty() {
            return Err(TaskError::TasksNotInProject(missing));
        }

        let now = Utc::now();
        let mut updated = 0;
        for entry in entries {
            let Some(row_id) = row_ids.get(&entry.task_id) else {
                continue;
            };
            let result = task::Entity::update_many()
                .col_expr(task::Column::Status, Expr::value(entry.status))
                .col_expr(task::Column::SortOrder, Expr::value(entry.order))
                .col_expr(task::Column::UpdatedAt, Expr::value(now))
                .filter(task::Column::Id.eq(*row_id))
                .exec(&txn)
                .await?;
            updated += result.rows_affected;
        }
        txn.commit().await?;

        tracing::debug!(%project_id, updated, "Applied board layout");
        Ok(updated)
    }

    pub async fn update<C>(
        db: &C,
        project_id: Uuid,
        task_id: Uuid,
        data: &UpdateTask,
    ) -> Result<Self, TaskError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        if let Some(order) = data.order
            && !order_in_range(order)
        {
            return Err(TaskError::Validation(format!("order must be between 0 and {MAX_ORDER}")));
        }
        retry_on_contention(|| Self::update_once(db, project_id, task_id, data)).await
    }

    async fn update_once<C>(
        db: &C,
        project_id: Uuid,
        task_id: Uuid,
        data: &UpdateTask,
    ) -> Result<Self, TaskError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let txn = db.begin().await?;
        let project_row_id = Project::lock_row(&txn, project_id)
            .await?
            .ok_or(TaskError::ProjectNotFound)?;
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(task_id))
            .filter(task::Column::ProjectId.eq(project_row_id))
            .one(&txn)
            .await?
            .ok_or(TaskError::TaskNotFound)?;

        let assignee = match data.assignee_id {
            Some(Some(id)) => Some(Some(assignee_row_id(&txn, project_row_id, id).await?)),
            Some(None) => Some(None),
            None => None,
        };

        let status_changed = data.status.is_some_and(|status| status != record.status);
        let order = match (data.order, data.status) {
            (Some(order), _) => Some(order),
            (None, Some(status)) if status_changed => {
                Some(next_order(&txn, project_row_id, status).await?)
            }
            _ => None,
        };

        let mut active: task::ActiveModel = record.into();
        if let Some(title) = &data.title {
            active.title = Set(title.clone());
        }
        if let Some(description) = &data.description {
            active.description = Set(description.clone());
        }
        if let Some(status) = data.status {
            active.status = Set(status);
        }
        if let Some(order) = order {
            active.sort_order = Set(order);
        }
        if let Some(due_date) = data.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(assignee) = assignee {
            active.assignee_id = Set(assignee);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await?;
        let task = Self::from_model(&txn, updated).await?;
        txn.commit().await?;
        Ok(task)
    }

    /// Removes one task. Remaining orders in its column are left untouched.
    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
        task_id: Uuid,
    ) -> Result<(), TaskError> {
        let project_row_id = ids::project_id_by_uuid(db, project_id)
            .await?
            .ok_or(TaskError::ProjectNotFound)?;
        let result = task::Entity::delete_many()
            .filter(task::Column::Uuid.eq(task_id))
            .filter(task::Column::ProjectId.eq(project_row_id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(TaskError::TaskNotFound);
        }
        Ok(())
    }
}

fn order_in_range(order: i32) -> bool {
    (0..=MAX_ORDER).contains(&order)
}

fn validate_layout(entries: &[LayoutEntry]) -> Result<(), TaskError> {
    let mut seen = HashSet::with_capacity(entries.len());
    let mut slots = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !order_in_range(entry.order) {
            return Err(TaskError::Validation(format!(
                "order for task {} must be between 0 and {MAX_ORDER}",
                entry.task_id
            )));
        }
        if !seen.insert(entry.task_id) {
            return Err(TaskError::Validation(format!(
                "task {} appears more than once in the layout",
                entry.task_id
            )));
        }
        if !slots.insert((entry.status, entry.order)) {
            return Err(TaskError::Validation(format!(
                "order {} is used more than once in column {}",
                entry.order, entry.status
            )));
        }
    }
    Ok(())
}

/// One past the highest order in the (project, status) column, or 0 when empty.
async fn next_order<C: ConnectionTrait>(
    db: &C,
    project_row_id: i64,
    status: TaskStatus,
) -> Result<i32, TaskError> {
    let max: Option<Option<i32>> = task::Entity::find()
        .select_only()
        .column_as(task::Column::SortOrder.max(), "max_order")
        .filter(task::Column::ProjectId.eq(project_row_id))
        .filter(task::Column::Status.eq(status))
        .into_tuple()
        .one(db)
        .await?;
    match max.flatten() {
        None => Ok(0),
        Some(order) => order.checked_add(1).ok_or_else(|| {
            TaskError::Validation(format!("column {status} is full, renumber it with a layout"))
        }),
    }
}

async fn assignee_row_id<C: ConnectionTrait>(
    db: &C,
    project_row_id: i64,
    assignee_id: Uuid,
) -> Result<i64, TaskError> {
    let member_row_id = ids::member_id_by_uuid(db, assignee_id)
        .await?
        .ok_or(TaskError::AssigneeNotInProject)?;
    ProjectMember::find_by_row_ids(db, project_row_id, member_row_id)
        .await?
        .ok_or(TaskError::AssigneeNotInProject)?;
    Ok(member_row_id)
}
