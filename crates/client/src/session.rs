use std::sync::Arc;

use db::{
    models::{
        board::BoardView,
        task::{CreateTask, Task, UpdateTask},
    },
    types::TaskStatus,
};
use uuid::Uuid;

use crate::{
    api::{BoardClient, ClientError},
    cache::BoardCache,
};

/// One member's live view of one project: the API client plus the local cache
/// every write goes through.
#[derive(Debug, Clone)]
pub struct BoardSession {
    client: BoardClient,
    cache: Arc<BoardCache>,
    project_id: Uuid,
}

impl BoardSession {
    pub fn new(client: BoardClient, project_id: Uuid) -> Self {
        Self {
            client,
            cache: Arc::new(BoardCache::new()),
            project_id,
        }
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    pub fn cache(&self) -> &BoardCache {
        &self.cache
    }

    pub fn client(&self) -> &BoardClient {
        &self.client
    }

    /// Fetches the board and offers it to the cache. Returns whether it was adopted.
    pub async fn refresh(&self) -> Result<bool, ClientError> {
        let view = self.client.board(self.project_id).await?;
        Ok(self.cache.apply_poll(view))
    }

    /// Replaces the cache with the server's board regardless of local edits.
    pub async fn resync(&self) -> Result<BoardView, ClientError> {
        let view = self.client.board(self.project_id).await?;
        self.cache.resync(view.clone());
        tracing::debug!(project_id = %self.project_id, "Board resynchronized");
        Ok(view)
    }

    /// Moves a task locally, then submits the affected columns as a layout.
    /// Returns `Ok(false)` when the task is not in the cached board.
    pub async fn move_task(
        &self,
        task_id: Uuid,
        to_status: TaskStatus,
        to_index: usize,
    ) -> Result<bool, ClientError> {
        let Some(entries) = self.cache.move_task(task_id, to_status, to_index) else {
            return Ok(false);
        };

        let write = self.cache.begin_write();
        match self.client.apply_layout(self.project_id, entries).await {
            Ok(view) => {
                write.succeed(Some(view));
                Ok(true)
            }
            Err(err) => {
                write.fail();
                self.recover(&err).await;
                Err(err)
            }
        }
    }

    pub async fn add_task(&self, payload: &CreateTask) -> Result<Task, ClientError> {
        let write = self.cache.begin_write();
        let result = self.client.create_task(self.project_id, payload).await;
        self.settle(write, result).await
    }

    pub async fn update_task(
        &self,
        task_id: Uuid,
        payload: &UpdateTask,
    ) -> Result<Task, ClientError> {
        let write = self.cache.begin_write();
        let result = self
            .client
            .update_task(self.project_id, task_id, payload)
            .await;
        self.settle(write, result).await
    }

    pub async fn delete_task(&self, task_id: Uuid) -> Result<(), ClientError> {
        let write = self.cache.begin_write();
        let result = self.client.delete_task(self.project_id, task_id).await;
        self.settle(write, result).await
    }

    /// Resolves a write that returns no board, then pulls the board so the
    /// change shows up without waiting for the next poll.
    async fn settle<T>(
        &self,
        write: crate::cache::WriteGuard<'_>,
        result: Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        match result {
            Ok(value) => {
                write.succeed(None);
                if let Err(err) = self.refresh().await {
                    tracing::warn!(
                        project_id = %self.project_id,
                        error = %err,
                        "Refresh after write failed"
                    );
                }
                Ok(value)
            }
            Err(err) => {
                write.fail();
                self.recover(&err).await;
                Err(err)
            }
        }
    }

    async fn recover(&self, cause: &ClientError) {
        tracing::warn!(
            project_id = %self.project_id,
            error = %cause,
            "Write failed, resynchronizing"
        );
        if let Err(err) = self.resync().await {
            // The cache stays marked for resync; the next poll replaces it.
            tracing::warn!(project_id = %self.project_id, error = %err, "Resync failed");
        }
    }
}
