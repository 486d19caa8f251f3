use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    models::{project::Project, project_member::MemberSummary, task::Task},
    types::TaskStatus,
};

/// Requested position of one task: its column and its order inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct LayoutEntry {
    pub task_id: Uuid,
    pub status: TaskStatus,
    pub order: i32,
}

/// Tasks of one project split into status columns, each sorted for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct Board {
    pub todo: Vec<Task>,
    pub doing: Vec<Task>,
    pub done: Vec<Task>,
}

/// Everything a member needs to render a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct BoardView {
    pub project: Project,
    pub members: Vec<MemberSummary>,
    pub columns: Board,
}

impl Board {
    /// Columns are ordered by `order`, then creation time, then id, so the result is
    /// deterministic even when stored orders collide or have gaps.
    pub fn group_and_sort(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut board = Board::default();
        for task in tasks {
            board.column_mut(task.status).push(task);
        }
        for status in TaskStatus::ALL {
            board.column_mut(status).sort_by(|a, b| {
                a.order
                    .cmp(&b.order)
                    .then_with(|| a.created_at.cmp(&b.created_at))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
        board
    }

    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::Doing => &self.doing,
            TaskStatus::Done => &self.done,
        }
    }

    fn column_mut(&mut self, status: TaskStatus) -> &mut Vec<Task> {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::Doing => &mut self.doing,
            TaskStatus::Done => &mut self.done,
        }
    }

    pub fn find(&self, task_id: Uuid) -> Option<&Task> {
        TaskStatus::ALL
            .into_iter()
            .flat_map(|status| self.column(status))
            .find(|task| task.id == task_id)
    }

    pub fn len(&self) -> usize {
        self.todo.len() + self.doing.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves a task to `to_index` (clamped) of the `to_status` column and renumbers
    /// the affected columns densely from 0. Returns the entries to submit as a
    /// layout, or `None` when the task is not on this board.
    pub fn move_task(
        &mut self,
        task_id: Uuid,
        to_status: TaskStatus,
        to_index: usize,
    ) -> Option<Vec<LayoutEntry>> {
        let from_status = TaskStatus::ALL.into_iter().find(|status| {
            self.column(*status).iter().any(|task| task.id == task_id)
        })?;

        let source = self.column_mut(from_status);
        let position = source.iter().position(|task| task.id == task_id)?;
        let mut task = source.remove(position);
        task.status = to_status;

        let target = self.column_mut(to_status);
        let index = to_index.min(target.len());
        target.insert(index, task);

        let mut entries = self.renumber(to_status);
        if from_status != to_status {
            entries.extend(self.renumber(from_status));
        }
        Some(entries)
    }

    /// Dense layout of every column, as the board currently displays it.
    pub fn layout(&self) -> Vec<LayoutEntry> {
        TaskStatus::ALL
            .into_iter()
            .flat_map(|status| {
                self.column(status)
                    .iter()
                    .zip(0..)
                    .map(move |(task, order)| LayoutEntry {
                        task_id: task.id,
                        status,
                        order,
                    })
            })
            .collect()
    }

    fn renumber(&mut self, status: TaskStatus) -> Vec<LayoutEntry> {
        self.column_mut(status)
            .iter_mut()
            .zip(0..)
            .map(|(task, order)| {
                task.order = order;
                task.status = status;
                LayoutEntry {
                    task_id: task.id,
                    status,
                    order,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn task(title: &str, status: TaskStatus, order: i32, age_secs: i64) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            project_id: Uuid::nil(),
            title: title.to_string(),
            description: None,
            status,
            order,
            due_date: None,
            assignee_id: None,
            creator_id: Uuid::nil(),
            created_at: now - Duration::seconds(age_secs),
            updated_at: now,
        }
    }

    fn titles(column: &[Task]) -> Vec<&str> {
        column.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn groups_by_status_and_sorts_by_order() {
        let board = Board::group_and_sort(vec![
            task("A", TaskStatus::Todo, 1, 10),
            task("B", TaskStatus::Todo, 0, 5),
            task("C", TaskStatus::Done, 0, 1),
        ]);

        assert_eq!(titles(&board.todo), vec!["B", "A"]);
        assert!(board.doing.is_empty());
        assert_eq!(titles(&board.done), vec!["C"]);
        assert_eq!(board.len(), 3);
    }

    #[test]
    fn equal_orders_fall_back_to_creation_time() {
        let board = Board::group_and_sort(vec![
            task("newer", TaskStatus::Doing, 2, 1),
            task("older", TaskStatus::Doing, 2, 60),
        ]);
        assert_eq!(titles(&board.doing), vec!["older", "newer"]);
    }

    #[test]
    fn gaps_do_not_matter_for_display() {
        let board = Board::group_and_sort(vec![
            task("x", TaskStatus::Todo, 9, 0),
            task("y", TaskStatus::Todo, 2, 0),
            task("z", TaskStatus::Todo, 5, 0),
        ]);
        assert_eq!(titles(&board.todo), vec!["y", "z", "x"]);
    }

    #[test]
    fn move_within_column_renumbers_densely() {
        let mut board = Board::group_and_sort(vec![
            task("A", TaskStatus::Todo, 0, 3),
            task("B", TaskStatus::Todo, 4, 2),
            task("C", TaskStatus::Todo, 9, 1),
        ]);
        let c = board.todo[2].id;

        let entries = board.move_task(c, TaskStatus::Todo, 0).unwrap();
        assert_eq!(titles(&board.todo), vec!["C", "A", "B"]);
        let orders: Vec<(Uuid, i32)> = entries.iter().map(|e| (e.task_id, e.order)).collect();
        assert_eq!(orders[0], (c, 0));
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.status == TaskStatus::Todo));
    }

    #[test]
    fn move_across_columns_updates_both() {
        let mut board = Board::group_and_sort(vec![
            task("A", TaskStatus::Todo, 0, 3),
            task("B", TaskStatus::Todo, 1, 2),
            task("D", TaskStatus::Done, 0, 1),
        ]);
        let a = board.todo[0].id;

        let entries = board.move_task(a, TaskStatus::Done, 99).unwrap();
        assert_eq!(titles(&board.todo), vec!["B"]);
        assert_eq!(titles(&board.done), vec!["D", "A"]);
        assert_eq!(board.done[1].status, TaskStatus::Done);

        assert!(entries.contains(&LayoutEntry {
            task_id: a,
            status: TaskStatus::Done,
            order: 1
        }));
        let b = board.todo[0].id;
        assert!(entries.contains(&LayoutEntry {
            task_id: b,
            status: TaskStatus::Todo,
            order: 0
        }));
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn move_unknown_task_is_none() {
        let mut board = Board::group_and_sort(vec![task("A", TaskStatus::Todo, 0, 0)]);
        assert!(board.move_task(Uuid::new_v4(), TaskStatus::Done, 0).is_none());
        assert_eq!(titles(&board.todo), vec!["A"]);
    }

    #[test]
    fn layout_covers_every_column() {
        let board = Board::group_and_sort(vec![
            task("A", TaskStatus::Todo, 3, 0),
            task("B", TaskStatus::Doing, 8, 0),
            task("C", TaskStatus::Doing, 2, 0),
        ]);
        let layout = board.layout();
        assert_eq!(layout.len(), 3);
        assert_eq!(layout[0].order, 0);
        assert_eq!(layout[1].task_id, board.doing[0].id);
        assert_eq!(layout[2].order, 1);
        assert_eq!(board.find(board.doing[1].id).map(|t| t.title.as_str()), Some("B"));
    }
}
