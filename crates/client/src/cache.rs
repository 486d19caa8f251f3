use std::sync::{Mutex, MutexGuard};

use db::{
    models::board::{BoardView, LayoutEntry},
    types::TaskStatus,
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct CacheState {
    view: Option<BoardView>,
    dirty: bool,
    in_flight: usize,
    resync_pending: bool,
}

/// Local copy of one project's board.
///
/// Optimistic edits mark the copy dirty. While it is dirty, or while any write
/// is still in flight, polled boards are dropped so they cannot roll back the
/// user's edits. The last successful write clears the flag. A failed write
/// marks the copy for resynchronization so the next board fetched replaces it.
#[derive(Debug, Default)]
pub struct BoardCache {
    state: Mutex<CacheState>,
}

impl BoardCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub fn view(&self) -> Option<BoardView> {
        self.lock().view.clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    pub fn resync_pending(&self) -> bool {
        self.lock().resync_pending
    }

    /// Offers a polled board. Returns whether it replaced the cached one.
    pub fn apply_poll(&self, view: BoardView) -> bool {
        let mut state = self.lock();
        if state.in_flight > 0 || (state.dirty && !state.resync_pending) {
            tracing::trace!(
                in_flight = state.in_flight,
                dirty = state.dirty,
                "Ignoring polled board"
            );
            return false;
        }
        state.view = Some(view);
        state.dirty = false;
        state.resync_pending = false;
        true
    }

    /// Replaces the cache with an authoritative board regardless of local edits.
    pub fn resync(&self, view: BoardView) {
        let mut state = self.lock();
        state.view = Some(view);
        state.dirty = false;
        state.resync_pending = false;
    }

    /// Moves a task in the cached board and marks it dirty. Returns the layout
    /// entries to submit, or `None` when the task is not cached.
    pub fn move_task(
        &self,
        task_id: Uuid,
        to_status: TaskStatus,
        to_index: usize,
    ) -> Option<Vec<LayoutEntry>> {
        let mut state = self.lock();
        let entries = state
            .view
            .as_mut()?
            .columns
            .move_task(task_id, to_status, to_index)?;
        state.dirty = true;
        Some(entries)
    }

    /// Registers a write. The guard must be resolved with `succeed` or `fail`;
    /// dropping it unresolved counts as a failure.
    pub fn begin_write(&self) -> WriteGuard<'_> {
        self.lock().in_flight += 1;
        WriteGuard {
            cache: self,
            resolved: false,
        }
    }

    fn finish_write(&self, outcome: Result<Option<BoardView>, ()>) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        match outcome {
            Ok(view) => {
                if state.in_flight == 0 {
                    state.dirty = false;
                    if let Some(view) = view {
                        state.view = Some(view);
                    }
                }
            }
            Err(()) => state.resync_pending = true,
        }
    }
}

/// An in-flight write against a [`BoardCache`].
#[must_use = "resolve the write with `succeed` or `fail`"]
pub struct WriteGuard<'a> {
    cache: &'a BoardCache,
    resolved: bool,
}

impl WriteGuard<'_> {
    /// `view` is the board returned by the server, adopted only when no other
    /// write is still outstanding.
    pub fn succeed(mut self, view: Option<BoardView>) {
        self.resolved = true;
        self.cache.finish_write(Ok(view));
    }

    pub fn fail(mut self) {
        self.resolved = true;
        self.cache.finish_write(Err(()));
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            self.cache.finish_write(Err(()));
        }
    }
}
