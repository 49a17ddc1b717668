//! Per-frame task scheduling.
//!
//! This is the stand-in for a platform "request animation frame" primitive.
//! Work that has to advance once per rendered frame registers a task; the
//! owner of the scheduler calls [`FrameScheduler::run_frame`] exactly once
//! per frame. Tasks run to completion one after another, in registration
//! order, so no two steps ever overlap.
//!
//! # Example
//!
//! ```
//! use stage_platform::{FrameScheduler, FrameStatus};
//!
//! let mut scheduler: FrameScheduler<u32> = FrameScheduler::new();
//! let handle = scheduler.schedule(|counter: &mut u32| {
//!     *counter += 1;
//!     if *counter == 3 { FrameStatus::Done } else { FrameStatus::Continue }
//! });
//!
//! let mut counter = 0;
//! while !handle.is_finished() {
//!     scheduler.run_frame(&mut counter);
//! }
//! assert_eq!(counter, 3);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// What a task wants after its step for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Run again next frame
    Continue,
    /// Drop the task
    Done,
}

/// Shared state between a scheduled task and the handle returned to the caller.
#[derive(Debug, Default)]
struct HandleState {
    cancelled: AtomicBool,
    finished: AtomicBool,
}

/// Handle to a scheduled task.
///
/// Cloning a handle creates another reference to the same task.
/// Cancelling through any clone stops the task before its next step.
#[derive(Debug, Clone)]
pub struct FrameHandle {
    id: u64,
    state: Arc<HandleState>,
}

impl FrameHandle {
    /// Scheduler-unique id of the task.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Request that the task stop. Takes effect before its next step;
    /// a task stopped this way never reports completion.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
    }

    /// Returns whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Returns whether the task ran to natural completion.
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Acquire)
    }

    /// Returns whether the task will run again.
    pub fn is_active(&self) -> bool {
        !self.is_cancelled() && !self.is_finished()
    }
}

type FrameCallback<C> = Box<dyn FnMut(&mut C) -> FrameStatus>;

struct ScheduledTask<C> {
    handle: FrameHandle,
    callback: FrameCallback<C>,
}

/// Counts for one call to [`FrameScheduler::run_frame`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTaskStats {
    /// Tasks that took a step
    pub ran: usize,
    /// Tasks that reported [`FrameStatus::Done`]
    pub finished: usize,
    /// Tasks dropped because their handle was cancelled
    pub cancelled: usize,
}

/// Runs registered tasks once per frame against a context `C`.
pub struct FrameScheduler<C> {
    tasks: Vec<ScheduledTask<C>>,
    next_id: u64,
    frame: u64,
}

impl<C> FrameScheduler<C> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
            frame: 0,
        }
    }

    /// Register a task that runs on every following frame until it
    /// returns [`FrameStatus::Done`] or is cancelled.
    pub fn schedule<F>(&mut self, callback: F) -> FrameHandle
    where
        F: FnMut(&mut C) -> FrameStatus + 'static,
    {
        let handle = FrameHandle {
            id: self.next_id,
            state: Arc::new(HandleState::default()),
        };
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            handle: handle.clone(),
            callback: Box::new(callback),
        });
        handle
    }

    /// Number of frames run so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of tasks still scheduled (cancelled ones are counted until
    /// the next frame drops them).
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Step every task once, in registration order.
    pub fn run_frame(&mut self, context: &mut C) -> FrameTaskStats {
        self.frame += 1;
        let mut stats = FrameTaskStats::default();

        self.tasks.retain_mut(|task| {
            if task.handle.is_cancelled() {
                stats.cancelled += 1;
                return false;
            }
            stats.ran += 1;
            match (task.callback)(context) {
                FrameStatus::Continue => true,
                FrameStatus::Done => {
                    task.handle.state.finished.store(true, Ordering::Release);
                    stats.finished += 1;
                    false
                }
            }
        });

        if stats.ran > 0 || stats.cancelled > 0 {
            tracing::trace!(
                "Frame {}: {} task(s) ran, {} finished, {} cancelled",
                self.frame,
                stats.ran,
                stats.finished,
                stats.cancelled
            );
        }
        stats
    }
}

impl<C> Default for FrameScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_run_in_registration_order() {
        let mut scheduler: FrameScheduler<Vec<&'static str>> = FrameScheduler::new();
        scheduler.schedule(|log: &mut Vec<&'static str>| {
            log.push("first");
            FrameStatus::Continue
        });
        scheduler.schedule(|log: &mut Vec<&'static str>| {
            log.push("second");
            FrameStatus::Continue
        });

        let mut log = Vec::new();
        scheduler.run_frame(&mut log);
        scheduler.run_frame(&mut log);
        assert_eq!(log, vec!["first", "second", "first", "second"]);
    }

    #[test]
    fn test_done_task_is_dropped_and_marked_finished() {
        let mut scheduler: FrameScheduler<u32> = FrameScheduler::new();
        let handle = scheduler.schedule(|_: &mut u32| FrameStatus::Done);

        let mut ctx = 0;
        let stats = scheduler.run_frame(&mut ctx);
        assert_eq!(stats.finished, 1);
        assert!(handle.is_finished());
        assert!(!handle.is_active());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_cancelled_task_never_runs_again() {
        let mut scheduler: FrameScheduler<u32> = FrameScheduler::new();
        let handle = scheduler.schedule(|count: &mut u32| {
            *count += 1;
            FrameStatus::Continue
        });

        let mut count = 0;
        scheduler.run_frame(&mut count);
        handle.cancel();
        let stats = scheduler.run_frame(&mut count);
        scheduler.run_frame(&mut count);

        assert_eq!(count, 1);
        assert_eq!(stats.cancelled, 1);
        assert!(handle.is_cancelled());
        assert!(!handle.is_finished());
    }

    #[test]
    fn test_frame_counter() {
        let mut scheduler: FrameScheduler<()> = FrameScheduler::new();
        scheduler.run_frame(&mut ());
        scheduler.run_frame(&mut ());
        assert_eq!(scheduler.frame(), 2);
    }

    #[test]
    fn test_handle_ids_are_unique() {
        let mut scheduler: FrameScheduler<()> = FrameScheduler::new();
        let a = scheduler.schedule(|_: &mut ()| FrameStatus::Done);
        let b = scheduler.schedule(|_: &mut ()| FrameStatus::Done);
        assert_ne!(a.id(), b.id());
    }
}
