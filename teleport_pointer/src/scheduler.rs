use std::collections::BTreeMap;

/// Handle to a scheduled task, used to cancel it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u64);

/// One-shot tasks keyed by the frame they become due on.
///
/// Tasks never block; the owner polls `take_due` once per tick and runs them.
#[derive(Debug)]
pub struct FrameScheduler<T> {
    next_handle: u64,
    pending: BTreeMap<TaskHandle, (u64, T)>,
}

impl<T> FrameScheduler<T> {
    pub fn new() -> Self {
        Self {
            next_handle: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn schedule(&mut self, due_frame: u64, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.insert(handle, (due_frame, task));
        handle
    }

    /// Returns the task if it had not run yet. Cancelling twice is a no-op.
    pub fn cancel(&mut self, handle: TaskHandle) -> Option<T> {
        self.pending.remove(&handle).map(|(_, task)| task)
    }

    /// Remove and return every task due on or before `frame`, in scheduling order.
    pub fn take_due(&mut self, frame: u64) -> Vec<T> {
        let due: Vec<TaskHandle> = self
            .pending
            .iter()
            .filter(|(_, (due_frame, _))| *due_frame <= frame)
            .map(|(handle, _)| *handle)
            .collect();

        due.into_iter()
            .filter_map(|handle| self.pending.remove(&handle))
            .map(|(_, task)| task)
            .collect()
    }
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_run_once_when_due() {
        let mut scheduler = FrameScheduler::new();
        scheduler.schedule(2, "late");
        scheduler.schedule(1, "early");

        assert!(scheduler.take_due(0).is_empty());
        assert_eq!(scheduler.take_due(1), vec!["early"]);
        assert_eq!(scheduler.take_due(5), vec!["late"]);
        assert!(scheduler.take_due(5).is_empty());
    }

    #[test]
    fn test_due_tasks_keep_scheduling_order() {
        let mut scheduler = FrameScheduler::new();
        scheduler.schedule(3, 'a');
        scheduler.schedule(1, 'b');
        scheduler.schedule(2, 'c');

        assert_eq!(scheduler.take_due(3), vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_cancelled_task_never_runs() {
        let mut scheduler = FrameScheduler::new();
        let handle = scheduler.schedule(1, 7);

        assert_eq!(scheduler.cancel(handle), Some(7));
        assert_eq!(scheduler.cancel(handle), None);
        assert!(scheduler.take_due(10).is_empty());
    }
}
