//! Work handed from background threads to the thread that owns the state.

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;

type Task<S> = Box<dyn FnOnce(&mut S) + Send>;

type Tasks<S> = Arc<Mutex<Vec<Task<S>>>>;

/// Multiple-producer, single-consumer queue of closures run against `S`.
///
/// Producers push through [`TaskSender`]s; the owner calls
/// [`poll`](Self::poll) once per tick to run everything queued so far.
pub struct TaskQueue<S> {
    tasks: Tasks<S>,
}

impl<S> TaskQueue<S> {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A producer handle that can be moved to another thread.
    pub fn sender(&self) -> TaskSender<S> {
        TaskSender {
            tasks: Arc::clone(&self.tasks),
        }
    }

    pub fn push(&self, task: impl FnOnce(&mut S) + Send + 'static) {
        self.tasks.lock().push(Box::new(task));
    }

    /// Runs every queued task in push order and returns how many ran.
    ///
    /// The queue is swapped out under the lock and the tasks run after it
    /// is released, so tasks may push more work; that work runs on the next
    /// poll.
    pub fn poll(&self, state: &mut S) -> usize {
        let tasks = mem::take(&mut *self.tasks.lock());
        let count = tasks.len();
        for task in tasks {
            task(state);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

impl<S> Default for TaskQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer side of a [`TaskQueue`].
pub struct TaskSender<S> {
    tasks: Tasks<S>,
}

impl<S> TaskSender<S> {
    pub fn push(&self, task: impl FnOnce(&mut S) + Send + 'static) {
        self.tasks.lock().push(Box::new(task));
    }
}

impl<S> Clone for TaskSender<S> {
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_tasks_run_in_order_on_poll() {
        let queue = TaskQueue::<Vec<u32>>::new();
        queue.push(|log| log.push(1));
        queue.push(|log| log.push(2));
        assert_eq!(queue.len(), 2);

        let mut log = Vec::new();
        assert_eq!(queue.poll(&mut log), 2);
        assert_eq!(log, vec![1, 2]);
        assert!(queue.is_empty());
        assert_eq!(queue.poll(&mut log), 0);
    }

    #[test]
    fn test_producers_on_other_threads() {
        let queue = TaskQueue::<u32>::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sender = queue.sender();
                thread::spawn(move || sender.push(move |total| *total += i))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut total = 0;
        assert_eq!(queue.poll(&mut total), 4);
        assert_eq!(total, 6);
    }

    #[test]
    fn test_task_pushing_more_work_runs_next_poll() {
        let queue = TaskQueue::<Vec<&'static str>>::new();
        let sender = queue.sender();
        queue.push(move |log| {
            log.push("first");
            sender.push(|log| log.push("second"));
        });

        let mut log = Vec::new();
        queue.poll(&mut log);
        assert_eq!(log, vec!["first"]);
        queue.poll(&mut log);
        assert_eq!(log, vec!["first", "second"]);
    }
}
