//! Fetch task bookkeeping
//!
//! Every page request becomes a [`FetchTask`] with a fresh generation. Only
//! the task carrying the latest generation may publish its result; every
//! other task resolves to Superseded.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::app::models::PageQuery;

/// Lifecycle of a page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Dispatched, no result yet
    Pending,
    /// Result delivered to the presentation layer
    Completed,
    /// A newer request was issued before this one finished
    Superseded,
    /// The fetch failed while still current
    Failed { reason: String },
}

/// One page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    pub generation: u64,
    pub query: PageQuery,
    pub status: TaskStatus,
    pub issued_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl FetchTask {
    pub fn new(generation: u64, query: PageQuery) -> Self {
        Self {
            generation,
            query,
            status: TaskStatus::Pending,
            issued_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    fn finish(&mut self, status: TaskStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }
}

/// Bounded log of recent tasks, oldest first
#[derive(Debug, Clone)]
pub struct TaskHistory {
    tasks: VecDeque<FetchTask>,
    capacity: usize,
}

impl TaskHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Record a newly issued task, evicting the oldest when full
    pub fn push(&mut self, task: FetchTask) {
        if self.tasks.len() == self.capacity {
            self.tasks.pop_front();
        }
        self.tasks.push_back(task);
    }

    /// Resolve the task for `generation`, if it is still remembered and pending
    pub fn resolve(&mut self, generation: u64, status: TaskStatus) {
        if let Some(task) = self
            .tasks
            .iter_mut()
            .rev()
            .find(|task| task.generation == generation)
        {
            if task.is_pending() {
                task.finish(status);
            }
        }
    }

    pub fn get(&self, generation: u64) -> Option<&FetchTask> {
        self.tasks.iter().find(|task| task.generation == generation)
    }

    pub fn to_vec(&self) -> Vec<FetchTask> {
        self.tasks.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
