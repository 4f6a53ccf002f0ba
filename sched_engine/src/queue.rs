//! Ready set and aperiodic FIFO
//!
//! Both containers keep arrival order. The dispatcher relies on that order
//! to break priority ties deterministically.

use crate::job::Job;
use core_types::{JobId, TaskId};
use std::collections::VecDeque;

/// Released periodic jobs that still owe computation
///
/// Several jobs of the same spec may be present at once.
#[derive(Debug, Clone, Default)]
pub struct ReadyQueue {
    jobs: Vec<Job>,
}

impl ReadyQueue {
    /// Creates an empty ready set
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Appends a newly released job
    pub fn push(&mut self, job: Job) {
        self.jobs.push(job);
    }

    /// Looks up a job
    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    /// Looks up a job for execution
    pub fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    /// Removes a job, keeping the order of the others
    pub fn remove(&mut self, id: JobId) -> Option<Job> {
        let pos = self.jobs.iter().position(|j| j.id == id)?;
        Some(self.jobs.remove(pos))
    }

    /// Returns true if the job is still pending
    pub fn contains(&self, id: JobId) -> bool {
        self.jobs.iter().any(|j| j.id == id)
    }

    /// Iterates over pending jobs in arrival order
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Pending jobs of one spec
    pub fn jobs_of(&self, task: TaskId) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(move |j| j.task() == task)
    }

    /// Returns the number of pending jobs
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// FIFO of armed aperiodic work
///
/// Each aperiodic spec contributes at most one entry.
#[derive(Debug, Clone, Default)]
pub struct AperiodicQueue {
    queue: VecDeque<Job>,
}

impl AperiodicQueue {
    /// Creates an empty queue
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Arms a unit of aperiodic work
    ///
    /// If the spec already has an entry, that entry is re-armed in place and
    /// keeps its position. Returns true if a new entry was enqueued.
    pub fn arm(&mut self, job: Job) -> bool {
        if let Some(existing) = self.queue.iter_mut().find(|j| j.task() == job.task()) {
            existing.rearm();
            return false;
        }
        self.queue.push_back(job);
        true
    }

    /// Returns the head of the queue
    pub fn head(&self) -> Option<&Job> {
        self.queue.front()
    }

    /// Returns the head of the queue for execution
    pub fn head_mut(&mut self) -> Option<&mut Job> {
        self.queue.front_mut()
    }

    /// Removes the head of the queue
    pub fn pop_head(&mut self) -> Option<Job> {
        self.queue.pop_front()
    }

    /// Returns true if the spec has armed work
    pub fn contains(&self, task: TaskId) -> bool {
        self.queue.iter().any(|j| j.task() == task)
    }

    /// Iterates over armed work in FIFO order
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.queue.iter()
    }

    /// Returns the number of armed entries
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if no aperiodic work is waiting
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::TaskSpec;

    fn job(task: u32, instance: u64, aperiodic: bool) -> Job {
        let mut spec = if aperiodic {
            TaskSpec::aperiodic(format!("A{}", task), 0.0, 2.0)
        } else {
            TaskSpec::periodic(format!("P{}", task), 0.0, 1.0, 4.0, 4.0)
        };
        spec.id = TaskId::new(task);
        Job::release(&spec, instance, 0.0)
    }

    #[test]
    fn test_ready_queue_keeps_arrival_order() {
        let mut ready = ReadyQueue::new();
        ready.push(job(1, 1, false));
        ready.push(job(0, 1, false));
        ready.push(job(1, 2, false));

        let order: Vec<JobId> = ready.iter().map(|j| j.id).collect();
        assert_eq!(
            order,
            vec![
                JobId::new(TaskId::new(1), 1),
                JobId::new(TaskId::new(0), 1),
                JobId::new(TaskId::new(1), 2),
            ]
        );
        assert_eq!(ready.jobs_of(TaskId::new(1)).count(), 2);
    }

    #[test]
    fn test_ready_queue_remove() {
        let mut ready = ReadyQueue::new();
        ready.push(job(0, 1, false));
        ready.push(job(0, 2, false));

        let removed = ready.remove(JobId::new(TaskId::new(0), 1)).unwrap();
        assert_eq!(removed.id.instance, 1);
        assert_eq!(ready.len(), 1);
        assert!(!ready.contains(removed.id));
        assert!(ready.remove(removed.id).is_none());
    }

    #[test]
    fn test_aperiodic_fifo_order() {
        let mut queue = AperiodicQueue::new();
        assert!(queue.arm(job(2, 1, true)));
        assert!(queue.arm(job(3, 1, true)));

        assert_eq!(queue.pop_head().unwrap().task(), TaskId::new(2));
        assert_eq!(queue.head().unwrap().task(), TaskId::new(3));
    }

    #[test]
    fn test_aperiodic_rearm_in_place() {
        let mut queue = AperiodicQueue::new();
        queue.arm(job(2, 1, true));
        queue.arm(job(3, 1, true));
        queue.head_mut().unwrap().run_for(1.5);

        // Re-arming an already queued spec resets it without requeueing
        assert!(!queue.arm(job(2, 2, true)));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.head().unwrap().task(), TaskId::new(2));
        assert_eq!(queue.head().unwrap().remaining, 2.0);
    }
}
