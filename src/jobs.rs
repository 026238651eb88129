//! Work posted by background threads.
//!
//! Threads other than the engine never touch the tree directly. They lock
//! the scene and post a [`SceneJob`]; the next `update` applies it before
//! any input.

use std::collections::VecDeque;
use std::path::PathBuf;

/// A deferred scene mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneJob {
    /// Replace the document with parsed text.
    Import(String),
    /// The runner started the node with this name.
    BeforeNode(String),
    AfterNode(String),
    AfterNodeFailed {
        name: String,
        message: String,
        screenshots: Vec<PathBuf>,
    },
    /// The runner is done; drop the running decoration.
    RunFinished,
    /// Show a status message.
    Status(String),
}

/// Jobs posted since the last tick, held by the scene itself.
///
/// Posting requires the scene lock, so the lock stays the only thing
/// other threads synchronize on.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: VecDeque<SceneJob>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: SceneJob) {
        self.jobs.push_back(job);
    }

    /// Take every pending job in posting order.
    pub fn drain(&mut self) -> Vec<SceneJob> {
        self.jobs.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jobs_keep_posting_order() {
        let mut queue = JobQueue::new();
        queue.push(SceneJob::BeforeNode("a".into()));
        queue.push(SceneJob::AfterNode("a".into()));
        assert_eq!(queue.len(), 2);
        assert_eq!(
            queue.drain(),
            vec![
                SceneJob::BeforeNode("a".into()),
                SceneJob::AfterNode("a".into())
            ]
        );
        assert!(queue.is_empty());
    }
}
