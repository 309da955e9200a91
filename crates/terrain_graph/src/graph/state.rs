//! Per-node execution state.
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use crate::map::HeightField;

/// Progress of a node through evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    /// Not evaluated yet, or the last attempt failed.
    NotStarted,
    /// All dependencies are done; the node is being processed.
    DependenciesResolved,
    /// The result is cached and will never be recomputed.
    Done,
}

impl ExecutionStatus {
    fn to_u8(self) -> u8 {
        match self {
            ExecutionStatus::NotStarted => 0,
            ExecutionStatus::DependenciesResolved => 1,
            ExecutionStatus::Done => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ExecutionStatus::DependenciesResolved,
            2 => ExecutionStatus::Done,
            _ => ExecutionStatus::NotStarted,
        }
    }
}

/// Status flag plus the memoized result of a node.
#[derive(Debug, Default)]
pub struct ExecutionState {
    status: AtomicU8,
    result: OnceLock<Arc<HeightField>>,
}

impl ExecutionState {
    pub fn status(&self) -> ExecutionStatus {
        ExecutionStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn is_done(&self) -> bool {
        self.status() == ExecutionStatus::Done
    }

    /// The cached result, once the node is done.
    pub fn result(&self) -> Option<Arc<HeightField>> {
        self.result.get().cloned()
    }

    pub(crate) fn mark_resolved(&self) {
        self.status
            .store(ExecutionStatus::DependenciesResolved.to_u8(), Ordering::Release);
    }

    pub(crate) fn reset(&self) {
        self.status
            .store(ExecutionStatus::NotStarted.to_u8(), Ordering::Release);
    }

    /// Store the result and mark the node done. A second result is ignored.
    pub(crate) fn complete(&self, result: Arc<HeightField>) {
        let _ = self.result.set(result);
        self.status
            .store(ExecutionStatus::Done.to_u8(), Ordering::Release);
    }
}
