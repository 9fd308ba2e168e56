//! Execution Plan
//!
//! Ordered sequence of change operations for one contract run, produced
//! exclusively by the diff engine.

pub mod change;
pub mod diff;

use serde::{Deserialize, Serialize};

use change::ChangeOperation;

/// One operation with its position in the plan. Sequence numbers start at 1
/// and encode the dependency order the executor must respect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedOperation {
    pub sequence: u32,
    pub operation: ChangeOperation,
}

/// Ordered change list for one contract run.
///
/// An empty plan classifies the run as a no-op. Diagnostics record
/// operations the planner dropped (duplicate-target guard), never silently.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub operations: Vec<PlannedOperation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl ExecutionPlan {
    /// Build a plan from already-sorted operations, assigning sequence
    /// numbers.
    pub fn new(operations: Vec<ChangeOperation>, diagnostics: Vec<String>) -> Self {
        let operations = operations
            .into_iter()
            .enumerate()
            .map(|(index, operation)| PlannedOperation {
                sequence: index as u32 + 1,
                operation,
            })
            .collect();
        Self {
            operations,
            diagnostics,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }
}
