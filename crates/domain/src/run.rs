//! Run Result
//!
//! Outcome record for one apply invocation: per-operation status plus the
//! overall run classification the orchestrator maps to a process exit
//! status. Partial success is never hidden behind a single pass/fail flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::plan::change::ChangeOperation;

/// Status of one executed (or deliberately not executed) operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// The change was applied to the live catalog.
    Applied,
    /// Nothing to do: already converged, or aborted after an earlier
    /// failure (the detail says which).
    Skipped,
    /// Destructive change held back because the run lacked the
    /// allow-destructive flag. Informational, not a failure.
    Blocked,
    /// Structural failure, or a transient failure that exhausted its retry
    /// budget. Terminates the remaining plan.
    Failed,
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::Skipped => write!(f, "skipped"),
            Self::Blocked => write!(f, "blocked"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One operation and what happened to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub sequence: u32,
    pub operation: ChangeOperation,
    pub status: OperationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Overall classification of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every planned operation applied (or was already converged).
    Converged,
    /// At least one operation applied before a failure stopped the plan.
    PartiallyConverged,
    /// The run failed before mutating anything, or failed with no progress.
    Failed,
    /// The computed plan was empty; live state already matched.
    NoOp,
}

impl RunStatus {
    /// Classify a finished execution from its per-operation outcomes.
    pub fn classify(plan_was_empty: bool, outcomes: &[OperationOutcome]) -> Self {
        if plan_was_empty {
            return Self::NoOp;
        }
        let failed = outcomes
            .iter()
            .any(|o| o.status == OperationStatus::Failed);
        if !failed {
            return Self::Converged;
        }
        let applied = outcomes
            .iter()
            .any(|o| o.status == OperationStatus::Applied);
        if applied {
            Self::PartiallyConverged
        } else {
            Self::Failed
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::PartiallyConverged => write!(f, "partially_converged"),
            Self::Failed => write!(f, "failed"),
            Self::NoOp => write!(f, "no_op"),
        }
    }
}

/// Outcome record for one apply invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub contract: String,
    pub environment: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub outcomes: Vec<OperationOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl RunResult {
    /// Process exit status for the surrounding invocation layer. The
    /// partially-converged/failed distinction stays in the structured
    /// output; it is not re-derivable from the code alone.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Converged | RunStatus::NoOp => 0,
            RunStatus::PartiallyConverged => 2,
            RunStatus::Failed => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QualifiedName;

    fn outcome(sequence: u32, status: OperationStatus) -> OperationOutcome {
        OperationOutcome {
            sequence,
            operation: ChangeOperation::CreateObject {
                name: QualifiedName::catalog("main"),
                columns: Vec::new(),
                constraints: Vec::new(),
                grants: Vec::new(),
            },
            status,
            detail: None,
        }
    }

    #[test]
    fn empty_plan_classifies_as_no_op() {
        assert_eq!(RunStatus::classify(true, &[]), RunStatus::NoOp);
    }

    #[test]
    fn blocked_operations_do_not_fail_the_run() {
        let outcomes = vec![
            outcome(1, OperationStatus::Applied),
            outcome(2, OperationStatus::Blocked),
        ];
        assert_eq!(RunStatus::classify(false, &outcomes), RunStatus::Converged);
    }

    #[test]
    fn failure_after_progress_is_partial_convergence() {
        let outcomes = vec![
            outcome(1, OperationStatus::Applied),
            outcome(2, OperationStatus::Failed),
            outcome(3, OperationStatus::Skipped),
        ];
        assert_eq!(
            RunStatus::classify(false, &outcomes),
            RunStatus::PartiallyConverged
        );
    }

    #[test]
    fn failure_with_no_progress_is_a_failed_run() {
        let outcomes = vec![outcome(1, OperationStatus::Failed)];
        assert_eq!(RunStatus::classify(false, &outcomes), RunStatus::Failed);
    }

    #[test]
    fn exit_codes_distinguish_partial_from_failed() {
        let mut result = RunResult {
            run_id: Uuid::new_v4(),
            contract: "orders".to_string(),
            environment: "dev".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            status: RunStatus::Converged,
            outcomes: Vec::new(),
            diagnostics: Vec::new(),
        };
        assert_eq!(result.exit_code(), 0);
        result.status = RunStatus::NoOp;
        assert_eq!(result.exit_code(), 0);
        result.status = RunStatus::PartiallyConverged;
        assert_eq!(result.exit_code(), 2);
        result.status = RunStatus::Failed;
        assert_eq!(result.exit_code(), 1);
    }
}
