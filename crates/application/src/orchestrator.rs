//! Apply Orchestrator
//!
//! The externally-invoked driver for one contract + environment. Drives
//! the phase machine `Loaded -> Validated -> StateRead -> Planned ->
//! Executing -> terminal`; only the executing phase mutates catalog state,
//! every earlier phase is read-only and safely repeatable. Pre-flight
//! failures therefore produce a failed run with zero outcomes and zero
//! mutations.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use pacta_domain::{diff, ExecutionPlan, OperationOutcome, RunResult, RunStatus};
use pacta_ports::{CatalogService, ContractSource, ContractSourceError};

use crate::error::ApplyError;
use crate::executor::PlanExecutor;
use crate::loader::ContractLoader;
use crate::reader::StateReader;

/// Phases of one apply run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunPhase {
    Loaded,
    Validated,
    StateRead,
    Planned,
    Executing,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded => write!(f, "loaded"),
            Self::Validated => write!(f, "validated"),
            Self::StateRead => write!(f, "state_read"),
            Self::Planned => write!(f, "planned"),
            Self::Executing => write!(f, "executing"),
        }
    }
}

/// Top-level apply driver
pub struct ApplyOrchestrator<S, C> {
    loader: ContractLoader<S>,
    reader: StateReader<C>,
    executor: PlanExecutor<C>,
}

impl<S, C> ApplyOrchestrator<S, C>
where
    S: ContractSource,
    C: CatalogService,
{
    pub fn new(source: S, catalog: Arc<C>) -> Self {
        Self {
            loader: ContractLoader::new(source),
            reader: StateReader::new(Arc::clone(&catalog)),
            executor: PlanExecutor::new(catalog),
        }
    }

    /// Run one end-to-end apply. Always produces a run result, even when
    /// the run fails before a plan is built.
    pub async fn apply(
        &self,
        contract_name: &str,
        environment: &str,
        allow_destructive: bool,
    ) -> RunResult {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            run_id = %run_id,
            contract = contract_name,
            environment,
            allow_destructive,
            "starting apply run"
        );

        let (status, outcomes, diagnostics) =
            match self.run(contract_name, allow_destructive).await {
                Ok((plan, outcomes)) => {
                    let status = RunStatus::classify(plan.is_empty(), &outcomes);
                    (status, outcomes, plan.diagnostics)
                }
                Err(err) => {
                    error!(run_id = %run_id, error = %err, "apply run failed before execution");
                    (RunStatus::Failed, Vec::new(), vec![err.to_string()])
                }
            };

        let result = RunResult {
            run_id,
            contract: contract_name.to_string(),
            environment: environment.to_string(),
            started_at,
            finished_at: Utc::now(),
            status,
            outcomes,
            diagnostics,
        };
        info!(run_id = %run_id, status = %result.status, operations = result.outcomes.len(), "apply run finished");
        result
    }

    async fn run(
        &self,
        contract_name: &str,
        allow_destructive: bool,
    ) -> Result<(ExecutionPlan, Vec<OperationOutcome>), ApplyError> {
        let contract = self.loader.load(contract_name).await?;
        info!(phase = %RunPhase::Loaded, contract = %contract.name, "phase complete");
        info!(phase = %RunPhase::Validated, contract = %contract.name, "phase complete");

        let objects = contract.referenced_objects();
        let live = self.reader.read_state(&objects).await?;
        info!(phase = %RunPhase::StateRead, objects = live.len(), "phase complete");

        let plan = diff(&contract, &live);
        info!(phase = %RunPhase::Planned, operations = plan.len(), "phase complete");
        if plan.is_empty() {
            return Ok((plan, Vec::new()));
        }

        info!(phase = %RunPhase::Executing, "phase started");
        let outcomes = self.executor.execute(&plan, allow_destructive).await;
        Ok((plan, outcomes))
    }

    /// Contract names available to this orchestrator's source.
    pub async fn list_contracts(&self) -> Result<Vec<String>, ContractSourceError> {
        self.loader.list().await
    }
}
