//! Plan Executor
//!
//! Applies an execution plan operation by operation, in plan order. A
//! failure stops forward progress but keeps what was already committed:
//! the catalog gives no multi-statement transaction guarantee across DDL,
//! so the semantics are partial convergence, not all-or-nothing.

use std::sync::Arc;
use tracing::{error, info, warn};

use pacta_domain::{
    CatalogObjectState, ChangeOperation, ExecutionPlan, OperationOutcome, OperationStatus,
};
use pacta_ports::{CatalogError, CatalogService};

/// Plan execution service
pub struct PlanExecutor<C> {
    catalog: Arc<C>,
}

impl<C> PlanExecutor<C>
where
    C: CatalogService,
{
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    /// Execute the plan in order. Destructive operations are skipped and
    /// recorded as blocked unless `allow_destructive` is set; a structural
    /// failure aborts every remaining operation while the outcomes of
    /// operations already applied stand.
    pub async fn execute(
        &self,
        plan: &ExecutionPlan,
        allow_destructive: bool,
    ) -> Vec<OperationOutcome> {
        let mut outcomes = Vec::with_capacity(plan.len());
        let mut aborted_by: Option<u32> = None;

        for planned in &plan.operations {
            let operation = &planned.operation;

            if let Some(failed_sequence) = aborted_by {
                outcomes.push(OperationOutcome {
                    sequence: planned.sequence,
                    operation: operation.clone(),
                    status: OperationStatus::Skipped,
                    detail: Some(format!(
                        "not attempted: operation {failed_sequence} failed"
                    )),
                });
                continue;
            }

            if operation.is_destructive() && !allow_destructive {
                warn!(sequence = planned.sequence, operation = %operation, "destructive operation blocked");
                outcomes.push(OperationOutcome {
                    sequence: planned.sequence,
                    operation: operation.clone(),
                    status: OperationStatus::Blocked,
                    detail: Some("requires explicit confirmation (--allow-destructive)".to_string()),
                });
                continue;
            }

            match self.apply_one(operation).await {
                Ok(None) => {
                    info!(sequence = planned.sequence, operation = %operation, "applied");
                    outcomes.push(OperationOutcome {
                        sequence: planned.sequence,
                        operation: operation.clone(),
                        status: OperationStatus::Applied,
                        detail: None,
                    });
                }
                Ok(Some(detail)) => {
                    info!(sequence = planned.sequence, operation = %operation, detail = %detail, "skipped");
                    outcomes.push(OperationOutcome {
                        sequence: planned.sequence,
                        operation: operation.clone(),
                        status: OperationStatus::Skipped,
                        detail: Some(detail),
                    });
                }
                Err(err) => {
                    error!(sequence = planned.sequence, operation = %operation, error = %err, "operation failed");
                    outcomes.push(OperationOutcome {
                        sequence: planned.sequence,
                        operation: operation.clone(),
                        status: OperationStatus::Failed,
                        detail: Some(err.to_string()),
                    });
                    aborted_by = Some(planned.sequence);
                }
            }
        }

        outcomes
    }

    /// Apply one operation. `Ok(Some(detail))` means the catalog was
    /// already converged for this operation and nothing was mutated.
    async fn apply_one(
        &self,
        operation: &ChangeOperation,
    ) -> Result<Option<String>, CatalogError> {
        match operation {
            ChangeOperation::CreateObject {
                name,
                columns,
                constraints,
                grants,
            } => {
                // Re-check existence at execution time rather than trusting
                // the plan; a concurrent run may have created the object
                // after the state read.
                if self.catalog.object_exists(name).await? {
                    return Ok(Some("already exists".to_string()));
                }
                let desired = CatalogObjectState {
                    name: name.clone(),
                    exists: true,
                    columns: columns.clone(),
                    constraints: constraints.clone(),
                    grants: grants.clone(),
                };
                self.catalog.create_object(&desired).await?;
                Ok(None)
            }
            ChangeOperation::AddColumn { table, column } => {
                self.catalog.add_column(table, column).await?;
                Ok(None)
            }
            ChangeOperation::DropColumn { table, column } => {
                self.catalog.drop_column(table, column).await?;
                Ok(None)
            }
            ChangeOperation::AlterColumnType {
                table, column, to, ..
            } => {
                self.catalog.alter_column_type(table, column, to).await?;
                Ok(None)
            }
            ChangeOperation::AddConstraint { table, constraint } => {
                self.catalog.add_constraint(table, constraint).await?;
                Ok(None)
            }
            ChangeOperation::DropConstraint { table, constraint } => {
                self.catalog.drop_constraint(table, constraint).await?;
                Ok(None)
            }
            ChangeOperation::GrantPrivilege {
                object,
                principal,
                privileges,
            } => {
                self.catalog.grant(object, principal, privileges).await?;
                Ok(None)
            }
            ChangeOperation::RevokePrivilege {
                object,
                principal,
                privileges,
            } => {
                self.catalog.revoke(object, principal, privileges).await?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacta_adapters::InMemoryCatalog;
    use pacta_domain::{ColumnSpec, DataType, QualifiedName};

    fn orders() -> QualifiedName {
        QualifiedName::table("main", "sales", "orders")
    }

    fn column(name: &str, data_type: DataType) -> ColumnSpec {
        ColumnSpec {
            name: name.to_string(),
            data_type,
            nullable: true,
            comment: None,
        }
    }

    fn seeded_catalog() -> Arc<InMemoryCatalog> {
        let catalog = InMemoryCatalog::new();
        catalog.seed_existing(QualifiedName::catalog("main"));
        catalog.seed_existing(QualifiedName::schema("main", "sales"));
        catalog.seed(CatalogObjectState {
            name: orders(),
            exists: true,
            columns: vec![column("id", DataType::Long)],
            constraints: Vec::new(),
            grants: Vec::new(),
        });
        Arc::new(catalog)
    }

    fn add_column_op(name: &str, data_type: DataType) -> ChangeOperation {
        ChangeOperation::AddColumn {
            table: orders(),
            column: column(name, data_type),
        }
    }

    #[tokio::test]
    async fn create_on_existing_object_is_a_skipped_no_op() {
        let catalog = seeded_catalog();
        let executor = PlanExecutor::new(Arc::clone(&catalog));
        let plan = ExecutionPlan::new(
            vec![ChangeOperation::CreateObject {
                name: orders(),
                columns: vec![column("id", DataType::Long)],
                constraints: Vec::new(),
                grants: Vec::new(),
            }],
            Vec::new(),
        );

        let outcomes = executor.execute(&plan, false).await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, OperationStatus::Skipped);
        assert_eq!(outcomes[0].detail.as_deref(), Some("already exists"));
    }

    #[tokio::test]
    async fn failure_keeps_prior_progress_and_aborts_the_rest() {
        let catalog = seeded_catalog();
        let executor = PlanExecutor::new(Arc::clone(&catalog));
        let plan = ExecutionPlan::new(
            vec![
                add_column_op("amount", DataType::Double),
                // "id" already exists with a different type: structural failure.
                add_column_op("id", DataType::Int),
                add_column_op("note", DataType::String),
            ],
            Vec::new(),
        );

        let outcomes = executor.execute(&plan, false).await;
        assert_eq!(outcomes[0].status, OperationStatus::Applied);
        assert_eq!(outcomes[1].status, OperationStatus::Failed);
        assert_eq!(outcomes[2].status, OperationStatus::Skipped);
        assert!(outcomes[2].detail.as_deref().unwrap().contains("operation 2 failed"));

        let state = catalog.snapshot(&orders()).unwrap();
        assert!(state.column("amount").is_some(), "operation 1 must persist");
        assert!(state.column("note").is_none(), "operation 3 must not run");
    }

    #[tokio::test]
    async fn destructive_operations_are_blocked_without_the_flag() {
        let catalog = seeded_catalog();
        let executor = PlanExecutor::new(Arc::clone(&catalog));
        let plan = ExecutionPlan::new(
            vec![ChangeOperation::DropColumn {
                table: orders(),
                column: "id".to_string(),
            }],
            Vec::new(),
        );

        let before = catalog.snapshot(&orders()).unwrap();
        let outcomes = executor.execute(&plan, false).await;
        assert_eq!(outcomes[0].status, OperationStatus::Blocked);
        assert_eq!(catalog.snapshot(&orders()).unwrap(), before);
        assert!(catalog
            .calls()
            .iter()
            .all(|call| !call.starts_with("drop_column")));
    }

    #[tokio::test]
    async fn destructive_operations_apply_with_the_flag() {
        let catalog = seeded_catalog();
        let executor = PlanExecutor::new(Arc::clone(&catalog));
        let plan = ExecutionPlan::new(
            vec![ChangeOperation::DropColumn {
                table: orders(),
                column: "id".to_string(),
            }],
            Vec::new(),
        );

        let outcomes = executor.execute(&plan, true).await;
        assert_eq!(outcomes[0].status, OperationStatus::Applied);
        assert!(catalog.snapshot(&orders()).unwrap().column("id").is_none());
    }
}
