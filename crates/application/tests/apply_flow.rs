//! Integration tests for the end-to-end apply flow
//!
//! Every test runs the real orchestrator against the in-memory catalog;
//! the catalog port is faked at the capability level, never at the network
//! layer.

use std::sync::Arc;

use pacta_adapters::{InMemoryCatalog, InMemoryContractSource, RetryConfig, RetryingCatalog};
use pacta_application::ApplyOrchestrator;
use pacta_domain::{
    CatalogObjectState, ChangeOperation, ColumnSpec, DataType, OperationStatus, QualifiedName,
    RunStatus,
};
use pacta_ports::CatalogError;

const ORDERS_DOC: &str = r#"
name: orders
version: "1.0"
tables:
  - name: main.sales.orders
    columns:
      - name: id
        type: long
        nullable: false
      - name: amount
        type: decimal(18,2)
"#;

fn orders() -> QualifiedName {
    QualifiedName::table("main", "sales", "orders")
}

fn column(name: &str, data_type: DataType, nullable: bool) -> ColumnSpec {
    ColumnSpec {
        name: name.to_string(),
        data_type,
        nullable,
        comment: None,
    }
}

fn source_with_orders() -> InMemoryContractSource {
    InMemoryContractSource::new().with_document("orders", ORDERS_DOC)
}

fn catalog_with_parents() -> Arc<InMemoryCatalog> {
    let catalog = InMemoryCatalog::new();
    catalog.seed_existing(QualifiedName::catalog("main"));
    catalog.seed_existing(QualifiedName::schema("main", "sales"));
    Arc::new(catalog)
}

#[tokio::test]
async fn applying_against_an_empty_catalog_creates_the_table_then_converges() {
    let catalog = catalog_with_parents();
    let orchestrator = ApplyOrchestrator::new(source_with_orders(), Arc::clone(&catalog));

    let result = orchestrator.apply("orders", "dev", false).await;
    assert_eq!(result.status, RunStatus::Converged);
    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(result.outcomes[0].status, OperationStatus::Applied);
    assert!(matches!(
        &result.outcomes[0].operation,
        ChangeOperation::CreateObject { name, columns, .. }
            if name == &orders() && columns.len() == 2
    ));
    assert_eq!(result.exit_code(), 0);

    let state = catalog.snapshot(&orders()).unwrap();
    assert!(state.exists);
    assert_eq!(state.columns.len(), 2);

    // Re-running the same contract against the converged catalog is a no-op.
    let rerun = orchestrator.apply("orders", "dev", false).await;
    assert_eq!(rerun.status, RunStatus::NoOp);
    assert!(rerun.outcomes.is_empty());
    assert_eq!(rerun.exit_code(), 0);
}

#[tokio::test]
async fn invalid_contracts_never_touch_the_catalog() {
    let invalid = r#"
name: orders
version: "1.0"
tables:
  - name: main.sales.orders
    columns:
      - name: id
        type: long
      - name: ID
        type: long
"#;
    let source = InMemoryContractSource::new().with_document("orders", invalid);
    let catalog = catalog_with_parents();
    let orchestrator = ApplyOrchestrator::new(source, Arc::clone(&catalog));

    let result = orchestrator.apply("orders", "dev", false).await;
    assert_eq!(result.status, RunStatus::Failed);
    assert!(result.outcomes.is_empty());
    assert!(result.diagnostics[0].contains("contract invalid"));
    assert_eq!(catalog.call_count(), 0, "no catalog call may occur");
}

#[tokio::test]
async fn malformed_documents_are_distinguished_from_missing_ones() {
    let source = InMemoryContractSource::new().with_document("orders", "tables: [not, a, contract");
    let catalog = catalog_with_parents();
    let orchestrator = ApplyOrchestrator::new(source, Arc::clone(&catalog));

    let result = orchestrator.apply("orders", "dev", false).await;
    assert_eq!(result.status, RunStatus::Failed);
    assert!(result.diagnostics[0].contains("contract malformed"));

    let result = orchestrator.apply("customers", "dev", false).await;
    assert_eq!(result.status, RunStatus::Failed);
    assert!(result.diagnostics[0].contains("contract not found"));
    assert_eq!(catalog.call_count(), 0);
}

#[tokio::test]
async fn a_failed_state_read_aborts_before_any_plan_is_built() {
    let catalog = catalog_with_parents();
    catalog.fail_next(CatalogError::Transient("connection reset".to_string()));
    let orchestrator = ApplyOrchestrator::new(source_with_orders(), Arc::clone(&catalog));

    let result = orchestrator.apply("orders", "dev", false).await;
    assert_eq!(result.status, RunStatus::Failed);
    assert!(result.outcomes.is_empty());
    assert!(result.diagnostics[0].contains("catalog read failed"));
    // Only read traffic reached the catalog.
    assert!(catalog
        .calls()
        .iter()
        .all(|call| call.starts_with("read_structure")));
}

#[tokio::test]
async fn destructive_drops_are_blocked_without_the_flag_and_applied_with_it() {
    let catalog = catalog_with_parents();
    catalog.seed(CatalogObjectState {
        name: orders(),
        exists: true,
        columns: vec![
            column("id", DataType::Long, false),
            column(
                "amount",
                DataType::Decimal {
                    precision: 18,
                    scale: 2,
                },
                true,
            ),
            column("legacy_flag", DataType::Boolean, true),
        ],
        constraints: Vec::new(),
        grants: Vec::new(),
    });
    let orchestrator = ApplyOrchestrator::new(source_with_orders(), Arc::clone(&catalog));

    let blocked = orchestrator.apply("orders", "dev", false).await;
    assert_eq!(blocked.status, RunStatus::Converged);
    assert_eq!(blocked.outcomes.len(), 1);
    assert_eq!(blocked.outcomes[0].status, OperationStatus::Blocked);
    assert!(
        catalog
            .snapshot(&orders())
            .unwrap()
            .column("legacy_flag")
            .is_some(),
        "live state must be unchanged while blocked"
    );

    let applied = orchestrator.apply("orders", "dev", true).await;
    assert_eq!(applied.status, RunStatus::Converged);
    assert_eq!(applied.outcomes[0].status, OperationStatus::Applied);
    assert!(catalog
        .snapshot(&orders())
        .unwrap()
        .column("legacy_flag")
        .is_none());

    // Once the destructive change lands the contract is fully converged.
    let rerun = orchestrator.apply("orders", "dev", false).await;
    assert_eq!(rerun.status, RunStatus::NoOp);
}

#[tokio::test]
async fn a_structural_failure_mid_plan_yields_partial_convergence() {
    let catalog = catalog_with_parents();
    // Live table has neither declared column, so the plan adds both and
    // drops the placeholder. The add of "id" is scripted to fail
    // structurally after the add of "amount" succeeded.
    catalog.seed(CatalogObjectState {
        name: orders(),
        exists: true,
        columns: vec![column("placeholder", DataType::String, true)],
        constraints: Vec::new(),
        grants: Vec::new(),
    });
    catalog.fail_on(
        "add_column main.sales.orders id",
        CatalogError::InvalidDdl("simulated rejection".to_string()),
    );
    let orchestrator = ApplyOrchestrator::new(source_with_orders(), Arc::clone(&catalog));

    let result = orchestrator.apply("orders", "dev", true).await;
    assert_eq!(result.status, RunStatus::PartiallyConverged);
    assert_eq!(result.exit_code(), 2);

    // Adds sort before the drop and the constraint; "amount" before "id".
    assert_eq!(result.outcomes.len(), 4);
    assert_eq!(result.outcomes[0].status, OperationStatus::Applied);
    assert_eq!(result.outcomes[1].status, OperationStatus::Failed);
    assert_eq!(result.outcomes[2].status, OperationStatus::Skipped);
    assert_eq!(result.outcomes[3].status, OperationStatus::Skipped);
    assert!(result.outcomes[2]
        .detail
        .as_deref()
        .unwrap()
        .contains("operation 2 failed"));

    let state = catalog.snapshot(&orders()).unwrap();
    assert!(state.column("amount").is_some(), "prior progress persists");
    assert!(
        state.column("placeholder").is_some(),
        "aborted operations never ran"
    );
}

#[tokio::test]
async fn transient_failures_during_execution_are_retried_to_success() {
    let inner = InMemoryCatalog::new();
    inner.seed_existing(QualifiedName::catalog("main"));
    inner.seed_existing(QualifiedName::schema("main", "sales"));
    inner.fail_on(
        "create_object",
        CatalogError::Transient("throttled".to_string()),
    );
    let catalog = Arc::new(RetryingCatalog::new(
        inner,
        RetryConfig {
            max_retries: 3,
            base_backoff_ms: 1,
            operation_timeout_ms: 1_000,
        },
    ));
    let orchestrator = ApplyOrchestrator::new(source_with_orders(), Arc::clone(&catalog));

    let result = orchestrator.apply("orders", "dev", false).await;
    assert_eq!(result.status, RunStatus::Converged);
    assert_eq!(result.outcomes[0].status, OperationStatus::Applied);
}
