//! In-Memory Catalog
//!
//! Test implementation of the catalog port using in-memory storage. It
//! honors the same contract as a real catalog (idempotent creates, parent
//! existence checks, structural errors for bad DDL), records every call so
//! tests can assert "no mutation on invalid input", and can be scripted to
//! fail upcoming calls for retry tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Mutex;

use pacta_domain::{
    CatalogObjectState, ColumnSpec, Constraint, DataType, Grant, Privilege, QualifiedName,
};
use pacta_ports::{CatalogError, CatalogService};

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    objects: Mutex<BTreeMap<QualifiedName, CatalogObjectState>>,
    calls: Mutex<Vec<String>>,
    scripted_failures: Mutex<VecDeque<CatalogError>>,
    targeted_failures: Mutex<Vec<(String, CatalogError)>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing object.
    pub fn seed(&self, state: CatalogObjectState) {
        let mut objects = self.objects.lock().unwrap();
        objects.insert(state.name.clone(), state);
    }

    /// Seed an existing catalog or schema with no structure.
    pub fn seed_existing(&self, name: QualifiedName) {
        self.seed(CatalogObjectState::existing(name));
    }

    /// Current snapshot of one object, if present.
    pub fn snapshot(&self, name: &QualifiedName) -> Option<CatalogObjectState> {
        self.objects.lock().unwrap().get(name).cloned()
    }

    /// Every call made against this catalog, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Script the next call to fail with `error`. Queued failures are
    /// consumed one per call, in order, before normal behavior resumes.
    pub fn fail_next(&self, error: CatalogError) {
        self.scripted_failures.lock().unwrap().push_back(error);
    }

    /// Script the first call whose recorded form starts with `prefix` to
    /// fail with `error`. Consumed once.
    pub fn fail_on(&self, prefix: impl Into<String>, error: CatalogError) {
        self.targeted_failures
            .lock()
            .unwrap()
            .push((prefix.into(), error));
    }

    fn record(&self, call: String) -> Result<(), CatalogError> {
        self.calls.lock().unwrap().push(call.clone());
        if let Some(error) = self.scripted_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        let mut targeted = self.targeted_failures.lock().unwrap();
        if let Some(position) = targeted.iter().position(|(prefix, _)| call.starts_with(prefix)) {
            let (_, error) = targeted.remove(position);
            return Err(error);
        }
        Ok(())
    }

    fn with_table<T>(
        &self,
        table: &QualifiedName,
        f: impl FnOnce(&mut CatalogObjectState) -> Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        let mut objects = self.objects.lock().unwrap();
        match objects.get_mut(table) {
            Some(state) if state.exists => f(state),
            _ => Err(CatalogError::InvalidDdl(format!(
                "{} '{}' does not exist",
                table.kind(),
                table
            ))),
        }
    }
}

#[async_trait]
impl CatalogService for InMemoryCatalog {
    async fn object_exists(&self, name: &QualifiedName) -> Result<bool, CatalogError> {
        self.record(format!("object_exists {name}"))?;
        let objects = self.objects.lock().unwrap();
        Ok(objects.get(name).is_some_and(|state| state.exists))
    }

    async fn read_structure(
        &self,
        name: &QualifiedName,
    ) -> Result<CatalogObjectState, CatalogError> {
        self.record(format!("read_structure {name}"))?;
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .get(name)
            .cloned()
            .unwrap_or_else(|| CatalogObjectState::absent(name.clone())))
    }

    async fn create_object(&self, desired: &CatalogObjectState) -> Result<(), CatalogError> {
        self.record(format!("create_object {}", desired.name))?;
        let mut objects = self.objects.lock().unwrap();
        if objects.get(&desired.name).is_some_and(|s| s.exists) {
            // Concurrent run already created it; creation is idempotent.
            return Ok(());
        }
        if let Some(parent) = desired.name.parent() {
            if !objects.get(&parent).is_some_and(|s| s.exists) {
                return Err(CatalogError::InvalidDdl(format!(
                    "parent {} '{}' does not exist",
                    parent.kind(),
                    parent
                )));
            }
        }
        let mut state = desired.clone();
        state.exists = true;
        objects.insert(state.name.clone(), state);
        Ok(())
    }

    async fn add_column(
        &self,
        table: &QualifiedName,
        column: &ColumnSpec,
    ) -> Result<(), CatalogError> {
        self.record(format!("add_column {table} {}", column.name))?;
        self.with_table(table, |state| {
            match state.column(&column.name) {
                Some(existing) if existing.data_type == column.data_type => Ok(()),
                Some(existing) => Err(CatalogError::InvalidDdl(format!(
                    "column '{}' already exists on '{table}' with type {}",
                    column.name, existing.data_type
                ))),
                None => {
                    state.columns.push(column.clone());
                    Ok(())
                }
            }
        })
    }

    async fn drop_column(&self, table: &QualifiedName, column: &str) -> Result<(), CatalogError> {
        self.record(format!("drop_column {table} {column}"))?;
        self.with_table(table, |state| {
            state
                .columns
                .retain(|c| !c.name.eq_ignore_ascii_case(column));
            Ok(())
        })
    }

    async fn alter_column_type(
        &self,
        table: &QualifiedName,
        column: &str,
        to: &DataType,
    ) -> Result<(), CatalogError> {
        self.record(format!("alter_column_type {table} {column} -> {to}"))?;
        self.with_table(table, |state| {
            let found = state
                .columns
                .iter_mut()
                .find(|c| c.name.eq_ignore_ascii_case(column));
            match found {
                Some(spec) => {
                    spec.data_type = to.clone();
                    Ok(())
                }
                None => Err(CatalogError::InvalidDdl(format!(
                    "column '{column}' does not exist on '{table}'"
                ))),
            }
        })
    }

    async fn add_constraint(
        &self,
        table: &QualifiedName,
        constraint: &Constraint,
    ) -> Result<(), CatalogError> {
        self.record(format!("add_constraint {table} {}", constraint.name()))?;
        self.with_table(table, |state| {
            state.constraints.retain(|c| c.name() != constraint.name());
            state.constraints.push(constraint.clone());
            Ok(())
        })
    }

    async fn drop_constraint(
        &self,
        table: &QualifiedName,
        constraint: &str,
    ) -> Result<(), CatalogError> {
        self.record(format!("drop_constraint {table} {constraint}"))?;
        self.with_table(table, |state| {
            state.constraints.retain(|c| c.name() != constraint);
            Ok(())
        })
    }

    async fn grant(
        &self,
        object: &QualifiedName,
        principal: &str,
        privileges: &BTreeSet<Privilege>,
    ) -> Result<(), CatalogError> {
        self.record(format!("grant {object} {principal}"))?;
        self.with_table(object, |state| {
            match state.grants.iter_mut().find(|g| g.principal == principal) {
                Some(grant) => grant.privileges.extend(privileges.iter().copied()),
                None => state.grants.push(Grant {
                    principal: principal.to_string(),
                    privileges: privileges.clone(),
                }),
            }
            Ok(())
        })
    }

    async fn revoke(
        &self,
        object: &QualifiedName,
        principal: &str,
        privileges: &BTreeSet<Privilege>,
    ) -> Result<(), CatalogError> {
        self.record(format!("revoke {object} {principal}"))?;
        self.with_table(object, |state| {
            if let Some(grant) = state.grants.iter_mut().find(|g| g.principal == principal) {
                grant.privileges.retain(|p| !privileges.contains(p));
            }
            state.grants.retain(|g| !g.privileges.is_empty());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> QualifiedName {
        QualifiedName::table("main", "sales", "orders")
    }

    fn seeded() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        catalog.seed_existing(QualifiedName::catalog("main"));
        catalog.seed_existing(QualifiedName::schema("main", "sales"));
        catalog
    }

    fn orders_state() -> CatalogObjectState {
        CatalogObjectState {
            name: orders(),
            exists: true,
            columns: vec![ColumnSpec {
                name: "id".to_string(),
                data_type: DataType::Long,
                nullable: false,
                comment: None,
            }],
            constraints: Vec::new(),
            grants: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_is_idempotent() {
        let catalog = seeded();
        catalog.create_object(&orders_state()).await.unwrap();
        catalog.create_object(&orders_state()).await.unwrap();
        assert!(catalog.object_exists(&orders()).await.unwrap());
    }

    #[tokio::test]
    async fn create_requires_the_parent() {
        let catalog = InMemoryCatalog::new();
        let err = catalog.create_object(&orders_state()).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidDdl(_)));
    }

    #[tokio::test]
    async fn missing_objects_read_as_absent_not_as_errors() {
        let catalog = InMemoryCatalog::new();
        let state = catalog.read_structure(&orders()).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed_in_order() {
        let catalog = seeded();
        catalog.fail_next(CatalogError::Transient("throttled".to_string()));
        let err = catalog.object_exists(&orders()).await.unwrap_err();
        assert!(err.is_transient());
        assert!(!catalog.object_exists(&orders()).await.unwrap());
    }

    #[tokio::test]
    async fn records_every_call() {
        let catalog = seeded();
        catalog.create_object(&orders_state()).await.unwrap();
        catalog
            .drop_column(&orders(), "id")
            .await
            .unwrap();
        let calls = catalog.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("create_object"));
        assert!(calls[1].starts_with("drop_column"));
    }
}
