//! Retrying Catalog Decorator
//!
//! Wraps any catalog service with per-call timeouts and bounded
//! exponential backoff. Only transient failures are retried; structural
//! failures (invalid DDL, permission denied) pass through immediately.
//! Exhausted retries surface as the operation's failure to the caller.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use pacta_domain::{CatalogObjectState, ColumnSpec, Constraint, DataType, Privilege, QualifiedName};
use pacta_ports::{CatalogError, CatalogService};

use crate::config::RetryConfig;

/// Decorator that retries transient catalog failures
#[derive(Debug, Clone)]
pub struct RetryingCatalog<C> {
    inner: C,
    config: RetryConfig,
}

impl<C> RetryingCatalog<C>
where
    C: CatalogService,
{
    pub fn new(inner: C, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Calculate exponential backoff duration
    fn backoff(&self, attempt: u32) -> Duration {
        self.config.base_backoff() * 2u32.saturating_pow(attempt)
    }

    async fn with_retry<T, F, Fut>(&self, call: &'static str, f: F) -> Result<T, CatalogError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        let mut attempt = 0u32;
        loop {
            match tokio::time::timeout(self.config.operation_timeout(), f()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) if err.is_transient() && attempt < self.config.max_retries => {
                    let backoff = self.backoff(attempt);
                    warn!(
                        call,
                        error = %err,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "transient catalog failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Ok(Err(err)) => return Err(err),
                Err(_) if attempt < self.config.max_retries => {
                    let backoff = self.backoff(attempt);
                    warn!(
                        call,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "catalog call timed out, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(_) => {
                    return Err(CatalogError::Transient(format!(
                        "{call} timed out after {:?}",
                        self.config.operation_timeout()
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl<C> CatalogService for RetryingCatalog<C>
where
    C: CatalogService,
{
    async fn object_exists(&self, name: &QualifiedName) -> Result<bool, CatalogError> {
        self.with_retry("object_exists", || self.inner.object_exists(name))
            .await
    }

    async fn read_structure(
        &self,
        name: &QualifiedName,
    ) -> Result<CatalogObjectState, CatalogError> {
        self.with_retry("read_structure", || self.inner.read_structure(name))
            .await
    }

    async fn create_object(&self, desired: &CatalogObjectState) -> Result<(), CatalogError> {
        self.with_retry("create_object", || self.inner.create_object(desired))
            .await
    }

    async fn add_column(
        &self,
        table: &QualifiedName,
        column: &ColumnSpec,
    ) -> Result<(), CatalogError> {
        self.with_retry("add_column", || self.inner.add_column(table, column))
            .await
    }

    async fn drop_column(&self, table: &QualifiedName, column: &str) -> Result<(), CatalogError> {
        self.with_retry("drop_column", || self.inner.drop_column(table, column))
            .await
    }

    async fn alter_column_type(
        &self,
        table: &QualifiedName,
        column: &str,
        to: &DataType,
    ) -> Result<(), CatalogError> {
        self.with_retry("alter_column_type", || {
            self.inner.alter_column_type(table, column, to)
        })
        .await
    }

    async fn add_constraint(
        &self,
        table: &QualifiedName,
        constraint: &Constraint,
    ) -> Result<(), CatalogError> {
        self.with_retry("add_constraint", || {
            self.inner.add_constraint(table, constraint)
        })
        .await
    }

    async fn drop_constraint(
        &self,
        table: &QualifiedName,
        constraint: &str,
    ) -> Result<(), CatalogError> {
        self.with_retry("drop_constraint", || {
            self.inner.drop_constraint(table, constraint)
        })
        .await
    }

    async fn grant(
        &self,
        object: &QualifiedName,
        principal: &str,
        privileges: &BTreeSet<Privilege>,
    ) -> Result<(), CatalogError> {
        self.with_retry("grant", || self.inner.grant(object, principal, privileges))
            .await
    }

    async fn revoke(
        &self,
        object: &QualifiedName,
        principal: &str,
        privileges: &BTreeSet<Privilege>,
    ) -> Result<(), CatalogError> {
        self.with_retry("revoke", || self.inner.revoke(object, principal, privileges))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::in_memory::InMemoryCatalog;

    fn fast_retries() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            base_backoff_ms: 1,
            operation_timeout_ms: 1_000,
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_within_the_budget() {
        let inner = InMemoryCatalog::new();
        inner.fail_next(CatalogError::Transient("throttled".to_string()));
        inner.fail_next(CatalogError::Transient("throttled".to_string()));

        let catalog = RetryingCatalog::new(inner, fast_retries());
        let name = QualifiedName::catalog("main");
        assert!(!catalog.object_exists(&name).await.unwrap());
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_transient_error() {
        let inner = InMemoryCatalog::new();
        for _ in 0..4 {
            inner.fail_next(CatalogError::Transient("throttled".to_string()));
        }

        let catalog = RetryingCatalog::new(inner, fast_retries());
        let name = QualifiedName::catalog("main");
        let err = catalog.object_exists(&name).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn structural_failures_are_not_retried() {
        let inner = InMemoryCatalog::new();
        inner.fail_next(CatalogError::PermissionDenied("no".to_string()));

        let catalog = RetryingCatalog::new(inner, fast_retries());
        let name = QualifiedName::catalog("main");
        let err = catalog.object_exists(&name).await.unwrap_err();
        assert!(matches!(err, CatalogError::PermissionDenied(_)));
        // One recorded call: the structural failure went straight through.
        assert_eq!(catalog.inner.call_count(), 1);
    }
}
