//! Catalog State Reader
//!
//! Produces a fresh live snapshot for every object a contract references.
//! Missing objects are normal diff input (`exists = false`); a failed read
//! aborts the run before any plan is built. Reads are never partially
//! trusted.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

use pacta_domain::{CatalogObjectState, QualifiedName};
use pacta_ports::CatalogService;

use crate::error::ApplyError;

/// Live state reading service
pub struct StateReader<C> {
    catalog: Arc<C>,
}

impl<C> StateReader<C>
where
    C: CatalogService,
{
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    /// Read the current state of every referenced object.
    pub async fn read_state(
        &self,
        objects: &BTreeSet<QualifiedName>,
    ) -> Result<BTreeMap<QualifiedName, CatalogObjectState>, ApplyError> {
        let mut live = BTreeMap::new();
        for object in objects {
            let state = self.catalog.read_structure(object).await?;
            debug!(object = %object, exists = state.exists, "read live structure");
            live.insert(object.clone(), state);
        }
        Ok(live)
    }
}
