//! Catalog Object Identity and Live State
//!
//! Value objects describing the three-level catalog namespace and the
//! structure of an object as currently observed. Snapshots are produced
//! fresh per run and never cached across runs; the catalog mutates
//! externally between invocations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::contract::types::{ColumnSpec, Constraint, Grant};
use crate::shared_kernel::error::DomainError;

/// Kind of catalog object addressed by a [`QualifiedName`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Catalog,
    Schema,
    Table,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catalog => write!(f, "catalog"),
            Self::Schema => write!(f, "schema"),
            Self::Table => write!(f, "table"),
        }
    }
}

/// Identity of one catalog object: `catalog[.schema[.table]]`.
///
/// The derived ordering is dependency order: a catalog sorts before every
/// schema inside it and a schema before every table inside it, which the
/// diff engine and the plan sort rely on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QualifiedName {
    catalog: String,
    schema: Option<String>,
    table: Option<String>,
}

impl QualifiedName {
    pub fn catalog(catalog: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            schema: None,
            table: None,
        }
    }

    pub fn schema(catalog: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            schema: Some(schema.into()),
            table: None,
        }
    }

    pub fn table(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: Some(schema.into()),
            table: Some(table.into()),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match (&self.schema, &self.table) {
            (None, _) => ObjectKind::Catalog,
            (Some(_), None) => ObjectKind::Schema,
            (Some(_), Some(_)) => ObjectKind::Table,
        }
    }

    /// Parent object, `None` for a catalog-level name.
    pub fn parent(&self) -> Option<QualifiedName> {
        match self.kind() {
            ObjectKind::Catalog => None,
            ObjectKind::Schema => Some(Self::catalog(self.catalog.clone())),
            ObjectKind::Table => Some(Self {
                catalog: self.catalog.clone(),
                schema: self.schema.clone(),
                table: None,
            }),
        }
    }

    pub fn catalog_name(&self) -> &str {
        &self.catalog
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.catalog)?;
        if let Some(schema) = &self.schema {
            write!(f, ".{schema}")?;
        }
        if let Some(table) = &self.table {
            write!(f, ".{table}")?;
        }
        Ok(())
    }
}

impl FromStr for QualifiedName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(DomainError::InvalidName(s.to_string()));
        }
        Ok(Self {
            catalog: parts[0].to_string(),
            schema: parts.get(1).map(|p| (*p).to_string()),
            table: parts.get(2).map(|p| (*p).to_string()),
        })
    }
}

impl TryFrom<String> for QualifiedName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> Self {
        name.to_string()
    }
}

/// Live snapshot of one catalog object as currently observed.
///
/// Missing objects are represented with `exists = false`; non-existence is
/// expected, normal input to the diff, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogObjectState {
    pub name: QualifiedName,
    pub exists: bool,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub grants: Vec<Grant>,
}

impl CatalogObjectState {
    /// Snapshot for an object that does not exist on the live side.
    pub fn absent(name: QualifiedName) -> Self {
        Self {
            name,
            exists: false,
            columns: Vec::new(),
            constraints: Vec::new(),
            grants: Vec::new(),
        }
    }

    /// Snapshot for an existing object with no structure (catalog, schema).
    pub fn existing(name: QualifiedName) -> Self {
        Self {
            name,
            exists: true,
            columns: Vec::new(),
            constraints: Vec::new(),
            grants: Vec::new(),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.name.kind()
    }

    /// Case-insensitive column lookup.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}
