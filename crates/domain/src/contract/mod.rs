//! Contract Model
//!
//! Typed in-memory representation of a declared data contract: the desired
//! state of one or more catalog objects. A contract is parsed from a
//! versioned, human-authored YAML document and is immutable once loaded for
//! a run. Validation happens wholly before any catalog interaction.

pub mod types;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::catalog::{ObjectKind, QualifiedName};
use crate::shared_kernel::error::{DomainError, DomainResult};
use types::{ColumnSpec, Constraint, Grant};

/// Desired structure of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableContract {
    pub name: QualifiedName,
    pub columns: Vec<ColumnSpec>,
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub grants: Vec<Grant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One declared data contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Contract {
    pub name: String,
    pub version: String,
    pub tables: Vec<TableContract>,
}

impl Contract {
    /// Check the structural invariants of the declared document.
    ///
    /// This runs before any catalog I/O; an invalid contract must never
    /// reach the reader or the executor.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.is_empty() {
            return Err(DomainError::Validation("contract name is empty".into()));
        }
        if self.tables.is_empty() {
            return Err(DomainError::Validation(format!(
                "contract '{}' declares no tables",
                self.name
            )));
        }

        let mut seen_tables = HashSet::new();
        for table in &self.tables {
            if table.name.kind() != ObjectKind::Table {
                return Err(DomainError::Validation(format!(
                    "'{}' is not a three-level table name",
                    table.name
                )));
            }
            if !seen_tables.insert(table.name.clone()) {
                return Err(DomainError::Validation(format!(
                    "table '{}' is declared more than once",
                    table.name
                )));
            }
            validate_table(table)?;
        }
        Ok(())
    }

    /// Every object this contract touches, parents included, in dependency
    /// order (catalog, then schema, then table).
    pub fn referenced_objects(&self) -> BTreeSet<QualifiedName> {
        let mut objects = BTreeSet::new();
        for table in &self.tables {
            let mut current = Some(table.name.clone());
            while let Some(name) = current {
                current = name.parent();
                objects.insert(name);
            }
        }
        objects
    }

    pub fn table(&self, name: &QualifiedName) -> Option<&TableContract> {
        self.tables.iter().find(|t| &t.name == name)
    }
}

fn validate_table(table: &TableContract) -> DomainResult<()> {
    if table.columns.is_empty() {
        return Err(DomainError::Validation(format!(
            "table '{}' declares no columns",
            table.name
        )));
    }

    let mut columns = HashSet::new();
    for column in &table.columns {
        if column.name.is_empty() {
            return Err(DomainError::Validation(format!(
                "table '{}' declares a column with an empty name",
                table.name
            )));
        }
        if !columns.insert(column.name.to_ascii_lowercase()) {
            return Err(DomainError::Validation(format!(
                "duplicate column '{}' in table '{}'",
                column.name, table.name
            )));
        }
    }

    let mut primary_keys = 0usize;
    for constraint in &table.constraints {
        if matches!(constraint, Constraint::PrimaryKey { .. }) {
            primary_keys += 1;
            if primary_keys > 1 {
                return Err(DomainError::Validation(format!(
                    "table '{}' declares more than one primary key",
                    table.name
                )));
            }
        }
        for referenced in constraint.referenced_columns() {
            if !columns.contains(&referenced.to_ascii_lowercase()) {
                return Err(DomainError::Validation(format!(
                    "constraint '{}' on table '{}' references undeclared column '{}'",
                    constraint.name(),
                    table.name,
                    referenced
                )));
            }
        }
    }

    let mut principals = HashSet::new();
    for grant in &table.grants {
        if grant.principal.is_empty() {
            return Err(DomainError::Validation(format!(
                "table '{}' declares a grant with an empty principal",
                table.name
            )));
        }
        if grant.privileges.is_empty() {
            return Err(DomainError::Validation(format!(
                "grant for '{}' on table '{}' declares no privileges",
                grant.principal, table.name
            )));
        }
        if !principals.insert(grant.principal.clone()) {
            return Err(DomainError::Validation(format!(
                "duplicate grant for principal '{}' on table '{}'",
                grant.principal, table.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::types::{DataType, Privilege};

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
    constraints:
      - primary_key:
          name: pk_orders
          columns: [id]
    grants:
      - principal: analysts
        privileges: [select]
"#;

    #[test]
    fn parses_a_contract_document() {
        let contract: Contract = serde_yaml::from_str(ORDERS_DOC).unwrap();
        assert_eq!(contract.name, "orders");
        assert_eq!(contract.tables.len(), 1);
        let table = &contract.tables[0];
        assert_eq!(table.name, QualifiedName::table("main", "sales", "orders"));
        assert_eq!(table.columns[0].data_type, DataType::Long);
        assert!(!table.columns[0].nullable);
        assert!(table.columns[1].nullable);
        assert!(table.grants[0].privileges.contains(&Privilege::Select));
        contract.validate().unwrap();
    }

    #[test]
    fn rejects_unknown_document_fields() {
        let doc = "name: x\nversion: '1'\nowner: me\ntables: []\n";
        assert!(serde_yaml::from_str::<Contract>(doc).is_err());
    }

    #[test]
    fn rejects_duplicate_columns_case_insensitively() {
        let mut contract: Contract = serde_yaml::from_str(ORDERS_DOC).unwrap();
        let mut duplicate = contract.tables[0].columns[0].clone();
        duplicate.name = "ID".to_string();
        contract.tables[0].columns.push(duplicate);
        let err = contract.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate column"));
    }

    #[test]
    fn rejects_constraints_on_undeclared_columns() {
        let mut contract: Contract = serde_yaml::from_str(ORDERS_DOC).unwrap();
        contract.tables[0].constraints.push(Constraint::NotNull {
            column: "missing".to_string(),
        });
        let err = contract.validate().unwrap_err();
        assert!(err.to_string().contains("undeclared column 'missing'"));
    }

    #[test]
    fn rejects_two_level_table_names() {
        let mut contract: Contract = serde_yaml::from_str(ORDERS_DOC).unwrap();
        contract.tables[0].name = "main.sales".parse().unwrap();
        assert!(contract.validate().is_err());
    }

    #[test]
    fn referenced_objects_include_parents_in_dependency_order() {
        let contract: Contract = serde_yaml::from_str(ORDERS_DOC).unwrap();
        let objects: Vec<_> = contract.referenced_objects().into_iter().collect();
        assert_eq!(
            objects,
            vec![
                QualifiedName::catalog("main"),
                QualifiedName::schema("main", "sales"),
                QualifiedName::table("main", "sales", "orders"),
            ]
        );
    }
}
