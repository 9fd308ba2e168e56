//! Change Operations
//!
//! Atomic units of convergence. Each operation carries its target identity
//! and payload; ordering ranks and the destructive flag drive plan
//! sequencing and execution-time gating.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::catalog::QualifiedName;
use crate::contract::types::{ColumnSpec, Constraint, DataType, Grant, Privilege};

/// Classification of a column type alteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCompatibility {
    /// Lossless promotion, safe to apply unconditionally.
    Widening,
    /// Potentially lossy, gated behind explicit confirmation.
    Narrowing,
}

impl TypeCompatibility {
    pub fn of(from: &DataType, to: &DataType) -> Self {
        if from.widens_to(to) {
            Self::Widening
        } else {
            Self::Narrowing
        }
    }
}

impl fmt::Display for TypeCompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Widening => write!(f, "widening"),
            Self::Narrowing => write!(f, "narrowing"),
        }
    }
}

/// One structural change needed to converge live state to declared state.
///
/// Operations are individually idempotent: re-applying a `CreateObject` on
/// an already-existing object is a no-op, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    CreateObject {
        name: QualifiedName,
        columns: Vec<ColumnSpec>,
        constraints: Vec<Constraint>,
        grants: Vec<Grant>,
    },
    AddColumn {
        table: QualifiedName,
        column: ColumnSpec,
    },
    DropColumn {
        table: QualifiedName,
        column: String,
    },
    AlterColumnType {
        table: QualifiedName,
        column: String,
        from: DataType,
        to: DataType,
        compatibility: TypeCompatibility,
    },
    AddConstraint {
        table: QualifiedName,
        constraint: Constraint,
    },
    DropConstraint {
        table: QualifiedName,
        constraint: String,
    },
    GrantPrivilege {
        object: QualifiedName,
        principal: String,
        privileges: BTreeSet<Privilege>,
    },
    RevokePrivilege {
        object: QualifiedName,
        principal: String,
        privileges: BTreeSet<Privilege>,
    },
}

impl ChangeOperation {
    /// The object this operation mutates.
    pub fn target(&self) -> &QualifiedName {
        match self {
            Self::CreateObject { name, .. } => name,
            Self::AddColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::AlterColumnType { table, .. }
            | Self::AddConstraint { table, .. }
            | Self::DropConstraint { table, .. } => table,
            Self::GrantPrivilege { object, .. } | Self::RevokePrivilege { object, .. } => object,
        }
    }

    /// Ordering class. Creates come first, then the constraint drops that
    /// unblock column work, then column alters/adds/drops, then constraint
    /// additions, then grant changes.
    pub fn rank(&self) -> u8 {
        match self {
            Self::CreateObject { .. } => 0,
            Self::DropConstraint { .. } => 1,
            Self::AlterColumnType { .. } => 2,
            Self::AddColumn { .. } => 3,
            Self::DropColumn { .. } => 4,
            Self::AddConstraint { .. } => 5,
            Self::GrantPrivilege { .. } => 6,
            Self::RevokePrivilege { .. } => 7,
        }
    }

    /// Destructive operations are skipped unless the run carries the
    /// allow-destructive flag.
    pub fn is_destructive(&self) -> bool {
        match self {
            Self::DropColumn { .. } | Self::RevokePrivilege { .. } => true,
            Self::AlterColumnType { compatibility, .. } => {
                *compatibility == TypeCompatibility::Narrowing
            }
            _ => false,
        }
    }

    /// Key identifying the object field this operation touches, used by the
    /// duplicate-operation guard.
    pub fn conflict_key(&self) -> (QualifiedName, String) {
        let field = match self {
            Self::CreateObject { .. } => "object".to_string(),
            Self::AddColumn { column, .. } => format!("column:{}", column.name.to_lowercase()),
            Self::DropColumn { column, .. } | Self::AlterColumnType { column, .. } => {
                format!("column:{}", column.to_lowercase())
            }
            Self::AddConstraint { constraint, .. } => format!("constraint:{}", constraint.name()),
            Self::DropConstraint { constraint, .. } => format!("constraint:{constraint}"),
            Self::GrantPrivilege { principal, .. } => format!("grant:{principal}"),
            Self::RevokePrivilege { principal, .. } => format!("revoke:{principal}"),
        };
        (self.target().clone(), field)
    }

    /// Deterministic within-class sort key.
    pub(crate) fn payload_key(&self) -> String {
        self.conflict_key().1
    }
}

fn privileges_label(privileges: &BTreeSet<Privilege>) -> String {
    privileges
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for ChangeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateObject { name, .. } => write!(f, "create {} {}", name.kind(), name),
            Self::AddColumn { table, column } => {
                write!(
                    f,
                    "add column {} {} to {}",
                    column.name, column.data_type, table
                )
            }
            Self::DropColumn { table, column } => {
                write!(f, "drop column {column} from {table}")
            }
            Self::AlterColumnType {
                table,
                column,
                from,
                to,
                compatibility,
            } => write!(
                f,
                "alter column {column} on {table}: {from} -> {to} ({compatibility})"
            ),
            Self::AddConstraint { table, constraint } => {
                write!(f, "add constraint {} on {}", constraint.name(), table)
            }
            Self::DropConstraint { table, constraint } => {
                write!(f, "drop constraint {constraint} on {table}")
            }
            Self::GrantPrivilege {
                object,
                principal,
                privileges,
            } => write!(
                f,
                "grant {} on {} to {}",
                privileges_label(privileges),
                object,
                principal
            ),
            Self::RevokePrivilege {
                object,
                principal,
                privileges,
            } => write!(
                f,
                "revoke {} on {} from {}",
                privileges_label(privileges),
                object,
                principal
            ),
        }
    }
}
