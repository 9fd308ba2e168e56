//! Diff Engine
//!
//! Pure function from (contract, live states) to an execution plan. No side
//! effects; identical inputs always produce the identical ordered plan, so
//! a run can be replayed and audited from its inputs alone.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::catalog::{CatalogObjectState, ObjectKind, QualifiedName};
use crate::contract::types::{ColumnSpec, Constraint, Grant, Privilege};
use crate::contract::{Contract, TableContract};
use crate::plan::change::{ChangeOperation, TypeCompatibility};
use crate::plan::ExecutionPlan;

/// Compute the minimal ordered change list converging `live` to `contract`.
///
/// Objects absent on the live side become a single `CreateObject` carrying
/// the full desired structure. Objects present on both sides are diffed
/// column by column, with constraint and grant differences computed as set
/// differences. The result is stress-sorted: creates first, then the
/// constraint drops that unblock column work, then column alters/adds/
/// drops, then constraint additions, then grant changes, with parents
/// always sequenced before children.
pub fn diff(
    contract: &Contract,
    live: &BTreeMap<QualifiedName, CatalogObjectState>,
) -> ExecutionPlan {
    let mut operations = Vec::new();

    // Parent objects first: catalogs and schemas have no structure of their
    // own to diff, only existence.
    for object in contract.referenced_objects() {
        if object.kind() == ObjectKind::Table {
            continue;
        }
        if !object_exists(live, &object) {
            operations.push(ChangeOperation::CreateObject {
                name: object,
                columns: Vec::new(),
                constraints: Vec::new(),
                grants: Vec::new(),
            });
        }
    }

    // Tables in declared order; duplicates collide in the guard below and
    // the later declaration wins.
    for table in &contract.tables {
        match live.get(&table.name) {
            Some(state) if state.exists => diff_table(table, state, &mut operations),
            _ => operations.push(ChangeOperation::CreateObject {
                name: table.name.clone(),
                columns: table.columns.clone(),
                constraints: table.constraints.clone(),
                grants: table.grants.clone(),
            }),
        }
    }

    let (mut operations, diagnostics) = drop_conflicting(operations);
    operations.sort_by_key(|op| (op.rank(), op.target().clone(), op.payload_key()));
    ExecutionPlan::new(operations, diagnostics)
}

fn object_exists(live: &BTreeMap<QualifiedName, CatalogObjectState>, name: &QualifiedName) -> bool {
    live.get(name).is_some_and(|state| state.exists)
}

fn diff_table(
    table: &TableContract,
    state: &CatalogObjectState,
    operations: &mut Vec<ChangeOperation>,
) {
    diff_columns(table, state, operations);
    diff_constraints(table, state, operations);
    diff_grants(&table.name, &table.grants, &state.grants, operations);
}

fn diff_columns(
    table: &TableContract,
    state: &CatalogObjectState,
    operations: &mut Vec<ChangeOperation>,
) {
    for declared in &table.columns {
        match state.column(&declared.name) {
            None => operations.push(ChangeOperation::AddColumn {
                table: table.name.clone(),
                column: declared.clone(),
            }),
            Some(observed) if observed.data_type != declared.data_type => {
                operations.push(ChangeOperation::AlterColumnType {
                    table: table.name.clone(),
                    column: declared.name.clone(),
                    from: observed.data_type.clone(),
                    to: declared.data_type.clone(),
                    compatibility: TypeCompatibility::of(&observed.data_type, &declared.data_type),
                });
            }
            Some(_) => {}
        }
    }

    for observed in &state.columns {
        let declared = table
            .columns
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(&observed.name));
        if !declared {
            operations.push(ChangeOperation::DropColumn {
                table: table.name.clone(),
                column: observed.name.clone(),
            });
        }
    }
}

/// Declared constraints plus the implicit not-null constraint of every
/// non-nullable column. Folding nullability into the constraint set makes
/// one set difference cover both spellings.
fn effective_constraints(columns: &[ColumnSpec], constraints: &[Constraint]) -> BTreeSet<Constraint> {
    let mut set: BTreeSet<Constraint> = constraints.iter().cloned().collect();
    for column in columns {
        if !column.nullable {
            set.insert(Constraint::NotNull {
                column: column.name.clone(),
            });
        }
    }
    set
}

fn diff_constraints(
    table: &TableContract,
    state: &CatalogObjectState,
    operations: &mut Vec<ChangeOperation>,
) {
    let desired = effective_constraints(&table.columns, &table.constraints);
    let observed = effective_constraints(&state.columns, &state.constraints);

    for constraint in observed.difference(&desired) {
        operations.push(ChangeOperation::DropConstraint {
            table: table.name.clone(),
            constraint: constraint.name(),
        });
    }
    for constraint in desired.difference(&observed) {
        operations.push(ChangeOperation::AddConstraint {
            table: table.name.clone(),
            constraint: constraint.clone(),
        });
    }
}

fn diff_grants(
    object: &QualifiedName,
    desired: &[Grant],
    observed: &[Grant],
    operations: &mut Vec<ChangeOperation>,
) {
    let desired = grant_map(desired);
    let observed = grant_map(observed);
    let empty = BTreeSet::new();

    let principals: BTreeSet<&String> = desired.keys().chain(observed.keys()).collect();
    for principal in principals {
        let wanted = desired.get(principal).unwrap_or(&empty);
        let held = observed.get(principal).unwrap_or(&empty);

        let missing: BTreeSet<Privilege> = wanted.difference(held).copied().collect();
        if !missing.is_empty() {
            operations.push(ChangeOperation::GrantPrivilege {
                object: object.clone(),
                principal: principal.clone(),
                privileges: missing,
            });
        }
        let excess: BTreeSet<Privilege> = held.difference(wanted).copied().collect();
        if !excess.is_empty() {
            operations.push(ChangeOperation::RevokePrivilege {
                object: object.clone(),
                principal: principal.clone(),
                privileges: excess,
            });
        }
    }
}

fn grant_map(grants: &[Grant]) -> BTreeMap<String, BTreeSet<Privilege>> {
    let mut map: BTreeMap<String, BTreeSet<Privilege>> = BTreeMap::new();
    for grant in grants {
        map.entry(grant.principal.clone())
            .or_default()
            .extend(grant.privileges.iter().copied());
    }
    map
}

/// Duplicate-target guard. Two operations on the same object and field
/// should not occur given validation, but when they do the later-declared
/// operation wins and the earlier is dropped with a recorded diagnostic,
/// never silently merged.
fn drop_conflicting(operations: Vec<ChangeOperation>) -> (Vec<ChangeOperation>, Vec<String>) {
    let mut slots: Vec<Option<ChangeOperation>> = Vec::with_capacity(operations.len());
    let mut index: HashMap<(QualifiedName, String), usize> = HashMap::new();
    let mut diagnostics = Vec::new();

    for operation in operations {
        let key = operation.conflict_key();
        if let Some(&previous) = index.get(&key) {
            let dropped = slots[previous]
                .take()
                .expect("conflicting slot still occupied");
            diagnostics.push(format!(
                "conflicting operations on {} ({}): dropped '{}' in favor of '{}'",
                key.0, key.1, dropped, operation
            ));
        }
        index.insert(key, slots.len());
        slots.push(Some(operation));
    }

    (slots.into_iter().flatten().collect(), diagnostics)
}
