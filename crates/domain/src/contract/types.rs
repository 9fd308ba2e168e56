//! Contract Value Objects
//!
//! Column, constraint, and grant vocabulary shared by the declared side
//! (contracts) and the observed side (catalog snapshots).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::shared_kernel::error::DomainError;

/// Fixed enumeration of supported column types.
///
/// Parsed from the document's lowercase spelling; an unknown spelling is a
/// validation failure, never a fallback.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Decimal { precision: u8, scale: u8 },
    String,
    Date,
    Timestamp,
    Binary,
}

impl DataType {
    /// Whether altering a column from `self` to `to` is a lossless widening.
    ///
    /// Widening pairs: int -> long, int -> double, long -> double,
    /// float -> double, date -> timestamp, and decimal growth that keeps
    /// both the fractional digits and the integral digits.
    pub fn widens_to(&self, to: &Self) -> bool {
        use DataType::{Date, Decimal, Double, Float, Int, Long, Timestamp};
        match (self, to) {
            (Int, Long | Double) | (Long, Double) | (Float, Double) | (Date, Timestamp) => true,
            (
                Decimal {
                    precision: p1,
                    scale: s1,
                },
                Decimal {
                    precision: p2,
                    scale: s2,
                },
            ) => p2 >= p1 && s2 >= s1 && (p2 - s2) >= (p1 - s1),
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Int => write!(f, "int"),
            Self::Long => write!(f, "long"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            Self::String => write!(f, "string"),
            Self::Date => write!(f, "date"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

impl FromStr for DataType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spelling = s.trim();
        let parsed = match spelling {
            "boolean" => Some(Self::Boolean),
            "int" => Some(Self::Int),
            "long" => Some(Self::Long),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            "string" => Some(Self::String),
            "date" => Some(Self::Date),
            "timestamp" => Some(Self::Timestamp),
            "binary" => Some(Self::Binary),
            other => parse_decimal(other),
        };
        parsed.ok_or_else(|| DomainError::UnknownType(s.to_string()))
    }
}

fn parse_decimal(spelling: &str) -> Option<DataType> {
    let args = spelling.strip_prefix("decimal(")?.strip_suffix(')')?;
    let (precision, scale) = args.split_once(',')?;
    let precision: u8 = precision.trim().parse().ok()?;
    let scale: u8 = scale.trim().parse().ok()?;
    if scale > precision || precision == 0 {
        return None;
    }
    Some(DataType::Decimal { precision, scale })
}

impl TryFrom<String> for DataType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        data_type.to_string()
    }
}

fn nullable_default() -> bool {
    true
}

/// Declared or observed structure of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default = "nullable_default")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Table-level constraint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Constraint {
    PrimaryKey { name: String, columns: Vec<String> },
    NotNull { column: String },
    Check { name: String, expression: String },
}

impl Constraint {
    /// Name the constraint is addressed by in drop operations. Not-null
    /// constraints carry a derived `nn_<column>` name.
    pub fn name(&self) -> String {
        match self {
            Self::PrimaryKey { name, .. } | Self::Check { name, .. } => name.clone(),
            Self::NotNull { column } => format!("nn_{column}"),
        }
    }

    /// Columns this constraint references.
    pub fn referenced_columns(&self) -> Vec<&str> {
        match self {
            Self::PrimaryKey { columns, .. } => columns.iter().map(String::as_str).collect(),
            Self::NotNull { column } => vec![column.as_str()],
            // Check expressions are opaque; column references inside them
            // are not extracted.
            Self::Check { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrimaryKey { name, columns } => {
                write!(f, "primary key {name} ({})", columns.join(", "))
            }
            Self::NotNull { column } => write!(f, "not null on {column}"),
            Self::Check { name, expression } => write!(f, "check {name} ({expression})"),
        }
    }
}

/// Privilege granted on a catalog object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privilege {
    Select,
    Modify,
    All,
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "select"),
            Self::Modify => write!(f, "modify"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Access grant: one principal and the privilege set it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Grant {
    pub principal: String,
    pub privileges: BTreeSet<Privilege>,
}
