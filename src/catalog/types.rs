//! Catalog type definitions
//!
//! Supported column types:
//! - boolean
//! - integer: 32-bit signed integer
//! - bigint: 64-bit signed integer
//! - double: 64-bit floating point
//! - varchar: UTF-8 string, ordered by the column's collation

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::collation::CollationId;

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    Integer,
    BigInt,
    Double,
    Varchar,
}

impl DataType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::BigInt => "bigint",
            DataType::Double => "double",
            DataType::Varchar => "varchar",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::BigInt | DataType::Double)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, DataType::Varchar)
    }

    fn numeric_rank(&self) -> Option<u8> {
        match self {
            DataType::Integer => Some(0),
            DataType::BigInt => Some(1),
            DataType::Double => Some(2),
            _ => None,
        }
    }

    /// Wider of two numeric types, `None` if either is not numeric
    pub fn promote(self, other: DataType) -> Option<DataType> {
        let (a, b) = (self.numeric_rank()?, other.numeric_rank()?);
        Some(if a >= b { self } else { other })
    }

    /// Whether values of the two types can be compared
    pub fn comparable_with(&self, other: &DataType) -> bool {
        self == other || (self.is_numeric() && other.is_numeric())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Declared name, in the case the user created it with
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    /// Collation id for string columns
    pub collation: Option<CollationId>,
}

impl Column {
    /// Create a nullable column
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            collation: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_collation(mut self, collation: CollationId) -> Self {
        self.collation = Some(collation);
        self
    }
}

/// Schema-qualified object name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableName {
    pub schema: String,
    pub table: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// One declared field of an index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexField {
    /// Position within the index, starting at 0
    pub position: usize,
    pub column: String,
    /// Position of the column within its table
    pub column_position: usize,
    pub data_type: DataType,
    pub collation: Option<CollationId>,
}

/// Index descriptor: ordered declared fields over one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub table: TableName,
    pub unique: bool,
    pub fields: Vec<IndexField>,
}

impl Index {
    /// Number of declared fields
    pub fn degree(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, position: usize) -> Option<&IndexField> {
        self.fields.get(position)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.table, self.name)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&field.column)?;
        }
        f.write_str(")")
    }
}

/// Table definition with its indexes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: TableName,
    pub columns: Vec<Column>,
    pub indexes: Vec<Arc<Index>>,
}

impl Table {
    pub fn new(name: TableName, columns: Vec<Column>) -> Self {
        Self {
            name,
            columns,
            indexes: Vec::new(),
        }
    }

    /// Case-insensitive column lookup returning the column position
    pub fn column(&self, name: &str) -> Option<(usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.name.eq_ignore_ascii_case(name))
    }

    /// Case-insensitive index lookup
    pub fn index(&self, name: &str) -> Option<&Arc<Index>> {
        self.indexes
            .iter()
            .find(|i| i.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_promotion() {
        assert_eq!(
            DataType::Integer.promote(DataType::BigInt),
            Some(DataType::BigInt)
        );
        assert_eq!(
            DataType::Double.promote(DataType::Integer),
            Some(DataType::Double)
        );
        assert_eq!(DataType::Varchar.promote(DataType::Integer), None);
    }

    #[test]
    fn test_comparability() {
        assert!(DataType::Integer.comparable_with(&DataType::Double));
        assert!(DataType::Varchar.comparable_with(&DataType::Varchar));
        assert!(!DataType::Varchar.comparable_with(&DataType::BigInt));
        assert!(!DataType::Boolean.comparable_with(&DataType::Integer));
    }

    #[test]
    fn test_column_lookup_ignores_case() {
        let table = Table::new(
            TableName::new("test", "t"),
            vec![
                Column::new("Id", DataType::Integer),
                Column::new("name", DataType::Varchar),
            ],
        );
        let (pos, col) = table.column("ID").unwrap();
        assert_eq!(pos, 0);
        assert_eq!(col.name, "Id");
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn test_data_type_serde_names() {
        let t: DataType = serde_json::from_str("\"bigint\"").unwrap();
        assert_eq!(t, DataType::BigInt);
        assert_eq!(serde_json::to_string(&DataType::Varchar).unwrap(), "\"varchar\"");
    }
}
