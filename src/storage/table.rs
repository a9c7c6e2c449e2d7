use crate::core::{Column, DataType, DbError, Result, Row, Schema, Value};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the surrogate key every table starts with.
pub const ID_COLUMN: &str = "ID";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    schema: TableSchema,
    rows: BTreeMap<i64, Row>,
    next_row_id: i64,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            next_row_id: 1,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Insert values for the named columns. Unnamed columns are NULL and the
    /// ID is assigned when not supplied.
    pub fn insert_values(&mut self, columns: &[String], values: Vec<Value>) -> Result<i64> {
        let schema = self.schema.schema();
        let mut row: Row = vec![Value::Null; schema.column_count()];
        for (name, value) in columns.iter().zip(values) {
            let idx = schema
                .find_column_index(name)
                .ok_or_else(|| DbError::ColumnNotFound(name.clone(), self.schema.name.clone()))?;
            row[idx] = value;
        }
        self.insert(row)
    }

    pub fn insert(&mut self, mut row: Row) -> Result<i64> {
        self.coerce_row(&mut row);
        self.validate_row(&row)?;

        let id = match row[0] {
            Value::Null => self.next_row_id,
            Value::Integer(id) => {
                if self.rows.contains_key(&id) {
                    return Err(DbError::ConstraintViolation(format!(
                        "Duplicate {} {} in table '{}'",
                        ID_COLUMN, id, self.schema.name
                    )));
                }
                id
            }
            ref other => {
                return Err(DbError::TypeMismatch(format!(
                    "{} must be an integer, got {}",
                    ID_COLUMN,
                    other.type_name()
                )));
            }
        };
        row[0] = Value::Integer(id);

        self.check_uniqueness(&row)?;

        self.next_row_id = self.next_row_id.max(id + 1);
        self.rows.insert(id, row);
        Ok(id)
    }

    pub fn scan(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows that agree on every unique-key column conflict. NULLs count as
    /// equal here, so a key with a missing part is still unique.
    fn check_uniqueness(&self, row: &Row) -> Result<()> {
        let key_indexes = self.schema.unique_key_indexes();
        if key_indexes.is_empty() {
            return Ok(());
        }

        let conflict = self
            .rows
            .values()
            .any(|existing| key_indexes.iter().all(|&idx| existing[idx] == row[idx]));

        if conflict {
            return Err(DbError::ConstraintViolation(format!(
                "Unique constraint violation: table '{}' already contains ({})",
                self.schema.name,
                self.schema.unique_key.join(", ")
            )));
        }
        Ok(())
    }

    /// Literals arrive as the closest SQL type; widen them to the column type.
    fn coerce_row(&self, row: &mut Row) {
        for (column, value) in self.schema.schema().columns().iter().zip(row.iter_mut()) {
            match (column.data_type, &*value) {
                (DataType::Float, Value::Integer(i)) => *value = Value::Float(*i as f64),
                (DataType::Timestamp, Value::Text(s)) => {
                    if let Ok(ts) = NaiveDateTime::parse_from_str(s, crate::core::value::TIMESTAMP_FORMAT) {
                        *value = Value::Timestamp(ts);
                    }
                }
                _ => {}
            }
        }
    }

    fn validate_row(&self, row: &Row) -> Result<()> {
        let columns = self.schema.schema().columns();
        if row.len() != columns.len() {
            return Err(DbError::ExecutionError(format!(
                "Expected {} columns, got {}",
                columns.len(),
                row.len()
            )));
        }
        // The ID column is checked by insert once it has been assigned.
        for (column, value) in columns.iter().zip(row.iter()).skip(1) {
            column.validate(value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    schema: Schema,
    pub unique_key: Vec<String>,
}

impl TableSchema {
    /// A table whose first column is the integer [`ID_COLUMN`].
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        let mut all = Vec::with_capacity(columns.len() + 1);
        all.push(Column::new(ID_COLUMN, DataType::Integer).not_null());
        all.extend(columns);
        Self {
            name: name.into(),
            schema: Schema::new(all),
            unique_key: Vec::new(),
        }
    }

    pub fn with_unique_key(mut self, columns: &[&str]) -> Self {
        self.unique_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn unique_key_indexes(&self) -> Vec<usize> {
        self.unique_key
            .iter()
            .filter_map(|name| self.schema.find_column_index(name))
            .collect()
    }
}
