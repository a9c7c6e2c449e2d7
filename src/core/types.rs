use super::{DataType, DbError, Result, Value};
use serde::{Deserialize, Serialize};

pub type Row = Vec<Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        if matches!(value, Value::Null) {
            if !self.nullable {
                return Err(DbError::ConstraintViolation(format!(
                    "Column '{}' cannot be NULL",
                    self.name
                )));
            }
            return Ok(());
        }

        if !self.data_type.is_compatible(value) {
            return Err(DbError::TypeMismatch(format!(
                "Column '{}' expects type {}, got {}",
                self.name,
                self.data_type,
                value.type_name()
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|col| col.name.eq_ignore_ascii_case(name))
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_null_column_rejects_null() {
        let col = Column::new("Name", DataType::Text).not_null();
        assert!(col.validate(&Value::Null).is_err());
        assert!(col.validate(&Value::Text("x".into())).is_ok());
    }

    #[test]
    fn test_type_checked() {
        let col = Column::new("Count", DataType::Integer);
        assert!(matches!(
            col.validate(&Value::Text("ten".into())),
            Err(DbError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let schema = Schema::new(vec![
            Column::new("ID", DataType::Integer),
            Column::new("RunID", DataType::Text),
        ]);
        assert_eq!(schema.find_column_index("runid"), Some(1));
        assert_eq!(schema.find_column_index("Missing"), None);
    }
}
