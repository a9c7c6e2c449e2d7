use super::schema;
use super::{Table, TableSchema};
use crate::core::{DbError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The set of tables in one store. Cloned whole to open a transaction, so
/// the committed catalog is never touched by uncommitted writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    tables: BTreeMap<String, Table>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding the empty results database tables.
    pub fn results_database() -> Self {
        schema::all_tables()
            .into_iter()
            .fold(Self::new(), |catalog, table| catalog.with_table(table))
    }

    pub fn with_table(mut self, schema: TableSchema) -> Self {
        self.tables.insert(key(schema.name()), Table::new(schema));
        self
    }

    /// Table names are matched case-insensitively.
    pub fn get_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(&key(name))
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub fn get_table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(&key(name))
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub fn row_count(&self) -> usize {
        self.tables.values().map(Table::row_count).sum()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_database_tables() {
        let catalog = Catalog::results_database();
        for name in [
            "Application",
            "Machine",
            "MPI",
            "OperatingSystem",
            "Processor",
            "Compiler",
            "Flags",
            "Run",
            "SubRun",
            "Parameter",
            "Result",
        ] {
            assert!(catalog.get_table(name).is_ok(), "missing table {}", name);
        }
        assert_eq!(catalog.table_count(), 11);
        assert_eq!(catalog.row_count(), 0);
    }

    #[test]
    fn test_lookup_ignores_case() {
        let catalog = Catalog::results_database();
        assert_eq!(catalog.get_table("mpi").unwrap().schema().name(), "MPI");
        assert!(matches!(catalog.get_table("Users"), Err(DbError::TableNotFound(_))));
    }
}
