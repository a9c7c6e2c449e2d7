use super::persistence::{DatabaseSnapshot, SnapshotManager};
use super::{Catalog, Store};
use crate::core::{DbError, Result, Row};
use crate::parser::{InsertStmt, Projection, QueryStmt, SqlParserAdapter, Statement};
use std::collections::VecDeque;
use std::path::Path;
use tracing::debug;

/// In-memory results database.
///
/// The first statement after a commit or rollback opens a transaction by
/// cloning the committed catalog into a working copy; every statement until
/// the next commit or rollback sees that copy. Commit swaps it in and
/// rollback drops it.
///
/// A file-backed store picks up snapshots committed by other stores when a
/// transaction opens. Its commit fails with [`DbError::TransactionError`] if
/// another store committed in the meantime.
pub struct MemoryStore {
    committed: Catalog,
    working: Option<Catalog>,
    /// The working copy holds inserts.
    dirty: bool,
    cursor: VecDeque<Row>,
    parser: SqlParserAdapter,
    snapshots: Option<SnapshotManager>,
    /// Snapshot generation `committed` corresponds to.
    generation: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            committed: Catalog::results_database(),
            working: None,
            dirty: false,
            cursor: VecDeque::new(),
            parser: SqlParserAdapter::new(),
            snapshots: None,
            generation: 0,
        }
    }

    /// Open a store backed by a snapshot file, creating empty tables when
    /// the file does not exist yet. Nothing is written until a commit.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut store = Self::new();
        store.snapshots = Some(SnapshotManager::new(path));
        store.reload()?;
        Ok(store)
    }

    /// The catalog as seen inside the current transaction.
    pub fn catalog(&self) -> &Catalog {
        self.working.as_ref().unwrap_or(&self.committed)
    }

    pub fn in_transaction(&self) -> bool {
        self.working.is_some()
    }

    pub fn row_count(&self, table: &str) -> Result<usize> {
        Ok(self.catalog().get_table(table)?.row_count())
    }

    /// Adopt the snapshot on disk if another store has moved it on.
    fn reload(&mut self) -> Result<()> {
        let Some(snapshots) = &self.snapshots else {
            return Ok(());
        };
        if let Some(snapshot) = snapshots.load()? {
            if snapshot.metadata.generation != self.generation {
                debug!(
                    "Loaded snapshot {} generation {} ({} rows)",
                    snapshots.path().display(),
                    snapshot.metadata.generation,
                    snapshot.metadata.row_count
                );
                self.generation = snapshot.metadata.generation;
                self.committed = snapshot.catalog;
            }
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        if self.working.is_none() {
            self.reload()?;
            self.working = Some(self.committed.clone());
        }
        Ok(())
    }

    fn working_mut(&mut self) -> &mut Catalog {
        self.working.get_or_insert_with(|| self.committed.clone())
    }

    fn execute_insert(&mut self, stmt: InsertStmt) -> Result<usize> {
        self.dirty = true;
        let table = self.working_mut().get_table_mut(&stmt.table_name)?;
        let mut inserted = 0;
        for values in stmt.values {
            table.insert_values(&stmt.columns, values)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    fn execute_query(&mut self, stmt: QueryStmt) -> Result<usize> {
        let table = self.catalog().get_table(&stmt.table_name)?;
        let schema = table.schema().schema();
        let column_index = |name: &str| {
            schema
                .find_column_index(name)
                .ok_or_else(|| DbError::ColumnNotFound(name.to_string(), stmt.table_name.clone()))
        };

        let filters = stmt
            .selection
            .iter()
            .map(|p| -> Result<_> { Ok((column_index(p.column.as_str())?, &p.test)) })
            .collect::<Result<Vec<_>>>()?;

        let projection = match &stmt.projection {
            Projection::Wildcard => None,
            Projection::Columns(names) => Some(
                names
                    .iter()
                    .map(|name| column_index(name.as_str()))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };

        let rows: VecDeque<Row> = table
            .scan()
            .filter(|row| filters.iter().all(|(idx, test)| test.matches(&row[*idx])))
            .map(|row| match &projection {
                None => row.clone(),
                Some(indexes) => indexes.iter().map(|&i| row[i].clone()).collect(),
            })
            .collect();

        let matched = rows.len();
        self.cursor = rows;
        Ok(matched)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn execute(&mut self, sql: &str) -> Result<usize> {
        self.cursor.clear();
        let statement = self.parser.parse(sql)?;
        self.begin()?;
        match statement {
            Statement::Insert(stmt) => self.execute_insert(stmt),
            Statement::Query(stmt) => self.execute_query(stmt),
        }
    }

    fn fetch_one(&mut self) -> Result<Option<Row>> {
        Ok(self.cursor.pop_front())
    }

    fn commit(&mut self) -> Result<()> {
        self.cursor.clear();
        let Some(working) = self.working.take() else {
            return Ok(());
        };
        if !std::mem::take(&mut self.dirty) {
            return Ok(());
        }

        match &self.snapshots {
            Some(snapshots) => {
                let generation = self.generation + 1;
                let snapshot = DatabaseSnapshot::new(working, generation);
                if let Err(err) = snapshots.replace(&snapshot, self.generation) {
                    self.working = Some(snapshot.catalog);
                    self.dirty = true;
                    return Err(err);
                }
                self.generation = generation;
                self.committed = snapshot.catalog;
            }
            None => self.committed = working,
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.cursor.clear();
        self.working = None;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use tempfile::tempdir;

    #[test]
    fn test_insert_then_select() {
        let mut store = MemoryStore::new();
        assert_eq!(
            store.execute("INSERT INTO Machine (Name, Vendor) VALUES ('WILLOW', NULL)").unwrap(),
            1
        );
        assert_eq!(
            store.execute("SELECT ID FROM Machine WHERE Name='WILLOW' AND Vendor IS NULL").unwrap(),
            1
        );
        assert_eq!(store.fetch_one().unwrap(), Some(vec![Value::Integer(1)]));
        assert_eq!(store.fetch_one().unwrap(), None);
    }

    #[test]
    fn test_null_never_equals() {
        let mut store = MemoryStore::new();
        store.execute("INSERT INTO Machine (Name, Vendor) VALUES ('WILLOW', NULL)").unwrap();
        assert_eq!(
            store.execute("SELECT ID FROM Machine WHERE Name='WILLOW' AND Vendor=NULL").unwrap(),
            0
        );
    }

    #[test]
    fn test_rollback_discards_writes() {
        let mut store = MemoryStore::new();
        store.execute("INSERT INTO Flags (Flag) VALUES ('-O3')").unwrap();
        assert!(store.in_transaction());
        assert_eq!(store.row_count("Flags").unwrap(), 1);
        store.rollback().unwrap();
        assert!(!store.in_transaction());
        assert_eq!(store.row_count("Flags").unwrap(), 0);
    }

    #[test]
    fn test_commit_keeps_writes() {
        let mut store = MemoryStore::new();
        store.execute("INSERT INTO Flags (Flag) VALUES ('-O3')").unwrap();
        store.commit().unwrap();
        store.execute("INSERT INTO Flags (Flag) VALUES ('-g')").unwrap();
        store.rollback().unwrap();
        assert_eq!(store.execute("SELECT * FROM Flags").unwrap(), 1);
        assert_eq!(store.fetch_one().unwrap(), Some(vec![Value::Integer(1), "-O3".into()]));
    }

    #[test]
    fn test_unique_key_violation() {
        let mut store = MemoryStore::new();
        store.execute("INSERT INTO Flags (Flag) VALUES ('-O3')").unwrap();
        assert!(matches!(
            store.execute("INSERT INTO Flags (Flag) VALUES ('-O3')"),
            Err(DbError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn test_unknown_table_and_column() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.execute("SELECT ID FROM Users"),
            Err(DbError::TableNotFound(_))
        ));
        assert!(matches!(
            store.execute("SELECT ID FROM Flags WHERE Colour='red'"),
            Err(DbError::ColumnNotFound(_, _))
        ));
    }

    #[test]
    fn test_snapshot_written_on_commit_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.db");

        let mut store = MemoryStore::open(&path).unwrap();
        store.execute("INSERT INTO Flags (Flag) VALUES ('-O3')").unwrap();
        store.rollback().unwrap();
        assert!(!path.exists());

        store.execute("INSERT INTO Flags (Flag) VALUES ('-xHOST')").unwrap();
        store.commit().unwrap();
        assert!(path.exists());

        let mut reopened = MemoryStore::open(&path).unwrap();
        assert_eq!(reopened.execute("SELECT * FROM Flags WHERE Flag='-xHOST'").unwrap(), 1);
        assert_eq!(reopened.row_count("Flags").unwrap(), 1);
    }

    #[test]
    fn test_read_only_commit_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.db");

        let mut store = MemoryStore::open(&path).unwrap();
        assert_eq!(store.execute("SELECT ID FROM Flags").unwrap(), 0);
        assert!(store.in_transaction());
        store.commit().unwrap();
        assert!(!store.in_transaction());
        assert!(!path.exists());
    }

    #[test]
    fn test_commit_over_newer_snapshot_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.db");
        let mut first = MemoryStore::open(&path).unwrap();
        let mut second = MemoryStore::open(&path).unwrap();

        first.execute("INSERT INTO Flags (Flag) VALUES ('-O3')").unwrap();
        second.execute("INSERT INTO Flags (Flag) VALUES ('-O3')").unwrap();
        first.commit().unwrap();
        assert!(matches!(second.commit(), Err(DbError::TransactionError(_))));
        assert!(second.in_transaction());
        second.rollback().unwrap();

        // The next transaction starts from the other store's commit.
        assert_eq!(second.execute("SELECT ID FROM Flags WHERE Flag='-O3'").unwrap(), 1);
        second.execute("INSERT INTO Flags (Flag) VALUES ('-g')").unwrap();
        second.commit().unwrap();

        assert_eq!(MemoryStore::open(&path).unwrap().row_count("Flags").unwrap(), 2);
        assert_eq!(first.execute("SELECT ID FROM Flags").unwrap(), 2);
    }
}
