use crate::core::{Result, Row, Value};

/// A transactional SQL store, seen the way an importer sees a database
/// cursor: statements run inside an implicit transaction that lasts until
/// [`commit`](Store::commit) or [`rollback`](Store::rollback).
pub trait Store {
    /// Run one statement. Returns the rows inserted for an INSERT and the
    /// rows matched for a SELECT; matched rows are then read with
    /// [`fetch_one`](Store::fetch_one).
    fn execute(&mut self, sql: &str) -> Result<usize>;

    /// Next row of the last SELECT, or `None` once exhausted.
    fn fetch_one(&mut self) -> Result<Option<Row>>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Render a value as a literal this store accepts.
    fn literal(&self, value: &Value) -> Result<String> {
        value.to_sql_literal()
    }
}

impl<S: Store + ?Sized> Store for &mut S {
    fn execute(&mut self, sql: &str) -> Result<usize> {
        (**self).execute(sql)
    }

    fn fetch_one(&mut self) -> Result<Option<Row>> {
        (**self).fetch_one()
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<()> {
        (**self).rollback()
    }

    fn literal(&self, value: &Value) -> Result<String> {
        (**self).literal(value)
    }
}
