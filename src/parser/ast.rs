use crate::core::Value;

/// The statements a [`MemoryStore`](crate::storage::MemoryStore) executes.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Insert(InsertStmt),
    Query(QueryStmt),
}

/// INSERT with an explicit column list.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub table_name: String,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Value>>,
}

/// Single-table SELECT filtered by a conjunction of column tests.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryStmt {
    pub table_name: String,
    pub projection: Projection,
    pub selection: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Wildcard,
    Columns(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub test: ColumnTest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnTest {
    Equals(Value),
    IsNull,
    IsNotNull,
}

impl ColumnTest {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Equals(expected) => value.sql_eq(expected),
            Self::IsNull => value.is_null(),
            Self::IsNotNull => !value.is_null(),
        }
    }
}
