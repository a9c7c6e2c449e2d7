pub mod adapter;
pub mod ast;

pub use adapter::SqlParserAdapter;
pub use ast::{ColumnTest, InsertStmt, Predicate, Projection, QueryStmt, Statement};
