// ============================================================================
// src/parser/adapter.rs - sqlparser AST to store statements
// ============================================================================

use crate::core::{DbError, Result, Value};
use crate::parser::ast::*;
use sqlparser::ast as sql_ast;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

/// Parses SQL text with sqlparser and narrows the result to the statements
/// the store understands.
pub struct SqlParserAdapter {
    dialect: PostgreSqlDialect,
}

impl SqlParserAdapter {
    pub fn new() -> Self {
        Self {
            dialect: PostgreSqlDialect {},
        }
    }

    pub fn parse(&self, sql: &str) -> Result<Statement> {
        let mut statements = Parser::parse_sql(&self.dialect, sql)
            .map_err(|e| DbError::ParseError(e.to_string()))?;

        if statements.len() != 1 {
            return Err(DbError::UnsupportedOperation(format!(
                "Expected one statement, got {}",
                statements.len()
            )));
        }

        match statements.remove(0) {
            sql_ast::Statement::Insert(insert) => Ok(Statement::Insert(self.convert_insert(insert)?)),
            sql_ast::Statement::Query(query) => Ok(Statement::Query(self.convert_query(*query)?)),
            other => Err(DbError::UnsupportedOperation(format!(
                "Statement type not supported: {}",
                other
            ))),
        }
    }

    fn convert_insert(&self, insert: sql_ast::Insert) -> Result<InsertStmt> {
        let table_name = insert.table.to_string();

        if insert.columns.is_empty() {
            return Err(DbError::UnsupportedOperation(
                "INSERT requires an explicit column list".into(),
            ));
        }
        let columns: Vec<String> = insert.columns.into_iter().map(|id| id.value).collect();

        let Some(source) = insert.source else {
            return Err(DbError::UnsupportedOperation("INSERT without VALUES".into()));
        };
        let sql_ast::SetExpr::Values(vals) = *source.body else {
            return Err(DbError::UnsupportedOperation(
                "Only VALUES clause supported".into(),
            ));
        };

        let values = vals
            .rows
            .into_iter()
            .map(|row| {
                if row.len() != columns.len() {
                    return Err(DbError::ExecutionError(format!(
                        "Expected {} values, got {}",
                        columns.len(),
                        row.len()
                    )));
                }
                row.into_iter().map(convert_literal).collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(InsertStmt {
            table_name,
            columns,
            values,
        })
    }

    fn convert_query(&self, query: sql_ast::Query) -> Result<QueryStmt> {
        let sql_ast::SetExpr::Select(select) = *query.body else {
            return Err(DbError::UnsupportedOperation(
                "Only SELECT queries supported".into(),
            ));
        };
        let select = *select;

        let [from] = select.from.as_slice() else {
            return Err(DbError::UnsupportedOperation(
                "SELECT must read exactly one table".into(),
            ));
        };
        if !from.joins.is_empty() {
            return Err(DbError::UnsupportedOperation("Joins not supported".into()));
        }
        let table_name = match &from.relation {
            sql_ast::TableFactor::Table { name, .. } => extract_table_name(name)?,
            other => {
                return Err(DbError::UnsupportedOperation(format!(
                    "Unsupported table reference: {}",
                    other
                )));
            }
        };

        let projection = convert_projection(select.projection)?;

        let mut selection = Vec::new();
        if let Some(expr) = select.selection {
            collect_predicates(expr, &mut selection)?;
        }

        Ok(QueryStmt {
            table_name,
            projection,
            selection,
        })
    }
}

impl Default for SqlParserAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn convert_projection(items: Vec<sql_ast::SelectItem>) -> Result<Projection> {
    if let [sql_ast::SelectItem::Wildcard(_)] = items.as_slice() {
        return Ok(Projection::Wildcard);
    }
    items
        .into_iter()
        .map(|item| match item {
            sql_ast::SelectItem::UnnamedExpr(expr) => column_name(expr),
            other => Err(DbError::UnsupportedOperation(format!(
                "Unsupported select item: {}",
                other
            ))),
        })
        .collect::<Result<Vec<_>>>()
        .map(Projection::Columns)
}

/// Flatten a WHERE clause made of `AND`, `=`, `IS NULL` and `IS NOT NULL`.
fn collect_predicates(expr: sql_ast::Expr, out: &mut Vec<Predicate>) -> Result<()> {
    match expr {
        sql_ast::Expr::Nested(inner) => collect_predicates(*inner, out),
        sql_ast::Expr::BinaryOp {
            left,
            op: sql_ast::BinaryOperator::And,
            right,
        } => {
            collect_predicates(*left, out)?;
            collect_predicates(*right, out)
        }
        sql_ast::Expr::BinaryOp {
            left,
            op: sql_ast::BinaryOperator::Eq,
            right,
        } => {
            let (column, value) = match (*left, *right) {
                (column @ (sql_ast::Expr::Identifier(_) | sql_ast::Expr::CompoundIdentifier(_)), value)
                | (value, column @ (sql_ast::Expr::Identifier(_) | sql_ast::Expr::CompoundIdentifier(_))) => {
                    (column, value)
                }
                (left, right) => {
                    return Err(DbError::UnsupportedOperation(format!(
                        "Unsupported comparison: {} = {}",
                        left, right
                    )));
                }
            };
            out.push(Predicate {
                column: column_name(column)?,
                test: ColumnTest::Equals(convert_literal(value)?),
            });
            Ok(())
        }
        sql_ast::Expr::IsNull(inner) => {
            out.push(Predicate {
                column: column_name(*inner)?,
                test: ColumnTest::IsNull,
            });
            Ok(())
        }
        sql_ast::Expr::IsNotNull(inner) => {
            out.push(Predicate {
                column: column_name(*inner)?,
                test: ColumnTest::IsNotNull,
            });
            Ok(())
        }
        other => Err(DbError::UnsupportedOperation(format!(
            "Unsupported condition: {}",
            other
        ))),
    }
}

fn column_name(expr: sql_ast::Expr) -> Result<String> {
    match expr {
        sql_ast::Expr::Identifier(ident) => Ok(ident.value),
        sql_ast::Expr::CompoundIdentifier(idents) => idents
            .into_iter()
            .last()
            .map(|ident| ident.value)
            .ok_or_else(|| DbError::ParseError("Empty identifier".into())),
        other => Err(DbError::UnsupportedOperation(format!(
            "Expected a column name, got {}",
            other
        ))),
    }
}

fn convert_literal(expr: sql_ast::Expr) -> Result<Value> {
    match expr {
        sql_ast::Expr::Value(val) => convert_value(&val.value),
        sql_ast::Expr::Nested(inner) => convert_literal(*inner),
        sql_ast::Expr::UnaryOp {
            op: sql_ast::UnaryOperator::Minus,
            expr,
        } => match convert_literal(*expr)? {
            Value::Integer(i) => Ok(Value::Integer(-i)),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(DbError::TypeMismatch(format!(
                "Cannot negate {}",
                other.type_name()
            ))),
        },
        other => Err(DbError::UnsupportedOperation(format!(
            "Expected a literal, got {}",
            other
        ))),
    }
}

fn convert_value(val: &sql_ast::Value) -> Result<Value> {
    match val {
        sql_ast::Value::Number(n, _) => {
            if let Ok(i) = n.parse::<i64>() {
                Ok(Value::Integer(i))
            } else if let Ok(f) = n.parse::<f64>() {
                Ok(Value::Float(f))
            } else {
                Err(DbError::TypeMismatch(format!("Invalid number: {}", n)))
            }
        }
        sql_ast::Value::SingleQuotedString(s) => Ok(Value::Text(s.clone())),
        sql_ast::Value::Boolean(b) => Ok(Value::Boolean(*b)),
        sql_ast::Value::Null => Ok(Value::Null),
        other => Err(DbError::UnsupportedValue(format!("{}", other))),
    }
}

fn extract_table_name(name: &sql_ast::ObjectName) -> Result<String> {
    name.0
        .last()
        .map(|ident| ident.to_string())
        .ok_or_else(|| DbError::ParseError("Invalid table name".into()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Statement {
        SqlParserAdapter::new().parse(sql).unwrap()
    }

    #[test]
    fn test_parse_insert() {
        let Statement::Insert(insert) = parse(
            "INSERT INTO Machine (Name, Vendor, Cores) VALUES ('O''Hare', NULL, -4)",
        ) else {
            panic!("expected INSERT");
        };
        assert_eq!(insert.table_name, "Machine");
        assert_eq!(insert.columns, vec!["Name", "Vendor", "Cores"]);
        assert_eq!(
            insert.values,
            vec![vec![Value::Text("O'Hare".into()), Value::Null, Value::Integer(-4)]]
        );
    }

    #[test]
    fn test_parse_float_literals() {
        let Statement::Insert(insert) =
            parse("INSERT INTO Result (Value, Error) VALUES (0.125, -1.5e-7)")
        else {
            panic!("expected INSERT");
        };
        assert_eq!(insert.values[0], vec![Value::Float(0.125), Value::Float(-1.5e-7)]);
    }

    #[test]
    fn test_parse_select_with_conjunction() {
        let Statement::Query(query) =
            parse("SELECT ID FROM Machine WHERE Name='WILLOW' AND Vendor IS NULL AND (Cores = 4)")
        else {
            panic!("expected SELECT");
        };
        assert_eq!(query.table_name, "Machine");
        assert_eq!(query.projection, Projection::Columns(vec!["ID".into()]));
        assert_eq!(
            query.selection,
            vec![
                Predicate { column: "Name".into(), test: ColumnTest::Equals(Value::Text("WILLOW".into())) },
                Predicate { column: "Vendor".into(), test: ColumnTest::IsNull },
                Predicate { column: "Cores".into(), test: ColumnTest::Equals(Value::Integer(4)) },
            ]
        );
    }

    #[test]
    fn test_parse_wildcard() {
        let Statement::Query(query) = parse("SELECT * FROM Flags") else {
            panic!("expected SELECT");
        };
        assert_eq!(query.projection, Projection::Wildcard);
        assert!(query.selection.is_empty());
    }

    #[test]
    fn test_rejects_other_statements() {
        let adapter = SqlParserAdapter::new();
        assert!(matches!(
            adapter.parse("DELETE FROM Run WHERE ID=1"),
            Err(DbError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            adapter.parse("INSERT INTO Run VALUES (1)"),
            Err(DbError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            adapter.parse("SELECT ID FROM Run WHERE ID > 1"),
            Err(DbError::UnsupportedOperation(_))
        ));
        assert!(matches!(adapter.parse("SELEC ID"), Err(DbError::ParseError(_))));
    }
}
