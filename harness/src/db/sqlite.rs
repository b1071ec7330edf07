use std::path::Path;

use log::trace;
use rusqlite::{
    types::{ToSqlOutput, ValueRef},
    Connection, ToSql,
};

use super::{Connector, Database, Dialect, Row, Statement, Value};
use crate::error::{DbError, HarnessError};

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Int(i) => ToSqlOutput::from(*i),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

fn from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(r) => Value::Text(r.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
    }
}

/// A borrowed SQLite connection.
#[derive(Debug)]
pub struct SqliteDatabase<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteDatabase<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl Database for SqliteDatabase<'_> {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&mut self, statement: &Statement) -> Result<Vec<Row>, DbError> {
        trace!("{statement}");
        let mut stmt = self.conn.prepare_cached(&statement.sql)?;
        let params = rusqlite::params_from_iter(statement.params.iter());
        let columns = stmt.column_count();
        if columns == 0 {
            stmt.execute(params)?;
            return Ok(Vec::new());
        }
        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push((0..columns).map(|i| row.get_ref(i).map(from_ref)).collect::<Result<Row, _>>()?);
        }
        Ok(out)
    }
}

/// A single SQLite connection, either to a file or to a private in-memory database.
///
/// The connection lives as long as the connector so that an in-memory database survives between
/// scopes.
#[derive(Debug)]
pub struct SqliteConnector {
    conn: Connection,
}

impl SqliteConnector {
    pub fn open(path: &Path) -> Result<Self, HarnessError> {
        let conn = Connection::open(path).map_err(|e| HarnessError::Connection(e.into()))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, HarnessError> {
        let conn = Connection::open_in_memory().map_err(|e| HarnessError::Connection(e.into()))?;
        Ok(Self { conn })
    }
}

impl Connector for SqliteConnector {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn with_connection<T>(
        &mut self,
        scope: impl FnOnce(&mut dyn Database) -> Result<T, HarnessError>,
    ) -> Result<T, HarnessError> {
        scope(&mut SqliteDatabase::new(&self.conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::Op, table::TableName};

    #[test]
    fn queries_and_statements() {
        let conn = Connection::open_in_memory().unwrap();
        let mut db = SqliteDatabase::new(&conn);
        let t = TableName::new("t_1").unwrap();
        db.execute(&Dialect::Sqlite.create_table(&t)).unwrap();
        assert!(!db.probe(&t).unwrap());
        assert_eq!(db.next_auto_increment(&t).unwrap(), 1);

        let inserted = db.execute(&Dialect::Sqlite.insert_rows(&t, &[4, 5])).unwrap();
        assert!(inserted.is_empty());
        assert!(db.probe(&t).unwrap());
        assert_eq!(db.next_auto_increment(&t).unwrap(), 3);

        let rows = db
            .execute(&Statement::new(Op::Count, "SELECT id, name, NULL FROM t_1 WHERE name = ?1").bind(5_i64))
            .unwrap();
        assert_eq!(rows, [vec![Value::Int(2), Value::Int(5), Value::Null]]);

        db.delete_all(&t).unwrap();
        assert!(!db.probe(&t).unwrap());
        assert_eq!(db.next_auto_increment(&t).unwrap(), 3);

        db.truncate(&t).unwrap();
        assert_eq!(db.next_auto_increment(&t).unwrap(), 1);
    }

    #[test]
    fn catalog_skips_internal_tables() {
        let conn = Connection::open_in_memory().unwrap();
        let mut db = SqliteDatabase::new(&conn);
        for name in ["table_1", "table_2", "other_1"] {
            db.execute(&Dialect::Sqlite.create_table(&TableName::new(name).unwrap())).unwrap();
        }
        assert_eq!(db.list_tables("table").unwrap(), ["table_1", "table_2"]);
        assert_eq!(db.list_tables("").unwrap(), ["other_1", "table_1", "table_2"]);
    }

    #[test]
    fn version() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(SqliteDatabase::new(&conn).server_version().unwrap().starts_with('3'));
    }
}
