use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use crate::error::SQLError;
use crate::traits::{Row, SQLStore, Statement, Value};

/// SqliteStore is a SQLStore implementation backed by rusqlite (bundled SQLite).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let conn = Connection::open(path)
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        // Enable WAL mode for better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Convert our Value enum to rusqlite's ToSql.
fn bind_params(params: &[Value]) -> Vec<Box<dyn rusqlite::types::ToSql + '_>> {
    params
        .iter()
        .map(|v| -> Box<dyn rusqlite::types::ToSql + '_> {
            match v {
                Value::Null => Box::new(rusqlite::types::Null),
                Value::Integer(i) => Box::new(*i),
                Value::Real(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.as_str()),
                Value::Blob(b) => Box::new(b.as_slice()),
            }
        })
        .collect()
}

impl SQLStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let mut columns = Vec::new();
                for (i, name) in column_names.iter().enumerate() {
                    let val = row_value_at(row, i);
                    columns.push((name.clone(), val));
                }
                Ok(Row { columns })
            })
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| SQLError::Query(e.to_string()))?);
        }
        Ok(result)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let affected = conn
            .execute(sql, param_refs.as_slice())
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        Ok(affected as u64)
    }

    fn exec_tx(&self, stmts: &[Statement]) -> Result<Vec<u64>, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        // Rolls back on drop unless committed.
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        let mut affected = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            let bound = bind_params(&stmt.params);
            let param_refs: Vec<&dyn rusqlite::types::ToSql> =
                bound.iter().map(|b| b.as_ref()).collect();

            let n = tx
                .execute(&stmt.sql, param_refs.as_slice())
                .map_err(|e| SQLError::Execution(e.to_string()))?;

            if stmt.guard && n == 0 {
                tracing::debug!("transaction guard matched no rows, rolling back: {}", stmt.sql);
                return Err(SQLError::GuardFailed(stmt.sql.clone()));
            }
            affected.push(n as u64);
        }

        tx.commit()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        Ok(affected)
    }
}

/// Extract a Value from a rusqlite row at a given column index.
fn row_value_at(row: &rusqlite::Row, idx: usize) -> Value {
    // Try integer first, then real, then text, then blob, then null.
    if let Ok(i) = row.get::<_, i64>(idx) {
        return Value::Integer(i);
    }
    if let Ok(f) = row.get::<_, f64>(idx) {
        return Value::Real(f);
    }
    if let Ok(s) = row.get::<_, String>(idx) {
        return Value::Text(s);
    }
    if let Ok(b) = row.get::<_, Vec<u8>>(idx) {
        return Value::Blob(b);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        let s = SqliteStore::open_in_memory().unwrap();
        s.exec(
            "CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT NOT NULL, n INTEGER)",
            &[],
        )
        .unwrap();
        s
    }

    #[test]
    fn exec_and_query() {
        let s = store();
        s.exec(
            "INSERT INTO kv (k, v, n) VALUES (?1, ?2, ?3)",
            &[
                Value::Text("a".into()),
                Value::Text("one".into()),
                Value::Integer(1),
            ],
        )
        .unwrap();

        let rows = s
            .query("SELECT v, n FROM kv WHERE k = ?1", &[Value::Text("a".into())])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("v"), Some("one"));
        assert_eq!(rows[0].get_i64("n"), Some(1));
    }

    #[test]
    fn exec_tx_commits_all() {
        let s = store();
        let affected = s
            .exec_tx(&[
                Statement::new(
                    "INSERT INTO kv (k, v) VALUES (?1, ?2)",
                    vec![Value::Text("a".into()), Value::Text("1".into())],
                ),
                Statement::new(
                    "INSERT INTO kv (k, v) VALUES (?1, ?2)",
                    vec![Value::Text("b".into()), Value::Text("2".into())],
                ),
            ])
            .unwrap();
        assert_eq!(affected, vec![1, 1]);

        let rows = s.query("SELECT k FROM kv", &[]).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn exec_tx_rolls_back_on_error() {
        let s = store();
        s.exec(
            "INSERT INTO kv (k, v) VALUES ('a', '1')",
            &[],
        )
        .unwrap();

        // Second statement violates the primary key; first must not survive.
        let result = s.exec_tx(&[
            Statement::new(
                "INSERT INTO kv (k, v) VALUES (?1, ?2)",
                vec![Value::Text("b".into()), Value::Text("2".into())],
            ),
            Statement::new(
                "INSERT INTO kv (k, v) VALUES (?1, ?2)",
                vec![Value::Text("a".into()), Value::Text("dup".into())],
            ),
        ]);
        assert!(result.is_err());
        assert!(result.unwrap_err().is_unique_violation());

        let rows = s.query("SELECT k FROM kv", &[]).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn exec_tx_guard_failure_rolls_back() {
        let s = store();
        s.exec("INSERT INTO kv (k, v) VALUES ('a', 'old')", &[])
            .unwrap();

        let result = s.exec_tx(&[
            Statement::new(
                "UPDATE kv SET v = 'new' WHERE k = 'a'",
                vec![],
            ),
            // Guard on a row that doesn't exist: everything rolls back.
            Statement::new(
                "UPDATE kv SET v = 'x' WHERE k = 'missing'",
                vec![],
            )
            .guarded(),
        ]);
        assert!(matches!(result, Err(SQLError::GuardFailed(_))));

        let rows = s.query("SELECT v FROM kv WHERE k = 'a'", &[]).unwrap();
        assert_eq!(rows[0].get_str("v"), Some("old"));
    }

    #[test]
    fn open_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        let s = SqliteStore::open(&path).unwrap();
        s.exec("CREATE TABLE t (id INTEGER)", &[]).unwrap();
        assert!(path.exists());
    }
}
