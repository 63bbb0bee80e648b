use crate::error::SQLError;

/// A dynamically-typed SQL parameter value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Convenience constructor for nullable text columns.
    pub fn opt_text(s: &Option<String>) -> Value {
        match s {
            Some(s) => Value::Text(s.clone()),
            None => Value::Null,
        }
    }
}

/// A row returned from a SQL query — column name to value.
#[derive(Debug, Clone)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    /// Get a column value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Get a text column value by name.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get an integer column value by name.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Get a real column value by name.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Value::Real(f)) => Some(*f),
            Some(Value::Integer(i)) => Some(*i as f64),
            _ => None,
        }
    }
}

/// One statement of a transactional batch (see [`SQLStore::exec_tx`]).
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
    /// If true, the statement must affect at least one row; otherwise the
    /// whole batch rolls back with [`SQLError::GuardFailed`]. This is the
    /// compare-and-swap primitive for state transitions that must not
    /// re-apply (e.g. `UPDATE ... WHERE status = 'PENDING'`).
    pub guard: bool,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
            guard: false,
        }
    }

    /// Mark the statement as a guard: zero affected rows aborts the batch.
    pub fn guarded(mut self) -> Self {
        self.guard = true;
        self
    }
}

/// SQLStore provides a SQL execution interface backed by an embedded database.
pub trait SQLStore: Send + Sync {
    /// Execute a query and return rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError>;

    /// Execute a statement (INSERT/UPDATE/DELETE) and return affected row count.
    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError>;

    /// Execute a batch of statements as one transaction.
    ///
    /// All-or-nothing: any statement error — or a guarded statement
    /// affecting zero rows — rolls back every statement in the batch.
    /// Returns the affected row count per statement, in order.
    fn exec_tx(&self, stmts: &[Statement]) -> Result<Vec<u64>, SQLError>;
}
