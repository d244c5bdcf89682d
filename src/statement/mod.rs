//! Chainable CQL statement builder.
//!
//! A [`Statement`] is bound to a [`Table`] and accumulates clause text. Every
//! clause method validates its input against the table's schema (unless the
//! statement was created with [`ValidationMode::Skip`]) and returns the same
//! builder for chaining. Nothing is terminated until [`Statement::to_cql`].
//!
//! ```
//! use cqlkit::prelude::*;
//!
//! let schema = Schema::builder()
//!     .column("firstname", SchemaType::text())
//!     .column("age", SchemaType::int())
//!     .primary_key("firstname")
//!     .build()?;
//! let users = Table::new("users", schema)?;
//!
//! let mut q = Statement::new(users);
//! q.select("*")?.where_equals("firstname", "james")?.and().gt("age", 37)?;
//! assert_eq!(q.to_cql(), "SELECT * FROM users WHERE firstname = 'james' AND age > 37;");
//! # Ok::<(), cqlkit::CqlError>(())
//! ```

mod clauses;
mod fragments;
mod literal;

pub use literal::quote_if_text;

use crate::catalog::Table;
use crate::config::ValidationMode;
use crate::error::{CqlError, CqlResult};
use crate::executor::{DEFAULT_BLACKLIST, ExecOptions, Executor, Row, scrub_rows};
use crate::value::Value;
use std::fmt;

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Pre-serialized statement text such as `COUNT(*)` or `userid AS id`.
///
/// Fragments are emitted verbatim and never validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fragment(String);

impl Fragment {
    pub fn new(text: impl Into<String>) -> Self {
        Fragment(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fragment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Fragment {
    fn from(s: &str) -> Self {
        Fragment(s.to_string())
    }
}

impl From<String> for Fragment {
    fn from(s: String) -> Self {
        Fragment(s)
    }
}

impl From<Fragment> for Value {
    fn from(f: Fragment) -> Self {
        Value::Fragment(f.0)
    }
}

/// Anything that can stand between `SELECT`/`DELETE` and `FROM`.
pub trait IntoSelector {
    fn into_selector(self) -> CqlResult<String>;
}

impl IntoSelector for &str {
    fn into_selector(self) -> CqlResult<String> {
        Ok(self.to_string())
    }
}

impl IntoSelector for String {
    fn into_selector(self) -> CqlResult<String> {
        Ok(self)
    }
}

impl IntoSelector for Fragment {
    fn into_selector(self) -> CqlResult<String> {
        Ok(self.0)
    }
}

impl<T: AsRef<str>> IntoSelector for Vec<T> {
    fn into_selector(self) -> CqlResult<String> {
        Ok(join_selectors(self.iter().map(AsRef::as_ref)))
    }
}

impl<T: AsRef<str>, const N: usize> IntoSelector for [T; N] {
    fn into_selector(self) -> CqlResult<String> {
        Ok(join_selectors(self.iter().map(AsRef::as_ref)))
    }
}

impl<T: AsRef<str>> IntoSelector for &[T] {
    fn into_selector(self) -> CqlResult<String> {
        Ok(join_selectors(self.iter().map(AsRef::as_ref)))
    }
}

/// Dynamic selectors, e.g. from JSON: a string or a list of strings.
impl IntoSelector for Value {
    fn into_selector(self) -> CqlResult<String> {
        let unsupported = |v: &Value| {
            CqlError::type_error(format!(
                "Unsupported selector for SELECT statement. Expected {} to be of type String or Array.",
                v
            ))
        };
        match self {
            Value::Text(s) | Value::Fragment(s) => Ok(s),
            Value::List(items) => {
                let names = items
                    .iter()
                    .map(|item| match item {
                        Value::List(_) | Value::Map(_) | Value::Null => Err(unsupported(item)),
                        other => Ok(other.to_string()),
                    })
                    .collect::<CqlResult<Vec<_>>>()?;
                Ok(names.join(", "))
            }
            other => Err(unsupported(&other)),
        }
    }
}

fn join_selectors<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

/// A mutable, chainable statement accumulator.
#[derive(Debug, Clone, Default)]
pub struct Statement {
    table: Option<Table>,
    cql: String,
    mode: ValidationMode,
}

impl Statement {
    /// A strictly validated statement against `table`.
    pub fn new(table: Table) -> Self {
        Self::with_mode(table, ValidationMode::Strict)
    }

    pub fn with_mode(table: Table, mode: ValidationMode) -> Self {
        Self {
            table: Some(table),
            cql: String::new(),
            mode,
        }
    }

    /// A statement with no table, for `CREATE TABLE` and raw CQL.
    pub fn unbound(mode: ValidationMode) -> Self {
        Self {
            table: None,
            cql: String::new(),
            mode,
        }
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Bind (or rebind) the table.
    ///
    /// Clauses already appended were validated against the previous table, so
    /// rebinding a non-empty statement is logged.
    pub fn set_table(&mut self, table: Table) -> &mut Self {
        if !self.cql.is_empty() {
            tracing::warn!(
                table = table.name(),
                cql = %self.cql,
                "table rebound after clauses were appended"
            );
        }
        self.table = Some(table);
        self
    }

    pub fn set_mode(&mut self, mode: ValidationMode) -> &mut Self {
        self.mode = mode;
        self
    }

    /// Reset the accumulated text, keeping the table binding.
    pub fn clear(&mut self) -> &mut Self {
        self.cql.clear();
        self
    }

    /// Replace the accumulated text with raw CQL.
    pub fn cql(&mut self, raw: impl Into<String>) -> &mut Self {
        self.cql = raw.into();
        self
    }

    /// Accumulated text, as built so far.
    pub fn as_str(&self) -> &str {
        &self.cql
    }

    pub fn is_empty(&self) -> bool {
        self.cql.trim().is_empty()
    }

    /// Trimmed text terminated by a single `;`.
    pub fn to_cql(&self) -> String {
        let trimmed = self.cql.trim();
        if trimmed.is_empty() || trimmed.ends_with(';') {
            trimmed.to_string()
        } else {
            format!("{};", trimmed)
        }
    }

    /// Serialize, hand off to `executor`, and scrub the returned rows.
    pub fn execute<E>(&self, executor: &E, options: &ExecOptions) -> CqlResult<Vec<Row>>
    where
        E: Executor + ?Sized,
    {
        let cql = self.to_cql();
        tracing::debug!(cql = %cql, consistency = %options.consistency, prepare = options.prepare, "executing statement");
        let rows = executor.execute(&cql, options)?;
        Ok(scrub_rows(rows, DEFAULT_BLACKLIST))
    }

    fn bound_table(&self) -> CqlResult<&Table> {
        self.table
            .as_ref()
            .ok_or_else(|| CqlError::config("No table is bound to this statement"))
    }

    /// Append one clause followed by a separating space.
    fn push(&mut self, clause: &str) -> &mut Self {
        self.cql.push_str(clause);
        self.cql.push(' ');
        self
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::types::SchemaType;
    use pretty_assertions::assert_eq;

    fn users() -> Table {
        let schema = Schema::builder()
            .column("userid", SchemaType::text())
            .column("firstname", SchemaType::text())
            .primary_key("userid")
            .build()
            .unwrap();
        Table::new("users", schema).unwrap()
    }

    #[test]
    fn test_serialize_terminates_once() {
        let mut q = Statement::new(users());
        q.select("*").unwrap();
        assert_eq!(q.as_str(), "SELECT * FROM users ");
        assert_eq!(q.to_cql(), "SELECT * FROM users;");
        assert_eq!(q.to_cql(), q.to_cql());

        q.cql("SELECT * FROM users;  ");
        assert_eq!(q.to_cql(), "SELECT * FROM users;");
    }

    #[test]
    fn test_empty_statement_serializes_empty() {
        let q = Statement::new(users());
        assert_eq!(q.to_cql(), "");
        assert!(q.is_empty());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut q = Statement::new(users());
        q.select("*").unwrap();
        let mut q2 = q.clone();
        assert_eq!(q2.to_cql(), "SELECT * FROM users;");

        q2.where_equals("userid", "abcdefg").unwrap();
        assert_eq!(q.to_cql(), "SELECT * FROM users;");
        assert_eq!(q2.to_cql(), "SELECT * FROM users WHERE userid = 'abcdefg';");
        assert!(q.table().unwrap().same_binding(q2.table().unwrap()));
    }

    #[test]
    fn test_clear_keeps_table() {
        let mut q = Statement::new(users());
        q.select("*").unwrap().clear();
        assert!(q.is_empty());
        q.select("firstname").unwrap();
        assert_eq!(q.to_cql(), "SELECT firstname FROM users;");
    }

    #[test]
    fn test_raw_cql_replaces_text() {
        let mut q = Statement::new(users());
        q.select("*").unwrap().cql("SELECT now() FROM system.local");
        assert_eq!(q.to_cql(), "SELECT now() FROM system.local;");
        assert_eq!(q.to_string(), q.to_cql());
    }

    #[test]
    fn test_unbound_statement() {
        let mut q = Statement::unbound(ValidationMode::Strict);
        let err = q.select("*").unwrap_err();
        assert!(matches!(err, CqlError::Config(_)));
        assert!(q.is_empty());
    }

    #[test]
    fn test_set_table_rebinds() {
        let mut q = Statement::unbound(ValidationMode::Strict);
        q.set_table(users()).select("*").unwrap();
        assert_eq!(q.to_cql(), "SELECT * FROM users;");
    }

    #[test]
    fn test_rebind_keeps_accumulated_text() {
        let accounts = Table::new(
            "accounts",
            Schema::builder()
                .column("owner", SchemaType::text().primary_key())
                .build()
                .unwrap(),
        )
        .unwrap();

        let mut q = Statement::new(users());
        q.select("*").unwrap();
        q.set_table(accounts.clone());
        assert_eq!(q.as_str(), "SELECT * FROM users ");
        assert!(q.table().unwrap().same_binding(&accounts));

        q.where_equals("owner", "frodo").unwrap();
        assert_eq!(q.to_cql(), "SELECT * FROM users WHERE owner = 'frodo';");
        assert!(matches!(q.equals("userid", "x"), Err(CqlError::Reference(_))));
    }

    #[test]
    fn test_selectors() {
        assert_eq!(vec!["a", "b"].into_selector().unwrap(), "a, b");
        assert_eq!(["a"].into_selector().unwrap(), "a");
        assert_eq!(
            vec![Fragment::from("a"), Fragment::new("b AS c")].into_selector().unwrap(),
            "a, b AS c"
        );
        assert_eq!(Value::from(vec!["x", "y"]).into_selector().unwrap(), "x, y");
        assert!(matches!(Value::Int(3).into_selector(), Err(CqlError::Type(_))));
        assert!(matches!(
            Value::map([("a", 1)]).into_selector(),
            Err(CqlError::Type(_))
        ));
    }

    #[test]
    fn test_execute_scrubs_rows() {
        let exec = |cql: &str, opts: &ExecOptions| -> CqlResult<Vec<Row>> {
            assert_eq!(cql, "SELECT * FROM users;");
            assert_eq!(opts.consistency, crate::executor::Consistency::Quorum);
            let row = serde_json::json!({"userid": "a", "firstname": null, "__columns": []});
            match row {
                serde_json::Value::Object(map) => Ok(vec![map]),
                _ => unreachable!(),
            }
        };
        let mut q = Statement::new(users());
        q.select("*").unwrap();
        let rows = q.execute(&exec, &ExecOptions::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0]["userid"], "a");
    }

    #[test]
    fn test_execute_propagates_failure() {
        let exec = |_: &str, _: &ExecOptions| -> CqlResult<Vec<Row>> {
            Err(CqlError::Execution("unavailable".into()))
        };
        let mut q = Statement::new(users());
        q.select("*").unwrap();
        assert!(matches!(
            q.execute(&exec, &ExecOptions::default()),
            Err(CqlError::Execution(_))
        ));
    }
}
