//! Clause methods.
//!
//! Every method builds its full clause before touching the accumulated text,
//! so a failed call leaves the statement unchanged.

use super::{IntoSelector, SortOrder, Statement, quote_if_text};
use crate::error::{CqlError, CqlResult};
use crate::schema::Schema;
use crate::types::SchemaType;
use crate::value::Value;

impl Statement {
    /// `CREATE TABLE [IF NOT EXISTS] name (col type, ..., PRIMARY KEY (...))`.
    ///
    /// A single inline key column gets a `PRIMARY KEY` suffix; several inline
    /// key columns, or a `PRIMARY_KEY` declaration, produce a trailing key group.
    pub fn create_table(
        &mut self,
        name: &str,
        schema: &Schema,
        if_not_exists: bool,
    ) -> CqlResult<&mut Self> {
        if name.trim().is_empty() {
            return Err(CqlError::config("CREATE TABLE requires a table name"));
        }

        let inline: Vec<&str> = match schema.key() {
            Some(_) => Vec::new(),
            None => schema.primary_columns(),
        };

        let mut defs: Vec<String> = schema
            .columns()
            .iter()
            .map(|col| {
                if inline.len() == 1 && col.is_primary() {
                    format!("{} {} PRIMARY KEY", col.name(), col.ty())
                } else {
                    format!("{} {}", col.name(), col.ty())
                }
            })
            .collect();

        if let Some(key) = schema.key() {
            defs.push(format!("PRIMARY KEY {}", key.to_cql()));
        } else if inline.len() > 1 {
            defs.push(format!("PRIMARY KEY ({})", inline.join(", ")));
        }

        let clause = format!(
            "CREATE TABLE {}{} ({})",
            if if_not_exists { "IF NOT EXISTS " } else { "" },
            name,
            defs.join(", ")
        );
        Ok(self.push(&clause))
    }

    /// `SELECT selector FROM table`.
    pub fn select(&mut self, selector: impl IntoSelector) -> CqlResult<&mut Self> {
        let table = self.bound_table()?.name().to_string();
        let selector = selector.into_selector()?;
        Ok(self.push(&format!("SELECT {} FROM {}", selector, table)))
    }

    /// `INSERT INTO table (cols) VALUES (vals)`, in record order.
    pub fn insert<I, K, V>(&mut self, record: I) -> CqlResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let table = self.bound_table()?.name().to_string();
        let mut columns = Vec::new();
        let mut values = Vec::new();

        for (column, value) in record {
            let column = column.into();
            let value = value.into();
            self.verify_column(&column, Some(&value))?;
            values.push(self.wrap_key_value(&column, &value)?);
            columns.push(column);
        }

        if columns.is_empty() {
            return Err(CqlError::config("INSERT requires at least one column"));
        }

        Ok(self.push(&format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            values.join(", ")
        )))
    }

    /// `DELETE selector FROM table`.
    ///
    /// Starts a new statement: anything accumulated before is discarded.
    pub fn delete(&mut self, selector: impl IntoSelector) -> CqlResult<&mut Self> {
        let table = self.bound_table()?.name().to_string();
        let selector = selector.into_selector()?;
        self.cql.clear();
        Ok(self.push(&format!("DELETE {} FROM {}", selector, table)))
    }

    /// `DELETE FROM table`, removing whole rows. Starts a new statement.
    pub fn delete_all(&mut self) -> CqlResult<&mut Self> {
        let table = self.bound_table()?.name().to_string();
        self.cql.clear();
        Ok(self.push(&format!("DELETE FROM {}", table)))
    }

    pub fn where_clause(&mut self) -> &mut Self {
        self.push("WHERE")
    }

    /// `WHERE column`, for a predicate completed by [`Statement::in_list`].
    pub fn where_column(&mut self, column: impl AsRef<str>) -> CqlResult<&mut Self> {
        let column = column.as_ref();
        self.verify_column(column, None)?;
        Ok(self.push(&format!("WHERE {}", column)))
    }

    pub fn and(&mut self) -> &mut Self {
        self.push("AND")
    }

    /// `AND column`.
    pub fn and_column(&mut self, column: impl AsRef<str>) -> CqlResult<&mut Self> {
        let column = column.as_ref();
        self.verify_column(column, None)?;
        Ok(self.push(&format!("AND {}", column)))
    }

    /// `column = value`.
    pub fn equals(&mut self, column: impl AsRef<str>, value: impl Into<Value>) -> CqlResult<&mut Self> {
        self.compare(column.as_ref(), "=", value.into())
    }

    /// `WHERE column = value`.
    pub fn where_equals(
        &mut self,
        column: impl AsRef<str>,
        value: impl Into<Value>,
    ) -> CqlResult<&mut Self> {
        let column = column.as_ref();
        let value = value.into();
        let predicate = self.predicate(column, "=", &value)?;
        Ok(self.push(&format!("WHERE {}", predicate)))
    }

    pub fn gt(&mut self, column: impl AsRef<str>, value: impl Into<Value>) -> CqlResult<&mut Self> {
        self.compare(column.as_ref(), ">", value.into())
    }

    pub fn gte(&mut self, column: impl AsRef<str>, value: impl Into<Value>) -> CqlResult<&mut Self> {
        self.compare(column.as_ref(), ">=", value.into())
    }

    pub fn lt(&mut self, column: impl AsRef<str>, value: impl Into<Value>) -> CqlResult<&mut Self> {
        self.compare(column.as_ref(), "<", value.into())
    }

    pub fn lte(&mut self, column: impl AsRef<str>, value: impl Into<Value>) -> CqlResult<&mut Self> {
        self.compare(column.as_ref(), "<=", value.into())
    }

    fn compare(&mut self, column: &str, op: &str, value: Value) -> CqlResult<&mut Self> {
        let predicate = self.predicate(column, op, &value)?;
        Ok(self.push(&predicate))
    }

    fn predicate(&self, column: &str, op: &str, value: &Value) -> CqlResult<String> {
        self.verify_column(column, Some(value))?;
        let rendered = self.wrap_key_value(column, value)?;
        Ok(format!("{} {} {}", column, op, rendered))
    }

    /// `IN (v1, v2, ...)`. A single value is treated as a one-element list.
    pub fn in_list(&mut self, values: impl Into<Value>) -> CqlResult<&mut Self> {
        let list = in_values(values.into())?;
        Ok(self.push(&format!("IN ({})", list)))
    }

    /// `column IN (v1, v2, ...)`.
    pub fn column_in(
        &mut self,
        column: impl AsRef<str>,
        values: impl Into<Value>,
    ) -> CqlResult<&mut Self> {
        let column = column.as_ref();
        let list = in_values(values.into())?;
        self.verify_column(column, None)?;
        Ok(self.push(&format!("{} IN ({})", column, list)))
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.push(&format!("LIMIT {}", n))
    }

    pub fn allow_filtering(&mut self) -> &mut Self {
        self.push("ALLOW FILTERING")
    }

    pub fn order_by(&mut self, column: impl AsRef<str>, order: SortOrder) -> &mut Self {
        self.push(&format!("ORDER BY {} {}", column.as_ref(), order.as_str()))
    }

    pub fn order_asc(&mut self, column: impl AsRef<str>) -> &mut Self {
        self.order_by(column, SortOrder::Asc)
    }

    pub fn order_desc(&mut self, column: impl AsRef<str>) -> &mut Self {
        self.order_by(column, SortOrder::Desc)
    }

    /// `USING TTL seconds`.
    pub fn using_ttl(&mut self, seconds: u64) -> &mut Self {
        self.push(&format!("USING TTL {}", seconds))
    }

    /// `USING TIMESTAMP micros`; anything but an integer is a type error.
    pub fn using_timestamp(&mut self, timestamp: impl Into<Value>) -> CqlResult<&mut Self> {
        let timestamp = timestamp.into();
        if !SchemaType::int().validate(&timestamp) {
            return Err(CqlError::type_error(format!(
                "USING TIMESTAMP requires a valid timestamp, instead, received {}",
                timestamp
            )));
        }
        Ok(self.push(&format!("USING TIMESTAMP {}", timestamp)))
    }
}

fn in_values(values: Value) -> CqlResult<String> {
    let items = match values {
        Value::Null => {
            return Err(CqlError::config("The predicate IN requires an array argument."));
        }
        Value::List(items) => items,
        single => vec![single],
    };
    Ok(items.iter().map(quote_if_text).collect::<Vec<_>>().join(", "))
}
