//! Tables, models, and the catalog that keeps their bindings stable.

use crate::config::{Config, ValidationMode};
use crate::error::{CqlError, CqlResult};
use crate::executor::ExecOptions;
use crate::schema::Schema;
use crate::statement::Statement;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A table name bound to a compiled schema.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    schema: Arc<Schema>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: impl Into<Arc<Schema>>) -> CqlResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CqlError::config(
                "Attempting to instantiate a table without a valid name.",
            ));
        }
        Ok(Self {
            name,
            schema: schema.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Same name and the very same schema instance.
    pub fn same_binding(&self, other: &Table) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.schema, &other.schema)
    }

    /// A fresh, strictly validated statement for this table.
    pub fn statement(&self) -> Statement {
        Statement::new(self.clone())
    }

    /// The `CREATE TABLE` statement for this table.
    pub fn create(&self, if_not_exists: bool) -> CqlResult<Statement> {
        let mut stmt = self.statement();
        stmt.create_table(&self.name, &self.schema, if_not_exists)?;
        Ok(stmt)
    }
}

/// Record-oriented helpers over a table.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    table: Table,
    mode: ValidationMode,
}

impl Model {
    pub fn new(name: impl Into<String>, table: Table) -> CqlResult<Self> {
        Self::with_mode(name, table, ValidationMode::Strict)
    }

    pub fn with_mode(
        name: impl Into<String>,
        table: Table,
        mode: ValidationMode,
    ) -> CqlResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CqlError::config(
                "Attempting to instantiate a model without a valid name.",
            ));
        }
        Ok(Self { name, table, mode })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// An empty statement bound to the model's table.
    pub fn query(&self) -> Statement {
        Statement::with_mode(self.table.clone(), self.mode)
    }

    /// `SELECT * FROM table WHERE a = .. AND b = ..`.
    ///
    /// An empty record selects every row.
    pub fn find<I, K, V>(&self, record: I) -> CqlResult<Statement>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut stmt = self.query();
        stmt.select("*")?;
        match_all(&mut stmt, record)?;
        Ok(stmt)
    }

    /// `SELECT * FROM table WHERE column = value`.
    pub fn find_all_by(&self, column: &str, value: impl Into<Value>) -> CqlResult<Statement> {
        let mut stmt = self.query();
        stmt.select("*")?.where_equals(column, value)?;
        Ok(stmt)
    }

    /// `DELETE FROM table WHERE a = .. AND b = ..`.
    pub fn delete<I, K, V>(&self, record: I) -> CqlResult<Statement>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut stmt = self.query();
        stmt.delete_all()?;
        match_all(&mut stmt, record)?;
        Ok(stmt)
    }

    /// `DELETE FROM table`, every row.
    pub fn delete_all(&self) -> CqlResult<Statement> {
        let mut stmt = self.query();
        stmt.delete_all()?;
        Ok(stmt)
    }

    /// `INSERT` the record, optionally `USING TTL`.
    pub fn save<I, K, V>(&self, record: I, ttl: Option<u64>) -> CqlResult<Statement>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut stmt = self.query();
        stmt.insert(record)?;
        if let Some(ttl) = ttl {
            stmt.using_ttl(ttl);
        }
        Ok(stmt)
    }

    /// A statement holding raw CQL.
    pub fn cql(&self, raw: impl Into<String>) -> Statement {
        let mut stmt = self.query();
        stmt.cql(raw);
        stmt
    }
}

fn match_all<I, K, V>(stmt: &mut Statement, record: I) -> CqlResult<()>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
{
    for (i, (column, value)) in record.into_iter().enumerate() {
        if i == 0 {
            stmt.where_clause();
        } else {
            stmt.and();
        }
        stmt.equals(column, value)?;
    }
    Ok(())
}

/// Registry of tables and models.
///
/// A name, once bound, keeps its schema (or table): asking again with the
/// same instance, or with none, returns the existing binding.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: HashMap<String, Table>,
    models: HashMap<String, Model>,
    mode: ValidationMode,
    options: ExecOptions,
}

impl Catalog {
    pub fn new(mode: ValidationMode) -> Self {
        if !mode.is_strict() {
            tracing::warn!("schema validation is disabled for this catalog");
        }
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Build a catalog with every table in `config` compiled and registered.
    pub fn from_config(config: &Config) -> CqlResult<Self> {
        let mut catalog = Self::new(config.validation_mode());
        catalog.options = config.exec_options();
        for name in config.table_names() {
            let schema = Schema::compile(config.structure(name)?)?;
            catalog.table(name, Some(Arc::new(schema)))?;
        }
        Ok(catalog)
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn exec_options(&self) -> ExecOptions {
        self.options
    }

    /// Look up or register a table.
    pub fn table(&mut self, name: &str, schema: Option<Arc<Schema>>) -> CqlResult<Table> {
        if name.trim().is_empty() {
            return Err(CqlError::config("Attempted to create a table with an invalid name."));
        }

        if let Some(existing) = self.tables.get(name) {
            if let Some(schema) = schema {
                if !Arc::ptr_eq(existing.schema(), &schema) {
                    return Err(CqlError::invariant(format!(
                        "Attempting to overwrite the schema for table : {}",
                        name
                    )));
                }
            }
            return Ok(existing.clone());
        }

        let schema = schema.ok_or_else(|| {
            CqlError::config(format!(
                "Table {} does not exist and no schema was given to create it",
                name
            ))
        })?;
        let table = Table::new(name, schema)?;
        tracing::debug!(table = name, columns = table.schema().columns().len(), "registered table");
        self.tables.insert(name.to_string(), table.clone());
        Ok(table)
    }

    /// Look up or register a model.
    pub fn model(&mut self, name: &str, table: Option<Table>) -> CqlResult<Model> {
        if name.trim().is_empty() {
            return Err(CqlError::config("Attempted to create a model with an invalid name."));
        }

        if let Some(existing) = self.models.get(name) {
            if let Some(table) = table {
                if !existing.table().same_binding(&table) {
                    return Err(CqlError::invariant(format!(
                        "Attempting to overwrite the table for model : {}",
                        name
                    )));
                }
            }
            return Ok(existing.clone());
        }

        let table = table.ok_or_else(|| {
            CqlError::config(
                "Attempted to retrieve a model that doesn't exist or create a model with an invalid table.",
            )
        })?;
        let model = Model::with_mode(name, table, self.mode)?;
        tracing::debug!(model = name, table = model.table().name(), "registered model");
        self.models.insert(name.to_string(), model.clone());
        Ok(model)
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Registered tables, by name.
    pub fn tables(&self) -> Vec<&Table> {
        let mut tables: Vec<&Table> = self.tables.values().collect();
        tables.sort_by(|a, b| a.name().cmp(b.name()));
        tables
    }

    /// A statement for `table` in the catalog's validation mode.
    pub fn statement(&self, table: &Table) -> Statement {
        Statement::with_mode(table.clone(), self.mode)
    }
}
