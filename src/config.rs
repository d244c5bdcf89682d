//! Catalog configuration.
//!
//! ```toml
//! skip_schema_validation = false
//! consistency = "local_quorum"
//!
//! [tables.users]
//! id = "uuid"
//! username = "text"
//! emails = "set<text>"
//! PRIMARY_KEY = ["id", "username"]
//! ```

use crate::error::{CqlError, CqlResult};
use crate::executor::{Consistency, ExecOptions};
use crate::parser::parse_type;
use crate::schema::{Declaration, PRIMARY_KEY, Structure};
use crate::value::Value;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// Whether statements check column references and values against the schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    #[default]
    Strict,
    /// Emit whatever the caller passes. Malformed input produces malformed text.
    Skip,
}

impl ValidationMode {
    pub fn is_strict(self) -> bool {
        self == ValidationMode::Strict
    }
}

impl From<bool> for ValidationMode {
    /// `true` means skip validation.
    fn from(skip: bool) -> Self {
        if skip {
            ValidationMode::Skip
        } else {
            ValidationMode::Strict
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub skip_schema_validation: bool,

    #[serde(default)]
    pub consistency: Consistency,

    /// Table name to ordered column declarations.
    #[serde(default)]
    pub tables: toml::Table,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> CqlResult<Self> {
        let text = std::fs::read_to_string(path)?;
        text.parse()
    }

    pub fn validation_mode(&self) -> ValidationMode {
        ValidationMode::from(self.skip_schema_validation)
    }

    pub fn exec_options(&self) -> ExecOptions {
        ExecOptions::default().consistency(self.consistency)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Column declarations of one table, in file order.
    ///
    /// String entries are parsed as type expressions; `PRIMARY_KEY` and any
    /// other non-string entry are passed through as values and checked when
    /// the schema is compiled.
    pub fn structure(&self, table: &str) -> CqlResult<Structure> {
        let section = self
            .tables
            .get(table)
            .ok_or_else(|| CqlError::config(format!("Table {} is not configured", table)))?
            .as_table()
            .ok_or_else(|| CqlError::config(format!("tables.{} must be a table", table)))?;

        section
            .iter()
            .map(|(column, decl)| -> CqlResult<(String, Declaration)> {
                let decl = match decl {
                    toml::Value::String(expr) if !column.eq_ignore_ascii_case(PRIMARY_KEY) => {
                        let ty = parse_type(expr).map_err(|e| match e {
                            CqlError::Parse { position, message } => CqlError::parse(
                                position,
                                format!("{}.{}: {}", table, column, message),
                            ),
                            other => other,
                        })?;
                        Declaration::Type(ty)
                    }
                    other => Declaration::Value(Value::from(other.clone())),
                };
                Ok((column.clone(), decl))
            })
            .collect()
    }
}

impl FromStr for Config {
    type Err = CqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}
