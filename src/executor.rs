//! Boundary to whatever actually runs statements.
//!
//! cqlkit never opens a connection. A caller plugs in an [`Executor`]
//! (a driver wrapper, or a closure in tests) and gets back scrubbed rows.

use crate::error::{CqlError, CqlResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A result row: column name to JSON value, in column order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Bookkeeping fields removed from every row by default.
pub const DEFAULT_BLACKLIST: &[&str] = &["__columns"];

/// Consistency level requested for a statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    Any,
    One,
    Two,
    Three,
    #[default]
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    LocalOne,
}

impl Consistency {
    /// Native protocol code.
    pub const fn code(self) -> u16 {
        match self {
            Self::Any => 0x00,
            Self::One => 0x01,
            Self::Two => 0x02,
            Self::Three => 0x03,
            Self::Quorum => 0x04,
            Self::All => 0x05,
            Self::LocalQuorum => 0x06,
            Self::EachQuorum => 0x07,
            Self::LocalOne => 0x10,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::One => "one",
            Self::Two => "two",
            Self::Three => "three",
            Self::Quorum => "quorum",
            Self::All => "all",
            Self::LocalQuorum => "local_quorum",
            Self::EachQuorum => "each_quorum",
            Self::LocalOne => "local_one",
        }
    }
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Consistency {
    type Err = CqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "any" => Self::Any,
            "one" => Self::One,
            "two" => Self::Two,
            "three" => Self::Three,
            "quorum" => Self::Quorum,
            "all" => Self::All,
            "local_quorum" => Self::LocalQuorum,
            "each_quorum" => Self::EachQuorum,
            "local_one" => Self::LocalOne,
            _ => {
                return Err(CqlError::config(format!(
                    "Unknown consistency level: {}",
                    s
                )));
            }
        };
        Ok(level)
    }
}

/// Options handed to the executor along with the statement text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOptions {
    pub consistency: Consistency,
    /// Ask the executor to prepare the statement before running it.
    pub prepare: bool,
}

impl ExecOptions {
    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }

    pub fn prepared(mut self) -> Self {
        self.prepare = true;
        self
    }
}

/// Runs a serialized statement.
pub trait Executor {
    fn execute(&self, cql: &str, options: &ExecOptions) -> CqlResult<Vec<Row>>;
}

impl<F> Executor for F
where
    F: Fn(&str, &ExecOptions) -> CqlResult<Vec<Row>>,
{
    fn execute(&self, cql: &str, options: &ExecOptions) -> CqlResult<Vec<Row>> {
        self(cql, options)
    }
}

/// Drop null-valued and blacklisted fields from every row.
pub fn scrub_rows(rows: Vec<Row>, blacklist: &[&str]) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .filter(|(k, v)| !v.is_null() && !blacklist.contains(&k.as_str()))
                .collect()
        })
        .collect()
}
