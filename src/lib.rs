//! # cqlkit
//!
//! Schema-driven CQL statement compiler: typed columns in, quoted and
//! escaped statements out.
//!
//! ## Quick Example
//!
//! ```
//! use cqlkit::prelude::*;
//!
//! let schema = Schema::builder()
//!     .column("firstname", SchemaType::text())
//!     .column("lastname", SchemaType::text())
//!     .column("age", SchemaType::int())
//!     .primary_key("firstname")
//!     .build()?;
//! let users = Table::new("users", schema)?;
//!
//! let mut q = users.statement();
//! q.insert([
//!     ("firstname", Value::from("James")),
//!     ("lastname", "Booth".into()),
//!     ("age", 37.into()),
//! ])?;
//! assert_eq!(
//!     q.to_cql(),
//!     "INSERT INTO users (firstname, lastname, age) VALUES ('James', 'Booth', 37);"
//! );
//! # Ok::<(), cqlkit::CqlError>(())
//! ```
//!
//! ## Layers
//!
//! | Module        | Role                                              |
//! |---------------|---------------------------------------------------|
//! | [`types`]     | Column type descriptors, validators, wrappers     |
//! | [`schema`]    | Schema compilation and primary-key resolution     |
//! | [`statement`] | The chainable statement builder                   |
//! | [`catalog`]   | Table / model bindings                            |
//! | [`executor`]  | Hand-off to whatever runs the statement           |
//! | [`config`]    | TOML catalog configuration                        |

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod parser;
pub mod schema;
pub mod statement;
pub mod types;
pub mod value;

pub use error::{CqlError, CqlResult};

pub mod prelude {
    pub use crate::catalog::{Catalog, Model, Table};
    pub use crate::config::{Config, ValidationMode};
    pub use crate::error::*;
    pub use crate::executor::{Consistency, ExecOptions, Executor, Row};
    pub use crate::schema::{Declaration, KeySpec, Schema};
    pub use crate::statement::{Fragment, SortOrder, Statement};
    pub use crate::types::SchemaType;
    pub use crate::value::Value;
}

/// Parse a column type expression such as `map<text, int>`.
///
/// # Example
///
/// ```
/// let ty = cqlkit::parse_type("list<text>").unwrap();
/// assert_eq!(ty.to_string(), "list<text>");
/// ```
pub fn parse_type(input: &str) -> CqlResult<types::SchemaType> {
    parser::parse_type(input)
}
