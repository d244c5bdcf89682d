//! Schema compilation and record validation.
//!
//! A schema is compiled from an ordered list of column declarations. The
//! primary key is either flagged inline on a column type or declared through
//! the `PRIMARY_KEY` pseudo column:
//!
//! ```
//! use cqlkit::schema::{KeySpec, Schema};
//! use cqlkit::types::SchemaType;
//!
//! let schema = Schema::builder()
//!     .column("id", SchemaType::uuid())
//!     .column("username", SchemaType::text())
//!     .column("age", SchemaType::int())
//!     .primary_key(KeySpec::partitioned(["id", "username"], ["age"]))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.primary_columns(), vec!["id", "username", "age"]);
//! ```

use crate::error::{CqlError, CqlResult};
use crate::types::{SchemaType, TypeParams};
use crate::value::Value;
use std::collections::HashMap;

/// Name of the pseudo column that carries a key specification.
pub const PRIMARY_KEY: &str = "PRIMARY_KEY";

/// One entry of a schema structure before compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Type(SchemaType),
    /// Anything that is not a type descriptor, typically read from a config
    /// file. Only the `PRIMARY_KEY` entry may be declared this way.
    Value(Value),
}

impl From<SchemaType> for Declaration {
    fn from(ty: SchemaType) -> Self {
        Declaration::Type(ty)
    }
}

/// Ordered column declarations.
pub type Structure = Vec<(String, Declaration)>;

/// A component of a compound primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart {
    Column(String),
    /// Parenthesized group; as the first part it is the partition key.
    Group(Vec<KeyPart>),
}

/// A resolved primary-key specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySpec {
    Single(String),
    Compound(Vec<KeyPart>),
}

impl KeySpec {
    pub fn column(name: impl Into<String>) -> Self {
        KeySpec::Single(name.into())
    }

    /// Flat composite key: `(a, b, c)`.
    pub fn composite<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeySpec::Compound(names.into_iter().map(|n| KeyPart::Column(n.into())).collect())
    }

    /// Partition group followed by clustering columns: `((a, b), c)`.
    pub fn partitioned<P, C, S, T>(partition: P, clustering: C) -> Self
    where
        P: IntoIterator<Item = S>,
        C: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut parts = vec![KeyPart::Group(
            partition.into_iter().map(|n| KeyPart::Column(n.into())).collect(),
        )];
        parts.extend(clustering.into_iter().map(|n| KeyPart::Column(n.into())));
        KeySpec::Compound(parts)
    }

    /// Read a specification from a string, array, or nested array value.
    pub fn from_value(value: &Value) -> CqlResult<Self> {
        match value {
            Value::Text(name) => Ok(KeySpec::Single(name.clone())),
            Value::List(items) => Ok(KeySpec::Compound(
                items.iter().map(part_from_value).collect::<CqlResult<_>>()?,
            )),
            other => Err(CqlError::type_error(format!(
                "Attempted to assign an incorrect type as PRIMARY KEY ({}). It must be a string or an array.",
                other
            ))),
        }
    }

    /// Every column named by the key, in declaration order.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        match self {
            KeySpec::Single(name) => out.push(name.as_str()),
            KeySpec::Compound(parts) => collect_parts(parts, &mut out),
        }
        out
    }

    /// Columns of the partition key.
    pub fn partition_columns(&self) -> Vec<&str> {
        match self {
            KeySpec::Single(name) => vec![name.as_str()],
            KeySpec::Compound(parts) => match parts.first() {
                Some(KeyPart::Column(name)) => vec![name.as_str()],
                Some(KeyPart::Group(group)) => {
                    let mut out = Vec::new();
                    collect_parts(group, &mut out);
                    out
                }
                None => Vec::new(),
            },
        }
    }

    /// Render as the parenthesized list used after `PRIMARY KEY`.
    pub fn to_cql(&self) -> String {
        match self {
            KeySpec::Single(name) => format!("({})", name),
            KeySpec::Compound(parts) => render_group(parts),
        }
    }
}

fn part_from_value(value: &Value) -> CqlResult<KeyPart> {
    match value {
        Value::Text(name) => Ok(KeyPart::Column(name.clone())),
        Value::List(items) => Ok(KeyPart::Group(
            items.iter().map(part_from_value).collect::<CqlResult<_>>()?,
        )),
        other => Err(CqlError::type_error(format!(
            "PRIMARY KEY entries must be column names or arrays of column names, found {}",
            other
        ))),
    }
}

fn collect_parts<'a>(parts: &'a [KeyPart], out: &mut Vec<&'a str>) {
    for part in parts {
        match part {
            KeyPart::Column(name) => out.push(name),
            KeyPart::Group(group) => collect_parts(group, out),
        }
    }
}

fn render_group(parts: &[KeyPart]) -> String {
    let rendered: Vec<String> = parts
        .iter()
        .map(|part| match part {
            KeyPart::Column(name) => name.clone(),
            KeyPart::Group(group) => render_group(group),
        })
        .collect();
    format!("({})", rendered.join(", "))
}

impl From<KeySpec> for Value {
    fn from(spec: KeySpec) -> Self {
        fn part(p: KeyPart) -> Value {
            match p {
                KeyPart::Column(name) => Value::Text(name),
                KeyPart::Group(group) => Value::List(group.into_iter().map(part).collect()),
            }
        }
        match spec {
            KeySpec::Single(name) => Value::Text(name),
            KeySpec::Compound(parts) => Value::List(parts.into_iter().map(part).collect()),
        }
    }
}

/// A compiled column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    ty: SchemaType,
    primary: bool,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &SchemaType {
        &self.ty
    }

    /// Whether the column is part of the primary key, however it was declared.
    pub fn is_primary(&self) -> bool {
        self.primary
    }
}

/// An immutable, compiled table schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    key: Option<KeySpec>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Compile a structure, resolving its primary-key declaration.
    pub fn compile<I>(structure: I) -> CqlResult<Self>
    where
        I: IntoIterator<Item = (String, Declaration)>,
    {
        let mut columns: Vec<Column> = Vec::new();
        let mut index = HashMap::new();
        let mut key_decl: Option<Value> = None;

        for (name, decl) in structure {
            if name.eq_ignore_ascii_case(PRIMARY_KEY) {
                if key_decl.is_some() {
                    return Err(CqlError::config("PRIMARY_KEY is declared more than once"));
                }
                key_decl = Some(match decl {
                    Declaration::Type(ty) => match ty.params() {
                        TypeParams::KeySpec(spec) => spec.clone(),
                        _ => Value::Null,
                    },
                    Declaration::Value(spec) => spec,
                });
                continue;
            }

            let ty = match decl {
                Declaration::Type(ty) if !ty.is_pseudo() => ty,
                Declaration::Type(_) => {
                    return Err(CqlError::type_error(format!(
                        "Expected {} to be a column type, found a PRIMARY KEY specification.",
                        name
                    )));
                }
                Declaration::Value(v) => {
                    return Err(CqlError::type_error(format!(
                        "Expected {} to be of type SchemaType, found {}.",
                        name, v
                    )));
                }
            };
            if index.contains_key(&name) {
                return Err(CqlError::config(format!("Column {} is declared more than once", name)));
            }
            index.insert(name.clone(), columns.len());
            columns.push(Column {
                primary: ty.is_primary(),
                name,
                ty,
            });
        }

        let key = match key_decl {
            Some(spec) => {
                let spec = KeySpec::from_value(&spec)?;
                for name in spec.columns() {
                    let idx = index.get(name).ok_or_else(|| {
                        CqlError::reference(format!(
                            "Attempted to assign, as PRIMARY KEY, an unknown key : {}",
                            name
                        ))
                    })?;
                    columns[*idx].primary = true;
                }
                Some(spec)
            }
            None => None,
        };

        if !columns.iter().any(|c| c.primary) {
            return Err(CqlError::config("No primary key has been set."));
        }

        tracing::debug!(columns = columns.len(), key = ?key, "compiled schema");

        Ok(Self {
            columns,
            index,
            key,
        })
    }

    /// Column type by name.
    pub fn get(&self, name: &str) -> Option<&SchemaType> {
        self.column(name).map(Column::ty)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&idx| &self.columns[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Key declared through the `PRIMARY_KEY` pseudo column, if any.
    pub fn key(&self) -> Option<&KeySpec> {
        self.key.as_ref()
    }

    /// Names of every primary-key column.
    ///
    /// Follows the declared key order when a `PRIMARY_KEY` entry exists,
    /// declaration order otherwise.
    pub fn primary_columns(&self) -> Vec<&str> {
        match &self.key {
            Some(spec) => spec.columns(),
            None => self
                .columns
                .iter()
                .filter(|c| c.primary)
                .map(Column::name)
                .collect(),
        }
    }

    pub fn is_primary(&self, name: &str) -> bool {
        self.column(name).is_some_and(Column::is_primary)
    }

    /// Check that every field of `record` is a known column holding a valid value.
    pub fn validate<I, K, V>(&self, record: I) -> CqlResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (key, value) in record {
            let key = key.as_ref();
            let value = value.into();
            let ty = self.get(key).ok_or_else(|| {
                CqlError::reference(format!(
                    "Attempted to validate a model value that is not in the schema: {}:{}",
                    key, value
                ))
            })?;
            if !ty.validate(&value) {
                return Err(CqlError::type_error(format!(
                    "Expected {} to be of type {}.",
                    value, ty
                )));
            }
        }
        Ok(())
    }
}

/// Accumulates declarations in order, then compiles them.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    structure: Structure,
}

impl SchemaBuilder {
    pub fn column(mut self, name: impl Into<String>, ty: SchemaType) -> Self {
        self.structure.push((name.into(), Declaration::Type(ty)));
        self
    }

    /// Declare the `PRIMARY_KEY` pseudo column.
    pub fn primary_key(mut self, spec: impl Into<Value>) -> Self {
        self.structure.push((
            PRIMARY_KEY.to_string(),
            Declaration::Type(SchemaType::primary_key_spec(spec)),
        ));
        self
    }

    pub fn build(self) -> CqlResult<Schema> {
        Schema::compile(self.structure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> SchemaBuilder {
        Schema::builder()
            .column("id", SchemaType::uuid())
            .column("username", SchemaType::text())
    }

    #[test]
    fn test_missing_primary_key() {
        let err = users().build().unwrap_err();
        assert!(matches!(err, CqlError::Config(ref m) if m == "No primary key has been set."));
    }

    #[test]
    fn test_inline_primary_key() {
        let schema = Schema::builder()
            .column("id", SchemaType::uuid().primary_key())
            .column("username", SchemaType::text())
            .build()
            .unwrap();
        assert!(schema.is_primary("id"));
        assert!(!schema.is_primary("username"));
        assert!(schema.key().is_none());
        assert_eq!(schema.primary_columns(), vec!["id"]);
    }

    #[test]
    fn test_single_pseudo_key() {
        let schema = users().primary_key("id").build().unwrap();
        assert!(schema.is_primary("id"));
        assert_eq!(schema.key(), Some(&KeySpec::column("id")));
    }

    #[test]
    fn test_flat_composite_key() {
        let schema = users().primary_key(vec!["id", "username"]).build().unwrap();
        assert!(schema.is_primary("id"));
        assert!(schema.is_primary("username"));
        assert_eq!(schema.key().unwrap().to_cql(), "(id, username)");
    }

    #[test]
    fn test_nested_partition_key() {
        let spec = Value::List(vec![vec!["id", "username"].into(), "age".into()]);
        let schema = users()
            .column("age", SchemaType::int())
            .primary_key(spec)
            .build()
            .unwrap();
        let key = schema.key().unwrap();
        assert_eq!(key, &KeySpec::partitioned(["id", "username"], ["age"]));
        assert_eq!(key.to_cql(), "((id, username), age)");
        assert_eq!(key.partition_columns(), vec!["id", "username"]);
        assert!(schema.columns().iter().all(Column::is_primary));
    }

    #[test]
    fn test_key_declared_before_columns() {
        let structure: Structure = vec![
            (PRIMARY_KEY.into(), SchemaType::primary_key_spec("id").into()),
            ("id".into(), SchemaType::uuid().into()),
        ];
        let schema = Schema::compile(structure).unwrap();
        assert!(schema.is_primary("id"));
    }

    #[test]
    fn test_unknown_key_column() {
        let err = users().primary_key(vec!["id", "email"]).build().unwrap_err();
        assert!(
            matches!(err, CqlError::Reference(ref m) if m.ends_with("unknown key : email")),
            "{err}"
        );
    }

    #[test]
    fn test_key_spec_wrong_shape() {
        let err = users().primary_key(5).build().unwrap_err();
        assert!(matches!(err, CqlError::Type(_)));

        let err = users().primary_key(Value::Null).build().unwrap_err();
        assert!(matches!(err, CqlError::Type(_)));

        let err = users()
            .primary_key(Value::List(vec!["id".into(), 3.into()]))
            .build()
            .unwrap_err();
        assert!(matches!(err, CqlError::Type(_)));
    }

    #[test]
    fn test_empty_key_list_has_no_primary() {
        let err = users().primary_key(Value::List(vec![])).build().unwrap_err();
        assert!(matches!(err, CqlError::Config(_)));
    }

    #[test]
    fn test_lowercase_pseudo_column() {
        let structure: Structure = vec![
            ("id".into(), SchemaType::uuid().into()),
            ("primary_key".into(), Declaration::Value("id".into())),
        ];
        assert!(Schema::compile(structure).unwrap().is_primary("id"));
    }

    #[test]
    fn test_declaration_not_a_type() {
        let structure: Structure = vec![
            ("id".into(), SchemaType::uuid().primary_key().into()),
            ("age".into(), Declaration::Value(12.into())),
        ];
        let err = Schema::compile(structure).unwrap_err();
        assert!(matches!(err, CqlError::Type(ref m) if m.starts_with("Expected age")));
    }

    #[test]
    fn test_duplicate_column() {
        let err = users()
            .column("id", SchemaType::text())
            .primary_key("id")
            .build()
            .unwrap_err();
        assert!(matches!(err, CqlError::Config(_)));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let schema = Schema::builder()
            .column("zeta", SchemaType::text())
            .column("alpha", SchemaType::int().primary_key())
            .column("mid", SchemaType::boolean())
            .build()
            .unwrap();
        let names: Vec<&str> = schema.columns().iter().map(Column::name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_validate_record() {
        let schema = users()
            .column("age", SchemaType::int())
            .primary_key("id")
            .build()
            .unwrap();

        let record: Vec<(&str, Value)> = vec![("username", "frodo".into()), ("age", 50.into())];
        assert!(schema.validate(record).is_ok());

        let err = schema.validate([("email", "f@baggins.com")]).unwrap_err();
        assert!(matches!(err, CqlError::Reference(_)));

        let err = schema.validate([("age", "fifty")]).unwrap_err();
        assert!(matches!(err, CqlError::Type(ref m) if m == "Expected fifty to be of type int."));
    }
}
