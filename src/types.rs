//! Column type descriptors.
//!
//! Every supported CQL column type has a factory on [`SchemaType`] that returns
//! a fresh descriptor pairing the wire type name, a validation predicate and
//! the literal wrapper used when its values are written into a statement.
//!
//! ```
//! use cqlkit::types::SchemaType;
//!
//! let emails = SchemaType::set(SchemaType::text());
//! assert_eq!(emails.to_string(), "set<text>");
//! assert!(emails.validate(&vec!["f@baggins.com", "baggins@gmail.com"].into()));
//! ```

use crate::error::CqlError;
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static IPV4: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{1,3}\.){3}\d{1,3}$").expect("valid IPv4 pattern"));

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}(?:-[0-9a-fA-F]{4}){3}-[0-9a-fA-F]{12}$")
        .expect("valid UUID pattern")
});

/// Start/end delimiters applied to a serialized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapper {
    None,
    SingleQuote,
    DoubleQuote,
    Brace,
    Bracket,
}

impl Wrapper {
    pub const fn start(self) -> &'static str {
        match self {
            Wrapper::None => "",
            Wrapper::SingleQuote => "'",
            Wrapper::DoubleQuote => "\"",
            Wrapper::Brace => "{",
            Wrapper::Bracket => "[",
        }
    }

    pub const fn end(self) -> &'static str {
        match self {
            Wrapper::None => "",
            Wrapper::SingleQuote => "'",
            Wrapper::DoubleQuote => "\"",
            Wrapper::Brace => "}",
            Wrapper::Bracket => "]",
        }
    }

    /// Surround already-rendered text with the delimiters.
    pub fn wrap(self, inner: &str) -> String {
        format!("{}{}{}", self.start(), inner, self.end())
    }

    /// Surround raw text, doubling any embedded quote delimiter.
    pub fn wrap_literal(self, raw: &str) -> String {
        match self {
            Wrapper::SingleQuote => self.wrap(&raw.replace('\'', "''")),
            Wrapper::DoubleQuote => self.wrap(&raw.replace('"', "\"\"")),
            _ => self.wrap(raw),
        }
    }
}

/// The closed set of column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Ascii,
    Bigint,
    Blob,
    Boolean,
    Counter,
    Decimal,
    Double,
    Float,
    Inet,
    Int,
    List,
    Map,
    Set,
    Text,
    Timestamp,
    Uuid,
    Timeuuid,
    Varchar,
    Varint,
    /// Pseudo-type carried by the `PRIMARY_KEY` schema entry.
    Primary,
}

impl ColumnType {
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Bigint => "bigint",
            Self::Blob => "blob",
            Self::Boolean => "boolean",
            Self::Counter => "counter",
            Self::Decimal => "decimal",
            Self::Double => "double",
            Self::Float => "float",
            Self::Inet => "inet",
            Self::Int => "int",
            Self::List => "list",
            Self::Map => "map",
            Self::Set => "set",
            Self::Text => "text",
            Self::Timestamp => "timestamp",
            Self::Uuid => "uuid",
            Self::Timeuuid => "timeuuid",
            Self::Varchar => "varchar",
            Self::Varint => "varint",
            Self::Primary => "primary",
        }
    }

    pub const fn wrapper(self) -> Wrapper {
        match self {
            Self::Ascii | Self::Inet | Self::Text | Self::Varchar | Self::Timestamp => {
                Wrapper::SingleQuote
            }
            Self::List => Wrapper::Bracket,
            Self::Set | Self::Map => Wrapper::Brace,
            _ => Wrapper::None,
        }
    }

    /// Resolve a scalar wire name (case-insensitive).
    ///
    /// Parameterized types (`list`, `set`, `map`) and the primary-key
    /// pseudo-type are not scalars and resolve to `None`.
    pub fn scalar(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "ascii" => Self::Ascii,
            "bigint" => Self::Bigint,
            "blob" => Self::Blob,
            "boolean" => Self::Boolean,
            "counter" => Self::Counter,
            "decimal" => Self::Decimal,
            "double" => Self::Double,
            "float" => Self::Float,
            "inet" => Self::Inet,
            "int" => Self::Int,
            "text" => Self::Text,
            "timestamp" => Self::Timestamp,
            "uuid" => Self::Uuid,
            "timeuuid" => Self::Timeuuid,
            "varchar" => Self::Varchar,
            "varint" => Self::Varint,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Type parameters of a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeParams {
    Scalar,
    /// Element type of a `list` or `set`.
    Collection(Box<SchemaType>),
    /// Key and value types of a `map`.
    Associative {
        key: Box<SchemaType>,
        value: Box<SchemaType>,
    },
    /// Raw key specification of the `PRIMARY_KEY` pseudo column.
    KeySpec(Value),
}

/// A column type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaType {
    kind: ColumnType,
    params: TypeParams,
    primary: bool,
}

impl SchemaType {
    fn scalar(kind: ColumnType) -> Self {
        Self {
            kind,
            params: TypeParams::Scalar,
            primary: false,
        }
    }

    pub fn ascii() -> Self {
        Self::scalar(ColumnType::Ascii)
    }

    pub fn bigint() -> Self {
        Self::scalar(ColumnType::Bigint)
    }

    /// Accepts any value; byte-sequence validation is not defined yet.
    pub fn blob() -> Self {
        Self::scalar(ColumnType::Blob)
    }

    pub fn boolean() -> Self {
        Self::scalar(ColumnType::Boolean)
    }

    pub fn counter() -> Self {
        Self::scalar(ColumnType::Counter)
    }

    pub fn decimal() -> Self {
        Self::scalar(ColumnType::Decimal)
    }

    pub fn double() -> Self {
        Self::scalar(ColumnType::Double)
    }

    pub fn float() -> Self {
        Self::scalar(ColumnType::Float)
    }

    pub fn inet() -> Self {
        Self::scalar(ColumnType::Inet)
    }

    pub fn int() -> Self {
        Self::scalar(ColumnType::Int)
    }

    pub fn text() -> Self {
        Self::scalar(ColumnType::Text)
    }

    pub fn timestamp() -> Self {
        Self::scalar(ColumnType::Timestamp)
    }

    pub fn uuid() -> Self {
        Self::scalar(ColumnType::Uuid)
    }

    pub fn timeuuid() -> Self {
        Self::scalar(ColumnType::Timeuuid)
    }

    pub fn varchar() -> Self {
        Self::scalar(ColumnType::Varchar)
    }

    pub fn varint() -> Self {
        Self::scalar(ColumnType::Varint)
    }

    /// Ordered collection of `element`.
    pub fn list(element: SchemaType) -> Self {
        Self {
            kind: ColumnType::List,
            params: TypeParams::Collection(Box::new(element)),
            primary: false,
        }
    }

    /// Unordered collection of `element`. Uniqueness is left to the store.
    pub fn set(element: SchemaType) -> Self {
        Self {
            kind: ColumnType::Set,
            params: TypeParams::Collection(Box::new(element)),
            primary: false,
        }
    }

    pub fn map(key: SchemaType, value: SchemaType) -> Self {
        Self {
            kind: ColumnType::Map,
            params: TypeParams::Associative {
                key: Box::new(key),
                value: Box::new(value),
            },
            primary: false,
        }
    }

    /// The `PRIMARY_KEY` pseudo column: a column name, a flat list of names,
    /// or a list whose first element is the partition-key group.
    pub fn primary_key_spec(spec: impl Into<Value>) -> Self {
        Self {
            kind: ColumnType::Primary,
            params: TypeParams::KeySpec(spec.into()),
            primary: false,
        }
    }

    /// Build a scalar descriptor from its wire name.
    pub fn named(name: &str) -> Option<Self> {
        ColumnType::scalar(name).map(Self::scalar)
    }

    /// Flag this column as (part of) the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn kind(&self) -> ColumnType {
        self.kind
    }

    pub fn wire_name(&self) -> &'static str {
        self.kind.wire_name()
    }

    pub fn wrapper(&self) -> Wrapper {
        self.kind.wrapper()
    }

    pub fn params(&self) -> &TypeParams {
        &self.params
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_pseudo(&self) -> bool {
        self.kind == ColumnType::Primary
    }

    /// Check whether `value` belongs to this type.
    pub fn validate(&self, value: &Value) -> bool {
        match self.kind {
            ColumnType::Ascii => value
                .text_form()
                .is_some_and(|s| !s.is_empty() && s.is_ascii()),
            ColumnType::Bigint
            | ColumnType::Counter
            | ColumnType::Int
            | ColumnType::Double
            | ColumnType::Varint => value.is_integral(),
            ColumnType::Decimal | ColumnType::Float => value.is_fractional(),
            ColumnType::Blob => true,
            ColumnType::Boolean => value.text_form().is_some_and(|s| {
                s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false")
            }),
            ColumnType::Inet => value.as_str().is_some_and(|s| IPV4.is_match(s)),
            ColumnType::Text | ColumnType::Varchar => matches!(value, Value::Text(_)),
            ColumnType::Timestamp => value
                .to_timestamp()
                .is_some_and(|ts| ts.timestamp_millis() > 0),
            ColumnType::Uuid | ColumnType::Timeuuid => {
                value.as_str().is_some_and(|s| UUID.is_match(s))
            }
            ColumnType::List | ColumnType::Set => match (&self.params, value) {
                (TypeParams::Collection(element), Value::List(items)) => {
                    items.iter().all(|item| element.validate(item))
                }
                _ => false,
            },
            ColumnType::Map => self.validate_map(value),
            ColumnType::Primary => matches!(
                &self.params,
                TypeParams::KeySpec(Value::Null | Value::Text(_) | Value::List(_))
            ),
        }
    }

    fn validate_map(&self, value: &Value) -> bool {
        let TypeParams::Associative { key, value: val } = &self.params else {
            return false;
        };
        let entry_ok = |(k, v): &(String, Value)| key_matches(key, k) && val.validate(v);

        match value {
            Value::Map(entries) => entries.iter().all(entry_ok),
            Value::List(items) => items.iter().all(|item| match item {
                Value::Map(entries) => entries.iter().all(entry_ok),
                _ => false,
            }),
            _ => false,
        }
    }
}

/// Map keys always arrive as strings; accept the key when either the string
/// itself or its scalar reading satisfies the key type.
fn key_matches(key_type: &SchemaType, key: &str) -> bool {
    if key_type.validate(&Value::Text(key.to_string())) {
        return true;
    }
    let parsed = if let Ok(i) = key.parse::<i64>() {
        Value::Int(i)
    } else if let Ok(f) = key.parse::<f64>() {
        Value::Float(f)
    } else {
        return false;
    };
    key_type.validate(&parsed)
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.params {
            TypeParams::Collection(element) => write!(f, "{}<{}>", self.wire_name(), element),
            TypeParams::Associative { key, value } => {
                write!(f, "{}<{}, {}>", self.wire_name(), key, value)
            }
            _ => f.write_str(self.wire_name()),
        }
    }
}

impl std::str::FromStr for SchemaType {
    type Err = CqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse_type(s)
    }
}
