//! Value rendering and schema checks shared by the clause methods.

use super::Statement;
use crate::error::{CqlError, CqlResult};
use crate::types::{ColumnType, SchemaType, TypeParams, Wrapper};
use crate::value::{Value, iso_timestamp};

/// Quote text values (doubling embedded quotes); render anything else as is.
pub fn quote_if_text(value: &Value) -> String {
    match value {
        Value::Text(s) => Wrapper::SingleQuote.wrap_literal(s),
        Value::Timestamp(ts) => Wrapper::SingleQuote.wrap(&iso_timestamp(ts)),
        other => other.to_string(),
    }
}

impl Statement {
    /// Check `column` against the bound schema, and `value` against its type.
    ///
    /// A plain column name must exist in the schema whatever the value. A
    /// column that is itself an expression, such as `TOKEN(userid)`, is not
    /// looked up. With no value only the column name is checked.
    ///
    /// Only [`Value::Fragment`] values skip the type check. Plain strings are
    /// always validated, so `"now()"` into a timestamp column fails; pass
    /// `Value::fragment("now()")` to emit it verbatim. Collection values are
    /// checked element by element when rendered, so only their outer shape is
    /// checked here.
    pub(super) fn verify_column(&self, column: &str, value: Option<&Value>) -> CqlResult<()> {
        if !self.mode.is_strict() || !is_identifier(column) {
            return Ok(());
        }

        let table = self.bound_table()?;
        let ty = table.schema().get(column).ok_or_else(|| {
            CqlError::reference(format!(
                "The column, {}, is not found in the schema for the table, {}",
                column,
                table.name()
            ))
        })?;

        let Some(value) = value.filter(|v| !v.is_fragment()) else {
            return Ok(());
        };

        let deferred = matches!(
            (ty.params(), value),
            (TypeParams::Collection(_), Value::List(_))
                | (TypeParams::Associative { .. }, Value::Map(_) | Value::List(_))
        );
        if deferred {
            return Ok(());
        }

        if ty.kind() == ColumnType::Timestamp && value.to_timestamp().is_none() {
            return Err(invalid_date(column, value));
        }

        if !ty.validate(value) {
            return Err(CqlError::type_error(format!(
                "The value, {}, for key, {}, is invalid. Expecting {}",
                value, column, ty
            )));
        }
        Ok(())
    }

    /// Render `value` as a literal of `column`'s type.
    ///
    /// The column must exist even when `value` is a fragment, unless the
    /// column is an expression such as `TOKEN(userid)`.
    pub(super) fn wrap_key_value(&self, column: &str, value: &Value) -> CqlResult<String> {
        if let Value::Fragment(text) = value {
            if !is_identifier(column) {
                return Ok(text.clone());
            }
        }

        let table = self.bound_table()?;
        let ty = table.schema().get(column).ok_or_else(|| {
            CqlError::reference(format!(
                "Attempted to process a key that is not a part of the schema, {}, with value of {}",
                column, value
            ))
        })?;

        self.render(column, ty, value)
    }

    fn render(&self, column: &str, ty: &SchemaType, value: &Value) -> CqlResult<String> {
        let strict = self.mode.is_strict();

        if let Value::Fragment(text) = value {
            return Ok(text.clone());
        }

        match ty.params() {
            TypeParams::Scalar => {
                let text = if ty.kind() == ColumnType::Timestamp {
                    let ts = value
                        .to_timestamp()
                        .ok_or_else(|| invalid_date(column, value))?;
                    iso_timestamp(&ts)
                } else {
                    value.to_string()
                };
                Ok(ty.wrapper().wrap_literal(&text))
            }

            TypeParams::Collection(element) => {
                let Value::List(items) = value else {
                    return Ok(value.to_string());
                };
                let rendered = items
                    .iter()
                    .map(|item| {
                        if strict && !item.is_fragment() && !element.validate(item) {
                            return Err(CqlError::type_error(format!(
                                "Mismatched key type for {}. Expecting a {}",
                                column, element
                            )));
                        }
                        self.render(column, element, item)
                    })
                    .collect::<CqlResult<Vec<_>>>()?;
                Ok(ty.wrapper().wrap(&rendered.join(", ")))
            }

            TypeParams::Associative { key, value: value_ty } => {
                let mismatch = || {
                    CqlError::type_error(format!(
                        "Mismatched value type for {}. Expecting a {}",
                        column, value_ty
                    ))
                };

                // Keys arrive as strings whatever the key type, so only values are checked.
                let entry = |(k, v): &(String, Value)| -> CqlResult<String> {
                    if strict && !v.is_fragment() && !value_ty.validate(v) {
                        return Err(mismatch());
                    }
                    Ok(format!(
                        "{} : {}",
                        key.wrapper().wrap_literal(k),
                        self.render(column, value_ty, v)?
                    ))
                };

                let mut rendered = Vec::new();
                match value {
                    Value::Map(map) => {
                        for pair in map {
                            rendered.push(entry(pair)?);
                        }
                    }
                    Value::List(items) => {
                        for item in items {
                            match item {
                                Value::Map(map) => {
                                    for pair in map {
                                        rendered.push(entry(pair)?);
                                    }
                                }
                                Value::Fragment(text) => rendered.push(text.clone()),
                                _ if strict => return Err(mismatch()),
                                // Skip mode keeps stray items in place, malformed as they are.
                                other => rendered.push(quote_if_text(other)),
                            }
                        }
                    }
                    other => return Ok(other.to_string()),
                }
                Ok(ty.wrapper().wrap(&rendered.join(", ")))
            }

            TypeParams::KeySpec(_) => Ok(value.to_string()),
        }
    }
}

/// A bare column name, as opposed to an expression such as `TOKEN(id)`.
fn is_identifier(column: &str) -> bool {
    !column.is_empty() && column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn invalid_date(column: &str, value: &Value) -> CqlError {
    CqlError::type_error(format!(
        "Invalid date passed for key {}, with value of {}",
        column, value
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Table;
    use crate::config::ValidationMode;
    use crate::schema::Schema;
    use pretty_assertions::assert_eq;

    fn statement(mode: ValidationMode) -> Statement {
        let schema = Schema::builder()
            .column("id", SchemaType::uuid().primary_key())
            .column("name", SchemaType::text())
            .column("host", SchemaType::inet())
            .column("age", SchemaType::int())
            .column("born", SchemaType::timestamp())
            .column("places", SchemaType::list(SchemaType::text()))
            .column("emails", SchemaType::set(SchemaType::text()))
            .column("todo", SchemaType::map(SchemaType::timestamp(), SchemaType::text()))
            .column("scores", SchemaType::map(SchemaType::text(), SchemaType::int()))
            .column("seen", SchemaType::list(SchemaType::timestamp()))
            .build()
            .unwrap();
        Statement::with_mode(Table::new("hobbits", schema).unwrap(), mode)
    }

    #[test]
    fn test_quote_if_text() {
        assert_eq!(quote_if_text(&"fourth".into()), "'fourth'");
        assert_eq!(quote_if_text(&"it's".into()), "'it''s'");
        assert_eq!(quote_if_text(&123.into()), "123");
        assert_eq!(quote_if_text(&true.into()), "true");
    }

    #[test]
    fn test_scalars() {
        let q = statement(ValidationMode::Strict);
        assert_eq!(q.wrap_key_value("name", &"O'Fadden".into()).unwrap(), "'O''Fadden'");
        assert_eq!(q.wrap_key_value("age", &37.into()).unwrap(), "37");
        assert_eq!(q.wrap_key_value("host", &"10.0.0.1".into()).unwrap(), "'10.0.0.1'");
        assert_eq!(
            q.wrap_key_value("id", &"123e4567-e89b-12d3-a456-426614174000".into()).unwrap(),
            "123e4567-e89b-12d3-a456-426614174000"
        );
    }

    #[test]
    fn test_timestamp_coercion() {
        let q = statement(ValidationMode::Strict);
        assert_eq!(
            q.wrap_key_value("born", &1430331195154i64.into()).unwrap(),
            "'2015-04-29T18:13:15.154Z'"
        );
        let err = q.wrap_key_value("born", &"abc-xyz".into()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type error: Invalid date passed for key born, with value of abc-xyz"
        );
    }

    #[test]
    fn test_collections() {
        let q = statement(ValidationMode::Strict);
        assert_eq!(
            q.wrap_key_value("places", &vec!["rivendell", "Hell's kitchen"].into()).unwrap(),
            "['rivendell', 'Hell''s kitchen']"
        );
        assert_eq!(
            q.wrap_key_value("emails", &vec!["f@baggins.com", "baggins@gmail.com"].into())
                .unwrap(),
            "{'f@baggins.com', 'baggins@gmail.com'}"
        );
        assert_eq!(q.wrap_key_value("places", &Value::List(vec![])).unwrap(), "[]");

        let err = q
            .wrap_key_value("places", &Value::List(vec!["shire".into(), 456.into()]))
            .unwrap_err();
        assert!(
            matches!(err, CqlError::Type(ref m) if m == "Mismatched key type for places. Expecting a text")
        );
    }

    #[test]
    fn test_maps() {
        let q = statement(ValidationMode::Strict);
        let todo = Value::map([
            ("2013-9-22 12:01", "Meet patrick o'laughlin at Hell's kitchen"),
            ("2013-10-1 18:00", "Dinner"),
        ]);
        assert_eq!(
            q.wrap_key_value("todo", &todo).unwrap(),
            "{'2013-9-22 12:01' : 'Meet patrick o''laughlin at Hell''s kitchen', '2013-10-1 18:00' : 'Dinner'}"
        );

        let as_list = Value::List(vec![Value::map([("a", 1)]), Value::map([("b", 2)])]);
        assert_eq!(q.wrap_key_value("scores", &as_list).unwrap(), "{'a' : 1, 'b' : 2}");

        let err = q
            .wrap_key_value("todo", &Value::map([("2013-10-1", 5)]))
            .unwrap_err();
        assert!(
            matches!(err, CqlError::Type(ref m) if m == "Mismatched value type for todo. Expecting a text")
        );
    }

    #[test]
    fn test_unknown_column() {
        let q = statement(ValidationMode::Skip);
        let err = q.wrap_key_value("email", &"x".into()).unwrap_err();
        assert!(matches!(err, CqlError::Reference(_)));
    }

    #[test]
    fn test_fragment_requires_known_column() {
        let q = statement(ValidationMode::Strict);
        let now = Value::fragment("now()");

        let err = q.wrap_key_value("no_such_column", &now).unwrap_err();
        assert!(matches!(err, CqlError::Reference(_)));
        let err = q.verify_column("no_such_column", Some(&now)).unwrap_err();
        assert!(matches!(err, CqlError::Reference(_)));

        assert!(q.verify_column("born", Some(&Value::fragment("toTimestamp(now())"))).is_ok());
        assert_eq!(
            q.wrap_key_value("born", &Value::fragment("toTimestamp(now())")).unwrap(),
            "toTimestamp(now())"
        );
        assert_eq!(
            q.wrap_key_value("TOKEN(id)", &Value::fragment("TOKEN('x')")).unwrap(),
            "TOKEN('x')"
        );

        let skip = statement(ValidationMode::Skip);
        let err = skip.wrap_key_value("no_such_column", &now).unwrap_err();
        assert!(matches!(err, CqlError::Reference(_)));
    }

    #[test]
    fn test_plain_strings_are_validated() {
        let q = statement(ValidationMode::Strict);
        let err = q.verify_column("born", Some(&"now()".into())).unwrap_err();
        assert!(matches!(err, CqlError::Type(_)));
        let err = q.verify_column("age", Some(&"now()".into())).unwrap_err();
        assert!(matches!(err, CqlError::Type(_)));
    }

    #[test]
    fn test_fragment_elements() {
        let q = statement(ValidationMode::Strict);
        let seen = Value::List(vec![
            Value::fragment("toTimestamp(now())"),
            1430331195154i64.into(),
        ]);
        assert_eq!(
            q.wrap_key_value("seen", &seen).unwrap(),
            "[toTimestamp(now()), '2015-04-29T18:13:15.154Z']"
        );

        let scores = Value::map([("frodo", Value::fragment("blobAsInt(0x01)")), ("sam", 2.into())]);
        assert_eq!(
            q.wrap_key_value("scores", &scores).unwrap(),
            "{'frodo' : blobAsInt(0x01), 'sam' : 2}"
        );
    }

    #[test]
    fn test_verify_column() {
        let q = statement(ValidationMode::Strict);
        assert!(q.verify_column("name", None).is_ok());
        assert!(q.verify_column("age", Some(&37.into())).is_ok());

        let err = q.verify_column("email", None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Reference error: The column, email, is not found in the schema for the table, hobbits"
        );

        let err = q.verify_column("name", Some(&Value::Null)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type error: The value, null, for key, name, is invalid. Expecting text"
        );

        let err = q.verify_column("places", Some(&"shire".into())).unwrap_err();
        assert!(matches!(err, CqlError::Type(_)));
        assert!(q.verify_column("places", Some(&vec![1, 2].into())).is_ok());
    }

    #[test]
    fn test_skip_mode() {
        let q = statement(ValidationMode::Skip);
        assert!(q.verify_column("email", Some(&1.into())).is_ok());
        assert!(q.verify_column("age", Some(&"old".into())).is_ok());
        assert_eq!(
            q.wrap_key_value("places", &Value::List(vec!["shire".into(), 456.into()])).unwrap(),
            "['shire', '456']"
        );

        let mixed = Value::List(vec![Value::map([("a", 1)]), 7.into(), "b".into()]);
        assert_eq!(q.wrap_key_value("scores", &mixed).unwrap(), "{'a' : 1, 7, 'b'}");

        let strict = statement(ValidationMode::Strict);
        let err = strict.wrap_key_value("scores", &mixed).unwrap_err();
        assert!(matches!(err, CqlError::Type(_)));
    }
}
