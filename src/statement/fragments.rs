//! Fragment helpers: `COUNT`, `TOKEN` and `AS`.
//!
//! Each helper returns a [`Fragment`] to pass into another clause; the
//! `with_*` variants append it to the statement instead.

use super::{Fragment, Statement, quote_if_text};
use crate::error::CqlResult;
use crate::value::Value;

impl Statement {
    /// `COUNT(expr)`.
    pub fn count(&self, expr: impl AsRef<str>) -> Fragment {
        Fragment(format!("COUNT({})", expr.as_ref()))
    }

    pub fn with_count(&mut self, expr: impl AsRef<str>) -> &mut Self {
        let fragment = self.count(expr);
        self.push(fragment.as_str())
    }

    /// `TOKEN(column)`; the column must exist in the schema.
    pub fn column_token(&self, column: impl AsRef<str>) -> CqlResult<Fragment> {
        let column = column.as_ref();
        self.verify_column(column, None)?;
        Ok(Fragment(format!("TOKEN({})", column)))
    }

    pub fn with_column_token(&mut self, column: impl AsRef<str>) -> CqlResult<&mut Self> {
        let fragment = self.column_token(column)?;
        Ok(self.push(fragment.as_str()))
    }

    /// `TOKEN(value)`, quoting text values.
    pub fn value_token(&self, value: impl Into<Value>) -> Fragment {
        Fragment(format!("TOKEN({})", quote_if_text(&value.into())))
    }

    pub fn with_value_token(&mut self, value: impl Into<Value>) -> &mut Self {
        let fragment = self.value_token(value);
        self.push(fragment.as_str())
    }

    /// `column AS alias`; the column must exist in the schema.
    pub fn alias(&self, column: impl AsRef<str>, alias: impl AsRef<str>) -> CqlResult<Fragment> {
        let column = column.as_ref();
        self.verify_column(column, None)?;
        Ok(Fragment(format!("{} AS {}", column, alias.as_ref())))
    }

    pub fn with_alias(
        &mut self,
        column: impl AsRef<str>,
        alias: impl AsRef<str>,
    ) -> CqlResult<&mut Self> {
        let fragment = self.alias(column, alias)?;
        Ok(self.push(fragment.as_str()))
    }
}
