//! Column type expression parser using nom.
//!
//! Schema files declare column types as text:
//!
//! ```text
//! text
//! list<text>
//! map<text, list<int>>
//! uuid primary key
//! ```

use nom::{
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::opt,
    multi::separated_list1,
    sequence::{delimited, preceded, tuple},
    IResult,
};

use crate::error::{CqlError, CqlResult};
use crate::types::SchemaType;

/// A type expression before names are resolved.
#[derive(Debug)]
struct RawType<'a> {
    name: &'a str,
    params: Vec<RawType<'a>>,
}

/// Parse a complete column type expression, with an optional trailing
/// `primary key` marker.
pub fn parse_type(input: &str) -> CqlResult<SchemaType> {
    match parse_column(input) {
        Ok(("", (raw, primary))) => {
            let ty = resolve(&raw, input)?;
            Ok(if primary { ty.primary_key() } else { ty })
        }
        Ok((remaining, _)) => Err(CqlError::parse(
            input.len() - remaining.len(),
            format!("Unexpected trailing content: '{}'", remaining),
        )),
        Err(e) => Err(CqlError::parse(0, format!("Parse failed: {:?}", e))),
    }
}

fn parse_column(input: &str) -> IResult<&str, (RawType<'_>, bool)> {
    let (input, raw) = parse_raw(input)?;
    let (input, primary) = opt(tuple((
        tag_no_case("primary"),
        multispace1,
        tag_no_case("key"),
    )))(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, (raw, primary.is_some())))
}

fn parse_raw(input: &str) -> IResult<&str, RawType<'_>> {
    let (input, _) = multispace0(input)?;
    let (input, name) = parse_identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, params) = opt(delimited(
        char('<'),
        separated_list1(char(','), parse_raw),
        preceded(multispace0, char('>')),
    ))(input)?;
    let (input, _) = multispace0(input)?;
    Ok((
        input,
        RawType {
            name,
            params: params.unwrap_or_default(),
        },
    ))
}

fn parse_identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn resolve(raw: &RawType<'_>, source: &str) -> CqlResult<SchemaType> {
    let position = raw.name.as_ptr() as usize - source.as_ptr() as usize;
    let arity = |expected: usize| -> CqlResult<()> {
        if raw.params.len() == expected {
            Ok(())
        } else {
            Err(CqlError::parse(
                position,
                format!(
                    "'{}' expects {} type parameter(s), found {}",
                    raw.name,
                    expected,
                    raw.params.len()
                ),
            ))
        }
    };

    match raw.name.to_ascii_lowercase().as_str() {
        "list" => {
            arity(1)?;
            Ok(SchemaType::list(resolve(&raw.params[0], source)?))
        }
        "set" => {
            arity(1)?;
            Ok(SchemaType::set(resolve(&raw.params[0], source)?))
        }
        "map" => {
            arity(2)?;
            Ok(SchemaType::map(
                resolve(&raw.params[0], source)?,
                resolve(&raw.params[1], source)?,
            ))
        }
        name => {
            let ty = SchemaType::named(name).ok_or_else(|| {
                CqlError::parse(position, format!("Unknown column type '{}'", raw.name))
            })?;
            arity(0)?;
            Ok(ty)
        }
    }
}
