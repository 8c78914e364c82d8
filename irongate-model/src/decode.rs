/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Per-field decode helpers over a generic property map.
//!
//! The decode contract, shared by every entity type:
//! - a required field that is absent (or JSON null) is a hard
//!   [`DecodeError::MissingField`] carrying the full nested path;
//! - an absent optional field resolves to `None`, never a silent default;
//! - a present field with the wrong shape is [`DecodeError::InvalidField`];
//! - list-valued fields default to an empty sequence when absent (large
//!   collections may be intentionally omitted by the sender);
//! - nested records decode recursively, reporting `parent.child[i].field`
//!   style paths.

use chrono::{DateTime, Utc};
use irongate_core::error::DecodeError;
use irongate_core::types::Snowflake;
use serde_json::{Map, Value};

/// Joins a parent path and a field name into a full path.
pub(crate) fn join(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{path}.{field}")
    }
}

/// Interprets a value as an object map.
pub(crate) fn object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, DecodeError> {
    value.as_object().ok_or_else(|| DecodeError::InvalidField {
        field: if path.is_empty() { "<root>".to_string() } else { path.to_string() },
        reason: "expected an object".to_string(),
    })
}

/// Returns the field value if present and non-null.
fn present<'a>(map: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    map.get(field).filter(|v| !v.is_null())
}

/// Returns a required field value. Absent or null is a hard failure.
pub(crate) fn req<'a>(
    map: &'a Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<&'a Value, DecodeError> {
    present(map, field).ok_or_else(|| DecodeError::MissingField(join(path, field)))
}

fn invalid(path: &str, field: &str, expected: &str) -> DecodeError {
    DecodeError::InvalidField {
        field: join(path, field),
        reason: format!("expected {expected}"),
    }
}

/// Required string field.
pub(crate) fn req_str<'a>(
    map: &'a Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<&'a str, DecodeError> {
    req(map, field, path)?
        .as_str()
        .ok_or_else(|| invalid(path, field, "a string"))
}

/// Optional string field.
pub(crate) fn opt_str(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<Option<String>, DecodeError> {
    match present(map, field) {
        None => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| invalid(path, field, "a string")),
    }
}

/// Required unsigned integer field.
pub(crate) fn req_u64(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<u64, DecodeError> {
    req(map, field, path)?
        .as_u64()
        .ok_or_else(|| invalid(path, field, "an unsigned integer"))
}

/// Optional unsigned integer field.
pub(crate) fn opt_u64(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<Option<u64>, DecodeError> {
    match present(map, field) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| invalid(path, field, "an unsigned integer")),
    }
}

/// Required small-integer field, range-checked into `u8`.
pub(crate) fn req_u8(map: &Map<String, Value>, field: &str, path: &str) -> Result<u8, DecodeError> {
    let raw = req_u64(map, field, path)?;
    u8::try_from(raw).map_err(|_| DecodeError::InvalidField {
        field: join(path, field),
        reason: format!("value {raw} out of range"),
    })
}

/// Optional signed integer field.
pub(crate) fn opt_i64(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<Option<i64>, DecodeError> {
    match present(map, field) {
        None => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid(path, field, "an integer")),
    }
}

/// Required boolean field.
pub(crate) fn req_bool(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<bool, DecodeError> {
    req(map, field, path)?
        .as_bool()
        .ok_or_else(|| invalid(path, field, "a boolean"))
}

/// Optional boolean field.
pub(crate) fn opt_bool(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<Option<bool>, DecodeError> {
    match present(map, field) {
        None => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| invalid(path, field, "a boolean")),
    }
}

/// Required snowflake field, parsed from its decimal wire form.
pub(crate) fn req_snowflake(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<Snowflake, DecodeError> {
    Snowflake::from_wire(req(map, field, path)?, &join(path, field))
}

/// Optional snowflake field.
pub(crate) fn opt_snowflake(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<Option<Snowflake>, DecodeError> {
    match present(map, field) {
        None => Ok(None),
        Some(v) => Snowflake::from_wire(v, &join(path, field)).map(Some),
    }
}

/// Flag bits that arrive either as an unsigned integer or as a decimal
/// string (the wire is inconsistent for permission sets).
pub(crate) fn req_bits(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<u64, DecodeError> {
    let value = req(map, field, path)?;
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| invalid(path, field, "an unsigned integer or decimal string"))
}

/// Optional RFC 3339 timestamp field.
pub(crate) fn opt_timestamp(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<Option<DateTime<Utc>>, DecodeError> {
    match opt_str(map, field, path)? {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| DecodeError::InvalidField {
                field: join(path, field),
                reason: format!("invalid timestamp: {e}"),
            }),
    }
}

/// List of plain strings, defaulting to empty when absent.
pub(crate) fn str_list(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<Vec<String>, DecodeError> {
    list_of(map, field, path, |v, elem_path| {
        v.as_str()
            .map(ToString::to_string)
            .ok_or_else(|| DecodeError::InvalidField {
                field: elem_path.to_string(),
                reason: "expected a string".to_string(),
            })
    })
}

/// List of snowflakes, defaulting to empty when absent.
pub(crate) fn snowflake_list(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<Vec<Snowflake>, DecodeError> {
    list_of(map, field, path, |v, elem_path| {
        Snowflake::from_wire(v, elem_path)
    })
}

/// Decodes a list-valued field element by element.
///
/// An absent field yields an empty ordered sequence. Any element failure
/// aborts the whole decode, reporting the element's `field[i]` path.
pub(crate) fn list_of<T>(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
    decode_elem: impl Fn(&Value, &str) -> Result<T, DecodeError>,
) -> Result<Vec<T>, DecodeError> {
    let Some(value) = present(map, field) else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| invalid(path, field, "an array"))?;

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let elem_path = format!("{}[{i}]", join(path, field));
        out.push(decode_elem(item, &elem_path)?);
    }
    Ok(out)
}
