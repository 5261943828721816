//! Tolerant JSON decoding for entities whose wire types are unreliable.
//!
//! # Design
//! The upstream API sends explicit `null` for absent values and switches some
//! numeric fields between JSON numbers and JSON strings. Instead of failing
//! the whole response on such quirks, each tolerant entity publishes a table
//! of `FieldSpec`s. `decode_object` walks that table once per object:
//!
//! - absent or `null` keys leave the slot at `None`;
//! - present values are coerced according to the slot's `Coercion`;
//! - a failed coercion leaves the slot at `None` and records a `Diagnostic`.
//!
//! Only a body that is not a JSON object at all is a hard error. Callers get
//! the diagnostics back in `Decoded` and can opt into strict handling with
//! `Decoded::into_strict`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::time_format;

/// A field that was present on the wire but could not be coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub field: String,
    pub raw: Value,
    pub reason: String,
}

/// Expected wire representation and typed slot for one field.
pub enum Coercion<T> {
    /// Required integer identifier. Stays `0` when missing.
    Id(fn(&mut T) -> &mut i64),
    /// JSON number holding an integer.
    Integer(fn(&mut T) -> &mut Option<i64>),
    /// JSON string holding a decimal number. A bare JSON number is accepted too.
    NumericString(fn(&mut T) -> &mut Option<f64>),
    Text(fn(&mut T) -> &mut Option<String>),
    /// `YYYY-MM-DD` string.
    Date(fn(&mut T) -> &mut Option<NaiveDate>),
    /// RFC 3339 timestamp string.
    DateTime(fn(&mut T) -> &mut Option<DateTime<Utc>>),
    /// Nested JSON object, handed to the nested entity's own decoder.
    Object(fn(&mut T, Value) -> Result<(), serde_json::Error>),
}

impl<T> Coercion<T> {
    pub fn wire_kind(&self) -> &'static str {
        match self {
            Coercion::Id(_) | Coercion::Integer(_) => "integer",
            Coercion::NumericString(_) => "numeric string",
            Coercion::Text(_) => "string",
            Coercion::Date(_) => "date string",
            Coercion::DateTime(_) => "datetime string",
            Coercion::Object(_) => "object",
        }
    }
}

pub struct FieldSpec<T> {
    pub name: &'static str,
    pub coercion: Coercion<T>,
}

/// An entity decoded field by field from a coercion table.
pub trait TolerantDecode: Default + Sized + 'static {
    /// Entity name used in log output.
    const ENTITY: &'static str;
    const FIELDS: &'static [FieldSpec<Self>];
}

/// A decoded entity together with the anomalies skipped along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Decoded<T> {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    /// Reject the value if any field had to be skipped.
    pub fn into_strict(self) -> Result<T, ApiError> {
        if self.diagnostics.is_empty() {
            Ok(self.value)
        } else {
            Err(ApiError::InvalidFields(self.diagnostics))
        }
    }
}

/// Decode a raw response body. Fails only when the body is not a JSON object.
pub fn decode_tolerant<T: TolerantDecode>(body: &[u8]) -> Result<Decoded<T>, ApiError> {
    let map: Map<String, Value> =
        serde_json::from_slice(body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
    Ok(decode_object(&map))
}

/// Decode an already parsed JSON object. Never fails.
pub fn decode_object<T: TolerantDecode>(map: &Map<String, Value>) -> Decoded<T> {
    let mut value = T::default();
    let mut diagnostics = Vec::new();

    for spec in T::FIELDS {
        let raw = match map.get(spec.name) {
            None | Some(Value::Null) => {
                if let Coercion::Id(_) = spec.coercion {
                    diagnostics.push(Diagnostic {
                        field: spec.name.to_string(),
                        raw: Value::Null,
                        reason: "missing required identifier".to_string(),
                    });
                }
                continue;
            }
            Some(raw) => raw,
        };

        if let Err(reason) = apply(&mut value, spec, raw) {
            diagnostics.push(Diagnostic {
                field: spec.name.to_string(),
                raw: raw.clone(),
                reason,
            });
        }
    }

    Decoded { value, diagnostics }
}

/// Decode an optional object found under `field` of a parent entity. Its
/// diagnostics are reported as `field.<name>`; a non-object value is a
/// diagnostic on `field` itself.
pub fn decode_nested<T: TolerantDecode>(field: &str, raw: Option<Value>) -> Decoded<Option<T>> {
    match raw {
        None | Some(Value::Null) => Decoded {
            value: None,
            diagnostics: Vec::new(),
        },
        Some(Value::Object(map)) => {
            let decoded = decode_object::<T>(&map);
            Decoded {
                value: Some(decoded.value),
                diagnostics: prefix_diagnostics(field, decoded.diagnostics),
            }
        }
        Some(other) => Decoded {
            value: None,
            diagnostics: vec![Diagnostic {
                field: field.to_string(),
                reason: mismatch("object", &other),
                raw: other,
            }],
        },
    }
}

/// Rewrite each diagnostic's field as `prefix.<field>`.
pub fn prefix_diagnostics(prefix: &str, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| Diagnostic {
            field: format!("{prefix}.{}", d.field),
            ..d
        })
        .collect()
}

fn apply<T>(target: &mut T, spec: &FieldSpec<T>, raw: &Value) -> Result<(), String> {
    match &spec.coercion {
        Coercion::Id(slot) => *slot(target) = as_integer(raw)?,
        Coercion::Integer(slot) => *slot(target) = Some(as_integer(raw)?),
        Coercion::NumericString(slot) => *slot(target) = Some(as_numeric_string(raw)?),
        Coercion::Text(slot) => *slot(target) = Some(as_text(raw, "string")?.to_owned()),
        Coercion::Date(slot) => {
            let text = as_text(raw, "date string")?;
            let date = time_format::parse_date(text).map_err(|e| format!("invalid date: {e}"))?;
            *slot(target) = Some(date);
        }
        Coercion::DateTime(slot) => {
            let text = as_text(raw, "datetime string")?;
            let dt =
                time_format::parse_datetime(text).map_err(|e| format!("invalid datetime: {e}"))?;
            *slot(target) = Some(dt);
        }
        Coercion::Object(assign) => {
            if !raw.is_object() {
                return Err(mismatch("object", raw));
            }
            assign(target, raw.clone()).map_err(|e| format!("invalid nested object: {e}"))?;
        }
    }
    Ok(())
}

fn as_integer(raw: &Value) -> Result<i64, String> {
    raw.as_i64().ok_or_else(|| mismatch("integer", raw))
}

fn as_text<'a>(raw: &'a Value, expected: &str) -> Result<&'a str, String> {
    raw.as_str().ok_or_else(|| mismatch(expected, raw))
}

fn as_numeric_string(raw: &Value) -> Result<f64, String> {
    let number = match raw {
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid number {text:?}: {e}"))?,
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| mismatch("numeric string", raw))?,
        other => return Err(mismatch("numeric string", other)),
    };
    if !number.is_finite() {
        return Err(format!("{number} is not a finite number"));
    }
    Ok(number)
}

fn mismatch(expected: &str, raw: &Value) -> String {
    let found = match raw {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    format!("expected {expected}, found {found}")
}

pub(crate) fn log_diagnostics(entity: &str, diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        tracing::warn!(
            entity,
            field = %d.field,
            raw = %d.raw,
            reason = %d.reason,
            "skipped field during tolerant decode"
        );
    }
}

/// serde entry point for tolerant entities nested inside structurally
/// decoded ones. Anomalies are only logged here; response parsers use
/// `decode_nested` to keep them.
pub fn deserialize_tolerant<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TolerantDecode,
{
    let map = Map::<String, Value>::deserialize(deserializer)?;
    let decoded = decode_object::<T>(&map);
    log_diagnostics(T::ENTITY, &decoded.diagnostics);
    Ok(decoded.value)
}

/// `deserialize_with` helper: a nested object that fails to decode becomes
/// `None` instead of failing its parent. Pair with `#[serde(default)]`.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            tracing::warn!(error = %err, "dropped nested object that failed to decode");
            Ok(None)
        }
    }
}
