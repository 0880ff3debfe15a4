//! `deserialize_with` helpers for loosely typed source fields.
//!
//! Source documents are hand-written or produced by other tools, so a field may hold `null`, a
//! number where a string is expected, or a float where an integer is expected. These helpers
//! degrade such a field to its default instead of failing the whole unit.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode `T`, or fall back to `T::default()` when the value is null or mistyped.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let v = Value::deserialize(deserializer)?;
    Ok(T::deserialize(v).unwrap_or_default())
}

/// Text from a string, number or bool; `None` for null, arrays and objects.
pub(crate) fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(&Value::deserialize(deserializer)?))
}

/// Like [`opt_text`], with an empty string for anything that is not a scalar.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_text(deserializer)?.unwrap_or_default())
}

/// A positive ordinal from any number (`1.0` reads as `1`). Zero, negative and
/// non-numeric values read as `None`.
pub(crate) fn opt_ordinal<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(v.as_f64()
        .filter(|x| x.is_finite() && *x >= 1.0 && *x <= f64::from(u32::MAX))
        .map(|x| x as u32))
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "or_default")]
        delay: f64,
        #[serde(default, deserialize_with = "opt_text")]
        name: Option<String>,
        #[serde(default, deserialize_with = "text")]
        target: String,
        #[serde(default, deserialize_with = "opt_ordinal")]
        number: Option<u32>,
    }

    fn decode(v: Value) -> Fields {
        Fields::deserialize(&v).unwrap()
    }

    #[test]
    fn nulls_read_as_defaults() {
        let p = decode(json!({"delay": null, "name": null, "target": null, "number": null}));
        assert_eq!(p.delay, 0.0);
        assert_eq!(p.name, None);
        assert_eq!(p.target, "");
        assert_eq!(p.number, None);
    }

    #[test]
    fn mistyped_values_degrade_per_field() {
        let p = decode(json!({"delay": "soon", "name": 7, "target": ["x"], "number": 2.0}));
        assert_eq!(p.delay, 0.0);
        assert_eq!(p.name.as_deref(), Some("7"));
        assert_eq!(p.target, "");
        assert_eq!(p.number, Some(2));
    }

    #[test]
    fn ordinals_must_be_positive() {
        assert_eq!(decode(json!({"number": 0})).number, None);
        assert_eq!(decode(json!({"number": -3})).number, None);
        assert_eq!(decode(json!({"number": "1"})).number, None);
        assert_eq!(decode(json!({"number": 3})).number, Some(3));
    }

    #[test]
    fn absent_fields_use_serde_default() {
        let p = decode(json!({}));
        assert_eq!(p.delay, 0.0);
        assert!(p.name.is_none());
    }
}
