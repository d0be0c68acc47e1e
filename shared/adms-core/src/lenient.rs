//! Serde helpers for loosely-typed upstream fields
//!
//! Upstream producers send identifiers as numbers and quantities as strings
//! depending on the source system; these accept either form.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

pub fn float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

pub fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(whole_part)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_part))
        }
        Some(Value::Bool(b)) => Some(i64::from(b)),
        _ => None,
    })
}

/// Fractions are dropped the same way for numbers and numeric text.
fn whole_part(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "super::integer")]
        count: Option<i64>,
        #[serde(default, deserialize_with = "super::float")]
        volume: Option<f64>,
        #[serde(default, deserialize_with = "super::string")]
        id: Option<String>,
    }

    fn count(value: serde_json::Value) -> Option<i64> {
        serde_json::from_value::<Sample>(json!({ "count": value })).unwrap().count
    }

    #[test]
    fn test_integer_text_and_number_agree() {
        assert_eq!(count(json!(3.7)), Some(3));
        assert_eq!(count(json!("3.7")), Some(3));
        assert_eq!(count(json!(" 12 ")), Some(12));
        assert_eq!(count(json!("many")), None);
        assert_eq!(count(json!(null)), None);
    }

    #[test]
    fn test_float_and_string_forms() {
        let sample: Sample =
            serde_json::from_value(json!({ "volume": "22.5", "id": 9164240926103102u64 })).unwrap();
        assert_eq!(sample.volume, Some(22.5));
        assert_eq!(sample.id.as_deref(), Some("9164240926103102"));
    }
}
