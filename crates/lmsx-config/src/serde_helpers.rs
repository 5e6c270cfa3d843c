//! Field deserializers shared by the config sections.

use std::fmt;

use serde::Deserializer;
use serde::de::{self, Visitor};

/// Deserialize a string that may arrive as a number or boolean.
///
/// Figment parses environment values, so `LMSX_MYSQL__PASSWORD=12345678`
/// reaches the struct as an integer. The value is rendered back to text.
/// Leading zeros and float formatting are not recoverable once parsed.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientVisitor;

    impl Visitor<'_> for LenientVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number or boolean")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_char<E>(self, value: char) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i128<E>(self, value: i128) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u128<E>(self, value: u128) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(LenientVisitor)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "lenient_string")]
        value: String,
    }

    #[test]
    fn accepts_scalars_as_text() {
        let cases = [
            (r#"{"value": "reader"}"#, "reader"),
            (r#"{"value": 12345678}"#, "12345678"),
            (r#"{"value": -4}"#, "-4"),
            (r#"{"value": true}"#, "true"),
            (r#"{"value": 2.5}"#, "2.5"),
            ("{}", ""),
        ];
        for (json, expected) in cases {
            let holder: Holder = serde_json::from_str(json).expect("deserializes");
            assert_eq!(holder.value, expected, "input {json}");
        }
    }

    #[test]
    fn rejects_structured_values() {
        assert!(serde_json::from_str::<Holder>(r#"{"value": [1]}"#).is_err());
        assert!(serde_json::from_str::<Holder>(r#"{"value": {"a": 1}}"#).is_err());
    }
}
