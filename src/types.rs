//! Shared wire-format helpers used across models and request bodies

use serde::{Deserialize, Deserializer, Serializer};

/// Boolean columns travel as `0`/`1`, the same shape SQLite stores them in.
/// Input is lenient: booleans, integers, `"on"`/`"true"`/`"1"` and `null`.
pub mod flag {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    fn truthy(repr: Repr) -> bool {
        match repr {
            Repr::Bool(b) => b,
            Repr::Int(n) => n != 0,
            Repr::Text(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes"),
        }
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(Option::<Repr>::deserialize(deserializer)?.map(truthy).unwrap_or(false))
    }

    /// Nullable flag columns, e.g. client flags on a policy row without clients
    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.serialize_some(&u8::from(*v)),
                None => serializer.serialize_none(),
            }
        }
    }
}

/// Optional ISO dates where the browser sends `""` for an untouched input
pub mod blank_date {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveDateTime};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse_day(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}', expected YYYY-MM-DD", s))),
        }
    }

    /// A plain calendar day, or the day of a full timestamp
    fn parse_day(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
            .or_else(|| s.parse::<NaiveDateTime>().ok().map(|dt| dt.date()))
    }
}
