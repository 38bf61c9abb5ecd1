//! Serde helpers for Google API JSON, which encodes 64-bit integers as
//! decimal strings.

use serde::{de, Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Int64Repr {
    Text(String),
    Number(i64),
}

pub(crate) fn deserialize_opt_int64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Int64Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Int64Repr::Number(n)) => Ok(Some(n)),
        Some(Int64Repr::Text(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(u64),
}

/// Resource ids arrive as uint64 strings; numbers are tolerated.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match IdRepr::deserialize(deserializer)? {
        IdRepr::Text(s) => Ok(s),
        IdRepr::Number(n) => Ok(n.to_string()),
    }
}
