// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Serde helpers for record headers and bodies.
//!
//! Headers are written as an ordered list of `[name, value]` pairs so repeated
//! names survive a round trip. Bodies are written as text.

use hyper::header::{HeaderName, HeaderValue};
use hyper::HeaderMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize_headers<S>(hm: &HeaderMap, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let pairs: Vec<(&str, String)> = hm
        .iter()
        .map(|(k, v)| (k.as_str(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();
    pairs.serialize(serializer)
}

pub fn deserialize_headers<'de, D>(deserializer: D) -> Result<HeaderMap, D::Error>
where
    D: Deserializer<'de>,
{
    let pairs = Vec::<(String, String)>::deserialize(deserializer)?;
    let mut hm = HeaderMap::with_capacity(pairs.len());
    for (k, v) in pairs {
        let name = k.parse::<HeaderName>().map_err(serde::de::Error::custom)?;
        let val = HeaderValue::from_bytes(v.as_bytes()).map_err(serde::de::Error::custom)?;
        hm.append(name, val);
    }
    Ok(hm)
}

pub mod body {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&String::from_utf8_lossy(body))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Bytes::from(s))
    }
}

/// Response status read through [`serde_json::Number`].
///
/// Numbers inside flattened or tagged content reach the deserializer buffered,
/// which only `Number` itself can read back when numbers keep their precision.
pub mod status {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u16, D::Error>
    where
        D: Deserializer<'de>,
    {
        let n = serde_json::Number::deserialize(deserializer)?;
        n.as_u64()
            .and_then(|v| u16::try_from(v).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid status code {}", n)))
    }
}
