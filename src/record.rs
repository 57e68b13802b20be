// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Decoded HTTP message records, as produced by the decode layer.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use hyper::HeaderMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::net::SocketAddr;

/// Transport stream identifier (one TCP connection for the whole capture).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct StreamId(pub u64);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Request,
    Response,
}

/// Start-line data, tagged by message direction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "direction", rename_all = "lowercase")]
pub enum Message {
    Request {
        method: String,
        /// Request-target as sent, path plus query.
        path: String,
        /// The HTTP-version token, e.g. "HTTP/1.1".
        version: String,
    },
    Response {
        #[serde(deserialize_with = "crate::serde_helpers::status::deserialize")]
        status: u16,
        version: String,
    },
}

/// One HTTP message seen in the capture. Immutable once decoded.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PacketRecord {
    pub stream_id: StreamId,
    pub timestamp: DateTime<Utc>,
    pub src: SocketAddr,
    pub dst: SocketAddr,

    #[serde(flatten)]
    pub message: Message,

    #[serde(
        default,
        serialize_with = "crate::serde_helpers::serialize_headers",
        deserialize_with = "crate::serde_helpers::deserialize_headers"
    )]
    pub headers: HeaderMap,

    /// Decoded body bytes (after transfer/content decoding by the decode layer).
    #[serde(default, with = "crate::serde_helpers::body")]
    pub body: Bytes,

    /// `Content-Length` as reported by the decode layer, when it reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,

    /// `Content-Type` as reported by the decode layer; the header is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl PacketRecord {
    pub fn direction(&self) -> Direction {
        match self.message {
            Message::Request { .. } => Direction::Request,
            Message::Response { .. } => Direction::Response,
        }
    }

    /// Status code, for responses.
    pub fn status(&self) -> Option<u16> {
        match self.message {
            Message::Response { status, .. } => Some(status),
            Message::Request { .. } => None,
        }
    }

    /// Case-insensitive header lookup; first value wins for repeated names.
    pub fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()))
    }

    /// Whether the message declares a JSON media type.
    pub fn is_json(&self) -> bool {
        let declared = match &self.content_type {
            Some(ct) => Cow::Borrowed(ct.as_str()),
            None => match self.header("content-type") {
                Some(ct) => ct,
                None => return false,
            },
        };
        declared
            .to_ascii_lowercase()
            .contains("application/json")
    }
}
