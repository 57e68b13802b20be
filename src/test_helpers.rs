// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Shared test utilities to reduce duplication across test modules.

use crate::record::{Message, PacketRecord, StreamId};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hyper::header::{HeaderName, HeaderValue};
use hyper::HeaderMap;
use std::net::SocketAddr;

pub const TEST_CLIENT: &str = "10.0.0.1:50000";
pub const TEST_SERVER: &str = "10.0.0.2:8080";
/// 31/Aug/2025:01:27:15 +0000
pub const TEST_EPOCH: i64 = 1_756_603_635;

pub fn test_time(offset_secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(TEST_EPOCH + offset_secs, 0).expect("valid test time")
}

pub fn make_headers_from_pairs(pairs: &[(&str, &str)]) -> HeaderMap {
    let mut hm = HeaderMap::new();
    for (k, v) in pairs {
        let name = HeaderName::from_bytes(k.as_bytes()).expect("valid test header name");
        let value = HeaderValue::from_str(v).expect("valid test header value");
        hm.append(name, value);
    }
    hm
}

fn addr(s: &str) -> SocketAddr {
    s.parse().expect("valid test address")
}

/// Request from `TEST_CLIENT` to `TEST_SERVER` on the given stream.
pub fn make_request(
    stream: u64,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> PacketRecord {
    PacketRecord {
        stream_id: StreamId(stream),
        timestamp: test_time(0),
        src: addr(TEST_CLIENT),
        dst: addr(TEST_SERVER),
        message: Message::Request {
            method: method.to_string(),
            path: path.to_string(),
            version: "HTTP/1.1".to_string(),
        },
        headers: make_headers_from_pairs(headers),
        body: Bytes::from(body.to_string()),
        content_length: None,
        content_type: None,
    }
}

/// Response from `TEST_SERVER` back to `TEST_CLIENT` on the given stream.
pub fn make_response(
    stream: u64,
    status: u16,
    headers: &[(&str, &str)],
    body: &str,
) -> PacketRecord {
    PacketRecord {
        stream_id: StreamId(stream),
        timestamp: test_time(1),
        src: addr(TEST_SERVER),
        dst: addr(TEST_CLIENT),
        message: Message::Response {
            status,
            version: "HTTP/1.1".to_string(),
        },
        headers: make_headers_from_pairs(headers),
        body: Bytes::from(body.to_string()),
        content_length: None,
        content_type: None,
    }
}

/// Unique temp path with the given prefix and extension.
pub fn make_temp_path(prefix: &str, ext: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("{}_{}.{}", prefix, uuid::Uuid::new_v4(), ext))
}
