// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Access-log field extraction from an exchange pair.

use crate::endpoint::Endpoints;
use crate::mask::MaskRules;
use crate::pairing::ExchangePair;
use crate::record::{Message, PacketRecord};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Everything a log line needs, with `None` where the capture had no data.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessFields {
    pub endpoints: Endpoints,
    pub time: DateTime<Utc>,
    pub request_line: Option<String>,
    pub status: Option<u16>,
    pub bytes: Option<u64>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    /// Masked request body; `Null` when the request is absent.
    pub request_body: Value,
    /// Masked response body; `Null` when the response is absent.
    pub response_body: Value,
}

impl AccessFields {
    pub fn extract(pair: &ExchangePair, rules: &MaskRules) -> Self {
        let request = pair.request();
        let response = pair.response();

        let primary = pair.primary();

        let endpoints = match (request, response) {
            (Some(req), Some(res)) => {
                let (from_req, from_res) = (Endpoints::of(req), Endpoints::of(res));
                if from_req != from_res {
                    tracing::warn!(
                        stream = %req.stream_id,
                        request = %from_req,
                        response = %from_res,
                        "paired request and response disagree on addressing, using request"
                    );
                }
                from_req
            }
            _ => Endpoints::of(primary),
        };

        Self {
            endpoints,
            time: primary.timestamp,
            request_line: request.and_then(request_line),
            status: response.and_then(PacketRecord::status),
            bytes: response.map(response_size),
            referer: request
                .and_then(|r| r.header("referer"))
                .map(|v| v.into_owned()),
            user_agent: request
                .and_then(|r| r.header("user-agent"))
                .map(|v| v.into_owned()),
            request_body: request.map_or(Value::Null, |r| body_value(r, rules)),
            response_body: response.map_or(Value::Null, |r| body_value(r, rules)),
        }
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

/// `METHOD PATH HTTP/VERSION` for a request record.
pub fn request_line(record: &PacketRecord) -> Option<String> {
    match &record.message {
        Message::Request {
            method,
            path,
            version,
        } => {
            let path = if path.is_empty() { "/" } else { path.as_str() };
            Some(format!("{} {} {}", or_dash(method), path, or_dash(version)))
        }
        Message::Response { .. } => None,
    }
}

/// `%b`: numeric Content-Length wins, even when it disagrees with the body.
pub fn response_size(record: &PacketRecord) -> u64 {
    record
        .content_length
        .or_else(|| {
            record
                .header("content-length")
                .and_then(|v| v.trim().parse::<u64>().ok())
        })
        .unwrap_or(record.body.len() as u64)
}

/// Parsed and masked JSON when the body is JSON, otherwise its text as a string.
pub fn body_value(record: &PacketRecord, rules: &MaskRules) -> Value {
    match serde_json::from_slice::<Value>(&record.body) {
        Ok(v) => rules.apply(&v),
        Err(_) => Value::String(String::from_utf8_lossy(&record.body).into_owned()),
    }
}
