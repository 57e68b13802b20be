// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Combined-log line rendering.
//!
//! ```text
//! %h %l %u %t "%r" %>s %b "%{Referer}i" "%{User-agent}i" src_ip:src_port dst_ip:dst_port <REQ_JSON> <RES_JSON>
//! ```
//!
//! Every unavailable field renders as `-`, quoted fields are escaped so they
//! can never contain a bare `"`, and both JSON fields are compact, so one
//! exchange is always exactly one line.

use crate::clf_time::format_clf;
use crate::extract::AccessFields;
use serde_json::Value;
use std::fmt::Write;

pub fn format_line(fields: &AccessFields) -> String {
    let mut line = String::with_capacity(256);
    let _ = write!(
        line,
        "{} - - {} \"{}\" {} {} \"{}\" \"{}\" {} {} {}",
        fields.endpoints.client.ip(),
        format_clf(&fields.time),
        escape_quoted(fields.request_line.as_deref()),
        dash(fields.status),
        dash(fields.bytes),
        escape_quoted(fields.referer.as_deref()),
        escape_quoted(fields.user_agent.as_deref()),
        fields.endpoints,
        compact_json(&fields.request_body),
        compact_json(&fields.response_body),
    );
    line
}

fn dash<T: ToString>(v: Option<T>) -> String {
    v.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Apache-style escaping for the quoted fields; `None` and empty become `-`.
pub fn escape_quoted(value: Option<&str>) -> String {
    let s = match value {
        Some(s) if !s.is_empty() => s,
        _ => return "-".to_string(),
    };
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() && (c as u32) < 0x80 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Single-line JSON. serde_json escapes control characters inside strings.
pub fn compact_json(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Endpoints;
    use crate::test_helpers::test_time;
    use rstest::rstest;
    use serde_json::json;

    fn sample() -> AccessFields {
        AccessFields {
            endpoints: Endpoints::new(
                "10.0.0.1:50000".parse().expect("addr"),
                "10.0.0.2:8080".parse().expect("addr"),
            ),
            time: test_time(0),
            request_line: Some("POST /api/orders HTTP/1.1".into()),
            status: Some(201),
            bytes: Some(37),
            referer: None,
            user_agent: Some("curl/8.5.0".into()),
            request_body: json!({"user": "alice", "password": "******"}),
            response_body: json!({"result": "created", "order_id": 7441}),
        }
    }

    #[test]
    fn formats_full_line() {
        assert_eq!(
            format_line(&sample()),
            r#"10.0.0.1 - - [31/Aug/2025:01:27:15 +0000] "POST /api/orders HTTP/1.1" 201 37 "-" "curl/8.5.0" 10.0.0.1:50000 10.0.0.2:8080 {"password":"******","user":"alice"} {"order_id":7441,"result":"created"}"#
        );
    }

    #[test]
    fn missing_fields_render_as_dash() {
        let mut f = sample();
        f.request_line = None;
        f.status = None;
        f.bytes = None;
        f.user_agent = Some(String::new());
        f.request_body = Value::Null;
        f.response_body = Value::Null;
        assert_eq!(
            format_line(&f),
            r#"10.0.0.1 - - [31/Aug/2025:01:27:15 +0000] "-" - - "-" "-" 10.0.0.1:50000 10.0.0.2:8080 null null"#
        );
    }

    #[test]
    fn multiline_bodies_stay_on_one_line() {
        let mut f = sample();
        f.request_body = json!("first\nsecond\r\n");
        f.response_body = json!({"msg": "a\nb"});
        let line = format_line(&f);
        assert!(!line.contains('\n'));
        assert!(!line.contains('\r'));
        assert!(line.ends_with(r#""first\nsecond\r\n" {"msg":"a\nb"}"#));
    }

    #[rstest]
    #[case(None, "-")]
    #[case(Some(""), "-")]
    #[case(Some("Mozilla/5.0"), "Mozilla/5.0")]
    #[case(Some("say \"hi\""), "say \\\"hi\\\"")]
    #[case(Some("back\\slash"), "back\\\\slash")]
    #[case(Some("tab\there"), "tab\\x09here")]
    #[case(Some("caf\u{e9}"), "caf\u{e9}")]
    fn escape_quoted_cases(#[case] input: Option<&str>, #[case] expected: &str) {
        assert_eq!(escape_quoted(input), expected);
    }

    #[test]
    fn ipv6_client_host_is_bare_address() {
        let mut f = sample();
        f.endpoints = Endpoints::new(
            "[2001:db8::1]:40000".parse().expect("addr"),
            "[2001:db8::2]:8080".parse().expect("addr"),
        );
        assert!(format_line(&f).starts_with("2001:db8::1 - - "));
    }
}
