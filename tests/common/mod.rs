// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

#![allow(dead_code)]

use std::path::PathBuf;

use serde_json::json;
use tokio::fs;

pub const CLIENT: &str = "192.168.10.5:52344";
pub const SERVER: &str = "192.168.10.9:8080";

pub fn temp_path(prefix: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}_{}.{}", prefix, uuid::Uuid::new_v4(), ext))
}

/// One JSONL request record, `secs` seconds after 2025-08-31T01:27:15Z.
pub fn request(
    stream: u64,
    secs: u64,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> String {
    json!({
        "stream_id": stream,
        "timestamp": timestamp(secs),
        "src": CLIENT,
        "dst": SERVER,
        "direction": "request",
        "method": method,
        "path": path,
        "version": "HTTP/1.1",
        "headers": headers,
        "body": body,
    })
    .to_string()
}

pub fn response(
    stream: u64,
    secs: u64,
    status: u16,
    headers: &[(&str, &str)],
    body: &str,
) -> String {
    json!({
        "stream_id": stream,
        "timestamp": timestamp(secs),
        "src": SERVER,
        "dst": CLIENT,
        "direction": "response",
        "status": status,
        "version": "HTTP/1.1",
        "headers": headers,
        "body": body,
    })
    .to_string()
}

fn timestamp(secs: u64) -> String {
    format!("2025-08-31T01:27:{:02}Z", 15 + secs)
}

pub async fn write_records(prefix: &str, lines: &[String]) -> anyhow::Result<PathBuf> {
    let path = temp_path(prefix, "jsonl");
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(&path, content).await?;
    Ok(path)
}
