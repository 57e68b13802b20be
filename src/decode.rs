// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Decoded-packet sources.
//!
//! Two interchangeable producers of [`PacketRecord`]s in capture order:
//! a `tshark` child process reading a capture file, and a JSONL file of
//! records that were decoded earlier.

use crate::clf_time::parse_epoch;
use crate::record::{Message, PacketRecord, StreamId};
use anyhow::Context;
use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::HeaderMap;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

/// Separates repeated occurrences of one field (e.g. header lines).
pub const AGGREGATOR: char = '\u{1f}';

/// Fields requested from tshark, in output column order.
pub const TSHARK_FIELDS: &[&str] = &[
    "frame.time_epoch",
    "tcp.stream",
    "ip.src",
    "ipv6.src",
    "tcp.srcport",
    "ip.dst",
    "ipv6.dst",
    "tcp.dstport",
    "http.request.method",
    "http.request.uri",
    "http.request.version",
    "http.response.code",
    "http.response.version",
    "http.content_length_header",
    "http.content_type",
    "http.request.line",
    "http.response.line",
    // Last, so a body containing tabs stays in one column.
    "http.file_data",
];

const F_TIME: usize = 0;
const F_STREAM: usize = 1;
const F_IP_SRC: usize = 2;
const F_IP6_SRC: usize = 3;
const F_SRC_PORT: usize = 4;
const F_IP_DST: usize = 5;
const F_IP6_DST: usize = 6;
const F_DST_PORT: usize = 7;
const F_METHOD: usize = 8;
const F_URI: usize = 9;
const F_REQ_VERSION: usize = 10;
const F_STATUS: usize = 11;
const F_RES_VERSION: usize = 12;
const F_CONTENT_LENGTH: usize = 13;
const F_CONTENT_TYPE: usize = 14;
const F_REQ_LINES: usize = 15;
const F_RES_LINES: usize = 16;
const F_BODY: usize = 17;

/// Every HTTP message is decoded; the JSON content-type selection happens
/// after pairing so a skipped message never shifts a stream's queue.
pub const DISPLAY_FILTER: &str = "http.request || http.response";

/// How the decode layer is invoked.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub tshark: String,
    pub decode_ports: Vec<u16>,
    /// Keep only exchanges where either side declares JSON.
    pub content_type_filter: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            tshark: "tshark".to_string(),
            decode_ports: Vec::new(),
            content_type_filter: true,
        }
    }
}

/// Arguments for a single tshark pass over `input`.
pub fn tshark_args(input: &Path, opts: &DecodeOptions) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-r".into(),
        input.to_string_lossy().into_owned(),
        "-n".into(),
        "-o".into(),
        "tcp.desegment_tcp_streams:TRUE".into(),
        "-o".into(),
        "http.desegment_body:TRUE".into(),
        "-o".into(),
        "http.decompress_body:TRUE".into(),
    ];
    for port in &opts.decode_ports {
        args.push("-d".into());
        args.push(format!("tcp.port=={},http", port));
    }
    args.push("-Y".into());
    args.push(DISPLAY_FILTER.into());
    args.extend(
        [
            "-T",
            "fields",
            "-E",
            "header=n",
            "-E",
            "separator=/t",
            "-E",
            "quote=n",
            "-E",
            "occurrence=a",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args.push("-E".into());
    args.push(format!("aggregator={}", AGGREGATOR));
    for field in TSHARK_FIELDS {
        args.push("-e".into());
        args.push(field.to_string());
    }
    args
}

fn first(field: &str) -> &str {
    field.split(AGGREGATOR).next().unwrap_or("").trim()
}

fn occurrences(field: &str) -> usize {
    field.split(AGGREGATOR).filter(|v| !v.trim().is_empty()).count()
}

fn parse_addr(v4: &str, v6: &str, port: &str) -> anyhow::Result<SocketAddr> {
    let ip = if first(v4).is_empty() { first(v6) } else { first(v4) };
    let ip: IpAddr = ip
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid address '{}': {}", ip, e))?;
    let port: u16 = first(port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid port '{}': {}", port, e))?;
    Ok(SocketAddr::new(ip, port))
}

/// Parse header lines such as `Content-Type: application/json\r\n`.
///
/// tshark prints the line terminator escaped, so both the escaped and the raw
/// form are stripped. Lines that are not valid headers are skipped.
pub fn parse_header_lines(raw: &str) -> HeaderMap {
    let mut hm = HeaderMap::new();
    for line in raw.split(AGGREGATOR) {
        let line = line
            .trim_end_matches("\\r\\n")
            .trim_end_matches("\\n")
            .trim_end_matches(['\r', '\n']);
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = match HeaderName::from_bytes(name.trim().as_bytes()) {
            Ok(n) => n,
            Err(_) => {
                tracing::debug!(%line, "skipping unparsable header line");
                continue;
            }
        };
        match HeaderValue::from_bytes(value.trim().as_bytes()) {
            Ok(v) => {
                hm.append(name, v);
            }
            Err(_) => tracing::debug!(%line, "skipping header with invalid value"),
        }
    }
    hm
}

/// Body bytes from tshark's `http.file_data` column.
///
/// Depending on the tshark version the column is either text or hex. Plain
/// hex that decodes to printable text wins, then text that parses as JSON,
/// then any hex (binary bodies); anything else is taken verbatim.
pub fn normalize_body(raw: &str) -> Bytes {
    let raw = raw.split(AGGREGATOR).next().unwrap_or("");
    if raw.is_empty() {
        return Bytes::new();
    }
    if let Some(bytes) = decode_hex(raw) {
        if is_printable_text(&bytes) {
            return Bytes::from(bytes);
        }
    }
    if serde_json::from_str::<serde::de::IgnoredAny>(raw).is_ok() {
        return Bytes::copy_from_slice(raw.as_bytes());
    }
    // Older tshark releases separate bytes with ':'.
    let digits: String = raw.chars().filter(|c| *c != ':').collect();
    if let Some(bytes) = decode_hex(&digits) {
        return Bytes::from(bytes);
    }
    Bytes::copy_from_slice(raw.as_bytes())
}

fn decode_hex(digits: &str) -> Option<Vec<u8>> {
    if digits.is_empty() || digits.len() % 2 != 0 || !digits.chars().all(|c| c.is_ascii_hexdigit())
    {
        return None;
    }
    hex::decode(digits).ok()
}

fn is_printable_text(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes)
        .map(|s| s.chars().all(|c| !c.is_control() || matches!(c, '\t' | '\r' | '\n')))
        .unwrap_or(false)
}

/// Parse one line of tshark field output.
///
/// `Ok(None)` means the frame carried neither a request nor a response.
pub fn parse_fields_line(line: &str) -> anyhow::Result<Option<PacketRecord>> {
    let cols: Vec<&str> = line.splitn(TSHARK_FIELDS.len(), '\t').collect();
    if cols.len() < TSHARK_FIELDS.len() {
        anyhow::bail!(
            "expected {} columns, got {}",
            TSHARK_FIELDS.len(),
            cols.len()
        );
    }

    let messages = occurrences(cols[F_METHOD]) + occurrences(cols[F_STATUS]);
    if messages > 1 {
        tracing::warn!(
            stream = first(cols[F_STREAM]),
            messages,
            "frame carries several HTTP messages, keeping only the first"
        );
    }

    let message = if !first(cols[F_METHOD]).is_empty() {
        Message::Request {
            method: first(cols[F_METHOD]).to_string(),
            path: first(cols[F_URI]).to_string(),
            version: first(cols[F_REQ_VERSION]).to_string(),
        }
    } else if !first(cols[F_STATUS]).is_empty() {
        let status = first(cols[F_STATUS]);
        Message::Response {
            status: status
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid status '{}': {}", status, e))?,
            version: first(cols[F_RES_VERSION]).to_string(),
        }
    } else {
        return Ok(None);
    };

    let stream = first(cols[F_STREAM]);
    let stream_id = StreamId(
        stream
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid tcp.stream '{}': {}", stream, e))?,
    );
    let header_col = match message {
        Message::Request { .. } => cols[F_REQ_LINES],
        Message::Response { .. } => cols[F_RES_LINES],
    };

    Ok(Some(PacketRecord {
        stream_id,
        timestamp: parse_epoch(first(cols[F_TIME]))?,
        src: parse_addr(cols[F_IP_SRC], cols[F_IP6_SRC], cols[F_SRC_PORT])?,
        dst: parse_addr(cols[F_IP_DST], cols[F_IP6_DST], cols[F_DST_PORT])?,
        message,
        headers: parse_header_lines(header_col),
        body: normalize_body(cols[F_BODY]),
        content_length: first(cols[F_CONTENT_LENGTH]).parse().ok(),
        content_type: Some(first(cols[F_CONTENT_TYPE]))
            .filter(|ct| !ct.is_empty())
            .map(str::to_string),
    }))
}

/// Records streamed out of a running tshark process.
pub struct TsharkSource {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    stderr: JoinHandle<String>,
    line_num: u64,
}

impl TsharkSource {
    pub async fn spawn(input: &Path, opts: &DecodeOptions) -> anyhow::Result<Self> {
        tokio::fs::metadata(input)
            .await
            .with_context(|| format!("cannot read capture {}", input.display()))?;

        let mut child = Command::new(&opts.tshark)
            .args(tshark_args(input, opts))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to run decode layer '{}'", opts.tshark))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("tshark stdout not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow::anyhow!("tshark stderr not captured"))?;
        // Drained concurrently so a chatty tshark never blocks on a full pipe.
        let stderr = tokio::spawn(async move {
            let mut s = String::new();
            let _ = stderr.read_to_string(&mut s).await;
            s
        });

        tracing::debug!(input = %input.display(), tshark = %opts.tshark, "decode layer started");
        Ok(Self {
            child,
            lines: BufReader::new(stdout).lines(),
            stderr,
            line_num: 0,
        })
    }

    pub async fn next_record(&mut self) -> anyhow::Result<Option<PacketRecord>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_num += 1;
            if line.trim().is_empty() {
                continue;
            }
            match parse_fields_line(&line) {
                Ok(Some(record)) => return Ok(Some(record)),
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(line = self.line_num, error = %e, "skipping undecodable frame");
                }
            }
        }
        Ok(None)
    }

    /// Wait for tshark to exit; a failing exit status is an input error.
    pub async fn finish(mut self) -> anyhow::Result<()> {
        let status = self.child.wait().await?;
        let stderr = self.stderr.await.unwrap_or_default();
        if !status.success() {
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            anyhow::bail!("decode layer exited with {}: {}", status, tail.join(" | "));
        }
        Ok(())
    }
}

/// Records read from a JSONL file, one serialized [`PacketRecord`] per line.
pub struct JsonlSource {
    path: PathBuf,
    lines: Lines<BufReader<tokio::fs::File>>,
    line_num: u64,
}

impl JsonlSource {
    pub async fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = tokio::fs::File::open(&path)
            .await
            .with_context(|| format!("cannot read records {}", path.display()))?;
        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
            line_num: 0,
        })
    }

    /// Malformed lines are skipped with a warning.
    pub async fn next_record(&mut self) -> anyhow::Result<Option<PacketRecord>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_num += 1;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<PacketRecord>(&line) {
                Ok(record) => return Ok(Some(record)),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = self.line_num,
                        error = %e,
                        "failed to parse record, skipping"
                    );
                }
            }
        }
        Ok(None)
    }
}

/// Either decode layer, behind one interface.
pub enum RecordSource {
    Tshark(TsharkSource),
    Jsonl(JsonlSource),
}

impl RecordSource {
    pub async fn next_record(&mut self) -> anyhow::Result<Option<PacketRecord>> {
        match self {
            RecordSource::Tshark(s) => s.next_record().await,
            RecordSource::Jsonl(s) => s.next_record().await,
        }
    }

    pub async fn finish(self) -> anyhow::Result<()> {
        match self {
            RecordSource::Tshark(s) => s.finish().await,
            RecordSource::Jsonl(_) => Ok(()),
        }
    }
}
