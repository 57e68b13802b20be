// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Single-pass driver: decoded records in, log lines out.

use crate::decode::{DecodeOptions, JsonlSource, RecordSource, TsharkSource};
use crate::extract::AccessFields;
use crate::format::format_line;
use crate::mask::MaskRules;
use crate::pairing::{ExchangePair, StreamPairer};
use crate::record::PacketRecord;
use crate::writer::{LogWriter, Sink};
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

/// Counters for one run (or the sum of several).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub records: u64,
    pub lines: u64,
    pub response_only: u64,
    pub dropped_requests: u64,
    /// Exchanges with no JSON side, left out by the content-type filter.
    pub skipped_non_json: u64,
}

impl AddAssign for RunStats {
    fn add_assign(&mut self, rhs: Self) {
        self.records += rhs.records;
        self.lines += rhs.lines;
        self.response_only += rhs.response_only;
        self.dropped_requests += rhs.dropped_requests;
        self.skipped_non_json += rhs.skipped_non_json;
    }
}

/// Pairing, extraction, masking and formatting for one capture.
///
/// Purely in-memory; a fresh extractor per input keeps captures independent.
pub struct Extractor<'a> {
    pairer: StreamPairer,
    rules: &'a MaskRules,
    json_only: bool,
    stats: RunStats,
}

impl<'a> Extractor<'a> {
    pub fn new(rules: &'a MaskRules) -> Self {
        Self {
            pairer: StreamPairer::new(),
            rules,
            json_only: false,
            stats: RunStats::default(),
        }
    }

    /// Only log exchanges where the request or the response declares JSON.
    /// Every message is still paired, so the filter never shifts a stream.
    pub fn json_only(mut self, json_only: bool) -> Self {
        self.json_only = json_only;
        self
    }

    /// Feed one record; returns a finished log line when it completes an exchange.
    pub fn ingest(&mut self, record: PacketRecord) -> Option<String> {
        self.stats.records += 1;
        let pair = self.pairer.push(record)?;
        if self.json_only && !pair.is_json() {
            tracing::trace!(stream = %pair.primary().stream_id, "skipping non-JSON exchange");
            self.stats.skipped_non_json += 1;
            return None;
        }
        if matches!(pair, ExchangePair::ResponseOnly(_)) {
            self.stats.response_only += 1;
        }
        self.stats.lines += 1;
        Some(format_line(&AccessFields::extract(&pair, self.rules)))
    }

    pub fn finish(self) -> RunStats {
        let mut stats = self.stats;
        stats.dropped_requests = self.pairer.finish() as u64;
        stats
    }
}

/// What the input paths contain.
#[derive(Debug, Clone)]
pub enum InputKind {
    /// Capture files decoded through tshark.
    Capture(DecodeOptions),
    /// JSONL files of already-decoded records.
    Records,
}

impl InputKind {
    /// Whether non-JSON exchanges are left out of the log.
    pub fn json_only(&self) -> bool {
        match self {
            InputKind::Capture(opts) => opts.content_type_filter,
            InputKind::Records => false,
        }
    }
}

pub async fn open_source(path: &Path, kind: &InputKind) -> anyhow::Result<RecordSource> {
    Ok(match kind {
        InputKind::Capture(opts) => RecordSource::Tshark(TsharkSource::spawn(path, opts).await?),
        InputKind::Records => RecordSource::Jsonl(JsonlSource::open(path).await?),
    })
}

/// Drain `source` into `writer`.
pub async fn process_source(
    mut source: RecordSource,
    rules: &MaskRules,
    json_only: bool,
    writer: &mut LogWriter,
) -> anyhow::Result<RunStats> {
    let mut extractor = Extractor::new(rules).json_only(json_only);
    while let Some(record) = source.next_record().await? {
        if let Some(line) = extractor.ingest(record) {
            writer.write_line(&line).await?;
        }
    }
    source.finish().await?;
    Ok(extractor.finish())
}

/// Process every input in order into one sink.
pub async fn run(
    inputs: &[PathBuf],
    kind: &InputKind,
    rules: &MaskRules,
    sink: &Sink,
) -> anyhow::Result<RunStats> {
    let mut writer = LogWriter::open(sink).await?;
    let mut total = RunStats::default();
    for input in inputs {
        let source = open_source(input, kind).await?;
        let stats = process_source(source, rules, kind.json_only(), &mut writer).await?;
        tracing::info!(
            input = %input.display(),
            records = stats.records,
            lines = stats.lines,
            response_only = stats.response_only,
            dropped_requests = stats.dropped_requests,
            skipped_non_json = stats.skipped_non_json,
            "capture processed"
        );
        total += stats;
    }
    tracing::debug!(lines = writer.lines_written(), "closing log output");
    writer.close().await?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{make_request, make_response};

    #[test]
    fn extractor_emits_on_response_only() {
        let rules = MaskRules::default();
        let mut ex = Extractor::new(&rules);
        assert!(ex
            .ingest(make_request(1, "GET", "/a", &[], ""))
            .is_none());
        let line = ex.ingest(make_response(1, 200, &[], "ok")).expect("line");
        assert!(line.contains("\"GET /a HTTP/1.1\" 200 2 "));

        let orphan = ex.ingest(make_response(2, 404, &[], "")).expect("line");
        assert!(orphan.contains(" \"-\" 404 0 "));
        assert!(orphan.starts_with("10.0.0.1 - - "));

        ex.ingest(make_request(3, "GET", "/never", &[], ""));
        let stats = ex.finish();
        assert_eq!(
            stats,
            RunStats {
                records: 4,
                lines: 2,
                response_only: 1,
                dropped_requests: 1,
                skipped_non_json: 0,
            }
        );
    }

    #[test]
    fn json_filter_applies_after_pairing() {
        let rules = MaskRules::default();
        let mut ex = Extractor::new(&rules).json_only(true);
        let json = [("content-type", "application/json")];

        assert!(ex
            .ingest(make_request(1, "POST", "/first", &json, r#"{"a":1}"#))
            .is_none());
        let first = ex
            .ingest(make_response(1, 500, &[("content-type", "text/plain")], "boom"))
            .expect("request side is JSON");
        assert!(first.contains("\"POST /first HTTP/1.1\" 500 4 "));

        assert!(ex
            .ingest(make_request(1, "POST", "/second", &json, r#"{"b":2}"#))
            .is_none());
        let second = ex
            .ingest(make_response(1, 201, &json, r#"{"id":2}"#))
            .expect("line");
        assert!(second.contains("\"POST /second HTTP/1.1\" 201 "), "{}", second);
        assert!(second.ends_with(r#"{"b":2} {"id":2}"#), "{}", second);

        // Neither side JSON: paired, then left out of the log.
        ex.ingest(make_request(1, "GET", "/page", &[], ""));
        assert!(ex
            .ingest(make_response(1, 204, &[], ""))
            .is_none());
        assert!(ex
            .ingest(make_response(1, 200, &json, "{}"))
            .expect("orphan JSON response")
            .contains(" \"-\" 200 2 "));

        let stats = ex.finish();
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.skipped_non_json, 1);
        assert_eq!(stats.response_only, 1);
        assert_eq!(stats.dropped_requests, 0);
    }

    #[test]
    fn json_filter_only_for_captures() {
        assert!(InputKind::Capture(DecodeOptions::default()).json_only());
        assert!(!InputKind::Capture(DecodeOptions {
            content_type_filter: false,
            ..DecodeOptions::default()
        })
        .json_only());
        assert!(!InputKind::Records.json_only());
    }

    #[test]
    fn stats_add_up() {
        let mut a = RunStats {
            records: 1,
            lines: 1,
            response_only: 0,
            dropped_requests: 2,
            skipped_non_json: 1,
        };
        a += RunStats {
            records: 3,
            lines: 2,
            response_only: 1,
            dropped_requests: 0,
            skipped_non_json: 2,
        };
        assert_eq!(a.records, 4);
        assert_eq!(a.lines, 3);
        assert_eq!(a.response_only, 1);
        assert_eq!(a.dropped_requests, 2);
        assert_eq!(a.skipped_non_json, 3);
    }
}
