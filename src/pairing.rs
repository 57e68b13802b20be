// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Per-stream FIFO pairing of requests with responses.

use crate::record::{Direction, PacketRecord, StreamId};
use std::collections::{HashMap, VecDeque};

/// A request matched with its response, or one half alone.
#[derive(Debug, Clone)]
pub enum ExchangePair {
    Complete {
        request: PacketRecord,
        response: PacketRecord,
    },
    ResponseOnly(PacketRecord),
    RequestOnly(PacketRecord),
}

impl ExchangePair {
    pub fn request(&self) -> Option<&PacketRecord> {
        match self {
            ExchangePair::Complete { request, .. } | ExchangePair::RequestOnly(request) => {
                Some(request)
            }
            ExchangePair::ResponseOnly(_) => None,
        }
    }

    pub fn response(&self) -> Option<&PacketRecord> {
        match self {
            ExchangePair::Complete { response, .. } | ExchangePair::ResponseOnly(response) => {
                Some(response)
            }
            ExchangePair::RequestOnly(_) => None,
        }
    }

    /// The request when present, else the response.
    pub fn primary(&self) -> &PacketRecord {
        match self {
            ExchangePair::Complete { request, .. } | ExchangePair::RequestOnly(request) => request,
            ExchangePair::ResponseOnly(response) => response,
        }
    }

    /// Either side declares a JSON content type.
    pub fn is_json(&self) -> bool {
        self.request().is_some_and(PacketRecord::is_json)
            || self.response().is_some_and(PacketRecord::is_json)
    }
}

/// Pending requests per stream, oldest at the front.
///
/// One pairer serves one capture; it is never shared and holds no state
/// beyond the run.
#[derive(Debug, Default)]
pub struct StreamPairer {
    pending: HashMap<StreamId, VecDeque<PacketRecord>>,
}

impl StreamPairer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one record. Responses emit a pair immediately; requests wait.
    pub fn push(&mut self, record: PacketRecord) -> Option<ExchangePair> {
        match record.direction() {
            Direction::Request => {
                self.pending
                    .entry(record.stream_id)
                    .or_default()
                    .push_back(record);
                None
            }
            Direction::Response => {
                let request = self
                    .pending
                    .get_mut(&record.stream_id)
                    .and_then(VecDeque::pop_front);
                match request {
                    Some(request) => Some(ExchangePair::Complete {
                        request,
                        response: record,
                    }),
                    None => {
                        tracing::warn!(
                            stream = %record.stream_id,
                            status = ?record.status(),
                            "response without pending request, emitting response-only entry"
                        );
                        Some(ExchangePair::ResponseOnly(record))
                    }
                }
            }
        }
    }

    /// Number of requests still waiting for a response.
    #[cfg(test)]
    pub fn pending_len(&self) -> usize {
        self.pending.values().map(VecDeque::len).sum()
    }

    /// End of capture: unanswered requests are dropped. Returns how many.
    pub fn finish(self) -> usize {
        let mut dropped = 0;
        for (stream, queue) in self.pending {
            if !queue.is_empty() {
                tracing::debug!(%stream, count = queue.len(), "dropping unanswered requests");
                dropped += queue.len();
            }
        }
        dropped
    }
}
