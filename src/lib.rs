// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Apache combined access logs rebuilt from captured cleartext HTTP.
//!
//! Decoded HTTP messages are paired per TCP stream (FIFO), their fields
//! extracted, sensitive body keys masked, and one log line written per
//! exchange.

pub mod capture_cmd;
pub mod clf_time;
pub mod config;
pub mod decode;
pub mod endpoint;
pub mod extract;
pub mod format;
pub mod mask;
pub mod pairing;
pub mod pipeline;
pub mod record;
pub mod serde_helpers;
pub mod writer;

#[cfg(test)]
mod test_helpers;
