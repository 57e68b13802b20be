// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Capture timestamps: epoch parsing and Common Log Format rendering.

use chrono::{DateTime, Utc};

/// Parse a decimal epoch timestamp such as `1756603635.123456789`.
pub fn parse_epoch(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();
    let (secs, frac) = s.split_once('.').unwrap_or((s, ""));
    let secs: i64 = secs
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid epoch seconds '{}': {}", s, e))?;

    // Keep at most nanosecond precision, right-padded.
    let digits: String = frac.chars().take(9).collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        anyhow::bail!("invalid epoch fraction '{}'", s);
    }
    let nanos: u32 = if digits.is_empty() {
        0
    } else {
        format!("{:0<9}", digits).parse()?
    };

    DateTime::<Utc>::from_timestamp(secs, nanos)
        .ok_or_else(|| anyhow::anyhow!("epoch out of range: {}", s))
}

/// Render `%t`, e.g. `[31/Aug/2025:01:27:15 +0000]`.
pub fn format_clf(ts: &DateTime<Utc>) -> String {
    ts.format("[%d/%b/%Y:%H:%M:%S %z]").to_string()
}
