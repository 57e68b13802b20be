// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Capture-acquisition command builder.
//!
//! Builds, but never runs, the privileged `tcpdump` invocation that produces
//! the capture files consumed by `extract`.

/// strftime pattern inserted for time-based rotation.
pub const TIME_PATTERN: &str = "_%Y%m%d-%H%M%S";

#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub interface: String,
    pub port: u16,
    pub output: String,
    /// `-C`: rotate after this many megabytes.
    pub rotate_size_mb: Option<u64>,
    /// `-G`: rotate after this many seconds.
    pub rotate_seconds: Option<u64>,
    /// `-W`: keep at most this many files.
    pub file_count: Option<u32>,
    /// `-s`; 0 captures whole packets.
    pub snaplen: u32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            interface: "any".to_string(),
            port: 80,
            output: "capture.pcap".to_string(),
            rotate_size_mb: None,
            rotate_seconds: None,
            file_count: None,
            snaplen: 0,
        }
    }
}

/// Insert [`TIME_PATTERN`] before the file extension unless the path already
/// carries a `%` placeholder.
pub fn with_time_pattern(output: &str) -> String {
    if output.contains('%') {
        return output.to_string();
    }
    let name_start = output.rfind('/').map_or(0, |i| i + 1);
    match output[name_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let at = name_start + dot;
            format!("{}{}{}", &output[..at], TIME_PATTERN, &output[at..])
        }
        _ => format!("{}{}", output, TIME_PATTERN),
    }
}

pub fn build_command(opts: &CaptureOptions) -> anyhow::Result<Vec<String>> {
    if opts.interface.trim().is_empty() {
        anyhow::bail!("interface must not be empty");
    }
    if opts.output.trim().is_empty() {
        anyhow::bail!("output path must not be empty");
    }
    if opts.rotate_size_mb == Some(0) || opts.rotate_seconds == Some(0) || opts.file_count == Some(0)
    {
        anyhow::bail!("rotation limits must be greater than zero");
    }
    if opts.file_count.is_some() && opts.rotate_size_mb.is_none() && opts.rotate_seconds.is_none()
    {
        anyhow::bail!("--file-count needs --rotate-size or --rotate-seconds");
    }

    let output = if opts.rotate_seconds.is_some() {
        with_time_pattern(&opts.output)
    } else {
        opts.output.clone()
    };

    let mut cmd: Vec<String> = vec![
        "tcpdump".into(),
        "-i".into(),
        opts.interface.clone(),
        "-s".into(),
        opts.snaplen.to_string(),
        "-w".into(),
        output,
    ];
    if let Some(mb) = opts.rotate_size_mb {
        cmd.push("-C".into());
        cmd.push(mb.to_string());
    }
    if let Some(secs) = opts.rotate_seconds {
        cmd.push("-G".into());
        cmd.push(secs.to_string());
    }
    if let Some(n) = opts.file_count {
        cmd.push("-W".into());
        cmd.push(n.to_string());
    }
    cmd.extend(["tcp", "port"].iter().map(|s| s.to_string()));
    cmd.push(opts.port.to_string());
    Ok(cmd)
}

/// Join arguments into a POSIX shell command line.
pub fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|a| shell_quote(a))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}
