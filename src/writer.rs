// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Log line output to a file or stdout.

use anyhow::Context;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Path value that selects standard output.
pub const STDOUT_PATH: &str = "-";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Stdout,
    File { path: PathBuf, append: bool },
}

impl Sink {
    /// `-` means stdout; anything else is a file path.
    pub fn from_arg(arg: &str, append: bool) -> Self {
        if arg == STDOUT_PATH {
            Sink::Stdout
        } else {
            Sink::File {
                path: PathBuf::from(arg),
                append,
            }
        }
    }
}

/// Append-only line writer. Each line is flushed as soon as it is written,
/// so an interrupted run keeps every line it already produced.
pub struct LogWriter {
    out: Box<dyn AsyncWrite + Unpin + Send>,
    lines: u64,
}

impl LogWriter {
    pub async fn open(sink: &Sink) -> anyhow::Result<Self> {
        let out: Box<dyn AsyncWrite + Unpin + Send> = match sink {
            Sink::Stdout => Box::new(tokio::io::stdout()),
            Sink::File { path, append } => Box::new(open_file(path, *append).await?),
        };
        Ok(Self { out, lines: 0 })
    }

    pub async fn write_line(&mut self, line: &str) -> anyhow::Result<()> {
        debug_assert!(!line.contains('\n'), "log line must not span lines");
        self.out.write_all(line.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        self.lines += 1;
        Ok(())
    }

    /// Lines written since the writer was opened.
    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    pub async fn close(mut self) -> anyhow::Result<()> {
        self.out.shutdown().await?;
        Ok(())
    }
}

async fn open_file(path: &Path, append: bool) -> anyhow::Result<tokio::fs::File> {
    let mut opts = OpenOptions::new();
    opts.create(true);
    if append {
        opts.append(true);
    } else {
        opts.write(true).truncate(true);
    }
    opts.open(path)
        .await
        .with_context(|| format!("cannot open output file {}", path.display()))
}
