// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use http_capture_log::capture_cmd::{build_command, shell_join, CaptureOptions};
use http_capture_log::config::Config;
use http_capture_log::decode::DecodeOptions;
use http_capture_log::mask::MaskRules;
use http_capture_log::pipeline::{self, InputKind};
use http_capture_log::writer::Sink;

#[derive(Parser, Debug)]
#[command(name = "http-capture-log", version)]
#[command(about = "Apache combined access logs, with masked JSON bodies, from HTTP captures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write one log line per request/response exchange found in the inputs
    Extract(ExtractArgs),
    /// Print the tcpdump command that records capture files (does not run it)
    CaptureCmd(CaptureArgs),
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Capture file(s), processed in order; JSONL record files with --records
    #[arg(short, long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Output log path, or - for stdout
    #[arg(short, long, default_value = "-")]
    out: String,

    /// Decode given TCP port as HTTP (repeatable)
    #[arg(long = "decode-port")]
    decode_port: Vec<u16>,

    /// Do not filter by Content-Type; log every exchange
    #[arg(long)]
    no_ct_filter: bool,

    /// Append to the output file instead of truncating it
    #[arg(long)]
    append: bool,

    /// Inputs are JSONL files of decoded records, not captures
    #[arg(long)]
    records: bool,

    /// Optional config TOML path
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CaptureArgs {
    /// Network interface to capture on
    #[arg(short, long, default_value = "any")]
    interface: String,

    /// TCP port carrying the HTTP traffic
    #[arg(short, long)]
    port: u16,

    /// Capture file path; may contain strftime placeholders
    #[arg(short = 'w', long, default_value = "capture.pcap")]
    output: String,

    /// Rotate after this many megabytes (-C)
    #[arg(long)]
    rotate_size: Option<u64>,

    /// Rotate after this many seconds (-G)
    #[arg(long)]
    rotate_seconds: Option<u64>,

    /// Keep at most this many files (-W)
    #[arg(long)]
    file_count: Option<u32>,

    /// Snapshot length (-s); 0 captures whole packets
    #[arg(long, default_value_t = 0)]
    snaplen: u32,
}

impl From<CaptureArgs> for CaptureOptions {
    fn from(a: CaptureArgs) -> Self {
        Self {
            interface: a.interface,
            port: a.port,
            output: a.output,
            rotate_size_mb: a.rotate_size,
            rotate_seconds: a.rotate_seconds,
            file_count: a.file_count,
            snaplen: a.snaplen,
        }
    }
}

/// Effective run settings: config file values overridden by flags.
#[derive(Debug)]
struct ExtractPlan {
    kind: InputKind,
    sink: Sink,
    rules: MaskRules,
}

fn plan_extract(args: &ExtractArgs, cfg: &Config) -> ExtractPlan {
    let kind = if args.records {
        InputKind::Records
    } else {
        InputKind::Capture(DecodeOptions {
            tshark: cfg.general.tshark.clone(),
            decode_ports: if args.decode_port.is_empty() {
                cfg.general.decode_ports.clone()
            } else {
                args.decode_port.clone()
            },
            content_type_filter: cfg.general.content_type_filter && !args.no_ct_filter,
        })
    };
    ExtractPlan {
        kind,
        sink: Sink::from_arg(&args.out, args.append || cfg.general.append),
        rules: cfg.mask_rules(),
    }
}

async fn extract(args: ExtractArgs) -> anyhow::Result<()> {
    let cfg = match args.config {
        Some(ref p) => Config::load_from_path(p)
            .await
            .with_context(|| format!("failed to load config {}", p.display()))?,
        None => Config::default(),
    };
    let plan = plan_extract(&args, &cfg);

    let stats = pipeline::run(&args.input, &plan.kind, &plan.rules, &plan.sink).await?;
    tracing::info!(
        inputs = args.input.len(),
        lines = stats.lines,
        response_only = stats.response_only,
        dropped_requests = stats.dropped_requests,
        skipped_non_json = stats.skipped_non_json,
        "done"
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // stdout may be the log sink; diagnostics stay on stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Extract(args) => extract(args).await,
        Commands::CaptureCmd(args) => {
            let cmd = build_command(&args.into())?;
            println!("{}", shell_join(&cmd));
            Ok(())
        }
    }
}
