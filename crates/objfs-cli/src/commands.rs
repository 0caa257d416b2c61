use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use objfs_fs::{init_object_fs_with_observer, FsConfig, FsRegistry};
use objfs_store::LocalClientFactory;
use objfs_stream::{IoCompat, PoolCounters, Stream};
use serde_json::json;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        config,
        cluster,
        user,
        client_args,
        format,
        stats,
        ..
    } = cli;

    let config = FsConfig {
        config_path: config,
        cluster,
        user,
        args: client_args,
    };
    let counters = Arc::new(PoolCounters::new());
    let registry = FsRegistry::new();
    init_object_fs_with_observer(&LocalClientFactory, &config, &registry, counters.clone())
        .context("failed to initialize the object filesystem")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = execute(command, &registry, format, &mut stdin.lock(), &mut out);
    if stats {
        print_stats(&counters, format, &mut io::stderr())?;
    }
    result
}

/// Run one subcommand against `registry`, reading uploads from `input`.
pub fn execute(
    command: Command,
    registry: &FsRegistry,
    format: OutputFormat,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Command::Cat(args) => cmd_cat(registry, &args.url, out),
        Command::Put(args) => cmd_upload(registry, args, false, format, input, out),
        Command::Append(args) => cmd_upload(registry, args, true, format, input, out),
        Command::Ls(args) => cmd_ls(registry, &args.url, format, out),
        Command::Rm(args) => cmd_rm(registry, &args.url, format, out),
        Command::Stat(args) => cmd_stat(registry, &args.url, format, out),
    }
}

fn cmd_cat(registry: &FsRegistry, url: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let mut reader = IoCompat(registry.open_reader(url)?);
    io::copy(&mut reader, out).with_context(|| format!("failed to read {url}"))?;
    out.flush()?;
    Ok(())
}

fn cmd_upload(
    registry: &FsRegistry,
    args: UploadArgs,
    append: bool,
    format: OutputFormat,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    // Open the source first: opening the writer truncates the object.
    let mut source: Box<dyn Read + '_> = match &args.input {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => Box::new(input),
    };
    let stream = if append {
        registry.open_appender(&args.url)?
    } else {
        registry.open_writer(&args.url)?
    };
    let mut writer = IoCompat(stream);
    let written = io::copy(&mut source, &mut writer)
        .with_context(|| format!("failed to write {}", args.url))?;

    let mut stream = writer.into_inner();
    let end = stream.tell();
    stream.close()?;

    match format {
        OutputFormat::Json => writeln!(
            out,
            "{}",
            json!({ "url": args.url, "written": written, "size": end, "append": append })
        )?,
        OutputFormat::Text => {
            let verb = if append { "Appended" } else { "Wrote" };
            writeln!(
                out,
                "{} {} {} bytes to {} (now {} bytes)",
                "✓".green().bold(),
                verb,
                written.to_string().bold(),
                args.url.cyan(),
                end
            )?;
        }
    }
    Ok(())
}

fn cmd_ls(
    registry: &FsRegistry,
    url: &str,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let entries = registry.list_entries(url)?;
    match format {
        OutputFormat::Json => writeln!(out, "{}", json!(entries))?,
        OutputFormat::Text if entries.is_empty() => {
            writeln!(out, "{}", "No entries.".dimmed())?
        }
        OutputFormat::Text => {
            for entry in &entries {
                writeln!(out, "{entry}")?;
            }
        }
    }
    Ok(())
}

fn cmd_rm(
    registry: &FsRegistry,
    url: &str,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    registry.remove(url)?;
    match format {
        OutputFormat::Json => writeln!(out, "{}", json!({ "url": url, "removed": true }))?,
        OutputFormat::Text => writeln!(out, "{} Removed {}", "✓".green().bold(), url.cyan())?,
    }
    Ok(())
}

fn cmd_stat(
    registry: &FsRegistry,
    url: &str,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let size = registry.size(url)?;
    match format {
        OutputFormat::Json => writeln!(out, "{}", json!({ "url": url, "size": size }))?,
        OutputFormat::Text => writeln!(out, "{}  {} bytes", url.cyan(), size.to_string().bold())?,
    }
    Ok(())
}

fn print_stats(
    counters: &PoolCounters,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let snapshot = counters.snapshot();
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = snapshot
                .iter()
                .map(|(pool, op, s)| {
                    json!({
                        "pool": pool,
                        "op": op.to_string(),
                        "calls": s.calls,
                        "bytes": s.bytes,
                        "errors": s.errors,
                        "latency_us": s.latency.as_micros() as u64,
                    })
                })
                .collect();
            writeln!(out, "{}", json!(rows))?;
        }
        OutputFormat::Text => {
            if snapshot.is_empty() {
                writeln!(out, "{}", "No I/O recorded.".dimmed())?;
            }
            for (pool, op, s) in &snapshot {
                writeln!(
                    out,
                    "{:<16} {:<7} calls={} bytes={} errors={} latency={:?}",
                    pool.bold(),
                    op,
                    s.calls,
                    s.bytes,
                    if s.errors > 0 {
                        s.errors.to_string().red()
                    } else {
                        s.errors.to_string().normal()
                    },
                    s.latency
                )?;
            }
        }
    }
    Ok(())
}
