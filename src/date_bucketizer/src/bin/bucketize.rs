use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use date_bucketizer::{
    DateBucketizer, Granularity,
    config::{BucketizerConfig, load_config_path},
    timeline::Timeline,
    timestamp::{parse_timestamp, to_rfc3339_millis},
};
use shared_utils::env::path_from_arg_or_env;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Environment variable consulted when `--config` is not given.
const CONFIG_ENV: &str = "BUCKETIZE_CONFIG";

#[derive(Parser)]
#[command(version, about = "Bucketize timestamps into hour/day/month bins")]
struct Cli {
    /// Bucketizer config file (TOML); defaults to $BUCKETIZE_CONFIG
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bucket granularity: hour, day or month
    #[arg(short, long)]
    granularity: Option<Granularity>,

    /// Inclusive start (RFC-3339 or epoch millis)
    #[arg(long, value_parser = parse_timestamp)]
    start: Option<DateTime<Utc>>,

    /// End of bucketing (RFC-3339 or epoch millis)
    #[arg(long, value_parser = parse_timestamp)]
    end: Option<DateTime<Utc>>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Count timestamps (one per line) per bucket
    Histogram {
        /// Read timestamps from this file instead of stdin
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Print the timeline as JSON
        #[arg(long)]
        json: bool,
    },

    /// Snap a selected range outward onto bucket boundaries
    Snap {
        /// Selection start
        #[arg(value_parser = parse_timestamp)]
        from: DateTime<Utc>,

        /// Selection end
        #[arg(value_parser = parse_timestamp)]
        to: DateTime<Utc>,
    },

    /// Show the bucket layout of the configured range
    Info,
}

fn init_logging() {
    // logs go to stderr; stdout is reserved for results
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_bucketizer(cli: &Cli) -> Result<DateBucketizer> {
    let base = match path_from_arg_or_env(cli.config.clone(), CONFIG_ENV)? {
        Some(path) => {
            debug!(path = %path.display(), "loading bucketizer config");
            load_config_path(&path)
                .with_context(|| format!("load config {}", path.display()))?
        }
        None => BucketizerConfig::default(),
    };
    let cfg = base.merge(cli.granularity, cli.start, cli.end);
    Ok(cfg.build()?)
}

fn read_timestamps(reader: impl BufRead) -> Result<Vec<DateTime<Utc>>> {
    let mut out = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let ts = parse_timestamp(trimmed).with_context(|| format!("line {}", lineno + 1))?;
        out.push(ts);
    }
    Ok(out)
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let bucketizer = build_bucketizer(&cli)?;
    let mut stdout = io::stdout().lock();

    match &cli.cmd {
        Cmd::Histogram { input, json } => {
            let dates = match input {
                Some(path) => {
                    let file = File::open(path)
                        .with_context(|| format!("open input {}", path.display()))?;
                    read_timestamps(BufReader::new(file))?
                }
                None => read_timestamps(io::stdin().lock())?,
            };
            info!(records = dates.len(), granularity = %bucketizer.granularity(), "binning");

            let timeline = Timeline::bin(&bucketizer, dates)?;
            if *json {
                serde_json::to_writer_pretty(&mut stdout, &timeline)?;
                writeln!(stdout)?;
            } else {
                for bin in &timeline.bins {
                    writeln!(stdout, "{}\t{}", to_rfc3339_millis(bin.start), bin.count)?;
                }
            }
            if timeline.dropped > 0 {
                eprintln!(
                    "SUMMARY: {} binned, {} past the end date",
                    timeline.total(),
                    timeline.dropped
                );
            }
        }

        Cmd::Snap { from, to } => {
            let (lo, hi) = bucketizer.snap_range(*from, *to)?;
            writeln!(stdout, "{}\t{}", to_rfc3339_millis(lo), to_rfc3339_millis(hi))?;
        }

        Cmd::Info => {
            let fmt_opt = |d: Option<DateTime<Utc>>| d.map_or("-".to_string(), to_rfc3339_millis);
            writeln!(stdout, "granularity\t{}", bucketizer.granularity())?;
            match bucketizer.millis_multiplier() {
                Some(ms) => writeln!(stdout, "millis\t{ms}")?,
                None => writeln!(stdout, "millis\t-")?,
            }
            writeln!(stdout, "start\t{}", fmt_opt(bucketizer.start_date()))?;
            writeln!(stdout, "end\t{}", fmt_opt(bucketizer.end_date()))?;
            if bucketizer.start_date().is_some() && bucketizer.end_date().is_some() {
                writeln!(stdout, "buckets\t{}", bucketizer.num_buckets(None, None)?)?;
            } else {
                writeln!(stdout, "buckets\t-")?;
            }
        }
    }

    Ok(())
}
