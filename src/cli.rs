use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use regex::Regex;
use tracing::{debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::checkpoint::Checkpoint;
use crate::parse;
use crate::stats::{Metric, Stats};

/// Resolved command-line configuration. Collaborators receive this value
/// explicitly; nothing reads argument state globally.
#[derive(Debug)]
pub struct Config {
    pub log_file: PathBuf,
    pub metric: Metric,
    pub exclude: Option<Regex>,
    pub status_file: PathBuf,
    pub from_beginning: bool,
    pub verbosity: u8,
}

pub fn parse_args() -> Result<Config> {
    config_from(&command().get_matches())
}

fn command() -> Command {
    Command::new("weblog-metrics")
        .about("Scans an NCSA combined-format access log and prints one metric")
        .arg(
            Arg::new("logfile")
                .long("logfile")
                .short('f')
                .value_name("PATH")
                .required(true)
                .help("Access log to scan"),
        )
        .arg(
            Arg::new("metric")
                .long("metric")
                .short('m')
                .value_name("METRIC")
                .value_parser(["count", "rate", "errors", "latency"])
                .default_value("count")
                .help("Statistic to print"),
        )
        .arg(
            Arg::new("exclude")
                .long("exclude")
                .short('e')
                .value_name("REGEX")
                .help("Skip lines matching this pattern"),
        )
        .arg(
            Arg::new("status-file")
                .long("status-file")
                .short('s')
                .value_name("PATH")
                .default_value("status.file")
                .help("Checkpoint file carrying the last line processed"),
        )
        .arg(
            Arg::new("beginning")
                .long("beginning")
                .short('b')
                .action(ArgAction::SetTrue)
                .help("Ignore the checkpoint and scan from the start"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .help("Verbose output"),
        )
        .arg(
            Arg::new("very-verbose")
                .long("very-verbose")
                .short('w')
                .action(ArgAction::SetTrue)
                .help("Very verbose output"),
        )
}

fn config_from(matches: &ArgMatches) -> Result<Config> {
    let metric = match matches
        .get_one::<String>("metric")
        .map(String::as_str)
        .context("metric has a default")?
    {
        "count" => Metric::Count,
        "rate" => Metric::Rate,
        "errors" => Metric::Errors,
        "latency" => Metric::Latency,
        other => bail!("unsupported metric {other:?}"),
    };

    let exclude = match matches.get_one::<String>("exclude") {
        Some(pattern) => Some(
            Regex::new(pattern).with_context(|| format!("invalid exclude pattern {pattern:?}"))?,
        ),
        None => None,
    };

    let verbosity = if matches.get_flag("very-verbose") {
        2
    } else if matches.get_flag("verbose") {
        1
    } else {
        0
    };

    Ok(Config {
        log_file: PathBuf::from(
            matches
                .get_one::<String>("logfile")
                .context("logfile is required")?,
        ),
        metric,
        exclude,
        status_file: PathBuf::from(
            matches
                .get_one::<String>("status-file")
                .context("status-file has a default")?,
        ),
        from_beginning: matches.get_flag("beginning"),
        verbosity,
    })
}

/// Installs the tracing subscriber on stderr; stdout stays reserved for the
/// metric value. RUST_LOG overrides the verbosity flags.
pub fn init_logging(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "warn",
        1 => "weblog_metrics=info",
        _ => "weblog_metrics=debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// One scan: restore the checkpoint, skip already-processed lines, parse and
/// aggregate the rest, persist the checkpoint, print the selected metric.
pub fn run(config: &Config) -> Result<()> {
    let started = Instant::now();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %config.log_file.display(),
        metric = ?config.metric,
        "starting scan"
    );

    let mut checkpoint = Checkpoint::load(&config.status_file);
    let mut start_line = if config.from_beginning {
        0
    } else {
        checkpoint.slot(config.metric)
    };

    let file = File::open(&config.log_file)
        .with_context(|| format!("cannot open log file {}", config.log_file.display()))?;
    let mut reader = BufReader::new(file);

    if start_line > 0 {
        let skipped = skip_lines(&mut reader, start_line)?;
        debug!(skipped, "skipped lines from previous runs");
        if skipped < start_line {
            // fewer lines than the checkpoint: the log was rotated or
            // truncated since the last run
            warn!(
                skipped,
                expected = start_line,
                "log shorter than checkpoint, rescanning from the start"
            );
            reader.rewind()?;
            start_line = 0;
        }
    }

    let mut stats = Stats::new();
    let mut lines_read: u64 = 0;
    for line in reader.lines() {
        let line = line.context("error reading log file")?;
        lines_read += 1;

        // trailing blank lines are common while the log is being appended
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(pattern) = &config.exclude {
            if pattern.is_match(line) {
                stats.excluded += 1;
                continue;
            }
        }

        stats.observe(parse::combined(line));
    }

    checkpoint.set_slot(config.metric, start_line + lines_read);
    checkpoint
        .save(&config.status_file)
        .with_context(|| format!("cannot write status file {}", config.status_file.display()))?;

    info!(
        lines_read,
        excluded = stats.excluded,
        unparsed = stats.unparsed,
        count_200 = stats.count_200,
        count_3xx = stats.count_3xx,
        count_4xx = stats.count_4xx,
        count_5xx = stats.count_5xx,
        duration_secs = stats.duration_secs(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scan finished"
    );

    report(config.metric, &stats);
    Ok(())
}

fn skip_lines(reader: &mut BufReader<File>, n: u64) -> Result<u64> {
    let mut skipped = 0;
    let mut buf = String::new();
    while skipped < n {
        buf.clear();
        let read = reader
            .read_line(&mut buf)
            .context("error skipping log lines")?;
        if read == 0 {
            break;
        }
        skipped += 1;
    }
    Ok(skipped)
}

fn report(metric: Metric, stats: &Stats) {
    match metric {
        Metric::Count => println!("{}", stats.count_200),
        Metric::Rate => println!("{}", stats.rate()),
        Metric::Errors => println!("{}", stats.count_5xx),
        Metric::Latency => println!("{:.6}", stats.avg_response_time()),
    }
}
