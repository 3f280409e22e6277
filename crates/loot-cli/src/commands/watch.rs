//! Watch command for following a live log.
//!
//! The reader runs on its own thread and publishes raw snapshots. This side
//! owns the crafting split: it folds each snapshot into a [`Session`], applies
//! control commands typed on stdin, and prints a report after either.

use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use loot_core::{
    Monitor, Publication, ReaderConfig, ReconcileError, Session, StartMode, TimeRange,
};

use crate::report::{JsonReport, render_text};
use crate::{Config, WatchArgs};

/// How long to wait for a snapshot before checking for control input.
const CONTROL_POLL: Duration = Duration::from_millis(100);

/// A control command typed while watching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// `crafted <pass>`
    AllCrafted(String),
    /// `dropped <pass>`
    AllDropped(String),
    /// `drop <pass> <count>`
    Dropped { pass: String, count: u64 },
    /// `drop-last`
    DropLast,
    /// `reset`
    Reset,
    /// `quit`
    Quit,
}

impl FromStr for Control {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (command, rest) = s.split_once(' ').unwrap_or((s, ""));
        let rest = rest.trim();

        match (command, rest.is_empty()) {
            ("crafted", false) => Ok(Self::AllCrafted(rest.to_string())),
            ("dropped", false) => Ok(Self::AllDropped(rest.to_string())),
            ("drop", false) => {
                let (pass, count) = rest
                    .rsplit_once(' ')
                    .ok_or_else(|| format!("usage: drop <pass> <count>, got: {s}"))?;
                let count = count
                    .parse()
                    .map_err(|_| format!("invalid count: {count}"))?;
                Ok(Self::Dropped {
                    pass: pass.trim().to_string(),
                    count,
                })
            }
            ("drop-last", true) => Ok(Self::DropLast),
            ("reset", true) => Ok(Self::Reset),
            ("quit" | "exit", true) => Ok(Self::Quit),
            _ => Err(format!("unknown command: {s}")),
        }
    }
}

/// Builds the reader settings for one session, pinned against `now`.
pub fn reader_config(config: &Config, args: &WatchArgs, now: NaiveDateTime) -> Result<ReaderConfig> {
    let path = args
        .log
        .clone()
        .or_else(|| config.log_path.clone())
        .context("no log file given and no log_path configured")?;

    let minutes = args.minutes.unwrap_or(config.window_minutes);
    let range = TimeRange::from_preset(args.range.as_deref().unwrap_or("trailing"), minutes)?;
    let resolved = range.resolve(now);
    tracing::debug!(%range, retention = ?resolved.retention, "resolved time range");

    let start = if args.from_start || config.from_start {
        StartMode::Beginning
    } else {
        StartMode::End
    };

    Ok(ReaderConfig {
        path,
        start: resolved.force_start.unwrap_or(start),
        retention: resolved.retention,
        poll_interval: Duration::from_millis(config.poll_interval_ms),
        publish_interval: Duration::from_secs(args.refresh.unwrap_or(config.refresh_secs)),
    })
}

/// Applies one control command, returning a short confirmation.
fn apply_control(session: &mut Session, control: &Control) -> Result<String, ReconcileError> {
    match control {
        Control::AllCrafted(pass) => {
            session.set_all_crafted(pass)?;
            Ok(format!("{pass}: all crafted"))
        }
        Control::AllDropped(pass) => {
            session.set_all_dropped(pass)?;
            Ok(format!("{pass}: all dropped"))
        }
        Control::Dropped { pass, count } => {
            session.reclassify(pass, *count)?;
            Ok(format!("{pass}: {count} dropped"))
        }
        Control::DropLast => {
            let pass = session.mark_last_dropped()?;
            Ok(format!("{pass}: one more dropped"))
        }
        Control::Reset | Control::Quit => Ok(String::new()),
    }
}

fn print_report<W: Write>(writer: &mut W, session: &Session, json: bool) -> Result<()> {
    let (Some(raw), Some(net)) = (session.latest(), session.net()) else {
        return Ok(());
    };
    if json {
        let report = JsonReport::new(raw, net, session.tally());
        serde_json::to_writer(&mut *writer, &report).context("failed to serialize report")?;
        writeln!(writer)?;
    } else {
        writeln!(writer, "{}", render_text(net, session.tally()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Forwards stdin lines to the watch loop.
fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("loot-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("failed to spawn stdin reader")?;
    Ok(rx)
}

pub fn run(config: &Config, args: &WatchArgs) -> Result<()> {
    let controls = spawn_stdin_reader()?;
    let mut stdout = io::stdout().lock();
    watch(&mut stdout, config, args, &controls)
}

/// The consumer loop: snapshots in, reports out, until `quit` or a fatal
/// reader error.
fn watch<W: Write>(
    writer: &mut W,
    config: &Config,
    args: &WatchArgs,
    controls: &Receiver<String>,
) -> Result<()> {
    let reader = reader_config(config, args, Local::now().naive_local())?;
    tracing::info!(path = %reader.path.display(), retention = ?reader.retention, "watching log");

    let mut monitor = Monitor::start(reader).context("failed to start log reader")?;
    let mut session = Session::new(config.recipes.clone(), config.dungeons.clone());
    let mut stdin_open = true;

    loop {
        match monitor.publications().recv_timeout(CONTROL_POLL) {
            Ok(Publication::Snapshot(raw)) => {
                session.apply(raw);
                print_report(writer, &session, args.json)?;
            }
            Ok(Publication::Error(message)) => {
                monitor.stop().ok();
                anyhow::bail!(message);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                return monitor.stop().context("log reader stopped");
            }
        }

        while stdin_open {
            let line = match controls.try_recv() {
                Ok(line) => line,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    stdin_open = false;
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let control = match line.parse::<Control>() {
                Ok(control) => control,
                Err(e) => {
                    eprintln!("{e}");
                    continue;
                }
            };

            match control {
                Control::Quit => return monitor.stop().context("log reader failed"),
                Control::Reset => {
                    monitor.stop().ok();
                    session.reset();
                    let reader = reader_config(config, args, Local::now().naive_local())?;
                    monitor = Monitor::start(reader).context("failed to restart log reader")?;
                    eprintln!("session reset");
                }
                _ => match apply_control(&mut session, &control) {
                    Ok(message) => {
                        eprintln!("{message}");
                        print_report(writer, &session, args.json)?;
                    }
                    Err(e) => eprintln!("{e}"),
                },
            }
        }
    }
}
