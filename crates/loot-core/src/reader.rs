//! Log tailing and snapshot publication.
//!
//! [`run`] follows a growing log file by polling, feeds parsed events into an
//! [`Aggregator`], and hands a fresh [`RawStats`] to the consumer once per
//! publish interval. [`Monitor`] runs the same loop on its own thread and
//! delivers publications over a channel.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::event::parse_line;
use crate::window::{Aggregator, RawStats, RetentionPolicy};

/// Default delay between read attempts when the log has no new line.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("cannot open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read log file: {0}")]
    Read(#[source] io::Error),
    #[error("failed to spawn reader thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("reader thread panicked")]
    Panicked,
}

/// Where reading starts when the file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMode {
    /// Replay the whole file.
    Beginning,
    /// Only see lines appended after launch.
    #[default]
    End,
}

/// Everything one reader run needs.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub path: PathBuf,
    pub start: StartMode,
    pub retention: RetentionPolicy,
    /// Sleep between read attempts when no line is available.
    pub poll_interval: Duration,
    /// Minimum wall-clock time between two publications.
    pub publish_interval: Duration,
}

impl ReaderConfig {
    pub fn new(path: impl Into<PathBuf>, retention: RetentionPolicy) -> Self {
        Self {
            path: path.into(),
            start: StartMode::default(),
            retention,
            poll_interval: DEFAULT_POLL_INTERVAL,
            publish_interval: Duration::from_secs(1),
        }
    }
}

/// What the reader hands to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum Publication {
    /// Statistics over the current, non-empty window.
    Snapshot(RawStats),
    /// The run hit a fatal error and has stopped.
    Error(String),
}

/// Follows the log until `stop` is set or a fatal error occurs.
///
/// A failure to open the file or to read from it ends the run: the error is
/// published once and then returned. Reaching end of file is not an error.
pub fn run<F>(config: &ReaderConfig, stop: &AtomicBool, mut on_publish: F) -> Result<(), ReaderError>
where
    F: FnMut(Publication),
{
    let mut reader = match open(&config.path, config.start) {
        Ok(reader) => reader,
        Err(e) => {
            tracing::warn!(error = %e, "log reader failed to start");
            on_publish(Publication::Error(e.to_string()));
            return Err(e);
        }
    };
    tracing::info!(path = %config.path.display(), start = ?config.start, "log reader started");

    let mut aggregator = Aggregator::new(config.retention);
    let mut line = Vec::new();
    let mut fragment_len = 0;
    let mut last_publish = Instant::now();

    while !stop.load(Ordering::Relaxed) {
        match read_complete_line(&mut reader, &mut line) {
            Ok(true) => {
                ingest(&mut aggregator, &line);
                line.clear();
                fragment_len = 0;
            }
            Ok(false) => {
                // A fragment that did not grow over a whole poll is the last
                // line of the file, written without a newline.
                if !line.is_empty()
                    && line.len() == fragment_len
                    && ingest(&mut aggregator, &line)
                {
                    line.clear();
                }
                fragment_len = line.len();
                thread::sleep(config.poll_interval);
            }
            Err(e) => {
                let e = ReaderError::Read(e);
                tracing::warn!(error = %e, "log reader stopped");
                on_publish(Publication::Error(e.to_string()));
                return Err(e);
            }
        }

        if last_publish.elapsed() >= config.publish_interval {
            last_publish = Instant::now();
            if let Some(stats) = aggregator.compute() {
                on_publish(Publication::Snapshot(stats));
            }
        }
    }

    tracing::info!(retained = aggregator.len(), "log reader stopped");
    Ok(())
}

/// Parses one raw line into the window. Returns whether it held an event.
fn ingest(aggregator: &mut Aggregator, line: &[u8]) -> bool {
    let Some(event) = parse_line(&String::from_utf8_lossy(line)) else {
        return false;
    };
    tracing::trace!(item = %event.item, quantity = event.quantity, "loot event");
    aggregator.append(event);
    true
}

fn open(path: &Path, start: StartMode) -> Result<BufReader<File>, ReaderError> {
    let open_err = |source| ReaderError::Open {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(open_err)?;
    let mut reader = BufReader::new(file);
    if start == StartMode::End {
        reader.seek(SeekFrom::End(0)).map_err(open_err)?;
    }
    Ok(reader)
}

/// Reads until the next newline, appending to `buf`.
///
/// Returns `true` once `buf` holds a whole line. A trailing fragment with no
/// newline yet stays in `buf` and `false` is returned, so a line the writer
/// is still flushing is never parsed in halves.
fn read_complete_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    reader.read_until(b'\n', buf)?;
    Ok(buf.last() == Some(&b'\n'))
}

/// Handle to a reader running on its own thread.
///
/// Publications arrive on [`Monitor::publications`]. Dropping the handle
/// stops the thread.
#[derive(Debug)]
pub struct Monitor {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<(), ReaderError>>>,
    publications: Receiver<Publication>,
}

impl Monitor {
    /// Spawns a reader thread for `config`.
    pub fn start(config: ReaderConfig) -> Result<Self, ReaderError> {
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("loot-reader".to_string())
            .spawn(move || {
                run(&config, &thread_stop, |publication| {
                    // The consumer hanging up is not the reader's problem.
                    tx.send(publication).ok();
                })
            })
            .map_err(ReaderError::Spawn)?;

        Ok(Self {
            stop,
            handle: Some(handle),
            publications: rx,
        })
    }

    #[must_use]
    pub const fn publications(&self) -> &Receiver<Publication> {
        &self.publications
    }

    /// Whether the reader thread has exited on its own.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Signals the reader and waits for it, returning how the run ended.
    pub fn stop(mut self) -> Result<(), ReaderError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), ReaderError> {
        self.stop.store(true, Ordering::Relaxed);
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ReaderError::Panicked)?,
            None => Ok(()),
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::debug!(error = %e, "reader ended with error");
        }
    }
}
