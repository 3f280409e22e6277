//! Whole-file statistics without tailing.

use std::path::Path;

use rayon::prelude::*;

use crate::event::{LootEvent, parse_line};
use crate::reader::ReaderError;
use crate::window::RawStats;

/// Parses every loot event in `text`, in line order.
pub fn parse_log(text: &str) -> Vec<LootEvent> {
    text.par_lines().filter_map(parse_line).collect()
}

/// Reads a complete log file and computes statistics over all of it.
///
/// Invalid UTF-8 is replaced rather than rejected. Returns `Ok(None)` when
/// the file holds no loot events.
pub fn summarize_file(path: &Path) -> Result<Option<RawStats>, ReaderError> {
    let bytes = std::fs::read(path).map_err(|source| ReaderError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let events = parse_log(&text);
    tracing::debug!(events = events.len(), path = %path.display(), "parsed log file");
    Ok(RawStats::from_events(&events))
}
