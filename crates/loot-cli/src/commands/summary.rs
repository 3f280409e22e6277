//! Summary command for statistics over a whole log file.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use loot_core::{Session, summarize_file};

use crate::Config;
use crate::report::{JsonReport, render_text};

pub fn run<W: Write>(writer: &mut W, config: &Config, log: &Path, json: bool) -> Result<()> {
    let raw = summarize_file(log).with_context(|| format!("failed to read {}", log.display()))?;
    let Some(raw) = raw else {
        writeln!(writer, "No loot events found.")?;
        return Ok(());
    };

    let mut session = Session::new(config.recipes.clone(), config.dungeons.clone());
    session.apply(raw);
    let (Some(raw), Some(net)) = (session.latest(), session.net()) else {
        return Ok(());
    };

    if json {
        let report = JsonReport::new(raw, net, session.tally());
        serde_json::to_writer(&mut *writer, &report).context("failed to serialize report")?;
        writeln!(writer)?;
    } else {
        write!(writer, "{}", render_text(net, session.tally()))?;
    }

    Ok(())
}
