//! Presentation of snapshots.
//!
//! Core figures stay fractional; this is the only place rates are rounded.

use std::fmt::Write;

use chrono::NaiveDateTime;
use loot_core::{DungeonTally, NetStats, RawStats};
use serde::{Deserialize, Serialize};

/// A published snapshot with presentation rounding applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedSnapshot {
    pub start_ts: NaiveDateTime,
    pub end_ts: NaiveDateTime,
    pub elapsed_hours: f64,
    pub elapsed_minutes: f64,
    pub total_currency: u64,
    pub currency_per_hour: i64,
    pub currency_per_minute: i64,
    /// `(name, quantity, per_hour)` in report order.
    pub items: Vec<(String, u64, i64)>,
}

impl From<&RawStats> for PublishedSnapshot {
    fn from(raw: &RawStats) -> Self {
        Self {
            start_ts: raw.start_ts,
            end_ts: raw.end_ts,
            elapsed_hours: raw.elapsed_hours,
            elapsed_minutes: raw.elapsed_minutes,
            total_currency: raw.total_currency,
            currency_per_hour: round(raw.currency_per_hour),
            currency_per_minute: round(raw.currency_per_minute),
            items: raw
                .items
                .iter()
                .map(|item| (item.name.clone(), item.quantity, round(item.per_hour)))
                .collect(),
        }
    }
}

/// Net figures as shown to the user.
#[derive(Debug, Clone, Serialize)]
pub struct NetView {
    pub currency: i64,
    pub crafting_currency: u64,
    pub currency_per_hour: i64,
    pub currency_per_minute: i64,
    pub items: Vec<NetItemView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetItemView {
    pub name: String,
    pub quantity: i64,
    pub per_hour: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crafted: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropped: Option<u64>,
}

impl From<&NetStats> for NetView {
    fn from(net: &NetStats) -> Self {
        Self {
            currency: net.net_currency,
            crafting_currency: net.crafting_currency,
            currency_per_hour: round(net.net_currency_per_hour),
            currency_per_minute: round(net.net_currency_per_minute),
            items: net
                .items
                .iter()
                .map(|item| NetItemView {
                    name: item.name.clone(),
                    quantity: item.net_quantity,
                    per_hour: round(item.net_per_hour),
                    crafted: item.pass.map(|p| p.crafted()),
                    dropped: item.pass.map(|p| p.dropped()),
                })
                .collect(),
        }
    }
}

/// One JSON document per snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport<'a> {
    pub snapshot: PublishedSnapshot,
    pub net: NetView,
    pub dungeons: &'a DungeonTally,
}

impl<'a> JsonReport<'a> {
    #[must_use]
    pub fn new(raw: &RawStats, net: &NetStats, dungeons: &'a DungeonTally) -> Self {
        Self {
            snapshot: PublishedSnapshot::from(raw),
            net: NetView::from(net),
            dungeons,
        }
    }
}

/// Rounds a rate to the nearest whole unit.
#[allow(clippy::cast_possible_truncation)]
pub fn round(value: f64) -> i64 {
    value.round() as i64
}

/// Formats an integer with thousands separators, e.g. `-1,234,567`.
pub fn format_number(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Renders the human-readable report for one snapshot.
pub fn render_text(net: &NetStats, dungeons: &DungeonTally) -> String {
    let view = NetView::from(net);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Interval: {} -> {}",
        net.start_ts.format("%H:%M:%S"),
        net.end_ts.format("%H:%M:%S")
    );
    let _ = writeln!(
        out,
        "Window: {:.2} h ({:.1} min)",
        net.elapsed_hours, net.elapsed_minutes
    );
    let _ = writeln!(
        out,
        "Yang: {} (crafting {})",
        format_number(view.currency),
        format_number(i64::try_from(view.crafting_currency).unwrap_or(i64::MAX))
    );
    let _ = writeln!(
        out,
        "Yang/h: {}  Yang/min: {}",
        format_number(view.currency_per_hour),
        format_number(view.currency_per_minute)
    );

    if view.items.is_empty() {
        let _ = writeln!(out, "No items.");
    } else {
        let _ = writeln!(out, "{:<32} {:>10} {:>10}  Source", "Item", "Qty", "Per hour");
        for item in &view.items {
            let source = match (item.crafted, item.dropped) {
                (Some(crafted), Some(dropped)) => format!("Craft:{crafted} / Drop:{dropped}"),
                _ => String::new(),
            };
            let line = format!(
                "{:<32} {:>10} {:>10}  {source}",
                item.name,
                format_number(item.quantity),
                format_number(item.per_hour)
            );
            let _ = writeln!(out, "{}", line.trim_end());
        }
    }

    if dungeons.total == 0 {
        let _ = writeln!(out, "Dungeon runs: none");
    } else {
        let _ = writeln!(out, "Dungeon runs: {}", dungeons.total);
        for (dungeon, count) in &dungeons.runs {
            let _ = writeln!(out, "  {dungeon}: {count}");
        }
    }

    out
}
