//! Loot events parsed from the game client's chat log.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Name of the in-game currency item.
pub const CURRENCY_ITEM: &str = "Yang";

/// Timestamp layout used by the client, e.g. `24/11/25 00:29:29`.
const TIMESTAMP_FORMAT: &str = "%d/%m/%y %H:%M:%S";

/// Pre-compiled matcher for "item received" lines.
static RECEIVE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d{2}/\d{2}/\d{2})\] \[(\d{2}:\d{2}:\d{2})\]: You receive (\d+) (.+?)\.")
        .unwrap()
});

/// A single "item received" line from the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootEvent {
    /// When the item was received, in the client's local time.
    pub timestamp: NaiveDateTime,
    /// How many units were received.
    pub quantity: u64,
    /// Item name, verbatim from the log.
    pub item: String,
}

impl LootEvent {
    /// Whether this event carries currency rather than a material.
    #[must_use]
    pub fn is_currency(&self) -> bool {
        self.item == CURRENCY_ITEM
    }
}

/// Parses one raw log line.
///
/// Returns `None` for anything that is not an "item received" line. Most
/// lines in a chat log are unrelated, so this is the common case.
pub fn parse_line(line: &str) -> Option<LootEvent> {
    let caps = RECEIVE_LINE_RE.captures(line)?;

    let timestamp =
        NaiveDateTime::parse_from_str(&format!("{} {}", &caps[1], &caps[2]), TIMESTAMP_FORMAT)
            .ok()?;
    let quantity = caps[3].parse().ok()?;

    Some(LootEvent {
        timestamp,
        quantity,
        item: caps[4].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    #[test]
    fn parses_currency_line() {
        let event = parse_line("[24/11/25] [00:29:29]: You receive 500000 Yang.").unwrap();

        let expected = NaiveDate::from_ymd_opt(2025, 11, 24)
            .unwrap()
            .and_hms_opt(0, 29, 29)
            .unwrap();
        assert_eq!(event.timestamp, expected);
        assert_eq!(event.quantity, 500_000);
        assert_eq!(event.item, "Yang");
        assert!(event.is_currency());
    }

    #[test]
    fn keeps_item_name_verbatim() {
        let event =
            parse_line("[01/02/25] [13:00:00]: You receive 1 Fragment of a Pass [U-1].").unwrap();
        assert_eq!(event.item, "Fragment of a Pass [U-1]");
        assert!(!event.is_currency());

        let lower = parse_line("[01/02/25] [13:00:00]: You receive 1 yang.").unwrap();
        assert!(!lower.is_currency());
    }

    #[test]
    fn ignores_unrelated_lines() {
        assert!(parse_line("").is_none());
        assert!(parse_line("[24/11/25] [00:29:29]: Welcome to the server").is_none());
        assert!(parse_line("[24/11/25] [00:29:29]: You receive Yang.").is_none());
        // Missing terminating period
        assert!(parse_line("[24/11/25] [00:29:29]: You receive 3 Shard").is_none());
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(parse_line("[31/02/25] [10:00:00]: You receive 1 Shard.").is_none());
        assert!(parse_line("[01/01/25] [25:00:00]: You receive 1 Shard.").is_none());
    }

    #[test]
    fn rejects_quantity_overflow() {
        let line = "[01/01/25] [10:00:00]: You receive 99999999999999999999999 Yang.";
        assert!(parse_line(line).is_none());
    }

    #[test]
    fn tolerates_trailing_newline() {
        let event = parse_line("[01/01/25] [10:00:00]: You receive 200 Shard.\r\n").unwrap();
        assert_eq!(event.item, "Shard");
        assert_eq!(event.quantity, 200);
    }
}
