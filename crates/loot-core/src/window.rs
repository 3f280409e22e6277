//! Retained event window and raw statistics.
//!
//! The [`Aggregator`] keeps the events that are currently relevant under one
//! [`RetentionPolicy`] and computes [`RawStats`] from them on demand. Rates in
//! `RawStats` are kept fractional; rounding is left to presentation so that
//! later composition with crafting deltas does not compound rounding error.

use std::collections::{HashMap, VecDeque};

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::event::LootEvent;

/// Floor applied to the observed span so rates never divide by zero.
const MIN_ELAPSED_SECS: f64 = 1.0;

/// Which events stay in the window after each append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Keep events no older than `duration` before the latest event.
    Trailing(Duration),
    /// Keep events at or after a fixed session start.
    FixedStart(NaiveDateTime),
    /// Keep everything.
    Unbounded,
}

impl RetentionPolicy {
    /// Trailing window of the given number of minutes.
    ///
    /// Lengths too large to represent keep everything.
    #[must_use]
    pub fn trailing_minutes(minutes: i64) -> Self {
        Duration::try_minutes(minutes).map_or(Self::Unbounded, Self::Trailing)
    }

    /// Lowest timestamp still retained once `latest` has been appended.
    ///
    /// A trailing window reaching past the earliest representable time has
    /// no lower bound.
    fn lower_bound(&self, latest: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::Trailing(duration) => latest.checked_sub_signed(*duration),
            Self::FixedStart(start) => Some(*start),
            Self::Unbounded => None,
        }
    }
}

/// Per-item figures within one computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStat {
    pub name: String,
    pub quantity: u64,
    /// Units per hour over the observed span, unrounded.
    pub per_hour: f64,
}

/// Un-adjusted statistics over the current window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStats {
    /// Timestamp of the oldest retained event.
    pub start_ts: NaiveDateTime,
    /// Timestamp of the newest retained event.
    pub end_ts: NaiveDateTime,
    pub elapsed_hours: f64,
    pub elapsed_minutes: f64,
    pub total_currency: u64,
    pub currency_per_hour: f64,
    pub currency_per_minute: f64,
    /// Materials ordered by quantity descending, ties in first-seen order.
    pub items: Vec<ItemStat>,
}

impl RawStats {
    /// Computes statistics over events in timestamp order.
    ///
    /// Returns `None` when there are no events, which is distinct from a
    /// window that holds events but yields zero loot.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_events<'a, I>(events: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a LootEvent>,
    {
        let mut events = events.into_iter();
        let first = events.next()?;

        let mut last = first;
        let mut total_currency = 0u64;
        let mut quantities: Vec<(String, u64)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for event in std::iter::once(first).chain(events) {
            last = event;
            if event.is_currency() {
                total_currency = total_currency.saturating_add(event.quantity);
                continue;
            }
            match index.get(event.item.as_str()) {
                Some(&i) => quantities[i].1 = quantities[i].1.saturating_add(event.quantity),
                None => {
                    index.insert(&event.item, quantities.len());
                    quantities.push((event.item.clone(), event.quantity));
                }
            }
        }

        let span_secs = (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0;
        let elapsed_secs = span_secs.max(MIN_ELAPSED_SECS);
        let elapsed_hours = elapsed_secs / 3600.0;
        let elapsed_minutes = elapsed_secs / 60.0;

        // Stable: equal quantities keep first-seen order.
        quantities.sort_by(|a, b| b.1.cmp(&a.1));
        let items = quantities
            .into_iter()
            .map(|(name, quantity)| ItemStat {
                per_hour: quantity as f64 / elapsed_hours,
                name,
                quantity,
            })
            .collect();

        Some(Self {
            start_ts: first.timestamp,
            end_ts: last.timestamp,
            elapsed_hours,
            elapsed_minutes,
            total_currency,
            currency_per_hour: total_currency as f64 / elapsed_hours,
            currency_per_minute: total_currency as f64 / elapsed_minutes,
            items,
        })
    }

    /// Quantity of a material in this window, if it was received at all.
    #[must_use]
    pub fn quantity(&self, name: &str) -> Option<u64> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.quantity)
    }

    /// Iterates `(name, quantity)` pairs in report order.
    pub fn per_item_quantity(&self) -> impl Iterator<Item = (&str, u64)> {
        self.items
            .iter()
            .map(|item| (item.name.as_str(), item.quantity))
    }
}

/// Holds the retained window and computes statistics over it.
#[derive(Debug)]
pub struct Aggregator {
    policy: RetentionPolicy,
    window: VecDeque<LootEvent>,
}

impl Aggregator {
    #[must_use]
    pub const fn new(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            window: VecDeque::new(),
        }
    }

    /// Appends an event and evicts whatever falls outside the policy.
    ///
    /// Events are expected in non-decreasing timestamp order, so eviction
    /// only ever inspects the front.
    pub fn append(&mut self, event: LootEvent) {
        let latest = event.timestamp;
        self.window.push_back(event);

        let Some(bound) = self.policy.lower_bound(latest) else {
            return;
        };
        while self
            .window
            .front()
            .is_some_and(|front| front.timestamp < bound)
        {
            self.window.pop_front();
        }
    }

    /// Raw statistics over the window, or `None` when it is empty.
    #[must_use]
    pub fn compute(&self) -> Option<RawStats> {
        RawStats::from_events(&self.window)
    }

    /// Events currently retained, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &LootEvent> {
        self.window.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    fn at(secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 24)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            + Duration::seconds(secs)
    }

    fn event(secs: i64, quantity: u64, item: &str) -> LootEvent {
        LootEvent {
            timestamp: at(secs),
            quantity,
            item: item.to_string(),
        }
    }

    #[test]
    fn empty_window_has_no_stats() {
        let aggregator = Aggregator::new(RetentionPolicy::Unbounded);
        assert!(aggregator.compute().is_none());
    }

    #[test]
    fn single_event_floors_elapsed_to_one_second() {
        let mut aggregator = Aggregator::new(RetentionPolicy::Unbounded);
        aggregator.append(event(0, 10, "Yang"));
        aggregator.append(event(0, 4, "Shard"));

        let stats = aggregator.compute().unwrap();
        assert!((stats.elapsed_hours - 1.0 / 3600.0).abs() < 1e-12);
        assert!((stats.elapsed_minutes - 1.0 / 60.0).abs() < 1e-12);
        assert!((stats.currency_per_hour - 36_000.0).abs() < 1e-6);
        assert!((stats.currency_per_minute - 600.0).abs() < 1e-6);
        assert!((stats.items[0].per_hour - 14_400.0).abs() < 1e-6);
    }

    #[test]
    fn trailing_window_keeps_exactly_recent_events() {
        let duration = Duration::minutes(5);
        let mut aggregator = Aggregator::new(RetentionPolicy::Trailing(duration));
        let offsets = [0, 30, 60, 200, 299, 300, 301, 650, 650, 900, 1500];
        let mut seen = Vec::new();

        for (i, secs) in offsets.into_iter().enumerate() {
            let ev = event(secs, i as u64 + 1, "Shard");
            seen.push(ev.clone());
            aggregator.append(ev);

            let cutoff = at(secs) - duration;
            let expected: Vec<_> = seen.iter().filter(|e| e.timestamp >= cutoff).collect();
            let actual: Vec<_> = aggregator.events().collect();
            assert_eq!(actual, expected, "after appending offset {secs}");
        }
    }

    #[test]
    fn fixed_start_drops_events_before_start() {
        let mut aggregator = Aggregator::new(RetentionPolicy::FixedStart(at(100)));
        aggregator.append(event(50, 1, "Shard"));
        aggregator.append(event(99, 1, "Shard"));
        aggregator.append(event(100, 2, "Shard"));
        aggregator.append(event(5000, 3, "Shard"));

        let kept: Vec<u64> = aggregator.events().map(|e| e.quantity).collect();
        assert_eq!(kept, vec![2, 3]);
    }

    #[test]
    fn unbounded_never_evicts() {
        let mut aggregator = Aggregator::new(RetentionPolicy::Unbounded);
        for day in 0..10 {
            aggregator.append(event(day * 86_400, 1, "Shard"));
        }
        assert_eq!(aggregator.len(), 10);
    }

    #[test]
    fn huge_trailing_window_keeps_everything() {
        let mut aggregator =
            Aggregator::new(RetentionPolicy::Trailing(Duration::minutes(10_000_000_000_000)));
        aggregator.append(event(0, 1, "Shard"));
        aggregator.append(event(86_400, 2, "Shard"));
        assert_eq!(aggregator.len(), 2);

        assert_eq!(
            RetentionPolicy::trailing_minutes(i64::MAX),
            RetentionPolicy::Unbounded
        );
    }

    #[test]
    fn currency_is_separated_from_items() {
        let mut aggregator = Aggregator::new(RetentionPolicy::Unbounded);
        aggregator.append(event(0, 500_000, "Yang"));
        aggregator.append(event(1800, 250_000, "Yang"));
        aggregator.append(event(3600, 7, "Shard"));

        let stats = aggregator.compute().unwrap();
        assert_eq!(stats.total_currency, 750_000);
        assert!((stats.elapsed_hours - 1.0).abs() < 1e-12);
        assert!((stats.currency_per_hour - 750_000.0).abs() < 1e-6);
        assert_eq!(stats.quantity("Shard"), Some(7));
        assert_eq!(stats.quantity("Yang"), None);
        assert_eq!(stats.start_ts, at(0));
        assert_eq!(stats.end_ts, at(3600));
    }

    #[test]
    fn items_sorted_by_quantity_with_stable_ties() {
        let mut aggregator = Aggregator::new(RetentionPolicy::Unbounded);
        aggregator.append(event(0, 3, "Beta"));
        aggregator.append(event(1, 5, "Alpha"));
        aggregator.append(event(2, 3, "Gamma"));
        aggregator.append(event(3, 2, "Beta"));
        aggregator.append(event(4, 1, "Delta"));

        let stats = aggregator.compute().unwrap();
        let order: Vec<(&str, u64)> = stats.per_item_quantity().collect();
        assert_eq!(
            order,
            vec![("Beta", 5), ("Alpha", 5), ("Gamma", 3), ("Delta", 1)]
        );
    }

    #[test]
    fn stats_serialization_preserves_item_order_and_quantities() {
        let mut aggregator = Aggregator::new(RetentionPolicy::Unbounded);
        aggregator.append(event(0, 18_446_744_073_709_551_615, "Huge"));
        aggregator.append(event(10, 3, "Small"));
        aggregator.append(event(20, 3, "Tied"));

        let stats = aggregator.compute().unwrap();
        let json = serde_json::to_string(&stats).unwrap();
        let parsed: RawStats = serde_json::from_str(&json).unwrap();

        let original: Vec<(&str, u64)> = stats.per_item_quantity().collect();
        let reparsed: Vec<(&str, u64)> = parsed.per_item_quantity().collect();
        assert_eq!(original, reparsed);
    }
}
