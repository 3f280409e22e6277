//! Consumer-side session state.
//!
//! A [`Session`] owns everything that the consumer may change between
//! snapshots: the crafting split and the derived net figures. Each incoming
//! snapshot and each reclassification recomputes the derived values from the
//! latest snapshot, so they always agree with the current split.

use crate::crafting::{CostTable, NetStats, ReconcileError, Reconciler};
use crate::dungeon::{DungeonTable, DungeonTally};
use crate::window::RawStats;

#[derive(Debug, Clone)]
pub struct Session {
    reconciler: Reconciler,
    dungeons: DungeonTable,
    latest: Option<RawStats>,
    net: Option<NetStats>,
    tally: DungeonTally,
}

impl Session {
    #[must_use]
    pub fn new(costs: CostTable, dungeons: DungeonTable) -> Self {
        Self {
            reconciler: Reconciler::new(costs),
            dungeons,
            latest: None,
            net: None,
            tally: DungeonTally::default(),
        }
    }

    /// Takes in a freshly published snapshot.
    pub fn apply(&mut self, raw: RawStats) -> &NetStats {
        self.reconciler.observe(&raw);
        self.tally = self.dungeons.classify(raw.per_item_quantity());
        let net = self.net.insert(self.reconciler.net(&raw));
        self.latest = Some(raw);
        net
    }

    pub fn reclassify(&mut self, pass: &str, dropped: u64) -> Result<(), ReconcileError> {
        self.reconciler.reclassify(pass, dropped)?;
        self.refresh();
        Ok(())
    }

    pub fn set_all_crafted(&mut self, pass: &str) -> Result<(), ReconcileError> {
        self.reconciler.set_all_crafted(pass)?;
        self.refresh();
        Ok(())
    }

    pub fn set_all_dropped(&mut self, pass: &str) -> Result<(), ReconcileError> {
        self.reconciler.set_all_dropped(pass)?;
        self.refresh();
        Ok(())
    }

    /// Marks one crafted unit of the latest pass as dropped.
    pub fn mark_last_dropped(&mut self) -> Result<String, ReconcileError> {
        let pass = self.reconciler.mark_last_dropped()?;
        self.refresh();
        Ok(pass)
    }

    /// Clears the crafting split, the latest snapshot and everything derived.
    pub fn reset(&mut self) {
        self.reconciler.clear();
        self.latest = None;
        self.net = None;
        self.tally = DungeonTally::default();
        tracing::info!("session reset");
    }

    #[must_use]
    pub const fn latest(&self) -> Option<&RawStats> {
        self.latest.as_ref()
    }

    #[must_use]
    pub const fn net(&self) -> Option<&NetStats> {
        self.net.as_ref()
    }

    #[must_use]
    pub const fn tally(&self) -> &DungeonTally {
        &self.tally
    }

    #[must_use]
    pub const fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    fn refresh(&mut self) {
        self.net = self.latest.as_ref().map(|raw| self.reconciler.net(raw));
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(CostTable::builtin(), DungeonTable::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, NaiveDate};

    use crate::event::LootEvent;

    fn raw(entries: &[(i64, u64, &str)]) -> RawStats {
        let base = NaiveDate::from_ymd_opt(2025, 11, 24)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        let events: Vec<LootEvent> = entries
            .iter()
            .map(|&(secs, quantity, item)| LootEvent {
                timestamp: base + Duration::seconds(secs),
                quantity,
                item: item.to_string(),
            })
            .collect();
        RawStats::from_events(&events).unwrap()
    }

    #[test]
    fn apply_nets_default_crafted_cost() {
        let mut session = Session::default();
        let net = session.apply(raw(&[
            (0, 10_000_000, "Yang"),
            (1800, 1, "Hellish Pass"),
            (3600, 500, "Shard"),
        ]));

        assert_eq!(net.crafting_currency, 2_000_000);
        assert_eq!(net.net_currency, 8_000_000);
        let shard = net.items.iter().find(|i| i.name == "Shard").unwrap();
        assert_eq!(shard.net_quantity, 100);
    }

    #[test]
    fn reclassify_refreshes_net_without_new_snapshot() {
        let mut session = Session::default();
        session.apply(raw(&[(0, 10_000_000, "Yang"), (60, 2, "Owl Pass")]));
        assert_eq!(session.net().unwrap().net_currency, 6_000_000);

        session.set_all_dropped("Owl Pass").unwrap();
        assert_eq!(session.net().unwrap().net_currency, 10_000_000);

        session.reclassify("Owl Pass", 1).unwrap();
        assert_eq!(session.net().unwrap().net_currency, 8_000_000);

        assert_eq!(session.mark_last_dropped().unwrap(), "Owl Pass");
        assert_eq!(session.net().unwrap().net_currency, 10_000_000);
    }

    #[test]
    fn failed_reclassify_keeps_net() {
        let mut session = Session::default();
        session.apply(raw(&[(0, 1_000, "Yang"), (60, 1, "Demonic Key")]));
        let before = session.net().cloned();

        assert!(session.reclassify("Demonic Key", 5).is_err());
        assert!(session.set_all_crafted("Unknown Pass").is_err());
        assert_eq!(session.net().cloned(), before);
    }

    #[test]
    fn dungeon_tally_follows_latest_snapshot() {
        let mut session = Session::default();
        session.apply(raw(&[(0, 2, "Razador's Chest"), (10, 1, "Nemere's Chest")]));
        assert_eq!(session.tally().total, 3);

        // The Razador chests were evicted from the window.
        session.apply(raw(&[(10, 1, "Nemere's Chest")]));
        assert_eq!(session.tally().total, 1);
        assert!(!session.tally().runs.contains_key("Razador"));
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = Session::default();
        session.apply(raw(&[(0, 3, "Charred Pass"), (5, 1, "Hellgates Chest")]));
        session.reset();

        assert!(session.latest().is_none());
        assert!(session.net().is_none());
        assert_eq!(session.tally(), &DungeonTally::default());
        assert_eq!(session.reconciler().passes().count(), 0);
        assert!(session.set_all_dropped("Charred Pass").is_err());
    }
}
