//! Dungeon run counting from chest drops.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Chest item name to the dungeon it comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DungeonTable(BTreeMap<String, String>);

impl DungeonTable {
    #[must_use]
    pub fn builtin() -> Self {
        [
            ("Razador's Chest", "Razador"),
            ("Nemere's Chest", "Nemere"),
            ("Jotun Thrym's Chest", "Jotun"),
            ("Hellgates Chest", "Blue Death"),
        ]
        .into_iter()
        .map(|(chest, dungeon)| (chest.to_string(), dungeon.to_string()))
        .collect()
    }

    #[must_use]
    pub fn category(&self, item: &str) -> Option<&str> {
        self.0.get(item).map(String::as_str)
    }

    /// Counts runs per dungeon in one snapshot's item quantities.
    ///
    /// Always computed from scratch so the tally follows the window when
    /// old events are evicted.
    pub fn classify<'a, I>(&self, items: I) -> DungeonTally
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        let mut tally = DungeonTally::default();
        for (name, quantity) in items {
            let Some(dungeon) = self.category(name) else {
                continue;
            };
            *tally.runs.entry(dungeon.to_string()).or_default() += quantity;
            tally.total += quantity;
        }
        tally
    }
}

impl Default for DungeonTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FromIterator<(String, String)> for DungeonTable {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Runs per dungeon plus the grand total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DungeonTally {
    pub runs: BTreeMap<String, u64>,
    pub total: u64,
}
