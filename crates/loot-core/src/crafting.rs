//! Crafting cost reconciliation.
//!
//! Some items ("passes") are either crafted from fragments at a fixed cost or
//! dropped outright. The log only reports how many units were received, so the
//! [`Reconciler`] keeps a crafted/dropped split per pass type and nets the cost
//! of the crafted portion out of the raw figures.
//!
//! New quantity is assumed crafted until the user says otherwise. That default
//! is a heuristic about how players usually acquire passes, not something the
//! log can confirm.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::window::RawStats;

/// Errors returned by reconciliation control calls.
///
/// Every failed call leaves the reconciler state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The name is not a tracked pass type.
    #[error("unknown pass: {name}")]
    UnknownPass { name: String },

    /// The requested dropped count does not fit the owned total.
    #[error("dropped count {dropped} out of range for {name} (total {total})")]
    DroppedOutOfRange {
        name: String,
        dropped: u64,
        total: u64,
    },

    /// No crafted unit is available to convert.
    #[error("no crafted pass left to mark as dropped")]
    NothingToMark,
}

/// What it costs to craft one unit of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Currency spent per crafted unit.
    pub currency: u64,
    /// Materials consumed per crafted unit.
    #[serde(default)]
    pub materials: BTreeMap<String, u64>,
}

/// Craftable item name to its recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostTable(BTreeMap<String, Recipe>);

impl CostTable {
    /// The recipes known to the game at the time of writing.
    #[must_use]
    pub fn builtin() -> Self {
        const SHARD: &str = "Shard";
        let recipes: [(&str, u64, [&str; 2], u64); 9] = [
            (
                "Hellish Pass",
                2_000_000,
                ["Fragment of a Pass [U-1]", "Fragment of a Pass [U-2]"],
                400,
            ),
            (
                "Ice-cold Pass",
                1_500_000,
                ["Fragment of a Pass [N-1]", "Fragment of a Pass [N-2]"],
                200,
            ),
            (
                "Grass-covered Pass",
                1_500_000,
                ["Fragment of a Pass [J-1]", "Fragment of a Pass [J-2]"],
                200,
            ),
            (
                "Charred Pass",
                1_500_000,
                ["Fragment of a Pass [R-1]", "Fragment of a Pass [R-2]"],
                200,
            ),
            (
                "Owl Pass",
                2_000_000,
                ["Piece of an Owl Pass [L]", "Piece of an Owl Pass [R]"],
                500,
            ),
            (
                "Taliko's Paradise Pass",
                2_000_000,
                ["Piece of a Papyrus [L]", "Piece of a Papyrus [R]"],
                700,
            ),
            (
                "Demonic Key",
                5_000_000,
                ["Piece of a Demonic Key [1]", "Piece of a Demonic Key [2]"],
                1000,
            ),
            (
                "Nalantir's Tooth",
                7_500_000,
                ["Broken Dragon Tooth [1]", "Broken Dragon Tooth [2]"],
                1500,
            ),
            (
                "Map to the Abandoned Fortress",
                7_500_000,
                ["Part of an Ancient Map [1]", "Part of an Ancient Map [2]"],
                2000,
            ),
        ];

        recipes
            .into_iter()
            .map(|(name, currency, [left, right], shards)| {
                let materials = [(left, 1), (right, 1), (SHARD, shards)]
                    .into_iter()
                    .map(|(item, qty)| (item.to_string(), qty))
                    .collect();
                (name.to_string(), Recipe { currency, materials })
            })
            .collect()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Recipe> {
        self.0.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Recipe)> {
        self.0.iter().map(|(name, recipe)| (name.as_str(), recipe))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CostTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FromIterator<(String, Recipe)> for CostTable {
    fn from_iter<T: IntoIterator<Item = (String, Recipe)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Owned quantity of one pass type, split by how it was acquired.
///
/// `crafted + dropped == total` holds for every value this type can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassState {
    total: u64,
    crafted: u64,
    dropped: u64,
}

impl PassState {
    /// A fresh state with every unit assumed crafted.
    #[must_use]
    pub const fn all_crafted(total: u64) -> Self {
        Self {
            total,
            crafted: total,
            dropped: 0,
        }
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub const fn crafted(&self) -> u64 {
        self.crafted
    }

    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Adds newly observed units, all of them assumed crafted.
    fn grow(&mut self, delta: u64) {
        self.total += delta;
        self.crafted += delta;
    }

    fn set_dropped(&mut self, dropped: u64) {
        debug_assert!(dropped <= self.total);
        self.dropped = dropped;
        self.crafted = self.total - dropped;
    }
}

/// Summed cost of every crafted pass currently tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CraftingDelta {
    pub currency: u64,
    pub materials: BTreeMap<String, u64>,
}

impl CraftingDelta {
    #[must_use]
    pub fn material(&self, name: &str) -> u64 {
        self.materials.get(name).copied().unwrap_or(0)
    }
}

/// One material line after crafting costs are netted out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetItem {
    pub name: String,
    pub raw_quantity: u64,
    /// Negative when declared crafting consumed more than the window received.
    pub net_quantity: i64,
    pub raw_per_hour: f64,
    pub net_per_hour: f64,
    /// Crafted/dropped split when the item is itself a pass type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<PassState>,
}

/// Raw statistics combined with the crafting split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetStats {
    pub start_ts: NaiveDateTime,
    pub end_ts: NaiveDateTime,
    pub elapsed_hours: f64,
    pub elapsed_minutes: f64,
    pub raw_currency: u64,
    pub crafting_currency: u64,
    pub net_currency: i64,
    pub net_currency_per_hour: f64,
    pub net_currency_per_minute: f64,
    pub items: Vec<NetItem>,
}

/// Tracks the crafted/dropped split per pass type and derives net figures.
#[derive(Debug, Clone)]
pub struct Reconciler {
    costs: CostTable,
    passes: BTreeMap<String, PassState>,
    /// Last pass type in the latest snapshot's item order.
    last_seen: Option<String>,
    delta: CraftingDelta,
}

impl Reconciler {
    #[must_use]
    pub fn new(costs: CostTable) -> Self {
        Self {
            costs,
            passes: BTreeMap::new(),
            last_seen: None,
            delta: CraftingDelta::default(),
        }
    }

    #[must_use]
    pub const fn costs(&self) -> &CostTable {
        &self.costs
    }

    #[must_use]
    pub fn pass(&self, name: &str) -> Option<PassState> {
        self.passes.get(name).copied()
    }

    pub fn passes(&self) -> impl Iterator<Item = (&str, PassState)> {
        self.passes.iter().map(|(name, state)| (name.as_str(), *state))
    }

    #[must_use]
    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    #[must_use]
    pub const fn delta(&self) -> &CraftingDelta {
        &self.delta
    }

    /// Folds a new snapshot into the per-pass state.
    ///
    /// Only names that are themselves recipes are tracked. Growth is assumed
    /// crafted; a shrinking total (eviction) leaves the state alone so earlier
    /// corrections survive. Returns whether anything changed.
    pub fn observe(&mut self, raw: &RawStats) -> bool {
        let mut changed = false;
        self.last_seen = raw
            .per_item_quantity()
            .map(|(name, _)| name)
            .filter(|name| self.costs.contains(name))
            .last()
            .map(str::to_string);

        for (name, quantity) in raw.per_item_quantity() {
            if !self.costs.contains(name) {
                continue;
            }
            match self.passes.get_mut(name) {
                None => {
                    tracing::debug!(pass = name, quantity, "tracking new pass type");
                    self.passes
                        .insert(name.to_string(), PassState::all_crafted(quantity));
                }
                Some(state) if quantity > state.total => {
                    let delta = quantity - state.total;
                    tracing::debug!(pass = name, delta, "pass total increased");
                    state.grow(delta);
                }
                Some(_) => continue,
            }
            changed = true;
        }

        if changed {
            self.recompute();
        }
        changed
    }

    /// Declares how many owned units of `name` were dropped.
    pub fn reclassify(&mut self, name: &str, dropped: u64) -> Result<(), ReconcileError> {
        let state = self.state_mut(name)?;
        if dropped > state.total {
            return Err(ReconcileError::DroppedOutOfRange {
                name: name.to_string(),
                dropped,
                total: state.total,
            });
        }
        state.set_dropped(dropped);
        tracing::debug!(pass = name, dropped, "reclassified pass");
        self.recompute();
        Ok(())
    }

    pub fn set_all_crafted(&mut self, name: &str) -> Result<(), ReconcileError> {
        self.reclassify(name, 0)
    }

    pub fn set_all_dropped(&mut self, name: &str) -> Result<(), ReconcileError> {
        let total = self.state_mut(name)?.total;
        self.reclassify(name, total)
    }

    /// Moves one crafted unit of the last pass in the current window to
    /// dropped.
    ///
    /// Passes already evicted from the window are never picked. Returns the
    /// affected pass name.
    pub fn mark_last_dropped(&mut self) -> Result<String, ReconcileError> {
        let name = self.last_seen.clone().ok_or(ReconcileError::NothingToMark)?;
        let state = self.state_mut(&name)?;
        if state.crafted == 0 {
            return Err(ReconcileError::NothingToMark);
        }
        let dropped = state.dropped + 1;
        self.reclassify(&name, dropped)?;
        Ok(name)
    }

    /// Combines raw statistics with the current crafting split.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn net(&self, raw: &RawStats) -> NetStats {
        let crafting_currency = self.delta.currency;
        let crafting_currency_f = crafting_currency as f64;

        let items = raw
            .items
            .iter()
            .map(|item| {
                let consumed = self.delta.material(&item.name);
                NetItem {
                    name: item.name.clone(),
                    raw_quantity: item.quantity,
                    net_quantity: signed(item.quantity) - signed(consumed),
                    raw_per_hour: item.per_hour,
                    net_per_hour: item.per_hour - consumed as f64 / raw.elapsed_hours,
                    pass: self.pass(&item.name),
                }
            })
            .collect();

        NetStats {
            start_ts: raw.start_ts,
            end_ts: raw.end_ts,
            elapsed_hours: raw.elapsed_hours,
            elapsed_minutes: raw.elapsed_minutes,
            raw_currency: raw.total_currency,
            crafting_currency,
            net_currency: signed(raw.total_currency) - signed(crafting_currency),
            net_currency_per_hour: raw.currency_per_hour - crafting_currency_f / raw.elapsed_hours,
            net_currency_per_minute: raw.currency_per_minute
                - crafting_currency_f / raw.elapsed_minutes,
            items,
        }
    }

    /// Forgets every tracked pass.
    pub fn clear(&mut self) {
        self.passes.clear();
        self.last_seen = None;
        self.delta = CraftingDelta::default();
    }

    fn state_mut(&mut self, name: &str) -> Result<&mut PassState, ReconcileError> {
        self.passes
            .get_mut(name)
            .ok_or_else(|| ReconcileError::UnknownPass {
                name: name.to_string(),
            })
    }

    /// Rebuilds the crafting delta from scratch.
    fn recompute(&mut self) {
        let mut delta = CraftingDelta::default();

        for (name, state) in &self.passes {
            if state.crafted == 0 {
                continue;
            }
            let Some(recipe) = self.costs.get(name) else {
                continue;
            };
            delta.currency = delta
                .currency
                .saturating_add(recipe.currency.saturating_mul(state.crafted));
            for (material, per_unit) in &recipe.materials {
                let entry = delta.materials.entry(material.clone()).or_default();
                *entry = entry.saturating_add(per_unit.saturating_mul(state.crafted));
            }
        }

        self.delta = delta;
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(CostTable::builtin())
    }
}

fn signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
