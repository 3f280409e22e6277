//! Core logic for the loot analyzer.
//!
//! This crate contains:
//! - Event parsing: recognising "item received" lines in the chat log
//! - Windowed aggregation: raw currency and item statistics over a retained window
//! - Log tailing: polling a growing log and publishing snapshots
//! - Crafting reconciliation: netting out the cost of crafted passes
//! - Dungeon run counting from chest drops

pub mod crafting;
pub mod dungeon;
pub mod event;
pub mod range;
pub mod reader;
pub mod session;
pub mod summary;
pub mod window;

pub use crafting::{
    CostTable, CraftingDelta, NetItem, NetStats, PassState, Recipe, ReconcileError, Reconciler,
};
pub use dungeon::{DungeonTable, DungeonTally};
pub use event::{CURRENCY_ITEM, LootEvent, parse_line};
pub use range::{RangeError, ResolvedRange, TimeRange};
pub use reader::{Monitor, Publication, ReaderConfig, ReaderError, StartMode, run};
pub use session::Session;
pub use summary::{parse_log, summarize_file};
pub use window::{Aggregator, ItemStat, RawStats, RetentionPolicy};
