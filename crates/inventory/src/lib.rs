//! Inventory domain module (event-sourced).
//!
//! A small reference domain for the commit/checkout engine: business rules
//! implemented purely as deterministic domain logic (no IO, no storage),
//! including the conflict rules consulted after a lost write race.

pub mod item;

pub use item::{
    AdjustStock, CreateItem, InventoryCommand, InventoryEvent, InventoryItem, InventoryItemId,
    ItemCreated, ItemRenamed, RenameItem, StockAdjusted,
};
