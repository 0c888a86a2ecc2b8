use serde::{Deserialize, Serialize};

use chronicle_core::{
    AggregateId, AggregateRoot, DomainError, DomainEvent, DomainEventSequence, DomainResult,
    Revision,
};

/// Inventory item identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryItemId(pub AggregateId);

impl InventoryItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InventoryItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: InventoryItem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    id: InventoryItemId,
    revision: Revision,
    tracked: DomainEventSequence<InventoryEvent>,
    name: String,
    stock: i64,
    created: bool,
}

impl InventoryItem {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: InventoryItemId) -> Self {
        Self {
            id,
            revision: Revision::empty(),
            tracked: DomainEventSequence::empty(),
            name: String::new(),
            stock: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> &InventoryItemId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stock(&self) -> i64 {
        self.stock
    }

    /// Revision including events recorded but not yet committed.
    pub fn current_revision(&self) -> Revision {
        if self.tracked.is_empty() {
            self.revision
        } else {
            self.tracked.head_revision()
        }
    }
}

/// Command: CreateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItem {
    pub item_id: InventoryItemId,
    pub name: String,
}

/// Command: AdjustStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub item_id: InventoryItemId,
    pub delta: i64,
}

/// Command: RenameItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameItem {
    pub item_id: InventoryItemId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    CreateItem(CreateItem),
    AdjustStock(AdjustStock),
    RenameItem(RenameItem),
}

/// Event: ItemCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreated {
    pub item_id: InventoryItemId,
    pub revision: Revision,
    pub name: String,
}

/// Event: StockAdjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjusted {
    pub item_id: InventoryItemId,
    pub revision: Revision,
    pub delta: i64,
}

/// Event: ItemRenamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRenamed {
    pub item_id: InventoryItemId,
    pub revision: Revision,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum InventoryEvent {
    #[serde(rename = "inventory.item.created")]
    ItemCreated(ItemCreated),
    #[serde(rename = "inventory.item.stock_adjusted")]
    StockAdjusted(StockAdjusted),
    #[serde(rename = "inventory.item.renamed")]
    ItemRenamed(ItemRenamed),
}

impl InventoryEvent {
    pub fn item_created(item_id: InventoryItemId, revision: Revision, name: &str) -> Self {
        InventoryEvent::ItemCreated(ItemCreated {
            item_id,
            revision,
            name: name.to_string(),
        })
    }

    pub fn stock_adjusted(item_id: InventoryItemId, revision: Revision, delta: i64) -> Self {
        InventoryEvent::StockAdjusted(StockAdjusted {
            item_id,
            revision,
            delta,
        })
    }

    pub fn item_renamed(item_id: InventoryItemId, revision: Revision, name: &str) -> Self {
        InventoryEvent::ItemRenamed(ItemRenamed {
            item_id,
            revision,
            name: name.to_string(),
        })
    }

    fn item_id(&self) -> &InventoryItemId {
        match self {
            InventoryEvent::ItemCreated(e) => &e.item_id,
            InventoryEvent::StockAdjusted(e) => &e.item_id,
            InventoryEvent::ItemRenamed(e) => &e.item_id,
        }
    }
}

impl DomainEvent for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemCreated(_) => "inventory.item.created",
            InventoryEvent::StockAdjusted(_) => "inventory.item.stock_adjusted",
            InventoryEvent::ItemRenamed(_) => "inventory.item.renamed",
        }
    }

    fn aggregate_id(&self) -> &AggregateId {
        &self.item_id().0
    }

    fn revision(&self) -> Revision {
        match self {
            InventoryEvent::ItemCreated(e) => e.revision,
            InventoryEvent::StockAdjusted(e) => e.revision,
            InventoryEvent::ItemRenamed(e) => e.revision,
        }
    }

    fn with_revision(&self, revision: Revision) -> Self {
        let mut copy = self.clone();
        match &mut copy {
            InventoryEvent::ItemCreated(e) => e.revision = revision,
            InventoryEvent::StockAdjusted(e) => e.revision = revision,
            InventoryEvent::ItemRenamed(e) => e.revision = revision,
        }
        copy
    }

    /// Conflict rules:
    /// - creating an item conflicts with anything (it assumes an empty stream)
    /// - two renames conflict (last writer would silently win)
    /// - two withdrawals conflict (together they may overdraw stock)
    /// - everything else commutes
    fn conflicts_with(&self, other: &Self) -> bool {
        match (self, other) {
            (InventoryEvent::ItemCreated(_), _) | (_, InventoryEvent::ItemCreated(_)) => true,
            (InventoryEvent::ItemRenamed(_), InventoryEvent::ItemRenamed(_)) => true,
            (InventoryEvent::StockAdjusted(a), InventoryEvent::StockAdjusted(b)) => {
                a.delta < 0 && b.delta < 0
            }
            _ => false,
        }
    }
}

impl AggregateRoot for InventoryItem {
    type Event = InventoryEvent;

    fn reconstitute_from_history(
        aggregate_id: AggregateId,
        history: &DomainEventSequence<Self::Event>,
    ) -> DomainResult<Self> {
        let mut item = Self::empty(InventoryItemId::new(aggregate_id));
        for event in history {
            if event.aggregate_id() != &item.id.0 {
                return Err(DomainError::aggregate_mismatch(&item.id.0, event.aggregate_id()));
            }
            item.apply(event);
        }
        item.revision = history.head_revision();
        Ok(item)
    }

    fn identifier(&self) -> &AggregateId {
        &self.id.0
    }

    fn revision(&self) -> Revision {
        self.revision
    }

    fn tracked_events(&self) -> &DomainEventSequence<Self::Event> {
        &self.tracked
    }
}

impl InventoryItem {
    /// Validate a command and record the resulting event.
    pub fn execute(&mut self, command: &InventoryCommand) -> DomainResult<()> {
        match command {
            InventoryCommand::CreateItem(cmd) => self.handle_create(cmd),
            InventoryCommand::AdjustStock(cmd) => self.handle_adjust(cmd),
            InventoryCommand::RenameItem(cmd) => self.handle_rename(cmd),
        }
    }

    fn apply(&mut self, event: &InventoryEvent) {
        match event {
            InventoryEvent::ItemCreated(e) => {
                self.name = e.name.clone();
                self.stock = 0;
                self.created = true;
            }
            InventoryEvent::StockAdjusted(e) => {
                self.stock += e.delta;
            }
            InventoryEvent::ItemRenamed(e) => {
                self.name = e.name.clone();
            }
        }
    }

    fn record(
        &mut self,
        make: impl FnOnce(InventoryItemId, Revision) -> InventoryEvent,
    ) -> DomainResult<()> {
        let event = make(self.id.clone(), self.current_revision().increment());
        self.tracked = self.tracked.push(event.clone())?;
        self.apply(&event);
        Ok(())
    }

    fn ensure_item_id(&self, item_id: &InventoryItemId) -> Result<(), DomainError> {
        if &self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&mut self, cmd: &CreateItem) -> Result<(), DomainError> {
        if self.created {
            return Err(DomainError::invariant("item already exists"));
        }
        self.ensure_item_id(&cmd.item_id)?;
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        self.record(|item_id, revision| InventoryEvent::item_created(item_id, revision, &cmd.name))
    }

    fn handle_adjust(&mut self, cmd: &AdjustStock) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::invariant("item does not exist"));
        }
        self.ensure_item_id(&cmd.item_id)?;

        if cmd.delta == 0 {
            return Err(DomainError::validation("delta cannot be zero"));
        }

        let new_stock = self.stock + cmd.delta;
        if new_stock < 0 {
            return Err(DomainError::invariant("stock cannot go negative"));
        }

        self.record(|item_id, revision| InventoryEvent::stock_adjusted(item_id, revision, cmd.delta))
    }

    fn handle_rename(&mut self, cmd: &RenameItem) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::invariant("item does not exist"));
        }
        self.ensure_item_id(&cmd.item_id)?;
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if cmd.name == self.name {
            return Ok(());
        }
        self.record(|item_id, revision| InventoryEvent::item_renamed(item_id, revision, &cmd.name))
    }
}
