//! Integration tests for the commit/checkout pipeline.
//!
//! Tests: Command → Aggregate → UnitOfWork → StreamStorage → checkout
//!
//! Verifies:
//! - Recorded events round-trip through storage and replay correctly
//! - Units of work sharing one storage resolve write races
//! - Business-level conflicts stop a commit instead of overwriting
//! - Persisted streams survive JSON serialization

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chronicle_core::{AggregateId, AggregateRoot, Revision, Sequence};
    use chronicle_events::{Metadata, Stream};
    use chronicle_inventory::{
        AdjustStock, CreateItem, InventoryCommand, InventoryEvent, InventoryItem, InventoryItemId,
        RenameItem,
    };

    use crate::event_store::{InMemoryStreamStorage, StreamStorage};
    use crate::unit_of_work::{UnitOfWork, UnitOfWorkError};

    type Store = Arc<InMemoryStreamStorage<InventoryEvent>>;

    fn test_item_id() -> InventoryItemId {
        InventoryItemId::new(AggregateId::generate())
    }

    fn setup() -> Store {
        chronicle_observability::init();
        Arc::new(InMemoryStreamStorage::new())
    }

    fn create(item_id: &InventoryItemId, name: &str) -> InventoryCommand {
        InventoryCommand::CreateItem(CreateItem {
            item_id: item_id.clone(),
            name: name.to_string(),
        })
    }

    fn adjust(item_id: &InventoryItemId, delta: i64) -> InventoryCommand {
        InventoryCommand::AdjustStock(AdjustStock {
            item_id: item_id.clone(),
            delta,
        })
    }

    fn rename(item_id: &InventoryItemId, name: &str) -> InventoryCommand {
        InventoryCommand::RenameItem(RenameItem {
            item_id: item_id.clone(),
            name: name.to_string(),
        })
    }

    /// Create an item with some initial stock through its own unit of work.
    fn seed_item(store: &Store, name: &str, stock: i64) -> InventoryItemId {
        let item_id = test_item_id();
        let mut uow = UnitOfWork::<InventoryItem, _>::new(Arc::clone(store));
        let mut item = InventoryItem::empty(item_id.clone());
        item.execute(&create(&item_id, name)).unwrap();
        item.execute(&adjust(&item_id, stock)).unwrap();
        uow.commit(&item, Metadata::new()).unwrap();
        item_id
    }

    #[test]
    fn created_item_round_trips_through_storage() {
        let store = setup();
        let item_id = seed_item(&store, "Widget", 10);

        let mut uow = UnitOfWork::<InventoryItem, _>::new(Arc::clone(&store));
        let item = uow.checkout(&item_id.0, Revision::empty()).unwrap();
        assert_eq!(item.name(), "Widget");
        assert_eq!(item.stock(), 10);
        assert_eq!(item.revision(), Revision::new(2));
        assert!(item.tracked_events().is_empty());
    }

    #[test]
    fn successive_commits_append_commits() {
        let store = setup();
        let item_id = seed_item(&store, "Widget", 10);
        let mut uow = UnitOfWork::<InventoryItem, _>::new(Arc::clone(&store));

        for delta in [5, -3, 8] {
            let mut item = uow.checkout(&item_id.0, Revision::empty()).unwrap();
            item.execute(&adjust(&item_id, delta)).unwrap();
            let committed = uow
                .commit(&item, Metadata::new().with("reason", "restock"))
                .unwrap();
            assert_eq!(committed.len(), 1);
        }

        let stream = store.load(&item_id.0, Revision::empty()).unwrap();
        assert_eq!(stream.head_sequence(), Sequence::new(4));
        assert_eq!(stream.head_revision(), Revision::new(5));

        let item = uow.checkout(&item_id.0, Revision::new(5)).unwrap();
        assert_eq!(item.stock(), 20);
    }

    #[test]
    fn concurrent_restocks_are_both_kept() {
        let store = setup();
        let item_id = seed_item(&store, "Widget", 10);

        let mut first = UnitOfWork::<InventoryItem, _>::new(Arc::clone(&store));
        let mut second = UnitOfWork::<InventoryItem, _>::new(Arc::clone(&store));

        let mut a = first.checkout(&item_id.0, Revision::empty()).unwrap();
        let mut b = second.checkout(&item_id.0, Revision::empty()).unwrap();
        a.execute(&adjust(&item_id, 4)).unwrap();
        b.execute(&adjust(&item_id, 6)).unwrap();

        first.commit(&a, Metadata::new()).unwrap();
        let committed = second.commit(&b, Metadata::new()).unwrap();
        assert_eq!(committed.head_revision(), Revision::new(4));

        let mut reader = UnitOfWork::<InventoryItem, _>::new(Arc::clone(&store));
        let item = reader.checkout(&item_id.0, Revision::empty()).unwrap();
        assert_eq!(item.stock(), 20);
    }

    #[test]
    fn concurrent_withdrawals_conflict() {
        let store = setup();
        let item_id = seed_item(&store, "Widget", 10);

        let mut first = UnitOfWork::<InventoryItem, _>::new(Arc::clone(&store));
        let mut second = UnitOfWork::<InventoryItem, _>::new(Arc::clone(&store));

        let mut a = first.checkout(&item_id.0, Revision::empty()).unwrap();
        let mut b = second.checkout(&item_id.0, Revision::empty()).unwrap();
        a.execute(&adjust(&item_id, -8)).unwrap();
        b.execute(&adjust(&item_id, -7)).unwrap();

        first.commit(&a, Metadata::new()).unwrap();
        let err = second.commit(&b, Metadata::new()).unwrap_err();
        match err {
            UnitOfWorkError::UnresolvableConflict {
                aggregate_id,
                conflicting_events,
            } => {
                assert_eq!(aggregate_id, item_id.0);
                assert_eq!(conflicting_events.len(), 1);
                assert_eq!(
                    conflicting_events[0],
                    InventoryEvent::stock_adjusted(item_id.clone(), Revision::new(3), -8)
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let mut reader = UnitOfWork::<InventoryItem, _>::new(Arc::clone(&store));
        let item = reader.checkout(&item_id.0, Revision::empty()).unwrap();
        assert_eq!(item.stock(), 2);
    }

    #[test]
    fn concurrent_renames_conflict_but_restock_does_not_block_rename() {
        let store = setup();
        let item_id = seed_item(&store, "Widget", 1);

        let mut first = UnitOfWork::<InventoryItem, _>::new(Arc::clone(&store));
        let mut second = UnitOfWork::<InventoryItem, _>::new(Arc::clone(&store));

        let mut a = first.checkout(&item_id.0, Revision::empty()).unwrap();
        let mut b = second.checkout(&item_id.0, Revision::empty()).unwrap();
        a.execute(&adjust(&item_id, 2)).unwrap();
        b.execute(&rename(&item_id, "Gadget")).unwrap();
        first.commit(&a, Metadata::new()).unwrap();
        second.commit(&b, Metadata::new()).unwrap();

        let mut a = first.checkout(&item_id.0, Revision::empty()).unwrap();
        let mut b = second.checkout(&item_id.0, Revision::empty()).unwrap();
        a.execute(&rename(&item_id, "Gizmo")).unwrap();
        b.execute(&rename(&item_id, "Doohickey")).unwrap();
        first.commit(&a, Metadata::new()).unwrap();
        assert!(matches!(
            second.commit(&b, Metadata::new()),
            Err(UnitOfWorkError::UnresolvableConflict { .. })
        ));

        let item = first.checkout(&item_id.0, Revision::empty()).unwrap();
        assert_eq!(item.name(), "Gizmo");
        assert_eq!(item.stock(), 3);
    }

    #[test]
    fn creating_an_existing_item_conflicts() {
        let store = setup();
        let item_id = test_item_id();

        let mut first = UnitOfWork::<InventoryItem, _>::new(Arc::clone(&store));
        let mut second = UnitOfWork::<InventoryItem, _>::new(Arc::clone(&store));

        let mut a = InventoryItem::empty(item_id.clone());
        let mut b = InventoryItem::empty(item_id.clone());
        a.execute(&create(&item_id, "Widget")).unwrap();
        b.execute(&create(&item_id, "Gadget")).unwrap();

        first.commit(&a, Metadata::new()).unwrap();
        assert!(matches!(
            second.commit(&b, Metadata::new()),
            Err(UnitOfWorkError::UnresolvableConflict { conflicting_events, .. })
                if conflicting_events.len() == 1
        ));
    }

    #[test]
    fn threads_sharing_a_store_never_lose_restocks() {
        let store = setup();
        let item_id = seed_item(&store, "Widget", 0);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let item_id = item_id.clone();
                thread::spawn(move || {
                    let mut uow = UnitOfWork::<InventoryItem, _>::new(store);
                    let mut applied = 0;
                    for _ in 0..5 {
                        let mut item = uow.checkout(&item_id.0, Revision::empty()).unwrap();
                        item.execute(&adjust(&item_id, 1)).unwrap();
                        match uow.commit(&item, Metadata::new()) {
                            Ok(_) => applied += 1,
                            Err(UnitOfWorkError::ConcurrencyRaceLost { .. }) => {}
                            Err(other) => panic!("unexpected error: {other:?}"),
                        }
                    }
                    applied
                })
            })
            .collect();

        let applied: i64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        let mut reader = UnitOfWork::<InventoryItem, _>::new(Arc::clone(&store));
        let item = reader.checkout(&item_id.0, Revision::empty()).unwrap();
        assert_eq!(item.stock(), applied);
    }

    #[test]
    fn persisted_stream_survives_json() {
        let store = setup();
        let item_id = seed_item(&store, "Widget", 3);

        let stream = store.load(&item_id.0, Revision::empty()).unwrap();
        let json = serde_json::to_string(&stream).unwrap();
        let restored: Stream<InventoryEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, stream);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["aggregateId"], item_id.0.as_str());
        assert_eq!(
            value["commitSequence"][0]["eventLog"][0]["@type"],
            "inventory.item.created"
        );
    }
}
