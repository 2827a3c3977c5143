//! Reserve / commit / release / add-stock through the ledger facade.

mod common;

use proptest::prelude::*;

use stockhold_core::ReservationId;
use stockhold_events::Event;
use stockhold_infra::{
    AddStockCommand, CommitStockCommand, ReleaseStockCommand, ReserveStockCommand, ServiceError,
};
use stockhold_inventory::{ReservationStatus, StockEvent, StockLevel};

use common::{harness, sku, store_id};

fn reserve_cmd(store: &str, sku_code: &str, quantity: i64) -> ReserveStockCommand {
    ReserveStockCommand::new(store_id(store), sku(sku_code), quantity, "CUST-42")
}

#[test]
fn reserve_then_commit_moves_stock_to_sold() {
    let h = harness();
    h.provision("STORE-01", "Notebook Dell XPS 13", 100);
    let subscription = h.publisher.subscribe();

    let id = h.ledger.reserve(reserve_cmd("STORE-01", "SKU123", 10)).unwrap();
    assert_eq!(h.counters("STORE-01", "SKU123"), (90, 10, 0));

    let reserved = subscription.try_recv().unwrap();
    assert_eq!(reserved.payload().event_type(), "StockReserved");
    assert_eq!(reserved.aggregate_id(), "SKU123");
    assert_eq!(reserved.sequence_number(), 1);

    let order = h
        .ledger
        .commit(CommitStockCommand::new(id.clone(), "ORDER-1"))
        .unwrap();
    assert_eq!(order, "ORDER-1");
    assert_eq!(h.counters("STORE-01", "SKU123"), (90, 0, 10));

    let committed = subscription.try_recv().unwrap();
    match committed.payload().payload() {
        StockEvent::StockCommitted(e) => {
            assert_eq!(e.reservation_id, id);
            assert_eq!(e.quantity, 10);
            assert_eq!(e.order_id, "ORDER-1");
            assert_eq!(e.customer_id, "CUST-42");
        }
        other => panic!("expected StockCommitted, got {other:?}"),
    }
    assert_eq!(committed.sequence_number(), 2);

    let view = h.ledger.find_reservation(&id).unwrap().unwrap();
    assert_eq!(view.status, ReservationStatus::Committed);
    assert_eq!(view.committed_at, Some(common::t0()));
}

#[test]
fn reserve_then_release_restores_available() {
    let h = harness();
    h.provision_sku("STORE-01", "SKU456", "iPhone 15 Pro", 50);
    let subscription = h.publisher.subscribe();

    let id = h.ledger.reserve(reserve_cmd("STORE-01", "SKU456", 5)).unwrap();
    assert_eq!(h.counters("STORE-01", "SKU456"), (45, 5, 0));

    h.ledger
        .release(ReleaseStockCommand::new(id.clone(), "customer cancelled"))
        .unwrap();
    assert_eq!(h.counters("STORE-01", "SKU456"), (50, 0, 0));

    let events = subscription.drain();
    assert_eq!(events.len(), 2);
    match events[1].payload().payload() {
        StockEvent::StockReleased(e) => {
            assert_eq!(e.reason, "customer cancelled");
            assert_eq!(e.quantity, 5);
        }
        other => panic!("expected StockReleased, got {other:?}"),
    }
    assert_eq!(
        h.ledger.find_reservation(&id).unwrap().unwrap().status,
        ReservationStatus::Cancelled
    );
}

#[test]
fn over_reservation_is_rejected_without_side_effects() {
    let h = harness();
    h.provision("STORE-01", "Notebook Dell XPS 13", 100);
    let subscription = h.publisher.subscribe();

    let err = h
        .ledger
        .reserve(reserve_cmd("STORE-01", "SKU123", 200))
        .unwrap_err();
    match &err {
        ServiceError::Validation { errors, .. } => {
            assert!(errors.iter().any(|e| e.contains("Insufficient stock")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(err.code(), "VALIDATION_ERROR");
    assert_eq!(h.counters("STORE-01", "SKU123"), (100, 0, 0));
    assert!(subscription.drain().is_empty());
    assert!(h.ledger.event_history(&sku("SKU123")).unwrap().is_empty());
    assert!(h
        .ledger
        .reservations_by_status(ReservationStatus::Reserved)
        .unwrap()
        .is_empty());
}

#[test]
fn invalid_quantities_and_blank_inputs_are_validation_errors() {
    let h = harness();
    h.provision("STORE-01", "Notebook Dell XPS 13", 100);

    for quantity in [0, -3, 101] {
        let err = h
            .ledger
            .reserve(reserve_cmd("STORE-01", "SKU123", quantity))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }), "{quantity}: {err:?}");
    }

    let blank_customer = ReserveStockCommand::new(store_id("STORE-01"), sku("SKU123"), 1, " ");
    assert!(matches!(
        h.ledger.reserve(blank_customer),
        Err(ServiceError::Validation { .. })
    ));

    let id = h.ledger.reserve(reserve_cmd("STORE-01", "SKU123", 1)).unwrap();
    assert!(matches!(
        h.ledger.commit(CommitStockCommand::new(id.clone(), "")),
        Err(ServiceError::Validation { .. })
    ));
    assert!(matches!(
        h.ledger.release(ReleaseStockCommand::new(id, "  ")),
        Err(ServiceError::Validation { .. })
    ));
    assert_eq!(h.counters("STORE-01", "SKU123"), (99, 1, 0));
}

#[test]
fn unknown_product_and_reservation_are_not_found() {
    let h = harness();

    let err = h
        .ledger
        .reserve(reserve_cmd("STORE-09", "SKU999", 1))
        .unwrap_err();
    assert!(matches!(err, ServiceError::ProductNotFound { .. }));
    assert_eq!(err.to_string(), "Product SKU999 not found in store STORE-09");
    assert_eq!(err.report().details["storeId"], "STORE-09");

    let missing = ReservationId::parse("RES-missing").unwrap();
    let err = h
        .ledger
        .commit(CommitStockCommand::new(missing.clone(), "ORDER-1"))
        .unwrap_err();
    assert_eq!(err.code(), "RESERVATION_NOT_FOUND");
    assert!(matches!(
        h.ledger.release(ReleaseStockCommand::new(missing, "why not")),
        Err(ServiceError::ReservationNotFound(_))
    ));
    assert!(h
        .ledger
        .find_by_store_and_sku(&store_id("STORE-09"), &sku("SKU999"))
        .unwrap()
        .is_none());
}

#[test]
fn terminal_reservations_reject_every_further_transition() {
    let h = harness();
    h.provision("STORE-01", "Notebook Dell XPS 13", 100);

    let committed = h.ledger.reserve(reserve_cmd("STORE-01", "SKU123", 10)).unwrap();
    h.ledger
        .commit(CommitStockCommand::new(committed.clone(), "ORDER-1"))
        .unwrap();
    let cancelled = h.ledger.reserve(reserve_cmd("STORE-01", "SKU123", 5)).unwrap();
    h.ledger
        .release(ReleaseStockCommand::new(cancelled.clone(), "changed mind"))
        .unwrap();

    let before = h.counters("STORE-01", "SKU123");
    let history_before = h.ledger.event_history(&sku("SKU123")).unwrap().len();

    let attempts = [
        h.ledger
            .commit(CommitStockCommand::new(committed.clone(), "ORDER-2"))
            .unwrap_err(),
        h.ledger
            .release(ReleaseStockCommand::new(committed.clone(), "undo"))
            .unwrap_err(),
        h.ledger
            .commit(CommitStockCommand::new(cancelled.clone(), "ORDER-3"))
            .unwrap_err(),
        h.ledger
            .release(ReleaseStockCommand::new(cancelled.clone(), "again"))
            .unwrap_err(),
    ];
    let expected_current = [
        ReservationStatus::Committed,
        ReservationStatus::Committed,
        ReservationStatus::Cancelled,
        ReservationStatus::Cancelled,
    ];
    for (err, current_expected) in attempts.iter().zip(expected_current) {
        match err {
            ServiceError::InvalidReservationState { current, expected, .. } => {
                assert_eq!(*current, current_expected);
                assert_eq!(*expected, ReservationStatus::Reserved);
            }
            other => panic!("expected InvalidReservationState, got {other:?}"),
        }
        assert_eq!(err.code(), "INVALID_RESERVATION_STATE");
    }

    assert_eq!(h.counters("STORE-01", "SKU123"), before);
    assert_eq!(before, (90, 0, 10));
    assert_eq!(h.ledger.event_history(&sku("SKU123")).unwrap().len(), history_before);
}

#[test]
fn add_stock_restocks_and_respects_ceiling() {
    let h = harness();
    h.provision("STORE-01", "Notebook Dell XPS 13", 3);
    assert_eq!(h.view("STORE-01", "SKU123").level, StockLevel::Critical);

    let view = h
        .ledger
        .add_stock(AddStockCommand::new(
            store_id("STORE-01"),
            sku("SKU123"),
            20,
            "supplier delivery",
        ))
        .unwrap();
    assert_eq!(view.available, 23);
    assert_eq!(view.level, StockLevel::Normal);
    assert_eq!(view.version, 2);

    let err = h
        .ledger
        .add_stock(AddStockCommand::new(store_id("STORE-01"), sku("SKU123"), 10_000, "oops"))
        .unwrap_err();
    match err {
        ServiceError::Validation { errors, .. } => {
            assert_eq!(errors, ["Cannot add 10000 units. Would exceed maximum stock of 10000"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let history = h.ledger.event_history(&sku("SKU123")).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].event_type(), "StockAdded");
}

#[test]
fn sample_catalogue_is_seeded_once() {
    let h = harness();
    assert_eq!(h.ledger.seed_sample_inventory().unwrap(), 6);
    assert_eq!(h.ledger.seed_sample_inventory().unwrap(), 0);

    let iphone = h.view("STORE-02", "SKU456");
    assert_eq!(iphone.product_name, "iPhone 15 Pro");
    assert_eq!(iphone.available, 40);
    assert_eq!(h.counters("STORE-03", "SKU789"), (60, 0, 0));
}

#[test]
fn events_of_one_sku_share_a_stream_across_stores() {
    let h = harness();
    h.ledger.seed_sample_inventory().unwrap();

    h.ledger.reserve(reserve_cmd("STORE-01", "SKU123", 1)).unwrap();
    h.ledger.reserve(reserve_cmd("STORE-02", "SKU123", 2)).unwrap();

    let history = h.ledger.event_history(&sku("SKU123")).unwrap();
    let sequences: Vec<u64> = history.iter().map(|e| e.sequence_number).collect();
    assert_eq!(sequences, vec![1, 2]);
    assert_eq!(history[1].event.payload().store_id().as_str(), "STORE-02");
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        ..ProptestConfig::default()
    })]

    /// Property: through any mix of service calls the sellable total plus
    /// sold stays equal to the provisioned quantity, and reserved always
    /// equals the sum of live holds.
    #[test]
    fn services_conserve_stock(ops in prop::collection::vec((0u8..3, 1i64..40, 0usize..8), 1..40)) {
        let h = harness();
        h.provision("STORE-01", "Notebook Dell XPS 13", 200);
        let mut live: Vec<(ReservationId, i64)> = Vec::new();

        for (op, quantity, pick) in ops {
            match op {
                0 => {
                    if let Ok(id) = h.ledger.reserve(reserve_cmd("STORE-01", "SKU123", quantity)) {
                        live.push((id, quantity));
                    }
                }
                1 if !live.is_empty() => {
                    let (id, _) = live.remove(pick % live.len());
                    prop_assert!(h.ledger.commit(CommitStockCommand::new(id, "ORDER-P")).is_ok());
                }
                2 if !live.is_empty() => {
                    let (id, _) = live.remove(pick % live.len());
                    prop_assert!(h.ledger.release(ReleaseStockCommand::new(id, "prop")).is_ok());
                }
                _ => {}
            }

            let (available, reserved, sold) = h.counters("STORE-01", "SKU123");
            prop_assert!(available >= 0 && reserved >= 0 && sold >= 0);
            prop_assert_eq!(available + reserved + sold, 200);
            prop_assert_eq!(reserved, live.iter().map(|(_, q)| q).sum::<i64>());
        }
    }
}
