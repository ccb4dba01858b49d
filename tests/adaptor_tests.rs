//! Insert, remove and update through the grid adaptor.

mod common;

use std::thread;

use common::{create_adaptor, order_ids, read, SEED_COUNT};
use gridbind::{EngineOptions, GridAdaptor, GridError, Order};
use serde_json::{json, Value};

#[test]
fn test_remove_only_record() {
    let adaptor =
        GridAdaptor::with_records(vec![Order::new(1001, "ALFKI", 1.5)], EngineOptions::default())
            .unwrap();

    let echoed = adaptor.remove(json!(1001), "OrderID").unwrap();
    assert_eq!(echoed, json!(1001));
    assert!(adaptor.is_empty());
    assert_eq!(read(&adaptor, json!({})), json!([]));
}

#[test]
fn test_remove_missing_key_is_silent() {
    let adaptor = create_adaptor();
    let echoed = adaptor.remove(json!(5000), "OrderID").unwrap();
    assert_eq!(echoed, json!(5000));
    assert_eq!(adaptor.len(), SEED_COUNT);

    let err = adaptor.remove_strict(json!(5000), "OrderID").unwrap_err();
    assert!(matches!(err, GridError::Engine(gridbind::EngineError::NotFound(_))));
}

#[test]
fn test_remove_matches_numeric_value() {
    let adaptor = create_adaptor();
    adaptor.remove(json!(1005.0), "OrderID").unwrap();
    assert_eq!(adaptor.len(), SEED_COUNT - 1);
    assert!(!order_ids(&read(&adaptor, json!({}))).contains(&1005));
}

#[test]
fn test_large_ids_are_matched_exactly() {
    let low = 9_007_199_254_740_992_i64;
    let high = low + 1;
    let adaptor = GridAdaptor::with_records(
        vec![Order::new(low, "ALFKI", 1.0), Order::new(high, "ANTON", 2.0)],
        EngineOptions::default(),
    )
    .unwrap();

    let found = read(
        &adaptor,
        json!({"where": [{"field": "OrderID", "operator": "equal", "value": high}], "requiresCounts": true}),
    );
    assert_eq!(found["count"], json!(1));

    let updated = adaptor
        .update(json!({"OrderID": high, "CustomerID": "BOLID"}), "OrderID")
        .unwrap();
    assert_eq!(updated["OrderID"], json!(high));

    adaptor.remove(json!(high), "OrderID").unwrap();
    let remaining = adaptor.records();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].order_id, low);
    assert_eq!(remaining[0].customer_id.as_deref(), Some("ALFKI"));
}

#[test]
fn test_insert_goes_to_head_and_is_queryable() {
    let adaptor = create_adaptor();
    let inserted = adaptor
        .insert(json!({"OrderID": 1, "CustomerID": "VINET", "Freight": 32.38}))
        .unwrap();
    assert_eq!(inserted["CustomerID"], json!("VINET"));
    assert_eq!(adaptor.len(), SEED_COUNT + 1);

    let all = read(&adaptor, json!({"take": 1}));
    assert_eq!(order_ids(&all), vec![1]);

    let found = read(
        &adaptor,
        json!({"where": [{"field": "OrderID", "operator": "equal", "value": 1}]}),
    );
    assert_eq!(found[0]["Freight"], json!(32.38));
}

#[test]
fn test_insert_allows_duplicate_keys() {
    let adaptor = create_adaptor();
    adaptor.insert(json!({"OrderID": 1001})).unwrap();
    assert_eq!(adaptor.len(), SEED_COUNT + 1);

    // The head copy is found first.
    adaptor.remove(json!(1001), "OrderID").unwrap();
    let records = adaptor.records();
    assert_eq!(records.len(), SEED_COUNT);
    assert_eq!(records[0].order_id, 1001);
    assert!(records[0].customer_id.is_some());
}

#[test]
fn test_update_existing() {
    let adaptor = create_adaptor();
    let updated = adaptor
        .update(
            json!({"OrderID": 1003, "CustomerID": "HANAR", "Freight": 99.5}),
            "OrderID",
        )
        .unwrap();
    assert_eq!(updated["CustomerID"], json!("HANAR"));
    assert_eq!(updated["Freight"], json!(99.5));
    assert_eq!(adaptor.len(), SEED_COUNT);

    let stored = read(
        &adaptor,
        json!({"where": [{"field": "OrderID", "operator": "equal", "value": 1003}]}),
    );
    assert_eq!(stored[0]["CustomerID"], json!("HANAR"));
}

#[test]
fn test_update_missing() {
    let adaptor = create_adaptor();
    let value = adaptor.update(json!({"OrderID": 1}), "OrderID").unwrap();
    assert_eq!(value, Value::Null);

    assert!(adaptor.update_strict(json!({"OrderID": 1}), "OrderID").is_err());
    assert_eq!(adaptor.len(), SEED_COUNT);
}

#[test]
fn test_wrong_key_column() {
    let adaptor = create_adaptor();
    let err = adaptor
        .update(json!({"OrderID": 1001}), "CustomerID")
        .unwrap_err();
    assert!(err.is_invalid_request());
}

#[test]
fn test_concurrent_inserts_and_reads() {
    let adaptor = create_adaptor();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let adaptor = adaptor.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    let id = 10_000 + t * 100 + i;
                    adaptor.insert(json!({"OrderID": id})).unwrap();
                    let page = adaptor
                        .read(&gridbind::QueryRequest::new().page(0, 5))
                        .unwrap();
                    assert_eq!(page.as_array().unwrap().len(), 5);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(adaptor.len(), SEED_COUNT + 100);
}
