//! Common test utilities for gridbind integration tests
//!
//! Provides shared helper functions for:
//! - Building adaptors over a reproducible seeded order collection
//! - Running JSON-shaped read requests
//! - Pulling order ids out of results

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use gridbind::{seed_orders_at, EngineOptions, GridAdaptor, Order, QueryRequest, SeedConfig};
use serde_json::Value;

pub const SEED_COUNT: usize = 20;

/// Day zero of the seeded collection; order `n` is dated `n` days later.
pub fn base_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn seed_config() -> SeedConfig {
    SeedConfig {
        count: SEED_COUNT,
        rng_seed: Some(42),
        ..SeedConfig::default()
    }
}

/// Orders 1001..=1020 with freight `1.5 * n`.
pub fn seeded_orders() -> Vec<Order> {
    seed_orders_at(&seed_config(), base_date())
}

pub fn create_adaptor() -> GridAdaptor<Order> {
    create_adaptor_with(EngineOptions::default())
}

pub fn create_adaptor_with(options: EngineOptions) -> GridAdaptor<Order> {
    GridAdaptor::with_records(seeded_orders(), options).expect("Failed to build adaptor")
}

/// Parse `request` as the grid would post it and run it.
pub fn read(adaptor: &GridAdaptor<Order>, request: Value) -> Value {
    let request: QueryRequest = serde_json::from_value(request).expect("Invalid request JSON");
    adaptor.read(&request).expect("Query failed")
}

/// Order ids of a flat record array.
pub fn order_ids(records: &Value) -> Vec<i64> {
    records
        .as_array()
        .expect("Expected a record array")
        .iter()
        .map(|r| r["OrderID"].as_i64().expect("Missing OrderID"))
        .collect()
}
