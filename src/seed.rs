//! Synthetic order data.
//!
//! Order `n` (1-based) gets id `start_id + n`, a random customer code, freight
//! `freight_step * n`, and a date `n` days after the base date.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::order::Order;

/// Seeding parameters, the `[seed]` section of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub count: usize,
    pub start_id: i64,
    pub freight_step: f64,
    pub customers: Vec<String>,
    /// Fixed RNG seed for reproducible customer codes.
    pub rng_seed: Option<u64>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            count: 200,
            start_id: 1000,
            freight_step: 1.5,
            customers: ["ALFKI", "ANANTR", "ANTON", "BLONP", "BOLID"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            rng_seed: None,
        }
    }
}

/// Generate orders dated relative to now.
pub fn seed_orders(config: &SeedConfig) -> Vec<Order> {
    seed_orders_at(config, Utc::now())
}

/// Generate orders dated relative to `base`.
pub fn seed_orders_at(config: &SeedConfig, base: DateTime<Utc>) -> Vec<Order> {
    let mut rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut orders = Vec::with_capacity(config.count);
    for n in 1..=config.count {
        let step = n as i64;
        let (Some(order_id), Some(order_date)) = (
            config.start_id.checked_add(step),
            Duration::try_days(step).and_then(|days| base.checked_add_signed(days)),
        ) else {
            tracing::warn!(
                start_id = config.start_id,
                generated = orders.len(),
                requested = config.count,
                "Order ids or dates out of range, stopping early"
            );
            break;
        };

        orders.push(Order {
            order_id,
            customer_id: config.customers.choose(&mut rng).cloned(),
            freight: Some(config.freight_step * n as f64),
            order_date: Some(order_date),
        });
    }

    tracing::info!(
        count = orders.len(),
        first_id = orders.first().map(|o| o.order_id),
        seeded = config.rng_seed.is_some(),
        "Seeded order collection"
    );
    orders
}
