//! The order record bound to the grid.

use chrono::{DateTime, Utc};
use gridbind_core::{date_value, executor::number_from_f64, Field, FieldKind, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the orders grid.
///
/// Serialized with the grid's column names (`OrderID`, `CustomerID`,
/// `Freight`, `OrderDate`). Dates go out in the same millisecond form the
/// engine searches and filters on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "OrderID")]
    pub order_id: i64,

    #[serde(rename = "CustomerID", default)]
    pub customer_id: Option<String>,

    #[serde(rename = "Freight", default)]
    pub freight: Option<f64>,

    #[serde(rename = "OrderDate", default, with = "gridbind_core::date_format")]
    pub order_date: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new(order_id: i64, customer_id: &str, freight: f64) -> Self {
        Self {
            order_id,
            customer_id: Some(customer_id.to_string()),
            freight: Some(freight),
            order_date: None,
        }
    }

    pub fn dated(mut self, date: DateTime<Utc>) -> Self {
        self.order_date = Some(date);
        self
    }
}

impl Record for Order {
    const KEY_FIELD: &'static str = "OrderID";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::new("OrderID", FieldKind::Number, |o: &Self| Value::from(o.order_id)),
            Field::new("CustomerID", FieldKind::Text, |o: &Self| {
                o.customer_id.clone().map(Value::String).unwrap_or(Value::Null)
            }),
            Field::new("Freight", FieldKind::Number, |o: &Self| {
                o.freight
                    .map(|f| Value::Number(number_from_f64(f)))
                    .unwrap_or(Value::Null)
            }),
            Field::new("OrderDate", FieldKind::Date, |o: &Self| {
                o.order_date.as_ref().map(date_value).unwrap_or(Value::Null)
            }),
        ]
    }

    fn apply_update(&mut self, changes: &Self) {
        self.order_id = changes.order_id;
        self.customer_id = changes.customer_id.clone();
        self.freight = changes.freight;
        self.order_date = changes.order_date;
    }
}
