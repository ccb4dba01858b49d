//! Shared fixtures for unit tests.

use chrono::{TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::executor::number_from_f64;
use crate::record::{date_value, Field, FieldKind, Record};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub in_stock: bool,
    pub added: Option<chrono::DateTime<Utc>>,
}

impl Item {
    pub fn new(id: i64, name: &str, category: &str, price: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            category: category.to_string(),
            price,
            in_stock: true,
            added: None,
        }
    }

    pub fn out_of_stock(mut self) -> Self {
        self.in_stock = false;
        self
    }

    pub fn added_on(mut self, year: i32, month: u32, day: u32) -> Self {
        self.added = Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single();
        self
    }
}

impl Record for Item {
    const KEY_FIELD: &'static str = "id";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::new("id", FieldKind::Number, |r: &Self| Value::from(r.id)),
            Field::new("name", FieldKind::Text, |r: &Self| Value::from(r.name.clone())),
            Field::new("category", FieldKind::Text, |r: &Self| {
                Value::from(r.category.clone())
            }),
            Field::new("price", FieldKind::Number, |r: &Self| {
                Value::Number(number_from_f64(r.price))
            }),
            Field::new("in_stock", FieldKind::Boolean, |r: &Self| Value::Bool(r.in_stock)),
            Field::new("added", FieldKind::Date, |r: &Self| {
                r.added.as_ref().map(date_value).unwrap_or(Value::Null)
            }),
        ]
    }

    fn apply_update(&mut self, changes: &Self) {
        self.id = changes.id;
        self.name = changes.name.clone();
        self.category = changes.category.clone();
        self.price = changes.price;
    }
}

/// Eight items over three categories, with duplicate prices for stability checks.
pub fn inventory() -> Vec<Item> {
    vec![
        Item::new(1, "Widget", "tools", 25.0).added_on(2024, 1, 10),
        Item::new(2, "Gadget", "tools", 40.0).added_on(2024, 2, 5),
        Item::new(3, "Sprocket", "parts", 5.5)
            .out_of_stock()
            .added_on(2024, 2, 20),
        Item::new(4, "Gizmo", "toys", 40.0).added_on(2024, 3, 1),
        Item::new(5, "Bolt", "parts", 0.5).added_on(2024, 3, 15),
        Item::new(6, "Yo-yo", "toys", 12.0).out_of_stock(),
        Item::new(7, "Wrench", "tools", 25.0).added_on(2024, 4, 2),
        Item::new(8, "Nut", "parts", 0.25).added_on(2024, 4, 30),
    ]
}

pub fn ids(items: &[Item]) -> Vec<i64> {
    items.iter().map(|i| i.id).collect()
}
