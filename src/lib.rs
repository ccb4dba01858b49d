pub mod adaptor;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod order;
pub mod seed;

pub use adaptor::GridAdaptor;
pub use batch::{run_script, Operation};
pub use config::Config;
pub use error::{GridError, GridResult};
pub use order::Order;
pub use seed::{seed_orders, seed_orders_at, SeedConfig};

pub use gridbind_core::{
    EngineError, EngineOptions, QueryEngine, QueryRequest, QueryResult, Record, WhereFilter,
};
