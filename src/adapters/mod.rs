// Adapters layer: concrete implementations of the domain ports.

pub mod sql_api;

pub use sql_api::SqlApiWarehouse;
