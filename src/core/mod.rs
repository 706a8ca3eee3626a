pub mod cache;
pub mod catalog;
pub mod export;
pub mod service;
pub mod view;

pub use crate::domain::model::{Cell, QualitySummary, ScoreBand, Table};
pub use crate::domain::ports::{Statement, Warehouse};
pub use crate::utils::error::Result;
