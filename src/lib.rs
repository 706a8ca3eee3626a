pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
#[cfg(feature = "tui")]
pub mod tui;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliArgs, Command};
pub use config::DashboardConfig;

pub use adapters::SqlApiWarehouse;
pub use core::{catalog::QueryCatalog, service::DashboardService, view::DashboardView};
pub use utils::error::{DashboardError, Result};
