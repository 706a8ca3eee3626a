//! Interactive terminal dashboard built on ratatui and crossterm.
//!
//! Launch with `dq-dashboard tui` (or no subcommand).

pub mod app;
pub mod ui;

pub use app::run;
