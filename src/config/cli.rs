use crate::core::catalog::{Action, QueryName};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "dq-dashboard")]
#[command(about = "Data quality metrics dashboard over warehouse dynamic tables")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "dq-dashboard.toml")]
    pub config: PathBuf,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Interactive terminal dashboard (default)
    Tui,
    /// Load every section once and print the dashboard as text
    Snapshot {
        /// Restrict market sections to these market areas
        #[arg(long = "market")]
        markets: Vec<String>,
    },
    /// List the market areas available for filtering
    Markets,
    /// Run one of the remediation drill-down queries
    Action {
        #[arg(value_enum)]
        action: ActionArg,
        #[arg(long = "market")]
        markets: Vec<String>,
    },
    /// Write a query result to a CSV file
    Export {
        #[arg(value_enum)]
        query: ExportArg,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long = "market")]
        markets: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    NullPrices,
    BlankTypes,
    Duplicates,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::NullPrices => Action::NullPrices,
            ActionArg::BlankTypes => Action::BlankTypes,
            ActionArg::Duplicates => Action::Duplicates,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportArg {
    Summary,
    Markets,
    History,
    NullPrices,
    BlankTypes,
    Duplicates,
}

impl From<ExportArg> for QueryName {
    fn from(arg: ExportArg) -> Self {
        match arg {
            ExportArg::Summary => QueryName::QualitySummary,
            ExportArg::Markets => QueryName::MarketQuality,
            ExportArg::History => QueryName::MetricHistory,
            ExportArg::NullPrices => QueryName::Action(Action::NullPrices),
            ExportArg::BlankTypes => QueryName::Action(Action::BlankTypes),
            ExportArg::Duplicates => QueryName::Action(Action::Duplicates),
        }
    }
}
