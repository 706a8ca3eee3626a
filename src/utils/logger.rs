use crate::utils::error::Result;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "dq_dashboard=debug,info"
    } else {
        "dq_dashboard=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// The interactive dashboard owns the terminal, so its logs go to a file.
pub fn init_file_logger<P: AsRef<Path>>(path: P, verbose: bool) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(false)
                .compact(),
        )
        .init();
    Ok(())
}

pub fn init_json_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}

/// TUI 模式預設的日誌檔
pub const DEFAULT_TUI_LOG: &str = "dq-dashboard.log";

/// Where log output goes for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Json,
    Compact,
}

impl LogTarget {
    /// The interactive dashboard always logs to a file (`file`, or
    /// [`DEFAULT_TUI_LOG`]); other commands log to stderr, as JSON when
    /// asked for.
    pub fn select(interactive: bool, json: bool, file: Option<&Path>) -> Self {
        if interactive {
            LogTarget::File(
                file.map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_TUI_LOG)),
            )
        } else if json {
            LogTarget::Json
        } else {
            LogTarget::Compact
        }
    }

    pub fn init(&self, verbose: bool) -> Result<()> {
        match self {
            LogTarget::File(path) => init_file_logger(path, verbose)?,
            LogTarget::Json => init_json_logger(verbose),
            LogTarget::Compact => init_cli_logger(verbose),
        }
        Ok(())
    }
}
