use clap::Parser;
use dq_dashboard::core::catalog::{Action, QueryName};
use dq_dashboard::core::export;
use dq_dashboard::core::view::ErrorPanel;
use dq_dashboard::render;
use dq_dashboard::utils::{logger::LogTarget, validation::Validate};
use dq_dashboard::{
    CliArgs, Command, DashboardConfig, DashboardError, DashboardService, DashboardView,
    QueryCatalog, SqlApiWarehouse,
};

fn report(e: &DashboardError) {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let command = args.command.clone().unwrap_or(Command::Tui);

    // 載入並驗證配置
    let config = match DashboardConfig::from_file(&args.config).and_then(|c| {
        c.validate()?;
        Ok(c)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load {}", args.config.display());
            report(&e);
            std::process::exit(2);
        }
    };

    // 終端機由介面佔用時，日誌一律寫入檔案
    LogTarget::select(
        matches!(command, Command::Tui),
        args.json_logs || config.logging.json,
        config.logging.file.as_deref(),
    )
    .init(args.verbose)?;
    tracing::info!("Starting dq-dashboard against {}", config.warehouse.account_url);
    if args.verbose {
        tracing::debug!("Objects: {:?}", config.objects);
    }

    let warehouse = match SqlApiWarehouse::new(&config) {
        Ok(warehouse) => warehouse,
        Err(e) => {
            report(&e);
            std::process::exit(2);
        }
    };
    let catalog = QueryCatalog::new(config.objects.clone());
    let service = DashboardService::new(warehouse, catalog, config.cache_ttl());

    match command {
        Command::Tui => run_tui(service, &config).await?,
        Command::Snapshot { markets } => {
            let outcome = match service.load().await {
                Ok(data) => DashboardView::build(&data, &markets),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(view) => println!(
                    "{}",
                    render::render_dashboard(&config.dashboard.title, &config.dashboard.subtitle, &view)
                ),
                Err(e) => {
                    tracing::error!("Dashboard load failed: {}", e);
                    let panel = ErrorPanel::from_error(&e, service.catalog());
                    eprintln!("{}", render::render_error(&panel));
                    std::process::exit(1);
                }
            }
        }
        Command::Markets => match service.market_areas().await {
            Ok(markets) => println!("{}", render::render_list("Market Areas", &markets)),
            Err(e) => {
                report(&e);
                std::process::exit(1);
            }
        },
        Command::Action { action, markets } => {
            let action: Action = action.into();
            match service.run_action(action, &markets).await {
                Ok(table) => {
                    println!("{} ({} rows)", action.heading(), table.len());
                    println!("{}", render::render_table(&table));
                }
                Err(e) => {
                    tracing::error!("{} failed: {}", action.button_label(), e);
                    let panel = ErrorPanel::from_error(&e, service.catalog());
                    eprintln!("{}", render::render_error(&panel));
                    std::process::exit(1);
                }
            }
        }
        Command::Export {
            query,
            output,
            markets,
        } => {
            let name: QueryName = query.into();
            let outcome = match service.query(name, &markets).await {
                Ok(table) => export::export_csv(&table, &output).map(|_| table.len()),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(rows) => println!("✅ Wrote {} rows of {} to {}", rows, name, output.display()),
                Err(e) => {
                    report(&e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "tui")]
async fn run_tui(
    service: DashboardService<SqlApiWarehouse>,
    config: &DashboardConfig,
) -> anyhow::Result<()> {
    dq_dashboard::tui::run(service, &config.dashboard, config.tick_rate()).await?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
async fn run_tui(
    _service: DashboardService<SqlApiWarehouse>,
    _config: &DashboardConfig,
) -> anyhow::Result<()> {
    anyhow::bail!("built without the `tui` feature; use the snapshot subcommand instead")
}
