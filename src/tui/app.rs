//! Application state and main event loop for the interactive dashboard.
//!
//! Every key press re-runs the whole dashboard load, the way a script-style
//! dashboard re-executes on each widget event. The TTL cache keeps those
//! reruns cheap; only the refresh key and the drill-down keys force a trip
//! to the warehouse.

use std::collections::HashSet;
use std::io;
use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, widgets::ListState, Terminal};

use super::ui;
use crate::config::toml_config::DisplayConfig;
use crate::core::catalog::Action;
use crate::core::service::DashboardService;
use crate::core::view::{DashboardView, ErrorPanel};
use crate::domain::model::Table;
use crate::domain::ports::Warehouse;
use crate::utils::error::Result;

/// Which pane receives navigation keys.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Focus {
    Sidebar,
    Main,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready(DashboardView),
    Failed(ErrorPanel),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    pub action: Action,
    pub table: Table,
}

/// Work the event loop has to await after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    None,
    Rerun,
    Refresh,
    Run(Action),
}

pub struct App<W: Warehouse> {
    pub service: DashboardService<W>,
    pub title: String,
    pub subtitle: String,

    pub focus: Focus,
    pub should_quit: bool,

    // Sidebar
    pub markets: Vec<String>,
    pub selected: HashSet<String>,
    pub market_state: ListState,

    // Main area
    pub state: LoadState,
    pub action_result: Option<ActionResult>,
    pub last_loaded: Option<DateTime<Local>>,
}

impl<W: Warehouse> App<W> {
    pub fn new(service: DashboardService<W>, display: &DisplayConfig) -> Self {
        Self {
            service,
            title: display.title.clone(),
            subtitle: display.subtitle.clone(),
            focus: Focus::Sidebar,
            should_quit: false,
            markets: Vec::new(),
            selected: HashSet::new(),
            market_state: ListState::default(),
            state: LoadState::Loading,
            action_result: None,
            last_loaded: None,
        }
    }

    /// Selected markets in sidebar order.
    pub fn selected_markets(&self) -> Vec<String> {
        self.markets
            .iter()
            .filter(|m| self.selected.contains(*m))
            .cloned()
            .collect()
    }

    /// One full render pass worth of data. Any failure replaces the whole
    /// main area with the error panel.
    pub async fn rerun(&mut self) {
        match self.service.market_areas().await {
            Ok(markets) => {
                self.selected.retain(|m| markets.contains(m));
                self.markets = markets;
                if self.market_state.selected().is_none() && !self.markets.is_empty() {
                    self.market_state.select(Some(0));
                }
            }
            Err(e) => {
                tracing::error!("Failed to load market areas: {}", e);
                self.state = LoadState::Failed(ErrorPanel::from_error(&e, self.service.catalog()));
                return;
            }
        }

        let selected = self.selected_markets();
        let outcome = match self.service.load().await {
            Ok(data) => DashboardView::build(&data, &selected),
            Err(e) => Err(e),
        };

        self.state = match outcome {
            Ok(view) => {
                self.last_loaded = Some(Local::now());
                LoadState::Ready(view)
            }
            Err(e) => {
                tracing::error!("Dashboard load failed: {}", e);
                LoadState::Failed(ErrorPanel::from_error(&e, self.service.catalog()))
            }
        };
    }

    /// Runs a drill-down. A failure aborts the pass like any load failure
    /// and replaces the main area with the error panel. Returns whether the
    /// query succeeded.
    pub async fn run_action(&mut self, action: Action) -> bool {
        let markets = self.selected_markets();
        match self.service.run_action(action, &markets).await {
            Ok(table) => {
                self.action_result = Some(ActionResult { action, table });
                true
            }
            Err(e) => {
                tracing::error!("{} failed: {}", action.button_label(), e);
                self.action_result = None;
                self.state = LoadState::Failed(ErrorPanel::from_error(&e, self.service.catalog()));
                false
            }
        }
    }

    /// Awaits whatever `handle_key` asked for, then re-runs the pass.
    pub async fn perform(&mut self, action: AppAction) {
        match action {
            AppAction::None => return,
            AppAction::Refresh => {
                self.service.refresh();
                self.action_result = None;
            }
            AppAction::Run(drill) => {
                // Keep the error panel; a rerun would paint over it.
                if !self.run_action(drill).await {
                    return;
                }
            }
            AppAction::Rerun => {}
        }
        self.rerun().await;
    }

    pub fn handle_key(&mut self, key: KeyCode) -> AppAction {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                AppAction::None
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Sidebar => Focus::Main,
                    Focus::Main => Focus::Sidebar,
                };
                AppAction::Rerun
            }
            KeyCode::Char('r') => AppAction::Refresh,
            KeyCode::Char('n') => AppAction::Run(Action::NullPrices),
            KeyCode::Char('b') => AppAction::Run(Action::BlankTypes),
            KeyCode::Char('d') => AppAction::Run(Action::Duplicates),
            KeyCode::Char('c') => {
                self.action_result = None;
                AppAction::Rerun
            }
            _ if self.focus == Focus::Sidebar => self.handle_sidebar_key(key),
            _ => AppAction::None,
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyCode) -> AppAction {
        let current = self.market_state.selected().unwrap_or(0);
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                if current > 0 {
                    self.market_state.select(Some(current - 1));
                }
                AppAction::Rerun
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if current < self.markets.len().saturating_sub(1) {
                    self.market_state.select(Some(current + 1));
                }
                AppAction::Rerun
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(market) = self.markets.get(current).cloned() {
                    if !self.selected.remove(&market) {
                        self.selected.insert(market);
                    }
                    AppAction::Rerun
                } else {
                    AppAction::None
                }
            }
            _ => AppAction::None,
        }
    }
}

/// Main entry point for the interactive dashboard.
///
/// Sets up the terminal, runs the event loop until the user quits and
/// restores the terminal even when the loop fails.
pub async fn run<W: Warehouse>(
    service: DashboardService<W>,
    display: &DisplayConfig,
    tick_rate: Duration,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(service, display);
    let outcome = event_loop(&mut terminal, &mut app, tick_rate).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

async fn event_loop<W: Warehouse>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<W>,
    tick_rate: Duration,
) -> Result<()> {
    terminal.draw(|f| ui::draw(f, app))?;
    app.rerun().await;

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let action = app.handle_key(key.code);
                    if app.should_quit {
                        break;
                    }
                    app.perform(action).await;
                }
            }
        }
    }
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ObjectsConfig;
    use crate::core::catalog::QueryCatalog;
    use crate::domain::model::Cell;
    use crate::domain::ports::Statement;
    use crate::utils::error::DashboardError;
    use async_trait::async_trait;

    /// Answers by the table name in the FROM clause. `fail` rejects every
    /// statement, `fail_actions` only the drill-downs.
    pub(crate) struct CannedWarehouse {
        pub fail: bool,
        pub fail_actions: bool,
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[async_trait]
    impl Warehouse for CannedWarehouse {
        async fn query(&self, statement: &Statement) -> Result<Table> {
            let drill_down = statement.sql.contains("LIMIT 50")
                || statement.sql.contains("WHERE price IS NULL")
                || statement.sql.contains("TRIM(COALESCE(property_type");
            if self.fail || (self.fail_actions && drill_down) {
                return Err(DashboardError::QueryError {
                    code: "002003".into(),
                    sql_state: "42S02".into(),
                    message: "Object does not exist".into(),
                });
            }
            let sql = &statement.sql;
            let table = if sql.contains("SELECT DISTINCT") {
                Table::with_rows(
                    cols(&["MARKET_AREA"]),
                    vec![
                        vec![Cell::Text("Austin".into())],
                        vec![Cell::Text("Denver".into())],
                    ],
                )
            } else if sql.contains("SFE_DT_QUALITY_SUMMARY") {
                Table::with_rows(
                    cols(&[
                        "TOTAL_RECORDS",
                        "NULL_PRICE_COUNT",
                        "NULL_ADDRESS_COUNT",
                        "NULL_MARKET_AREA_COUNT",
                        "BLANK_PROPERTY_TYPE_COUNT",
                        "BLANK_LISTING_STATUS_COUNT",
                        "DUPLICATE_ID_COUNT",
                        "QUALITY_SCORE",
                        "TOTAL_ISSUES",
                    ]),
                    vec![vec![
                        Cell::Int(1000),
                        Cell::Int(10),
                        Cell::Int(5),
                        Cell::Int(5),
                        Cell::Int(20),
                        Cell::Int(5),
                        Cell::Int(5),
                        Cell::Float(95.0),
                        Cell::Int(50),
                    ]],
                )
            } else if sql.contains("SFE_DT_MARKET_TRENDS") {
                Table::with_rows(
                    cols(&[
                        "MARKET_AREA",
                        "TOTAL_LISTINGS",
                        "ACTIVE_LISTINGS",
                        "AVG_PRICE",
                        "MEDIAN_PRICE",
                        "NULL_PRICES",
                        "BLANK_TYPES",
                        "MARKET_QUALITY_SCORE",
                    ]),
                    vec![
                        vec![
                            Cell::Text("Denver".into()),
                            Cell::Int(40),
                            Cell::Int(30),
                            Cell::Float(510000.0),
                            Cell::Float(480000.0),
                            Cell::Int(4),
                            Cell::Int(2),
                            Cell::Float(70.0),
                        ],
                        vec![
                            Cell::Text("Austin".into()),
                            Cell::Int(60),
                            Cell::Int(55),
                            Cell::Float(450000.0),
                            Cell::Float(430000.0),
                            Cell::Int(1),
                            Cell::Int(0),
                            Cell::Float(98.5),
                        ],
                    ],
                )
            } else if sql.contains("WHERE price IS NULL") {
                Table::with_rows(
                    cols(&["LISTING_ID", "ADDRESS", "CITY", "MARKET_AREA", "PRICE"]),
                    vec![vec![
                        Cell::Int(42),
                        Cell::Text("1 Main St".into()),
                        Cell::Text("Austin".into()),
                        Cell::Text("Austin".into()),
                        Cell::Null,
                    ]],
                )
            } else {
                Table::new(cols(&["TABLE_NAME"]))
            };
            Ok(table)
        }
    }

    pub(crate) fn app(fail: bool) -> App<CannedWarehouse> {
        app_with(CannedWarehouse {
            fail,
            fail_actions: false,
        })
    }

    pub(crate) fn app_with(warehouse: CannedWarehouse) -> App<CannedWarehouse> {
        let service = DashboardService::new(
            warehouse,
            QueryCatalog::new(ObjectsConfig::default()),
            Duration::from_secs(60),
        );
        App::new(service, &DisplayConfig::default())
    }

    #[tokio::test]
    async fn test_rerun_populates_view() {
        let mut app = app(false);
        app.rerun().await;

        assert_eq!(app.markets, vec!["Austin", "Denver"]);
        assert_eq!(app.market_state.selected(), Some(0));
        match &app.state {
            LoadState::Ready(view) => {
                assert_eq!(view.cards[0].value, "95.0%");
                assert_eq!(view.markets.as_ref().unwrap().bars.len(), 2);
                assert!(view.history.is_none());
            }
            other => panic!("unexpected state: {:?}", other),
        }
        assert!(app.last_loaded.is_some());
    }

    #[tokio::test]
    async fn test_toggling_market_filters_chart() {
        let mut app = app(false);
        app.rerun().await;

        app.handle_key(KeyCode::Down);
        let action = app.handle_key(KeyCode::Char(' '));
        assert_eq!(action, AppAction::Rerun);
        app.perform(action).await;

        assert_eq!(app.selected_markets(), vec!["Denver"]);
        match &app.state {
            LoadState::Ready(view) => {
                let bars = &view.markets.as_ref().unwrap().bars;
                assert_eq!(bars, &vec![("Denver".to_string(), 70.0)]);
            }
            other => panic!("unexpected state: {:?}", other),
        }

        let action = app.handle_key(KeyCode::Enter);
        app.perform(action).await;
        assert!(app.selected_markets().is_empty());
    }

    #[tokio::test]
    async fn test_action_key_runs_drill_down() {
        let mut app = app(false);
        app.rerun().await;

        let action = app.handle_key(KeyCode::Char('n'));
        assert_eq!(action, AppAction::Run(Action::NullPrices));
        app.perform(action).await;

        let result = app.action_result.as_ref().unwrap();
        assert_eq!(result.action, Action::NullPrices);
        assert_eq!(result.table.len(), 1);

        let action = app.handle_key(KeyCode::Char('r'));
        app.perform(action).await;
        assert!(app.action_result.is_none());
    }

    #[tokio::test]
    async fn test_failure_shows_error_panel() {
        let mut app = app(true);
        app.rerun().await;

        match &app.state {
            LoadState::Failed(panel) => {
                assert!(panel.message.contains("Object does not exist"));
                assert_eq!(panel.steps.len(), 3);
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_drill_down_shows_error_panel() {
        let mut app = app_with(CannedWarehouse {
            fail: false,
            fail_actions: true,
        });
        app.rerun().await;
        assert!(matches!(app.state, LoadState::Ready(_)));

        let action = app.handle_key(KeyCode::Char('d'));
        app.perform(action).await;

        match &app.state {
            LoadState::Failed(panel) => {
                assert!(panel.message.starts_with("Error loading data: "));
                assert!(panel.steps[0].contains("SHOW DYNAMIC TABLES"));
                assert!(panel.steps[1].contains("ALTER DYNAMIC TABLE"));
            }
            other => panic!("unexpected state: {:?}", other),
        }
        assert!(app.action_result.is_none());

        // The next key press re-runs the load and clears the panel.
        let action = app.handle_key(KeyCode::Char('c'));
        app.perform(action).await;
        assert!(matches!(app.state, LoadState::Ready(_)));
    }

    #[tokio::test]
    async fn test_navigation_keys_rerun() {
        let mut app = app(false);
        app.rerun().await;

        assert_eq!(app.handle_key(KeyCode::Down), AppAction::Rerun);
        assert_eq!(app.market_state.selected(), Some(1));
        assert_eq!(app.handle_key(KeyCode::Char('k')), AppAction::Rerun);
        assert_eq!(app.market_state.selected(), Some(0));
    }

    #[test]
    fn test_quit_and_focus_keys() {
        let mut app = app(false);
        assert_eq!(app.handle_key(KeyCode::Tab), AppAction::Rerun);
        assert_eq!(app.focus, Focus::Main);
        // Navigation keys are ignored outside the sidebar.
        assert_eq!(app.handle_key(KeyCode::Char(' ')), AppAction::None);
        app.handle_key(KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
