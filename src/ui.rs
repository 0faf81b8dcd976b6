use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, BarChart, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row,
        Table, TableState,
    },
    Frame, Terminal,
};
use std::io;
use uuid::Uuid;

use crate::auth::AuthGate;
use crate::editor::{FieldValue, Widget};
use crate::metrics::{self, DashboardMetrics};
use crate::report::{self, ReportPeriod};
use crate::session::Session;
use crate::store::{Ledger, LedgerStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Transactions,
    Expenditures,
    Reports,
    Password,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Dashboard => Page::Transactions,
            Page::Transactions => Page::Expenditures,
            Page::Expenditures => Page::Reports,
            Page::Reports => Page::Password,
            Page::Password => Page::Dashboard,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Dashboard => Page::Password,
            Page::Transactions => Page::Dashboard,
            Page::Expenditures => Page::Transactions,
            Page::Reports => Page::Expenditures,
            Page::Password => Page::Reports,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Transactions => "Transactions",
            Page::Expenditures => "Expenditures",
            Page::Reports => "Reports",
            Page::Password => "Password",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Sales,
    Expenses,
}

/// One field of the in-flight edit form: a text buffer plus a hint derived
/// from the inferred widget.
#[derive(Debug, Clone)]
pub struct EditField {
    pub name: &'static str,
    pub buffer: String,
    pub hint: &'static str,
}

/// An edit form open over one record.
#[derive(Debug, Clone)]
pub struct EditForm {
    pub table: TableKind,
    pub id: Uuid,
    pub fields: Vec<EditField>,
    pub selected: usize,
}

#[derive(Debug, Clone)]
pub enum Mode {
    Browse,
    Edit(EditForm),
}

pub struct App {
    pub gate: AuthGate,
    pub session: Session,
    pub store: LedgerStore,
    pub ledger: Ledger,
    pub metrics: DashboardMetrics,
    pub profit_series: Vec<(NaiveDate, f64)>,
    pub today: NaiveDate,
    pub current_page: Page,
    pub mode: Mode,
    pub sales_state: TableState,
    pub expenses_state: TableState,
    pub login_input: String,
    pub password_fields: [String; 3],
    pub password_selected: usize,
    pub report_selected: usize,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(gate: AuthGate, store: LedgerStore, ledger: Ledger) -> Self {
        let mut sales_state = TableState::default();
        if !ledger.sales.is_empty() {
            sales_state.select(Some(0));
        }
        let mut expenses_state = TableState::default();
        if !ledger.expenses.is_empty() {
            expenses_state.select(Some(0));
        }

        let today = Local::now().date_naive();
        let metrics = metrics::aggregate(ledger.sales.rows(), ledger.expenses.rows(), today);
        let profit_series = metrics::daily_profit(ledger.sales.rows());

        Self {
            gate,
            session: Session::new(),
            store,
            ledger,
            metrics,
            profit_series,
            today,
            current_page: Page::Dashboard,
            mode: Mode::Browse,
            sales_state,
            expenses_state,
            login_input: String::new(),
            password_fields: Default::default(),
            password_selected: 0,
            report_selected: 0,
            status: None,
            should_quit: false,
        }
    }

    /// One full aggregation pass over the current tables. Runs after every
    /// mutation so the dashboard never shows stale figures.
    pub fn recompute(&mut self) {
        self.metrics = metrics::aggregate(
            self.ledger.sales.rows(),
            self.ledger.expenses.rows(),
            self.today,
        );
        self.profit_series = metrics::daily_profit(self.ledger.sales.rows());
    }

    /// Write the mutated tables back to the store. Failures become a
    /// visible status message, never a crash.
    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.ledger) {
            self.status = Some(format!("Save failed: {:#}", e));
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    fn selected_sale_id(&self) -> Option<Uuid> {
        self.sales_state
            .selected()
            .and_then(|i| self.ledger.sales.rows().get(i))
            .map(|r| r.id)
    }

    fn selected_expense_id(&self) -> Option<Uuid> {
        self.expenses_state
            .selected()
            .and_then(|i| self.ledger.expenses.rows().get(i))
            .map(|r| r.id)
    }

    fn move_selection(&mut self, delta: i64) {
        let (state, len) = match self.current_page {
            Page::Transactions => (&mut self.sales_state, self.ledger.sales.len()),
            Page::Expenditures => (&mut self.expenses_state, self.ledger.expenses.len()),
            _ => return,
        };
        if len == 0 {
            state.select(None);
            return;
        }
        let current = state.selected().unwrap_or(0) as i64;
        let next = (current + delta).rem_euclid(len as i64) as usize;
        state.select(Some(next));
    }

    // ------------------------------------------------------------------
    // Login / password
    // ------------------------------------------------------------------

    fn submit_login(&mut self) {
        let password = std::mem::take(&mut self.login_input);
        match self.gate.login(&mut self.session, &password) {
            Ok(()) => {
                self.current_page = Page::Dashboard;
                self.recompute();
                self.status = None;
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    fn submit_password_change(&mut self) {
        let [current, new, confirm] = self.password_fields.clone();
        match self
            .gate
            .change_password(&mut self.session, &current, &new, &confirm)
        {
            Ok(()) => {
                self.password_fields = Default::default();
                self.password_selected = 0;
                // Change forces re-login; the login screen takes over
                self.set_status("Password changed - please log in again");
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    // ------------------------------------------------------------------
    // Edit / delete
    // ------------------------------------------------------------------

    fn open_edit_form(&mut self) {
        let (table, form_result) = match self.current_page {
            Page::Transactions => match self.selected_sale_id() {
                Some(id) => (
                    TableKind::Sales,
                    self.ledger
                        .sales
                        .begin_edit(&mut self.session, id)
                        .and_then(|_| self.ledger.sales.edit_form(id))
                        .map(|form| (id, form)),
                ),
                None => return,
            },
            Page::Expenditures => match self.selected_expense_id() {
                Some(id) => (
                    TableKind::Expenses,
                    self.ledger
                        .expenses
                        .begin_edit(&mut self.session, id)
                        .and_then(|_| self.ledger.expenses.edit_form(id))
                        .map(|form| (id, form)),
                ),
                None => return,
            },
            _ => return,
        };

        match form_result {
            Ok((id, form)) => {
                let fields = form
                    .into_iter()
                    .map(|fe| {
                        let (buffer, hint) = match fe.widget {
                            Widget::Number { value } => (format!("{}", value), "number"),
                            Widget::Date { value } => (
                                value
                                    .map(|d| d.format("%Y-%m-%d").to_string())
                                    .unwrap_or_default(),
                                "YYYY-MM-DD",
                            ),
                            Widget::Text { value } => (value, "text"),
                        };
                        EditField {
                            name: fe.field,
                            buffer,
                            hint,
                        }
                    })
                    .collect();

                self.mode = Mode::Edit(EditForm {
                    table,
                    id,
                    fields,
                    selected: 0,
                });
            }
            Err(e) => self.set_status(format!("{:#}", e)),
        }
    }

    fn save_edit_form(&mut self) {
        let form = match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Edit(form) => form,
            Mode::Browse => return,
        };

        let values: Vec<(&str, FieldValue)> = form
            .fields
            .iter()
            .map(|f| (f.name, FieldValue::Text(f.buffer.clone())))
            .collect();

        let result = match form.table {
            TableKind::Sales => self
                .ledger
                .sales
                .save_edit(&mut self.session, form.id, &values),
            TableKind::Expenses => self
                .ledger
                .expenses
                .save_edit(&mut self.session, form.id, &values),
        };

        match result {
            Ok(()) => {
                self.persist();
                self.recompute();
                self.set_status("Record updated");
            }
            Err(e) => self.set_status(format!("{:#}", e)),
        }
    }

    fn cancel_edit_form(&mut self) {
        if let Mode::Edit(form) = std::mem::replace(&mut self.mode, Mode::Browse) {
            match form.table {
                TableKind::Sales => self.ledger.sales.cancel_edit(&mut self.session, form.id),
                TableKind::Expenses => {
                    self.ledger.expenses.cancel_edit(&mut self.session, form.id)
                }
            }
            self.set_status("Edit cancelled");
        }
    }

    fn delete_selected(&mut self) {
        let result = match self.current_page {
            Page::Transactions => self
                .selected_sale_id()
                .map(|id| self.ledger.sales.delete(&mut self.session, id).map(|_| ())),
            Page::Expenditures => self
                .selected_expense_id()
                .map(|id| self.ledger.expenses.delete(&mut self.session, id).map(|_| ())),
            _ => None,
        };

        match result {
            Some(Ok(())) => {
                // Keep the selection on a valid position after the shift
                let len = match self.current_page {
                    Page::Transactions => self.ledger.sales.len(),
                    _ => self.ledger.expenses.len(),
                };
                let state = match self.current_page {
                    Page::Transactions => &mut self.sales_state,
                    _ => &mut self.expenses_state,
                };
                if len == 0 {
                    state.select(None);
                } else if let Some(i) = state.selected() {
                    state.select(Some(i.min(len - 1)));
                }

                self.persist();
                self.recompute();
                self.set_status("Record deleted");
            }
            Some(Err(e)) => self.set_status(format!("{:#}", e)),
            None => {}
        }
    }

    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    fn generate_pdf(&mut self) {
        let period = ReportPeriod::ALL[self.report_selected];
        let result = report::period_report_pdf(
            self.ledger.sales.rows(),
            self.ledger.expenses.rows(),
            period,
            self.today,
        )
        .and_then(|bytes| {
            let name = report::pdf_file_name(period);
            std::fs::write(&name, bytes)?;
            Ok(name)
        });

        match result {
            Ok(name) => self.set_status(format!("Wrote {}", name)),
            Err(e) => self.set_status(format!("PDF report failed: {:#}", e)),
        }
    }

    fn export_csv(&mut self) {
        let result = report::sales_csv(self.ledger.sales.rows())
            .and_then(|bytes| {
                let name = report::csv_file_name();
                std::fs::write(&name, bytes)?;
                Ok(name)
            })
            .and_then(|sales_name| {
                let bytes = report::expenses_csv(self.ledger.expenses.rows())?;
                let name = report::expenses_csv_file_name();
                std::fs::write(&name, bytes)?;
                Ok((sales_name, name))
            });

        match result {
            Ok((sales_name, expenses_name)) => {
                self.set_status(format!("Wrote {} and {}", sales_name, expenses_name))
            }
            Err(e) => self.set_status(format!("CSV export failed: {:#}", e)),
        }
    }
}

// ============================================================================
// EVENT LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            handle_key(app, key.code, key.modifiers);
            if app.should_quit {
                return Ok(());
            }
        }
    }
}

fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    // The login screen swallows everything until authenticated
    if !app.session.is_logged_in() {
        match code {
            KeyCode::Enter => app.submit_login(),
            KeyCode::Backspace => {
                app.login_input.pop();
            }
            KeyCode::Esc => app.should_quit = true,
            KeyCode::Char(c) => app.login_input.push(c),
            _ => {}
        }
        return;
    }

    // An open edit form takes the keys next
    if matches!(app.mode, Mode::Edit(_)) {
        match code {
            KeyCode::Esc => app.cancel_edit_form(),
            KeyCode::Enter => app.save_edit_form(),
            _ => {
                if let Mode::Edit(ref mut form) = app.mode {
                    match code {
                        KeyCode::Down | KeyCode::Tab => {
                            form.selected = (form.selected + 1) % form.fields.len();
                        }
                        KeyCode::Up => {
                            form.selected =
                                (form.selected + form.fields.len() - 1) % form.fields.len();
                        }
                        KeyCode::Backspace => {
                            form.fields[form.selected].buffer.pop();
                        }
                        KeyCode::Char(c) => form.fields[form.selected].buffer.push(c),
                        _ => {}
                    }
                }
            }
        }
        return;
    }

    match code {
        // 'q' stays free for typing on the password form
        KeyCode::Char('q') if app.current_page != Page::Password => app.should_quit = true,
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Tab => {
            if modifiers.contains(KeyModifiers::SHIFT) {
                app.current_page = app.current_page.previous();
            } else {
                app.current_page = app.current_page.next();
            }
            app.status = None;
        }
        KeyCode::BackTab => {
            app.current_page = app.current_page.previous();
            app.status = None;
        }
        _ => match app.current_page {
            Page::Transactions | Page::Expenditures => match code {
                KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
                KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
                KeyCode::Char('e') => app.open_edit_form(),
                KeyCode::Char('d') => app.delete_selected(),
                _ => {}
            },
            Page::Reports => match code {
                KeyCode::Down | KeyCode::Char('j') => {
                    app.report_selected = (app.report_selected + 1) % ReportPeriod::ALL.len();
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    app.report_selected = (app.report_selected + ReportPeriod::ALL.len() - 1)
                        % ReportPeriod::ALL.len();
                }
                KeyCode::Char('p') => app.generate_pdf(),
                KeyCode::Char('c') => app.export_csv(),
                _ => {}
            },
            Page::Password => match code {
                KeyCode::Down => {
                    app.password_selected = (app.password_selected + 1) % 3;
                }
                KeyCode::Up => {
                    app.password_selected = (app.password_selected + 2) % 3;
                }
                KeyCode::Enter => app.submit_password_change(),
                KeyCode::Backspace => {
                    app.password_fields[app.password_selected].pop();
                }
                KeyCode::Char(c) => app.password_fields[app.password_selected].push(c),
                _ => {}
            },
            Page::Dashboard => {}
        },
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    if !app.session.is_logged_in() {
        render_login(f, app);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Dashboard => render_dashboard(f, chunks[1], app),
        Page::Transactions => render_sales(f, chunks[1], app),
        Page::Expenditures => render_expenses(f, chunks[1], app),
        Page::Reports => render_reports(f, chunks[1], app),
        Page::Password => render_password(f, chunks[1], app),
    }

    if let Mode::Edit(form) = &app.mode {
        render_edit_form(f, form);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_login(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 9, f.size());

    let masked = "*".repeat(app.login_input.len());
    let mut lines = vec![
        Line::from(Span::styled(
            "Shop Ledger Login",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Password: {}", masked)),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to log in - Esc to quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if let Some(status) = &app.status {
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let login = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(login, area);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [
        Page::Dashboard,
        Page::Transactions,
        Page::Expenditures,
        Page::Reports,
        Page::Password,
    ];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Today: {}", app.today),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn metric_card(title: &str, value: f64, color: Color) -> Paragraph<'static> {
    Paragraph::new(vec![Line::from(Span::styled(
        format!("{:.0}", value),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", title)),
    )
}

fn profit_color(value: f64) -> Color {
    if value >= 0.0 {
        Color::Green
    } else {
        Color::Red
    }
}

fn thirds(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(area)
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // today cards
            Constraint::Length(3), // overall cards
            Constraint::Length(3), // additional cards
            Constraint::Min(0),    // charts
        ])
        .split(area);

    let m = &app.metrics;

    let today_cols = thirds(rows[0]);
    f.render_widget(
        metric_card("Today's Sales", m.today_sales, Color::Magenta),
        today_cols[0],
    );
    f.render_widget(
        metric_card("Today's Profit", m.today_profit, profit_color(m.today_profit)),
        today_cols[1],
    );
    f.render_widget(
        metric_card("Today's Expenditure", m.today_expenditure, Color::Magenta),
        today_cols[2],
    );

    let total_cols = thirds(rows[1]);
    f.render_widget(
        metric_card("Total Sales", m.total_sales, Color::Magenta),
        total_cols[0],
    );
    f.render_widget(
        metric_card("Total Profit", m.total_profit, profit_color(m.total_profit)),
        total_cols[1],
    );
    f.render_widget(
        metric_card("Total Expenditure", m.total_expenditure, Color::Magenta),
        total_cols[2],
    );

    let extra_cols = thirds(rows[2]);
    f.render_widget(
        metric_card("Pending Payments", m.pending_payments, Color::Yellow),
        extra_cols[0],
    );
    f.render_widget(
        metric_card("Mobile Sales", m.mobile_sales, Color::Magenta),
        extra_cols[1],
    );
    f.render_widget(
        metric_card("Accessories Sales", m.accessories_sales, Color::Magenta),
        extra_cols[2],
    );

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[3]);

    render_distribution_chart(f, charts[0], app);
    render_profit_chart(f, charts[1], app);
}

fn render_distribution_chart(f: &mut Frame, area: Rect, app: &App) {
    let distribution = app.metrics.sales_distribution();
    let data: Vec<(&str, u64)> = distribution
        .iter()
        .map(|(label, value)| (*label, value.max(0.0) as u64))
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Sales Distribution "),
        )
        .data(&data)
        .bar_width(12)
        .bar_style(Style::default().fg(Color::Magenta))
        .value_style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(chart, area);
}

fn render_profit_chart(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Daily Profit & Loss ");

    if app.profit_series.is_empty() {
        let empty = Paragraph::new("No dated profit data yet")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let points: Vec<(f64, f64)> = app
        .profit_series
        .iter()
        .enumerate()
        .map(|(i, (_, profit))| (i as f64, *profit))
        .collect();

    let min_profit = points.iter().map(|(_, p)| *p).fold(f64::INFINITY, f64::min);
    let max_profit = points
        .iter()
        .map(|(_, p)| *p)
        .fold(f64::NEG_INFINITY, f64::max);
    let y_low = min_profit.min(0.0);
    let y_high = if max_profit <= y_low {
        y_low + 1.0
    } else {
        max_profit
    };

    let first = app
        .profit_series
        .first()
        .map(|(d, _)| d.to_string())
        .unwrap_or_default();
    let last = app
        .profit_series
        .last()
        .map(|(d, _)| d.to_string())
        .unwrap_or_default();

    let datasets = vec![Dataset::default()
        .name("profit")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&points)];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, (points.len().max(2) - 1) as f64])
                .labels(vec![Span::raw(first), Span::raw(last)]),
        )
        .y_axis(
            Axis::default().bounds([y_low, y_high]).labels(vec![
                Span::raw(format!("{:.0}", y_low)),
                Span::raw(format!("{:.0}", y_high)),
            ]),
        );

    f.render_widget(chart, area);
}

fn render_sales(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["#", "Date", "Type", "Category", "Price", "Profit", "Left"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.ledger.sales.list().into_iter().map(|(position, sale)| {
        let marker = if app.session.is_editing(sale.id) {
            "*"
        } else {
            ""
        };
        let date = sale
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());

        Row::new(vec![
            Cell::from(format!("{}{}", position, marker)),
            Cell::from(date),
            Cell::from(sale.kind.clone()),
            Cell::from(sale.category.clone()),
            Cell::from(format!("{:.0}", sale.selling_price)),
            Cell::from(format!("{:.0}", sale.profit))
                .style(Style::default().fg(profit_color(sale.profit))),
            Cell::from(format!("{:.0}", sale.left_amount)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Transactions (e edit / d delete) "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.sales_state);
}

fn render_expenses(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["#", "Date", "Amount"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app
        .ledger
        .expenses
        .list()
        .into_iter()
        .map(|(position, expense)| {
            let marker = if app.session.is_editing(expense.id) {
                "*"
            } else {
                ""
            };
            let date = expense
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());

            Row::new(vec![
                Cell::from(format!("{}{}", position, marker)),
                Cell::from(date),
                Cell::from(format!("{:.0}", expense.amount)),
            ])
            .height(1)
        });

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Expenditures (e edit / d delete) "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.expenses_state);
}

fn render_edit_form(f: &mut Frame, form: &EditForm) {
    let area = centered_rect(60, (form.fields.len() as u16) + 4, f.size());
    f.render_widget(Clear, area);

    let mut lines = Vec::with_capacity(form.fields.len() + 1);
    for (i, field) in form.fields.iter().enumerate() {
        let style = if i == form.selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{}: {}  ({})", field.name, field.buffer, field.hint),
            style,
        )));
    }
    lines.push(Line::from(Span::styled(
        "Enter save - Esc cancel - Tab next field",
        Style::default().fg(Color::DarkGray),
    )));

    let title = match form.table {
        TableKind::Sales => " Edit Transaction ",
        TableKind::Expenses => " Edit Expenditure ",
    };

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title),
    );

    f.render_widget(popup, area);
}

fn render_reports(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Report Period",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (i, period) in ReportPeriod::ALL.iter().enumerate() {
        let style = if i == app.report_selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let marker = if i == app.report_selected { "→ " } else { "  " };
        lines.push(Line::from(Span::styled(
            format!("{}{}", marker, period.label()),
            style,
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "p: write PDF report   c: export all data as CSV",
        Style::default().fg(Color::DarkGray),
    )));

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Download Reports "),
    );

    f.render_widget(panel, area);
}

fn render_password(f: &mut Frame, area: Rect, app: &App) {
    let labels = ["Current password", "New password", "Confirm new password"];

    let mut lines = vec![
        Line::from(Span::styled(
            "Change Password",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (i, label) in labels.iter().enumerate() {
        let masked = "*".repeat(app.password_fields[i].len());
        let style = if i == app.password_selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{}: {}", label, masked),
            style,
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter to submit - a successful change logs you out",
        Style::default().fg(Color::DarkGray),
    )));

    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Password "));

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let message = app
        .status
        .clone()
        .unwrap_or_else(|| "Tab: switch page  q: quit".to_string());

    let bar = Paragraph::new(Line::from(vec![Span::styled(
        format!(" {} ", message),
        Style::default().fg(Color::Cyan),
    )]))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(bar, area);
}

fn centered_rect(width_percent: u16, height: u16, area: Rect) -> Rect {
    let width = area.width * width_percent / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect {
        x,
        y,
        width,
        height: height.min(area.height),
    }
}
