use crate::calc::validator::parse_distance;
use crate::data::{AppSettings, StepLedger};
use crate::ui::form::{
    DATE_LABEL, DATE_PLACEHOLDER, DISTANCE_LABEL, Field, SUBMIT_LABEL, StepForm, SubmitOutcome,
};
use anyhow::Result;
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind, KeyModifiers};
use log::debug;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use std::io::Stdout;
use std::time::Duration as StdDuration;

const FOCUS_COLOR: Color = Color::Yellow;
const DELETE_MARK: &str = "✘";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Date,
    Distance,
    Table,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Date => Focus::Distance,
            Focus::Distance => Focus::Table,
            Focus::Table => Focus::Date,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Date => Focus::Table,
            Focus::Distance => Focus::Date,
            Focus::Table => Focus::Distance,
        }
    }

    fn field(self) -> Option<Field> {
        match self {
            Focus::Date => Some(Field::Date),
            Focus::Distance => Some(Field::Distance),
            Focus::Table => None,
        }
    }
}

pub struct App<'a> {
    ledger: &'a mut StepLedger,
    form: StepForm,
    settings: AppSettings,
    focus: Focus,
    /// Selected row while the table has focus.
    list_cursor: usize,
    /// Modal message; while set, keys only dismiss it.
    alert: Option<String>,
    /// Result of the last successful submit. Cleared on next keypress.
    status: Option<String>,
}

impl<'a> App<'a> {
    pub fn new(ledger: &'a mut StepLedger, settings: AppSettings) -> Self {
        App {
            ledger,
            form: StepForm::default(),
            settings,
            focus: Focus::Date,
            list_cursor: 0,
            alert: None,
            status: None,
        }
    }

    fn submit(&mut self) {
        match self.form.submit(self.ledger) {
            SubmitOutcome::Recorded { key, total } => {
                self.status = Some(format!("{key}: {} км", format_distance(total)));
                self.clamp_cursor();
            }
            SubmitOutcome::Alert(e) => self.alert = Some(e.to_string()),
            SubmitOutcome::Ignored => {}
        }
    }

    fn delete_selected(&mut self) {
        let key = match self.ledger.entries().get(self.list_cursor) {
            Some(entry) => entry.key.clone(),
            None => return,
        };
        debug!("deleting {key}");
        self.ledger.remove(&key);
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        let len = self.ledger.len();
        if self.list_cursor > 0 && self.list_cursor >= len {
            self.list_cursor = len.saturating_sub(1);
        }
    }

    /// Returns true if the app should quit.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        if self.alert.is_some() {
            if matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.alert = None;
            }
            return false;
        }

        self.status = None;

        match code {
            KeyCode::Esc => return true,
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return false;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                return false;
            }
            _ => {}
        }

        match self.focus {
            Focus::Date => match code {
                KeyCode::Char(c) => self.form.date.push(c),
                KeyCode::Backspace => {
                    self.form.date.pop();
                }
                KeyCode::Enter => self.submit(),
                _ => {}
            },

            Focus::Distance => match code {
                KeyCode::Char(c) => {
                    if let Some(c) = numeric_input_char(c) {
                        self.form.distance.push(c);
                    }
                }
                KeyCode::Backspace => {
                    self.form.distance.pop();
                }
                KeyCode::Up => {
                    let next = step_distance(&self.form.distance, self.settings.distance_step);
                    self.form.set(Field::Distance, next);
                }
                KeyCode::Down => {
                    let next = step_distance(&self.form.distance, -self.settings.distance_step);
                    self.form.set(Field::Distance, next);
                }
                KeyCode::Enter => self.submit(),
                _ => {}
            },

            Focus::Table => match code {
                KeyCode::Up => {
                    if self.list_cursor > 0 {
                        self.list_cursor -= 1;
                    }
                }
                KeyCode::Down => {
                    if self.list_cursor + 1 < self.ledger.len() {
                        self.list_cursor += 1;
                    }
                }
                KeyCode::Delete | KeyCode::Char('x') => self.delete_selected(),
                KeyCode::Char('q') => return true,
                _ => {}
            },
        }
        false
    }

    pub fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // form row
                Constraint::Min(3),    // steps table
                Constraint::Length(1), // status / key hints
            ])
            .split(f.area());

        self.render_form(f, chunks[0]);
        self.render_table(f, chunks[1]);
        self.render_footer(f, chunks[2]);

        if let Some(message) = &self.alert {
            render_alert(f, message);
        }
    }

    fn render_form(&self, f: &mut Frame, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(22),
                Constraint::Length(16),
                Constraint::Length(8),
                Constraint::Min(0),
            ])
            .split(area);

        f.render_widget(self.input_box(Field::Date, DATE_LABEL), cols[0]);
        f.render_widget(self.input_box(Field::Distance, DISTANCE_LABEL), cols[1]);

        let button = Paragraph::new(SUBMIT_LABEL)
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(button, cols[2]);
    }

    fn input_box(&self, field: Field, label: &str) -> Paragraph<'static> {
        let focused = self.focus.field() == Some(field);
        let value = self.form.value(field);

        let content = if focused {
            Line::from(format!("{value}_"))
        } else if value.is_empty() && field == Field::Date {
            Line::from(Span::styled(
                DATE_PLACEHOLDER,
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::from(value.to_string())
        };

        let border = if focused {
            Style::default().fg(FOCUS_COLOR)
        } else {
            Style::default()
        };

        Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(format!(" {label} ")),
        )
    }

    fn render_table(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let header = Row::new(vec![
            Cell::from("Дата").style(bold),
            Cell::from(DISTANCE_LABEL).style(bold),
            Cell::from("Удалить").style(bold),
        ]);

        let rows: Vec<Row> = self
            .ledger
            .entries()
            .iter()
            .map(|e| {
                Row::new(vec![
                    Cell::from(e.key.clone()),
                    Cell::from(format_distance(e.distance)),
                    Cell::from(DELETE_MARK).style(Style::default().fg(Color::Red)),
                ])
            })
            .collect();

        let mut table_state = TableState::default();
        if self.focus == Focus::Table && !self.ledger.is_empty() {
            table_state.select(Some(self.list_cursor));
        }

        let border = if self.focus == Focus::Table {
            Style::default().fg(FOCUS_COLOR)
        } else {
            Style::default()
        };

        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Length(14),
                Constraint::Length(8),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).border_style(border))
        .row_highlight_style(
            Style::default()
                .fg(FOCUS_COLOR)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

        f.render_stateful_widget(table, area, &mut table_state);
    }

    fn render_footer(&self, f: &mut Frame, area: Rect) {
        let line = match &self.status {
            Some(msg) => Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Green))),
            None => {
                let hints = match self.focus {
                    Focus::Date => "Tab=поле  Enter=ОК  Esc=выход",
                    Focus::Distance => "Tab=поле  ↑↓=шаг  Enter=ОК  Esc=выход",
                    Focus::Table => "Tab=поле  ↑↓=строка  Del/x=удалить  q/Esc=выход",
                };
                Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray)))
            }
        };
        f.render_widget(Paragraph::new(line), area);
    }
}

fn render_alert(f: &mut Frame, message: &str) {
    let area = centered_rect(f.area(), 50, 6);
    let lines = vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Enter — OK",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let popup = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Внимание "),
    );
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

// ── App event loop ────────────────────────────────────────────────────────────

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    poll_interval: StdDuration,
) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;
        if event::poll(poll_interval)? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key.code, key.modifiers) {
                    break;
                }
            }
        }
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// One decimal place, as shown in the table.
///
/// Exact halves round away from zero and negative zero prints as "0.0".
pub(crate) fn format_distance(distance: f64) -> String {
    let sign = if distance < 0.0 { "-" } else { "" };
    let magnitude = distance.abs();
    if magnitude.is_infinite() {
        return format!("{sign}Infinity");
    }

    // The only doubles sitting exactly halfway between two tenths are odd
    // multiples of 0.25; scaling by 4 is exact.
    let quarters = magnitude * 4.0;
    let is_tie = quarters.fract() == 0.0 && quarters % 2.0 == 1.0;

    if is_tie {
        let tenths = (magnitude * 10.0).ceil();
        format!("{sign}{:.1}", tenths / 10.0)
    } else {
        format!("{sign}{magnitude:.1}")
    }
}

/// Filters keystrokes for the distance field. A decimal comma becomes a point.
pub(crate) fn numeric_input_char(c: char) -> Option<char> {
    match c {
        '0'..='9' | '.' | '-' | '+' | 'e' | 'E' => Some(c),
        ',' => Some('.'),
        _ => None,
    }
}

/// Adds `step` to the current distance text; empty or unparsable text counts as zero.
pub(crate) fn step_distance(current: &str, step: f64) -> String {
    let value = parse_distance(current)
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);
    let decimals = decimal_places(step);
    let next = value + step;
    // Avoid printing "-0.0" when stepping back down to zero.
    let next = if next.abs() < 0.5 * 10f64.powi(-(decimals as i32)) {
        0.0
    } else {
        next
    };
    format!("{next:.decimals$}")
}

fn decimal_places(step: f64) -> usize {
    let text = step.abs().to_string();
    text.split_once('.').map(|(_, frac)| frac.len()).unwrap_or(0)
}

fn centered_rect(area: Rect, width_pct: u16, height: u16) -> Rect {
    let width = ((u32::from(area.width) * u32::from(width_pct) / 100) as u16)
        .max(20)
        .min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ratatui::backend::TestBackend;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(code, KeyModifiers::empty())
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn submit_entry(app: &mut App, date: &str, distance: &str) {
        app.focus = Focus::Date;
        type_str(app, date);
        press(app, KeyCode::Tab);
        type_str(app, distance);
        press(app, KeyCode::Enter);
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    // ── helper tests ──────────────────────────────────────────────────────────

    #[test]
    fn test_format_distance_one_decimal() {
        assert_eq!(format_distance(3.0), "3.0");
        assert_eq!(format_distance(3.76), "3.8");
        assert_eq!(format_distance(12.04), "12.0");
        assert_eq!(format_distance(f64::INFINITY), "Infinity");
        assert_eq!(format_distance(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_format_distance_ties_round_away_from_zero() {
        assert_eq!(format_distance(0.25), "0.3");
        assert_eq!(format_distance(2.25), "2.3");
        assert_eq!(format_distance(0.75), "0.8");
        assert_eq!(format_distance(-0.25), "-0.3");
        assert_eq!(format_distance(-2.25), "-2.3");
    }

    #[test]
    fn test_format_distance_near_ties_use_exact_value() {
        // 0.35 is stored slightly below the half, 0.45 slightly above.
        assert_eq!(format_distance(0.35), "0.3");
        assert_eq!(format_distance(0.45), "0.5");
    }

    #[test]
    fn test_format_distance_negative_zero() {
        assert_eq!(format_distance(-0.0), "0.0");
        assert_eq!(format_distance(0.0), "0.0");
        assert_eq!(format_distance(-0.04), "-0.0");
    }

    #[test]
    fn test_numeric_input_char_filters() {
        assert_eq!(numeric_input_char('7'), Some('7'));
        assert_eq!(numeric_input_char('.'), Some('.'));
        assert_eq!(numeric_input_char(','), Some('.'));
        assert_eq!(numeric_input_char('a'), None);
        assert_eq!(numeric_input_char(' '), None);
    }

    #[test]
    fn test_step_distance_from_empty() {
        assert_eq!(step_distance("", 0.1), "0.1");
        assert_eq!(step_distance("", -0.1), "-0.1");
    }

    #[test]
    fn test_step_distance_rounds_to_step_precision() {
        assert_eq!(step_distance("0.2", 0.1), "0.3");
        assert_eq!(step_distance("5", 0.5), "5.5");
        assert_eq!(step_distance("3", 1.0), "4");
    }

    #[test]
    fn test_step_distance_back_to_zero() {
        assert_eq!(step_distance("0.1", -0.1), "0.0");
    }

    // ── key handling tests ────────────────────────────────────────────────────

    #[test]
    fn test_tab_cycles_focus() {
        let mut ledger = StepLedger::default();
        let mut app = App::new(&mut ledger, AppSettings::default());
        assert_eq!(app.focus, Focus::Date);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Distance);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Table);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Date);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, Focus::Table);
    }

    #[test]
    fn test_typing_edits_focused_field_only() {
        let mut ledger = StepLedger::default();
        let mut app = App::new(&mut ledger, AppSettings::default());
        type_str(&mut app, "01.02.2024");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "4a,5");
        assert_eq!(app.form.date, "01.02.2024");
        assert_eq!(app.form.distance, "4.5");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.form.distance, "4.");
        assert_eq!(app.form.date, "01.02.2024");
    }

    #[test]
    fn test_up_down_step_distance() {
        let mut ledger = StepLedger::default();
        let mut app = App::new(&mut ledger, AppSettings::default());
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.form.distance, "0.2");
        press(&mut app, KeyCode::Down);
        assert_eq!(app.form.distance, "0.1");
    }

    #[test]
    fn test_enter_submits_and_clears_form() {
        let mut ledger = StepLedger::default();
        {
            let mut app = App::new(&mut ledger, AppSettings::default());
            submit_entry(&mut app, "29.02.2024", "3.5");
            assert_eq!(app.form, StepForm::default());
            assert!(app.alert.is_none());
            assert!(app.status.is_some());
        }
        assert_eq!(ledger.get("29.02.2024").unwrap().distance, 3.5);
    }

    #[test]
    fn test_bad_date_opens_alert_and_keeps_fields() {
        let mut ledger = StepLedger::default();
        let mut app = App::new(&mut ledger, AppSettings::default());
        submit_entry(&mut app, "29.02.2023", "3");
        assert_eq!(
            app.alert.as_deref(),
            Some("Такой даты не существует. Пожалуйста, проверьте правильность.")
        );
        assert_eq!(app.form.date, "29.02.2023");
        assert_eq!(app.form.distance, "3");
        assert!(app.ledger.is_empty());
    }

    #[test]
    fn test_alert_swallows_keys_until_dismissed() {
        let mut ledger = StepLedger::default();
        let mut app = App::new(&mut ledger, AppSettings::default());
        submit_entry(&mut app, "1.1.2000", "3");
        assert!(app.alert.is_some());

        // Neither typing nor Esc-to-quit reach the app while the alert is open.
        press(&mut app, KeyCode::Char('9'));
        assert_eq!(app.form.distance, "3");
        assert!(!press(&mut app, KeyCode::Esc));
        assert!(app.alert.is_none());

        press(&mut app, KeyCode::Char('9'));
        assert_eq!(app.form.distance, "39");
    }

    #[test]
    fn test_bad_distance_is_silent() {
        let mut ledger = StepLedger::default();
        let mut app = App::new(&mut ledger, AppSettings::default());
        type_str(&mut app, "01.01.2024");
        press(&mut app, KeyCode::Enter);
        assert!(app.alert.is_none());
        assert!(app.status.is_none());
        assert_eq!(app.form.date, "01.01.2024");
        assert!(app.ledger.is_empty());
    }

    #[test]
    fn test_table_delete_selected_row() {
        let mut ledger = StepLedger::default();
        ledger.upsert(d(2024, 1, 1), 1.0);
        ledger.upsert(d(2024, 1, 2), 2.0);
        ledger.upsert(d(2024, 1, 3), 3.0);
        let mut app = App::new(&mut ledger, AppSettings::default());
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, Focus::Table);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Delete);
        let keys: Vec<_> = app.ledger.entries().iter().map(|e| e.key.clone()).collect();
        assert_eq!(keys, vec!["03.01.2024", "01.01.2024"]);
    }

    #[test]
    fn test_delete_last_row_moves_cursor_up() {
        let mut ledger = StepLedger::default();
        ledger.upsert(d(2024, 1, 1), 1.0);
        ledger.upsert(d(2024, 1, 2), 2.0);
        let mut app = App::new(&mut ledger, AppSettings::default());
        app.focus = Focus::Table;
        press(&mut app, KeyCode::Down);
        assert_eq!(app.list_cursor, 1);
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.list_cursor, 0);
        press(&mut app, KeyCode::Char('x'));
        assert!(app.ledger.is_empty());
        // Nothing left to delete.
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.list_cursor, 0);
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut ledger = StepLedger::default();
        ledger.upsert(d(2024, 1, 1), 1.0);
        let mut app = App::new(&mut ledger, AppSettings::default());
        app.focus = Focus::Table;
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.list_cursor, 0);
    }

    #[test]
    fn test_q_types_into_date_but_quits_from_table() {
        let mut ledger = StepLedger::default();
        let mut app = App::new(&mut ledger, AppSettings::default());
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.form.date, "q");
        app.focus = Focus::Table;
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_esc_and_ctrl_c_quit() {
        let mut ledger = StepLedger::default();
        let mut app = App::new(&mut ledger, AppSettings::default());
        assert!(press(&mut app, KeyCode::Esc));
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
    }

    // ── render tests ──────────────────────────────────────────────────────────

    #[test]
    fn test_render_shows_entries_newest_first() {
        let mut ledger = StepLedger::default();
        ledger.upsert(d(2024, 1, 15), 2.24);
        ledger.upsert(d(2024, 3, 1), 10.0);
        let app = App::new(&mut ledger, AppSettings::default());
        let text = screen(&app);
        let newer = text.find("01.03.2024").unwrap();
        let older = text.find("15.01.2024").unwrap();
        assert!(newer < older);
        assert!(text.contains("10.0"));
        assert!(text.contains("2.2"));
    }

    #[test]
    fn test_render_shows_placeholder_when_date_unfocused() {
        let mut ledger = StepLedger::default();
        let mut app = App::new(&mut ledger, AppSettings::default());
        app.focus = Focus::Table;
        assert!(screen(&app).contains(DATE_PLACEHOLDER));
    }

    #[test]
    fn test_render_alert_popup() {
        let mut ledger = StepLedger::default();
        let mut app = App::new(&mut ledger, AppSettings::default());
        submit_entry(&mut app, "01-01-2000", "1");
        assert!(screen(&app).contains("Внимание"));
    }
}
