use crate::data::{AppSettings, StepLedger};
use crate::ui::steps_view::{App, run_app};
use crate::ui::{restore_terminal, setup_terminal};
use anyhow::Result;
use log::info;
use std::time::Duration;

pub fn run() -> Result<()> {
    let settings = AppSettings::load()?;
    let poll_interval = Duration::from_millis(settings.poll_interval_ms);
    let mut ledger = StepLedger::default();

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen
        );
        original_hook(info);
    }));

    let mut terminal = setup_terminal()?;
    let mut app = App::new(&mut ledger, settings);

    let result = run_app(&mut terminal, &mut app, poll_interval);

    restore_terminal(&mut terminal)?;
    drop(app);

    // The ledger lives for this session only.
    info!(
        "session closed with {} day(s), {:.1} km",
        ledger.len(),
        ledger.total_distance()
    );

    result
}
