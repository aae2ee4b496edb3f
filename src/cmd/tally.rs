use crate::data::StepLedger;
use crate::ui::form::{DISTANCE_LABEL, Field, StepForm, SubmitOutcome};
use crate::ui::steps_view::format_distance;
use anyhow::{Context, Result};
use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

/// Feeds `DATE DISTANCE` lines through the entry form and prints the totals.
pub fn run(input: Option<&Path>, json: bool) -> Result<()> {
    let ledger = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            tally_lines(BufReader::new(file), &mut io::stderr())?
        }
        None => tally_lines(io::stdin().lock(), &mut io::stderr())?,
    };

    let mut out = io::stdout();
    if json {
        write_json(&ledger, &mut out)
    } else {
        write_table(&ledger, &mut out)
    }
}

/// Each non-blank line is one form submission. Alerts go to `alerts`,
/// prefixed with the 1-based line number. Lines starting with `#` are skipped.
pub(crate) fn tally_lines<R: BufRead, W: Write>(reader: R, alerts: &mut W) -> Result<StepLedger> {
    let mut ledger = StepLedger::default();
    let mut form = StepForm::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("failed to read input")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        form.set(Field::Date, parts.next().unwrap_or(""));
        form.set(Field::Distance, parts.next().unwrap_or(""));

        match form.submit(&mut ledger) {
            SubmitOutcome::Recorded { .. } => {}
            SubmitOutcome::Alert(e) => writeln!(alerts, "line {}: {}", idx + 1, e)?,
            SubmitOutcome::Ignored => debug!("line {}: no distance, skipped", idx + 1),
        }
    }
    Ok(ledger)
}

pub(crate) fn write_table<W: Write>(ledger: &StepLedger, out: &mut W) -> Result<()> {
    writeln!(out, "  {:<12} {:>12}", "Дата", DISTANCE_LABEL)?;
    writeln!(out, "---")?;
    for entry in ledger.entries() {
        writeln!(
            out,
            "  {:<12} {:>12}",
            entry.key,
            format_distance(entry.distance)
        )?;
    }
    writeln!(out, "---")?;
    writeln!(
        out,
        "Итого: {} дн., {} км",
        ledger.len(),
        format_distance(ledger.total_distance())
    )?;
    Ok(())
}

pub(crate) fn write_json<W: Write>(ledger: &StepLedger, out: &mut W) -> Result<()> {
    let json = serde_json::to_string_pretty(ledger.entries()).context("failed to serialize JSON")?;
    writeln!(out, "{json}")?;
    Ok(())
}
