//! Output formatting for CLI commands
//!
//! Records print as pretty JSON by default; listings can also render as a
//! table.

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use runfolder::{RunfolderRecord, RunfolderState};
use serde::Serialize;

/// Print any serializable value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Print runfolder records as a table
pub fn print_runfolder_table(records: &[RunfolderRecord]) {
    if records.is_empty() {
        println!("No runfolders found.");
        return;
    }
    println!("{}", runfolder_table(records));
}

fn runfolder_table(records: &[RunfolderRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        ["STATE", "PATH", "HOST", "METADATA"]
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );

    for record in records {
        table.add_row(vec![
            Cell::new(record.state.as_str()).fg(color_for_state(record.state)),
            Cell::new(record.path.display().to_string()),
            Cell::new(&record.host),
            Cell::new(format_metadata(record)),
        ]);
    }
    table
}

/// Color for state indicators
pub fn color_for_state(state: RunfolderState) -> Color {
    match state {
        RunfolderState::Ready => Color::Green,
        RunfolderState::Started | RunfolderState::Pending => Color::Yellow,
        RunfolderState::Done => Color::Blue,
        RunfolderState::Error => Color::Red,
        RunfolderState::None => Color::Grey,
    }
}

fn format_metadata(record: &RunfolderRecord) -> String {
    record
        .metadata
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(", ")
}
