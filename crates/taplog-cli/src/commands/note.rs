use chrono::Local;
use taplog_core::{EntryId, LogReconciler};

use crate::commands::common::{format_entry_line, Workspace};
use crate::error::CliError;

pub async fn run_note(text_parts: &[String], mut workspace: Workspace) -> Result<(), CliError> {
    let id = free_note(&mut workspace.log, text_parts)?;

    if let Some(entry) = workspace.log.get(&id) {
        println!("{}", format_entry_line(entry, &Local));
    }
    workspace.finish().await;
    Ok(())
}

/// Record a free-note entry carrying the joined words.
pub fn free_note(log: &mut LogReconciler, text_parts: &[String]) -> Result<EntryId, CliError> {
    let id = log.record_free_note()?;
    log.attach_note(&text_parts.join(" "))?;
    Ok(id)
}
