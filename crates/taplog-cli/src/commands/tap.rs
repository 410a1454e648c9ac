use chrono::Local;
use taplog_core::{Category, EntryId, LogReconciler};

use crate::commands::common::{format_entry_line, Workspace};
use crate::error::CliError;

pub async fn run_tap(
    category: Category,
    note: Option<&str>,
    mut workspace: Workspace,
) -> Result<(), CliError> {
    let id = tap_with_note(&mut workspace.log, category, note).await?;

    if let Some(entry) = workspace.log.get(&id) {
        println!("{}", format_entry_line(entry, &Local));
    }
    workspace.finish().await;
    Ok(())
}

/// Record a tap and close its note prompt in one step.
///
/// The note upsert is only sent once the initial insert has landed, so the
/// row cannot be upserted before it exists.
pub async fn tap_with_note(
    log: &mut LogReconciler,
    category: Category,
    note: Option<&str>,
) -> Result<EntryId, CliError> {
    let id = log.record_tap(category)?;
    match note {
        Some(text) => {
            log.settle().await;
            log.attach_note(text)?;
        }
        None => {
            log.cancel_note();
        }
    }
    Ok(id)
}
