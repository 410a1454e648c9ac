use chrono::Local;
use taplog_core::timeline::group_by_day;

use crate::commands::common::{
    entry_to_list_item, format_day_lines, EntryListItem, Workspace, EMPTY_LOG_HINT,
    SIGNED_OUT_HINT,
};
use crate::error::CliError;

pub async fn run_list(limit: usize, as_json: bool, workspace: Workspace) -> Result<(), CliError> {
    let entries = workspace.log.entries();
    let shown = &entries[..limit.min(entries.len())];

    if as_json {
        let json_items = shown
            .iter()
            .map(|entry| entry_to_list_item(entry, &Local))
            .collect::<Vec<EntryListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if shown.is_empty() {
        if workspace.log.session().is_none() {
            println!("{SIGNED_OUT_HINT}");
        } else {
            println!("{EMPTY_LOG_HINT}");
        }
    } else {
        for line in format_day_lines(&group_by_day(shown, &Local), &Local) {
            println!("{line}");
        }
    }

    workspace.finish().await;
    Ok(())
}
