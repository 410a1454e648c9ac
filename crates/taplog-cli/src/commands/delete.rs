use crate::commands::common::{resolve_entry_id, Workspace};
use crate::error::CliError;

pub async fn run_delete(id: &str, mut workspace: Workspace) -> Result<(), CliError> {
    let entry_id = resolve_entry_id(&workspace.log, id)?;
    if !workspace.log.delete_entry(&entry_id) && workspace.log.session().is_none() {
        return Err(CliError::EntryNotFound(entry_id.to_string()));
    }

    println!("{entry_id}");
    workspace.finish().await;
    Ok(())
}
