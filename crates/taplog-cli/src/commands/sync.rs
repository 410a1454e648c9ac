use taplog_core::SyncState;

use crate::commands::common::Workspace;
use crate::error::CliError;

pub async fn run_sync(mut workspace: Workspace) -> Result<(), CliError> {
    if workspace.log.session().is_none() {
        return Err(taplog_core::Error::SignInRequired.into());
    }

    match workspace.log.pull_all().await {
        SyncState::Synced => println!("Synced {} entries", workspace.log.len()),
        state => println!("Sync {}; showing local copy", state.label()),
    }
    workspace.finish().await;
    Ok(())
}
