use std::path::Path;

use chrono::{Local, Utc};

use crate::commands::common::Workspace;
use crate::error::CliError;

pub async fn run_export(output_path: Option<&Path>, workspace: Workspace) -> Result<(), CliError> {
    let artifact = workspace.log.export_snapshot(&Local, Utc::now()).await?;

    if let Some(path) = output_path {
        let path = if path.is_dir() {
            path.join(&artifact.file_name)
        } else {
            path.to_path_buf()
        };
        std::fs::write(&path, artifact.contents)?;
        println!("{}", path.display());
    } else {
        println!("{}", artifact.contents);
    }

    workspace.finish().await;
    Ok(())
}
