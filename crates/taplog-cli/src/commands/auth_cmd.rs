use std::path::PathBuf;

use taplog_core::cache::{FileCache, LocalCache};
use taplog_core::SessionGate;

use crate::auth::{auth_client_for, clear_stored_session, load_stored_session, CliAuthClient};
use crate::cli::AuthCommands;
use crate::commands::common::resolve_cache_path;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub const MAGIC_LINK_SENT: &str = "Check your email for the magic link.";

pub async fn run_auth(
    command: AuthCommands,
    global_profile: Option<&str>,
    cache_path: Option<PathBuf>,
) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { profile, email } => {
            let (profile_name, gate) = open_gate(profile.as_deref().or(global_profile))?;
            gate.sign_in_with_email(&email).await?;
            println!("{MAGIC_LINK_SENT}");
            println!(
                "Then run `taplog auth verify --profile {profile_name} --email {} --code <CODE>` or `--link <URL>`.",
                email.trim()
            );
            Ok(())
        }
        AuthCommands::Verify {
            profile,
            email,
            code,
            link,
        } => {
            let (profile_name, gate) = open_gate(profile.as_deref().or(global_profile))?;
            let session = match (link, code, email) {
                (Some(link), _, _) => gate.complete_magic_link(&link).await?,
                (None, Some(code), Some(email)) => {
                    gate.verify_email_code(email.trim(), code.trim()).await?
                }
                (None, Some(_), None) => {
                    return Err(CliError::Auth("--email is required with --code".to_string()));
                }
                (None, None, _) => {
                    return Err(CliError::Auth(
                        "Pass --code with the emailed code or --link with the magic link URL"
                            .to_string(),
                    ));
                }
            };
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in profile '{profile_name}' as {email_label}");
            Ok(())
        }
        AuthCommands::Status { profile } => {
            let config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            let client_config = config.client_config(&profile_name);

            let session = match auth_client_for(&profile_name, &client_config)? {
                Some(client) => client.restore_session().await?,
                None => {
                    println!("Profile '{profile_name}' is not configured.");
                    load_stored_session(&profile_name)?
                }
            };

            if let Some(session) = session {
                let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                println!(
                    "Profile '{}' is signed in as {} (expires_at={})",
                    profile_name, email_label, session.expires_at
                );
            } else {
                println!("Profile '{profile_name}' is not signed in.");
            }
            Ok(())
        }
        AuthCommands::Logout { profile } => {
            let config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            let client_config = config.client_config(&profile_name);

            let stored_session = load_stored_session(&profile_name)?;
            let client = auth_client_for(&profile_name, &client_config)?;
            if let (Some(client), Some(session)) = (client, stored_session) {
                if let Err(error) = client.revoke(&session.access_token).await {
                    tracing::warn!("Remote sign-out failed: {}", error);
                }
            }
            clear_stored_session(&profile_name)?;

            LocalCache::new(FileCache::new(resolve_cache_path(cache_path, &profile_name)))
                .persist(&[]);
            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
    }
}

fn open_gate(profile: Option<&str>) -> Result<(String, SessionGate<CliAuthClient>), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile);
    let client = auth_client_for(&profile_name, &config.client_config(&profile_name))?
        .ok_or_else(|| {
            CliError::Config(format!(
                "Profile '{profile_name}' missing Supabase auth config. Run `taplog config init --profile {profile_name}` first."
            ))
        })?;
    Ok((profile_name, SessionGate::new(client)))
}
