use taplog_core::config::ClientConfig;
use taplog_core::util::is_http_url;

use crate::cli::ConfigCommands;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            supabase_url,
            supabase_anon_key,
            redirect_url,
            no_activate,
        } => {
            let explicit = ClientConfig {
                supabase_url,
                supabase_anon_key,
                email_redirect_to: redirect_url,
            };
            run_config_init(profile.as_deref().or(global_profile), explicit, no_activate)
        }
    }
}

/// Merge explicit flags, then `TAPLOG_*` environment variables, then the
/// stored profile, and persist the result.
pub fn run_config_init(
    profile_name: Option<&str>,
    explicit: ClientConfig,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing_profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged = merge_profile(explicit, ClientConfig::from_env(), existing_profile);
    validate_profile_urls(&merged)?;

    *config.profile_mut_or_default(&profile_name) = merged.clone();
    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let missing_fields = missing_fields(&merged);
    if missing_fields.is_empty() {
        println!(
            "Profile '{profile_name}' is ready. Run `taplog auth login --email <email>`."
        );
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

pub fn merge_profile(
    explicit: ClientConfig,
    env: ClientConfig,
    existing: ClientConfig,
) -> ClientConfig {
    explicit.or(env).or(existing)
}

pub fn missing_fields(profile: &ClientConfig) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if profile.supabase_url.is_none() {
        missing.push("supabase_url");
    }
    if profile.supabase_anon_key.is_none() {
        missing.push("supabase_anon_key");
    }
    missing
}

pub fn validate_profile_urls(profile: &ClientConfig) -> Result<(), CliError> {
    if let Some(url) = &profile.supabase_url {
        if !is_http_url(url) {
            return Err(CliError::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
    }
    if let Some(url) = &profile.email_redirect_to {
        if !is_http_url(url) {
            return Err(CliError::Config(
                "redirect_url must include http:// or https://".to_string(),
            ));
        }
    }
    Ok(())
}
