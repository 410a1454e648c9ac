use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::TimeZone;
use serde::Serialize;
use taplog_core::cache::{FileCache, LocalCache, CACHE_FILE_NAME};
use taplog_core::store::SupabaseLogStore;
use taplog_core::timeline::{format_date, format_time, DayGroup};
use taplog_core::{Category, EntryId, LogEntry, LogReconciler, Notice, SessionGate};

use crate::auth::{auth_client_for, CliAuthClient};
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub const ENV_CACHE_PATH: &str = "TAPLOG_CACHE_PATH";

pub const SIGNED_OUT_HINT: &str = "Sign in with your email (magic link) to start logging: `taplog auth login --email you@example.com`. Your entries sync to the cloud (Supabase) and are available on any device.";
pub const EMPTY_LOG_HINT: &str = "No entries yet. Tap a category (`taplog tap eat`) or press E/D/F/P/N in `taplog interactive` to create a row with the current time.";

const SHORT_ID_LEN: usize = 13;

/// Session gate and log for one CLI profile.
pub struct Workspace {
    pub profile_name: String,
    pub gate: SessionGate<CliAuthClient>,
    pub log: LogReconciler,
}

impl Workspace {
    /// Load the profile, adopt the cached log, then restore the session
    /// (which pulls the remote log when signed in).
    pub async fn open(
        global_profile: Option<&str>,
        cache_path: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
        let profile_name = profiles.resolve_profile_name(global_profile);
        let config = profiles.client_config(&profile_name);

        let Some((url, anon_key)) = config.supabase().map_err(CliError::Config)? else {
            return Err(CliError::NotConfigured);
        };
        let auth = auth_client_for(&profile_name, &config)?.ok_or(CliError::NotConfigured)?;
        let store = SupabaseLogStore::new(&url, anon_key)?;

        let cache = FileCache::new(resolve_cache_path(cache_path, &profile_name));
        tracing::debug!("Using local cache at {}", cache.path().display());
        let mut log = LogReconciler::new(Arc::new(store), LocalCache::new(cache));
        log.restore_cache();

        let gate = SessionGate::new(auth);
        let session = match gate.restore().await {
            Ok(session) => session,
            Err(error) => {
                tracing::warn!("Could not restore session: {}", error);
                None
            }
        };
        log.apply_session(session).await;

        Ok(Self {
            profile_name,
            gate,
            log,
        })
    }

    /// Wait for background writes and print any warnings they raised.
    pub async fn finish(mut self) {
        self.log.settle().await;
        report_notices(&mut self.log);
    }
}

pub fn report_notices(log: &mut LogReconciler) {
    for notice in log.drain_notices() {
        eprintln!("{}", notice_line(&notice));
    }
}

pub fn notice_line(notice: &Notice) -> String {
    format!("{}  {notice}", short_id(&notice.entry_id()))
}

pub fn resolve_cache_path(explicit: Option<PathBuf>, profile_name: &str) -> PathBuf {
    explicit
        .or_else(|| {
            env::var_os(ENV_CACHE_PATH)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| default_cache_path(profile_name))
}

pub fn default_cache_path(profile_name: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taplog")
        .join(profile_name)
        .join(CACHE_FILE_NAME)
}

pub fn normalize_entry_identifier(id: &str) -> Result<String, CliError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(CliError::EmptyEntryId);
    }
    Ok(id.to_ascii_lowercase())
}

/// Resolve a full entry id or a unique prefix of one in the local log.
pub fn resolve_entry_id(log: &LogReconciler, query: &str) -> Result<EntryId, CliError> {
    let query = normalize_entry_identifier(query)?;
    if let Ok(id) = query.parse::<EntryId>() {
        return Ok(id);
    }

    let matching_ids = log
        .entries()
        .into_iter()
        .map(|entry| entry.id)
        .filter(|id| id.to_string().starts_with(&query))
        .take(3)
        .collect::<Vec<_>>();

    match matching_ids.as_slice() {
        [] => Err(CliError::EntryNotFound(query)),
        [id] => Ok(*id),
        _ => {
            let options = matching_ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousEntryId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntryListItem {
    pub id: String,
    pub ts: i64,
    pub time: String,
    pub date: String,
    pub eat: Option<String>,
    pub drink: Option<String>,
    pub feel: Option<String>,
    pub posture: Option<String>,
    pub note: Option<String>,
}

pub fn entry_to_list_item<Tz>(entry: &LogEntry, tz: &Tz) -> EntryListItem
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    EntryListItem {
        id: entry.id.to_string(),
        ts: entry.ts,
        time: format_time(entry.ts, tz),
        date: format_date(entry.ts, tz),
        eat: entry.eat.clone(),
        drink: entry.drink.clone(),
        feel: entry.feel.clone(),
        posture: entry.posture.clone(),
        note: entry.note.clone(),
    }
}

pub fn short_id(id: &EntryId) -> String {
    id.to_string().chars().take(SHORT_ID_LEN).collect()
}

/// The recorded columns of an entry on one line.
pub fn entry_summary(entry: &LogEntry) -> String {
    let mut parts = Category::ALL
        .iter()
        .filter_map(|category| {
            entry
                .category(*category)
                .map(|value| format!("{category}: {}", collapse_whitespace(value)))
        })
        .collect::<Vec<_>>();
    if let Some(note) = entry.note.as_deref() {
        parts.push(format!("note: {}", collapse_whitespace(note)));
    }

    if parts.is_empty() {
        "(blank)".to_string()
    } else {
        parts.join("  ")
    }
}

pub fn format_entry_line<Tz>(entry: &LogEntry, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let short_id = short_id(&entry.id);
    let time = format_time(entry.ts, tz);
    format!("{short_id:<13}  {time:>8}  {}", entry_summary(entry))
}

/// Day header followed by indented entry lines, per group.
pub fn format_day_lines<Tz>(groups: &[DayGroup<'_>], tz: &Tz) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut lines = Vec::new();
    for group in groups {
        lines.push(group.label.clone());
        for entry in &group.entries {
            lines.push(format!("  {}", format_entry_line(entry, tz)));
        }
    }
    lines
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
