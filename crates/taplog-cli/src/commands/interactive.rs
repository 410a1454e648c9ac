//! Line-driven logging session: one key per line, note prompts, and live
//! session changes.

use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{Local, Utc};
use taplog_core::keymap::{shortcut_help, Shortcut};
use taplog_core::timeline::group_by_day;
use taplog_core::{EntryId, LogReconciler, NoteTarget, PendingNote};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::auth_cmd::MAGIC_LINK_SENT;
use crate::commands::common::{
    format_day_lines, format_entry_line, report_notices, Workspace, EMPTY_LOG_HINT,
    SIGNED_OUT_HINT,
};
use crate::error::CliError;

const RECENT_LIMIT: usize = 10;
const CANCEL_INPUTS: [&str; 2] = ["\u{1b}", ":cancel"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub async fn run_interactive(mut workspace: Workspace) -> Result<(), CliError> {
    let mut sessions = workspace.gate.subscribe();
    sessions.mark_unchanged();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", shortcut_help());
    println!("Also: login <email>, code <email> <code>, link <url>, logout");
    render_recent(&workspace.log);

    loop {
        print_prompt(&workspace.log)?;
        tokio::select! {
            changed = sessions.changed() => {
                if changed.is_err() {
                    break;
                }
                let session = sessions.borrow_and_update().clone();
                let state = workspace.log.apply_session(session).await;
                println!();
                match workspace.log.session() {
                    Some(session) => println!(
                        "Signed in as {} ({})",
                        session.user.email.as_deref().unwrap_or(session.user_id()),
                        state.label()
                    ),
                    None => println!("Signed out"),
                }
                render_recent(&workspace.log);
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if handle_line(&mut workspace, &line).await == Flow::Quit {
                    break;
                }
            }
        }
        workspace.log.reap();
        report_notices(&mut workspace.log);
    }

    workspace.finish().await;
    Ok(())
}

/// What one line of input means in the current prompt state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input<'a> {
    /// Text for the open note prompt, which takes every line while open.
    NoteText(&'a str),
    CancelNote,
    Shortcut(Shortcut),
    Words(Vec<&'a str>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteOutcome {
    Saved(EntryId),
    /// The prompt's entry was deleted or replaced while it was open.
    Discarded,
}

pub fn classify_line<'a>(log: &LogReconciler, line: &'a str) -> Input<'a> {
    if log.pending_note().is_some() {
        if CANCEL_INPUTS.contains(&line.trim()) {
            return Input::CancelNote;
        }
        return Input::NoteText(line);
    }
    Shortcut::from_line(line).map_or_else(
        || Input::Words(line.split_whitespace().collect()),
        Input::Shortcut,
    )
}

pub fn complete_note(log: &mut LogReconciler, text: &str) -> Result<NoteOutcome, CliError> {
    Ok(log
        .attach_note(text)?
        .map_or(NoteOutcome::Discarded, NoteOutcome::Saved))
}

/// Run a record shortcut; `None` for shortcuts that do not record.
pub fn record_shortcut(
    log: &mut LogReconciler,
    shortcut: Shortcut,
) -> Option<Result<EntryId, CliError>> {
    let recorded = match shortcut {
        Shortcut::Record(category) => log.record_tap(category),
        Shortcut::FreeNote => log.record_free_note(),
        Shortcut::Sync | Shortcut::Export | Shortcut::Quit => return None,
    };
    Some(recorded.map_err(CliError::from))
}

async fn handle_line(workspace: &mut Workspace, line: &str) -> Flow {
    let outcome = match classify_line(&workspace.log, line) {
        Input::CancelNote => {
            workspace.log.cancel_note();
            println!("Note cancelled");
            Ok(())
        }
        Input::NoteText(text) => {
            complete_note(&mut workspace.log, text).map(|outcome| match outcome {
                NoteOutcome::Saved(id) => print_entry(&workspace.log, &id),
                NoteOutcome::Discarded => println!("Entry is gone; note discarded"),
            })
        }
        Input::Shortcut(shortcut) => return run_shortcut(workspace, shortcut).await,
        Input::Words(words) => run_words(workspace, &words).await,
    };
    if let Err(error) = outcome {
        eprintln!("{error}");
    }
    Flow::Continue
}

async fn run_words(workspace: &mut Workspace, words: &[&str]) -> Result<(), CliError> {
    match words {
        [] => {
            render_recent(&workspace.log);
            Ok(())
        }
        ["login", email] => {
            workspace.gate.sign_in_with_email(email).await?;
            println!("{MAGIC_LINK_SENT}");
            Ok(())
        }
        ["code", email, code] => {
            workspace.gate.verify_email_code(email, code).await?;
            Ok(())
        }
        ["link", url] => {
            workspace.gate.complete_magic_link(url).await?;
            Ok(())
        }
        ["logout"] => Ok(workspace.gate.sign_out().await?),
        _ => {
            println!("Unknown input. {}", shortcut_help());
            Ok(())
        }
    }
}

async fn run_shortcut(workspace: &mut Workspace, shortcut: Shortcut) -> Flow {
    let log = &mut workspace.log;
    if let Some(recorded) = record_shortcut(log, shortcut) {
        match recorded {
            Ok(id) => print_entry(log, &id),
            Err(error) => eprintln!("{error}"),
        }
        return Flow::Continue;
    }

    match shortcut {
        Shortcut::Quit => return Flow::Quit,
        Shortcut::Sync => {
            let state = log.pull_all().await;
            println!("Sync {}", state.label());
            render_recent(log);
        }
        Shortcut::Export => {
            if let Err(error) = export_to_current_dir(log).await {
                eprintln!("{error}");
            }
        }
        Shortcut::Record(_) | Shortcut::FreeNote => {}
    }
    Flow::Continue
}

fn print_entry(log: &LogReconciler, id: &EntryId) {
    if let Some(entry) = log.get(id) {
        println!("{}", format_entry_line(entry, &Local));
    }
}

async fn export_to_current_dir(log: &LogReconciler) -> Result<(), CliError> {
    let artifact = log.export_snapshot(&Local, Utc::now()).await?;
    let path = PathBuf::from(&artifact.file_name);
    std::fs::write(&path, artifact.contents)?;
    println!("Exported {}", path.display());
    Ok(())
}

fn render_recent(log: &LogReconciler) {
    let entries = log.entries();
    if entries.is_empty() {
        if log.session().is_none() {
            println!("{SIGNED_OUT_HINT}");
        } else {
            println!("{EMPTY_LOG_HINT}");
        }
        return;
    }

    let shown = &entries[..RECENT_LIMIT.min(entries.len())];
    for line in format_day_lines(&group_by_day(shown, &Local), &Local) {
        println!("{line}");
    }
}

fn prompt_text(log: &LogReconciler) -> String {
    match log.pending_note() {
        Some(PendingNote { target, .. }) => {
            let label = match target {
                NoteTarget::Category(category) => category.key(),
                NoteTarget::FreeNote => "note",
            };
            format!("Note for {label} (Enter saves, Esc+Enter cancels): ")
        }
        None => format!("[{}] > ", log.sync_state().label()),
    }
}

fn print_prompt(log: &LogReconciler) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", prompt_text(log))?;
    stdout.flush()?;
    Ok(())
}
