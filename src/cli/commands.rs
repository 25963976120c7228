//! CLI command implementations

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cli::args::{CallCommand, ConfigCommand, ProfileCommand, ReportCommand};
use crate::config::Settings;
use crate::llm::{build_assistant, ChatRequest, GREETING};
use crate::profile::{normalize_phone_number, split_phone_number, ProfileStore};
use crate::provider::build_call_provider;
use crate::report::{render_transcript, HealthReport};
use crate::session::{watch, CallSession, CallStatus, FileCallIdStore, SessionManager};
use crate::storage::{ChatMessage, ChatRole, Database, Repository, StoredReport};
use crate::SessionError;

/// Handle profile subcommands
pub fn profile_command(settings: &Settings, user_id: &str, cmd: ProfileCommand) -> Result<()> {
    let repo = Repository::new(settings)?;

    match cmd {
        ProfileCommand::Set {
            phone,
            country_code,
            name,
            email,
        } => {
            if phone.is_none() && name.is_none() && email.is_none() {
                anyhow::bail!("Nothing to update. Pass --phone, --name or --email.");
            }

            let mut profile = repo.profile_or_new(user_id)?;
            if let Some(phone) = phone {
                profile.phone_number = Some(normalize_phone_number(&country_code, &phone)?);
            }
            if let Some(name) = name {
                profile.display_name = Some(name.trim().to_string());
            }
            if let Some(email) = email {
                profile.email = Some(email.trim().to_string());
            }

            repo.database().upsert_profile(&profile)?;
            println!("Profile saved for {}", user_id);
        }
        ProfileCommand::Show => {
            let profile = repo
                .database()
                .get_profile(user_id)?
                .with_context(|| format!("No profile for {}. Run `thryve profile set` first.", user_id))?;

            let phone = match profile.phone_number.as_deref() {
                Some(full) => match split_phone_number(full) {
                    Some((code, local)) => format!("{} {}", code, local),
                    None => full.to_string(),
                },
                None => "(not set)".to_string(),
            };

            println!("User: {}", profile.user_id);
            println!("Name: {}", profile.display_name.as_deref().unwrap_or("(not set)"));
            println!("Email: {}", profile.email.as_deref().unwrap_or("(not set)"));
            println!("Phone: {}", phone);
            println!("Plan: {}", profile.subscription_tier.as_str());
        }
        ProfileCommand::Plan { tier } => {
            repo.database().set_subscription_tier(user_id, tier)?;
            println!("Plan changed to {}", tier.as_str());
        }
    }

    Ok(())
}

/// Handle call subcommands
pub async fn call_command(settings: &Settings, user_id: &str, cmd: CallCommand) -> Result<()> {
    let repo = Repository::new(settings)?;

    match cmd {
        CallCommand::Start { no_wait } => start_call(settings, &repo, user_id, no_wait).await,
        CallCommand::Status => show_call_status(settings, &repo, user_id).await,
        CallCommand::Watch => {
            let mut manager = open_manager(settings)?;
            follow_call(settings, &repo, user_id, &mut manager).await
        }
        CallCommand::Reset { force } => reset_call(settings, &repo, user_id, force).await,
    }
}

fn open_manager(settings: &Settings) -> Result<SessionManager> {
    let provider = build_call_provider(settings)?;
    let store = FileCallIdStore::from_settings(settings);
    Ok(SessionManager::from_settings(settings, provider, Box::new(store)))
}

async fn start_call(
    settings: &Settings,
    repo: &Repository,
    user_id: &str,
    no_wait: bool,
) -> Result<()> {
    let profile = repo.profile_or_new(user_id)?;
    let phone_number = repo.database().phone_number(user_id)?.unwrap_or_default();

    let mut manager = open_manager(settings)?;
    let call_id = match manager.start(&phone_number, &profile.caller_name()).await {
        Ok(call_id) => call_id,
        Err(e @ SessionError::Precondition(_)) => {
            anyhow::bail!("{} Run `thryve profile set --phone <number>` first.", e)
        }
        Err(e @ SessionError::SessionInProgress(_)) => {
            anyhow::bail!("{}. Run `thryve call watch` to follow it.", e)
        }
        Err(e @ SessionError::NotReset) => anyhow::bail!(e),
        Err(e) => {
            manager.reset()?;
            return Err(e.into());
        }
    };

    println!("Call started: {}", call_id);
    println!("Your phone should ring shortly.");

    if no_wait {
        return Ok(());
    }

    follow_call(settings, repo, user_id, &mut manager).await
}

async fn show_call_status(settings: &Settings, repo: &Repository, user_id: &str) -> Result<()> {
    let mut manager = open_manager(settings)?;

    let session = match manager.poll().await {
        Ok(session) => session,
        Err(SessionError::NoActiveSession) => {
            println!("{}", CallStatus::NotStarted.headline());
            return Ok(());
        }
        Err(SessionError::Provider(_)) => manager.session().clone(),
        Err(e) => return Err(e.into()),
    };

    print_progress(&session);
    finish_call(repo, user_id, &mut manager, &session)
}

/// Poll until the call settles, then hand the result off.
async fn follow_call(
    settings: &Settings,
    repo: &Repository,
    user_id: &str,
    manager: &mut SessionManager,
) -> Result<()> {
    let stop = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    let session = match watch(manager, settings.poll_interval(), print_progress, stop).await {
        Ok(session) => session,
        Err(SessionError::NoActiveSession) => {
            println!("{}", CallStatus::NotStarted.headline());
            return Ok(());
        }
        Err(SessionError::Provider(_)) => {
            let session = manager.session().clone();
            print_progress(&session);
            session
        }
        Err(e) => return Err(e.into()),
    };

    finish_call(repo, user_id, manager, &session)
}

/// Show the outcome of a settled call and clear it from the active slot.
fn finish_call(
    repo: &Repository,
    user_id: &str,
    manager: &mut SessionManager,
    session: &CallSession,
) -> Result<()> {
    match session.status {
        CallStatus::Completed => {
            let stored = repo
                .archive_session(user_id, session)?
                .context("Completed call produced no report")?;
            manager.reset()?;

            println!();
            print!("{}", export_as_txt(&stored));
            println!();
            println!("Saved as report {}", short_id(&stored.id));
            Ok(())
        }
        CallStatus::Errored => {
            let detail = session
                .error_detail
                .clone()
                .unwrap_or_else(|| "unknown error".to_string());
            manager.reset()?;
            anyhow::bail!("Call failed: {}", detail)
        }
        _ => {
            println!("The call is still in progress. Run `thryve call watch` to follow it.");
            Ok(())
        }
    }
}

async fn reset_call(
    settings: &Settings,
    repo: &Repository,
    user_id: &str,
    force: bool,
) -> Result<()> {
    let mut manager = open_manager(settings)?;

    // Learn where the stored call stands before deciding whether it can go.
    match manager.poll().await {
        Ok(_) | Err(SessionError::Provider(_)) => {}
        Err(SessionError::NoActiveSession) => {
            println!("No call to reset");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    if manager.session().status == CallStatus::Completed {
        if let Some(stored) = repo.archive_session(user_id, manager.session())? {
            println!("Saved finished call as report {}", short_id(&stored.id));
        }
    }

    if force {
        manager.force_reset()?;
    } else {
        match manager.reset() {
            Ok(()) => {}
            Err(e @ SessionError::SessionInProgress(_)) => {
                anyhow::bail!("{}. Use --force to abandon it.", e)
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("Call cleared");
    Ok(())
}

/// Handle report subcommands
pub fn report_command(settings: &Settings, user_id: &str, cmd: ReportCommand) -> Result<()> {
    let repo = Repository::new(settings)?;

    match cmd {
        ReportCommand::List { limit } => {
            let reports = repo.list_reports(user_id, limit)?;

            if reports.is_empty() {
                println!("No reports found");
                return Ok(());
            }

            println!(
                "{:<10} {:<17} {:<10} {:<40}",
                "ID", "Date", "Duration", "Detected conditions"
            );
            println!("{}", "-".repeat(78));

            for stored in reports {
                println!(
                    "{:<10} {:<17} {:<10} {:<40}",
                    short_id(&stored.id),
                    stored.created_at.format("%Y-%m-%d %H:%M"),
                    stored.duration_ms.map(format_duration_ms).unwrap_or_default(),
                    truncate(stored.report.detected_conditions.display(), 38)
                );
            }
        }
        ReportCommand::View { id } => {
            let stored = find_report(&repo, user_id, &id)?;
            print!("{}", export_as_txt(&stored));
        }
        ReportCommand::Export { id, format, output } => {
            let stored = find_report(&repo, user_id, &id)?;
            export_report(&stored, &format, output)?;
        }
    }

    Ok(())
}

fn find_report(repo: &Repository, user_id: &str, id: &str) -> Result<StoredReport> {
    repo.find_report(user_id, id)?.context("Report not found")
}

fn export_report(stored: &StoredReport, format: &str, output: Option<PathBuf>) -> Result<()> {
    let content = match format {
        "txt" => export_as_txt(stored),
        "json" => serde_json::to_string_pretty(stored)?,
        "md" => export_as_markdown(stored),
        _ => anyhow::bail!("Unsupported format: {}. Supported: txt, json, md", format),
    };

    if let Some(path) = output {
        std::fs::write(&path, content)?;
        println!("Exported to: {}", path.display());
    } else {
        print!("{}", content);
    }

    Ok(())
}

/// Talk to the health assistant
pub async fn chat_command(
    settings: &Settings,
    user_id: &str,
    message: Option<String>,
    clear: bool,
) -> Result<()> {
    let db = Database::open(settings)?;

    if clear {
        let removed = db.clear_chat_history(user_id)?;
        println!("Cleared {} messages", removed);
    }

    let message = match message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()) {
        Some(message) => message,
        None => {
            if !clear {
                print_chat_history(&db.chat_history(user_id)?);
            }
            return Ok(());
        }
    };

    let history = db.chat_history(user_id)?;
    let assistant = build_assistant(settings)?;
    let reply = assistant
        .reply(ChatRequest {
            history: &history,
            message: &message,
        })
        .await?;

    db.insert_chat_message(&ChatMessage::new(user_id, ChatRole::User, message))?;
    db.insert_chat_message(&ChatMessage::new(user_id, ChatRole::Model, reply.clone()))?;

    println!("{}", reply);
    Ok(())
}

fn print_chat_history(history: &[ChatMessage]) {
    if history.is_empty() {
        println!("{}", GREETING);
        return;
    }

    for message in history {
        let who = match message.role {
            ChatRole::User => "You",
            ChatRole::Model => "Thryve",
        };
        println!("{}: {}", who, message.content);
        println!();
    }
}

/// Handle config subcommands
pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let toml = toml::to_string_pretty(settings)?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

// Helper functions

fn print_progress(session: &CallSession) {
    println!("{}", session.status.headline());
    if let Some(duration_ms) = session.duration_ms {
        println!("  Call duration: {}", format_duration_ms(duration_ms));
    }
    if let Some(detail) = session.error_detail.as_deref() {
        println!("  {}", detail);
    }
}

fn format_duration_ms(ms: u64) -> String {
    let secs = ms / 1000;
    let minutes = secs / 60;
    let seconds = secs % 60;
    format!("{}:{:02}", minutes, seconds)
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn truncate(s: &str, max_chars: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    if first_line.chars().count() <= max_chars && first_line.len() == s.len() {
        first_line.to_string()
    } else {
        let kept: String = first_line.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn report_sections(report: &HealthReport) -> [(&'static str, &str); 5] {
    [
        ("Detected Conditions", report.detected_conditions.display()),
        ("Diet Plan", report.diet_plan.display()),
        ("Preventive Measures", report.preventive_measures.display()),
        ("Summary", report.summary.display()),
        ("User Sentiment", report.sentiment.display()),
    ]
}

fn export_as_txt(stored: &StoredReport) -> String {
    let mut output = String::new();
    output.push_str(&format!("Report: {}\n", short_id(&stored.id)));
    output.push_str(&format!(
        "Date: {}\n",
        stored.created_at.format("%Y-%m-%d %H:%M")
    ));
    if let Some(duration_ms) = stored.duration_ms {
        output.push_str(&format!("Duration: {}\n", format_duration_ms(duration_ms)));
    }
    output.push_str("\n---\n");

    for (title, body) in report_sections(&stored.report) {
        output.push_str(&format!("\n{}:\n{}\n", title, body));
    }

    output.push_str("\nTranscript:\n");
    if stored.report.transcript.is_empty() {
        output.push_str("(No transcript available)\n");
    } else {
        output.push_str(&render_transcript(&stored.report.transcript));
    }

    output
}

fn export_as_markdown(stored: &StoredReport) -> String {
    let mut output = String::new();
    output.push_str("# Health Report\n\n");
    output.push_str(&format!(
        "_{}_\n",
        stored.created_at.format("%Y-%m-%d %H:%M UTC")
    ));

    for (title, body) in report_sections(&stored.report) {
        output.push_str(&format!("\n## {}\n\n{}\n", title, body));
    }

    output.push_str("\n## Transcript\n\n");
    if stored.report.transcript.is_empty() {
        output.push_str("No transcript available\n");
    }
    for line in &stored.report.transcript {
        output.push_str(&format!("**{}:** {}\n\n", line.speaker.label(), line.text));
    }

    output
}
