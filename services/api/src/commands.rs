use crate::infra::{build_mailer, open_store, persist_store};
use chrono::Utc;
use clap::Args;
use interview_hub::config::{AppConfig, MAX_ARCHIVE_RETENTION_DAYS};
use interview_hub::error::AppError;
use interview_hub::export::{render, ExportKind};
use interview_hub::jobs::{archive_rejected_selections, send_interview_reminders, ReminderWindow};
use interview_hub::telemetry;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct ArchiveArgs {
    /// Override how many days rejected selections are kept
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..=MAX_ARCHIVE_RETENTION_DAYS))]
    pub(crate) retention_days: Option<i64>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Export to write: interviews, interview-task-items, test-tasks or test-task-items
    pub(crate) kind: ExportKind,
    /// Destination file (defaults to stdout)
    #[arg(long, short)]
    pub(crate) output: Option<PathBuf>,
}

fn prepare() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

pub(crate) fn run_reminders() -> Result<(), AppError> {
    let config = prepare()?;
    let store = open_store(&config)?;
    let mailer = build_mailer(&config.mail)?;
    let window = ReminderWindow::from_config(&config.jobs);

    let report = send_interview_reminders(
        &store,
        mailer.as_ref(),
        &config.mail.from,
        window,
        Utc::now(),
    )?;
    println!(
        "Interview reminders: {} sent, {} failed",
        report.sent, report.failed
    );
    Ok(())
}

pub(crate) fn run_archive(args: ArchiveArgs) -> Result<(), AppError> {
    let config = prepare()?;
    let store = open_store(&config)?;
    let retention_days = args
        .retention_days
        .unwrap_or(config.jobs.archive_retention_days);

    let removed = archive_rejected_selections(&store, Utc::now(), retention_days)?;
    persist_store(&config, &store)?;
    println!("Archived {removed} rejected company selections older than {retention_days} days");
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = prepare()?;
    let store = open_store(&config)?;
    let bytes = {
        let tables = store.read()?;
        render(&tables, args.kind)?
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, &bytes)?;
            println!("Wrote {} to {}", args.kind.file_name(), path.display());
        }
        None => std::io::stdout().write_all(&bytes)?,
    }
    Ok(())
}
